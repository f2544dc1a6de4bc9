// [tests/mirror/libs/shared/atalaya/atalaya_integrity.test.rs]
/**
 * =================================================================
 * APARATO: ATALAYA INTEGRITY CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-SHARED
 * RESPONSABILIDAD: VALIDACIÓN DE TRAZADO E INTERCEPCIÓN DE PÁNICOS
 * =================================================================
 */

use canguro_shared_atalaya::init_tracing;
use std::panic;
use tracing::{info, instrument};

#[instrument(name = "test_instrumentation_strata")]
fn simulate_instrumented_operation() {
    info!("📡 [SIGNAL]: executing traced micro-operation");
}

#[test]
fn certify_atalaya_macro_and_panic_strata() {
    // 1. FASE DE IGNICIÓN
    init_tracing("atalaya_integrity_test");

    // 2. FASE DE MACRO SYNC
    simulate_instrumented_operation();

    // 3. FASE DE ESCUDO: el hook global no debe impedir la captura local
    let panic_capture = panic::catch_unwind(|| {
        panic!("INTENTIONAL_STRATA_FAILURE_FOR_TESTING");
    });
    assert!(panic_capture.is_err(), "the panic hook must not swallow the unwind");

    // 4. RE-IGNICIÓN: un segundo init no debe derribar el proceso
    //    (el suscriptor global ya existe; el hook simplemente se re-instala)
    let reinit = panic::catch_unwind(|| init_tracing("atalaya_reinit"));
    let _ = reinit;
}
