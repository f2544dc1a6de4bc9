// [libs/shared/atalaya/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ATALAYA OBSERVER (V4.1 - GOLD MASTER)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: TELEMETRÍA, TRAZADO Y CAPTURA DE PÁNICOS
 *
 * El colapso de un hilo de manada debe dejar rastro: el hook global
 * vuelca origen y detalle del pánico bajo el target 'canguro_panics'
 * y después delega en el hook previo, de modo que el volcado estándar
 * de Rust sigue disponible en consola.
 * =================================================================
 */

use std::panic;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Directiva de filtro cuando RUST_LOG no dicta otra cosa.
fn default_directive() -> &'static str {
    if cfg!(debug_assertions) { "debug" } else { "info" }
}

/// Texto humano del payload de un pánico.
fn payload_text(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "<opaque panic payload>".to_string()
    }
}

/// Arma la telemetría del nodo: filtro dirigido por entorno, capa de
/// consola en desarrollo o JSON en producción, y hook de pánicos que
/// registra el colapso antes de ceder al hook previo.
pub fn init_tracing(service_identifier: &str) {
    let directive =
        std::env::var("RUST_LOG").unwrap_or_else(|_| default_directive().to_string());
    let filter =
        EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(default_directive()));

    let registry = tracing_subscriber::registry().with(filter);
    let mode = if cfg!(debug_assertions) {
        registry
            .with(formatting_layer::layer().with_thread_names(true).with_target(false))
            .init();
        "console"
    } else {
        registry.with(formatting_layer::layer().json()).init();
        "json"
    };

    let node_label = format!("canguro::{service_identifier}");
    let previous_hook = panic::take_hook();
    panic::set_hook(Box::new(move |report| {
        let origin = report.location().map_or_else(
            || "<unlocated>".to_string(),
            |at| format!("{}:{}", at.file(), at.line()),
        );
        error!(
            target: "canguro_panics",
            node = %node_label,
            origin = %origin,
            detail = %payload_text(report.payload()),
            "💥 [HERD_COLLAPSE]: a walker thread aborted"
        );
        previous_hook(report);
    }));

    info!("🔭 [ATALAYA]: telemetry armed for {} ({})", service_identifier, mode);
}
