// [libs/core/herd-engine/src/coordinator.rs]
/*!
 * =================================================================
 * APARATO: SEARCH COORDINATOR (V4.0 - EXPLICIT STATE)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: SEÑALES DE PARO/GUARDADO Y CONTADORES DE ENJAMBRE
 *
 * El estado mutable global del sistema (endOfSearch, saveRequest,
 * colisiones de manada propia, esfuerzo) vive en este valor explícito
 * enhebrado a cada trabajador; jamás en singletons ambientales.
 * =================================================================
 */

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

/// Intervalo de sondeo del protocolo de estacionamiento.
const PARK_POLL: Duration = Duration::from_millis(50);

/// Coordinador de una búsqueda en curso.
#[derive(Debug, Default)]
pub struct SearchCoordinator {
    end_of_search: AtomicBool,
    save_request: AtomicBool,
    parked_workers: AtomicUsize,
    /// Colisiones dentro de la misma manada (canguros muertos re-sembrados).
    pub same_herd_collisions: AtomicU64,
    /// Operaciones de grupo acumuladas por todo el enjambre.
    pub operations: AtomicU64,
}

impl SearchCoordinator {
    /// Coordinador en estado inicial.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transición unidireccional false → true del fin de búsqueda.
    pub fn request_stop(&self) {
        self.end_of_search.store(true, Ordering::SeqCst);
    }

    /// Lectura cooperativa del fin de búsqueda (una vez por iteración).
    #[inline(always)]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.end_of_search.load(Ordering::Relaxed)
    }

    /// Registra un evento de manada propia.
    pub fn record_same_herd(&self) {
        self.same_herd_collisions.fetch_add(1, Ordering::Relaxed);
    }

    /// Acumula operaciones de grupo ejecutadas (una ráfaga completa).
    #[inline(always)]
    pub fn record_operations(&self, count: u64) {
        self.operations.fetch_add(count, Ordering::Relaxed);
    }

    /// Observa si hay una solicitud de guardado pendiente (el trabajador
    /// deposita su instantánea de manada antes de estacionarse).
    #[inline(always)]
    #[must_use]
    pub fn save_requested(&self) -> bool {
        self.save_request.load(Ordering::Acquire)
    }

    /// Punto de suspensión de los trabajadores: si hay guardado en curso,
    /// el hilo se registra como estacionado y espera la liberación.
    pub fn hold_for_save(&self) {
        if !self.save_request.load(Ordering::Acquire) {
            return;
        }
        self.parked_workers.fetch_add(1, Ordering::AcqRel);
        while self.save_request.load(Ordering::Acquire) && !self.is_stopped() {
            std::thread::sleep(PARK_POLL);
        }
        self.parked_workers.fetch_sub(1, Ordering::AcqRel);
    }

    /// Quiescencia para guardado: levanta la solicitud y espera a que los
    /// `worker_count` hilos se estacionen, con cota `timeout`.
    ///
    /// Retorna `false` en timeout (el guardado se aborta y el checkpoint
    /// previo sigue siendo autoritativo); la solicitud queda limpia.
    #[must_use]
    pub fn quiesce_for_save(&self, worker_count: usize, timeout: Duration) -> bool {
        self.save_request.store(true, Ordering::Release);
        let deadline = Instant::now() + timeout;
        while self.parked_workers.load(Ordering::Acquire) < worker_count {
            if self.is_stopped() {
                break;
            }
            if Instant::now() >= deadline {
                if !self.is_stopped() {
                    warn!("⏱️ [SAVE_TIMEOUT]: workers did not park in time; previous checkpoint stands");
                }
                self.save_request.store(false, Ordering::Release);
                return false;
            }
            std::thread::sleep(PARK_POLL);
        }
        true
    }

    /// Libera a los trabajadores estacionados tras el guardado.
    pub fn release_after_save(&self) {
        self.save_request.store(false, Ordering::Release);
    }
}
