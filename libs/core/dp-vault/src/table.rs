// [libs/core/dp-vault/src/table.rs]
/*!
 * =================================================================
 * APARATO: SHARDED DP VAULT (V4.0 - ZENITH GOLD)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: ÍNDICE x → d CON SEMÁNTICA ADD-WITH-COLLISION
 *
 * # Mathematical Proof (Collision Funnel):
 * Cada shard mantiene sus registros ordenados por x_128 y sin pares
 * (x, d) duplicados. Un segundo registro con la misma X y distinta d
 * jamás se inserta: se entrega al resolutor como par (existente,
 * entrante), de modo que la bóveda conserva al primer testigo y toda
 * colisión es observable exactamente una vez.
 * =================================================================
 */

use crate::errors::VaultError;
use canguro_domain_models::HASH_SIZE;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tracing::error;

/// Paso fijo de crecimiento de capacidad de un shard.
const SHARD_GROWTH_STEP: usize = 4;

/// Registro de punto distinguido dentro de un shard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DpEntry {
    /// 128 bits bajos de la coordenada X.
    pub x_bits: u128,
    /// Delta empacado: bit 127 signo, bit 126 clase, 126 bits de magnitud.
    pub packed_delta: u128,
}

/// Un shard de la bóveda: vector ordenado por `x_bits` ascendente.
#[derive(Debug, Default, Clone)]
pub struct DpShard {
    /// Registros ordenados; el invariante se restablece en cada inserción.
    pub entries: Vec<DpEntry>,
}

/// Veredicto del protocolo de inserción (§ADD del diseño).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    /// X inédita: el registro quedó indexado.
    Added,
    /// Par (x, d) ya presente: el emisor debe re-sembrar su canguro.
    Duplicate,
    /// Misma X con distinta d: par para el resolutor; el entrante no se inserta.
    Collision(DpEntry),
}

impl DpShard {
    /// Inserción ordenada con semántica add-with-collision.
    pub fn insert(&mut self, x_bits: u128, packed_delta: u128) -> InsertOutcome {
        match self.entries.binary_search_by(|probe| probe.x_bits.cmp(&x_bits)) {
            Ok(position) => {
                let existing = self.entries[position];
                if existing.packed_delta == packed_delta {
                    InsertOutcome::Duplicate
                } else {
                    InsertOutcome::Collision(existing)
                }
            }
            Err(position) => {
                self.reserve_growth();
                self.entries.insert(position, DpEntry { x_bits, packed_delta });
                InsertOutcome::Added
            }
        }
    }

    /// Crecimiento geométrico: factor >= 4/3 en pasos múltiplos de 4.
    fn reserve_growth(&mut self) {
        if self.entries.len() == self.entries.capacity() {
            let extra = ((self.entries.capacity() / 3).max(SHARD_GROWTH_STEP) + 3) & !3;
            self.entries.reserve_exact(extra);
        }
    }

    /// Pre-dimensiona el shard para una carga conocida (restauración de respaldo).
    pub fn reserve_for_load(&mut self, expected: usize) {
        let missing = expected.saturating_sub(self.entries.capacity() - self.entries.len());
        if missing > 0 {
            self.entries.reserve_exact((missing + 3) & !3);
        }
    }
}

/// Bóveda completa: `HASH_SIZE` shards tras cerrojos de lectura/escritura.
///
/// El arreglo de shards es fijo durante la vida del proceso; las operaciones
/// trans-shard (reset, respaldo, fusión) exigen acceso exclusivo `&mut` o
/// que todos los caminantes estén estacionados.
pub struct DpVault {
    shards: Vec<RwLock<DpShard>>,
    total_entries: AtomicU64,
}

impl Default for DpVault {
    fn default() -> Self {
        Self::new()
    }
}

impl DpVault {
    /// Construye la bóveda vacía con su arreglo de shards definitivo.
    #[must_use]
    pub fn new() -> Self {
        let mut shards = Vec::with_capacity(HASH_SIZE as usize);
        for _ in 0..HASH_SIZE {
            shards.push(RwLock::new(DpShard::default()));
        }
        Self { shards, total_entries: AtomicU64::new(0) }
    }

    /// Inserción concurrente en el shard indicado.
    ///
    /// El cerrojo de escritura cubre la sección crítica completa: toda
    /// observación externa ve el shard ordenado.
    pub fn insert(&self, shard: u32, x_bits: u128, packed_delta: u128) -> InsertOutcome {
        let slot = (shard & (HASH_SIZE - 1)) as usize;
        match self.shards[slot].write() {
            Ok(mut guard) => {
                let outcome = guard.insert(x_bits, packed_delta);
                if outcome == InsertOutcome::Added {
                    self.total_entries.fetch_add(1, Ordering::Relaxed);
                }
                outcome
            }
            Err(poison) => {
                error!("💀 [LOCK_POISONED]: shard {} write failed: {}", slot, poison);
                InsertOutcome::Duplicate
            }
        }
    }

    /// Volumen total de registros indexados.
    #[must_use]
    pub fn total_entries(&self) -> u64 {
        self.total_entries.load(Ordering::Relaxed)
    }

    /// Acceso exclusivo a un shard (cargas y fusiones con propiedad única).
    pub fn shard_mut(&mut self, shard: u32) -> &mut DpShard {
        let slot = (shard & (HASH_SIZE - 1)) as usize;
        self.shards[slot]
            .get_mut()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Instantánea de un shard bajo cerrojo de lectura.
    #[must_use]
    pub fn snapshot_shard(&self, shard: u32) -> Vec<DpEntry> {
        let slot = (shard & (HASH_SIZE - 1)) as usize;
        match self.shards[slot].read() {
            Ok(guard) => guard.entries.clone(),
            Err(poison) => poison.into_inner().entries.clone(),
        }
    }

    /// Ocupación y capacidad actuales de un shard.
    #[must_use]
    pub fn shard_occupancy(&self, shard: u32) -> (usize, usize) {
        let slot = (shard & (HASH_SIZE - 1)) as usize;
        match self.shards[slot].read() {
            Ok(guard) => (guard.entries.len(), guard.entries.capacity()),
            Err(poison) => {
                let inner = poison.into_inner();
                (inner.entries.len(), inner.entries.capacity())
            }
        }
    }

    /// Re-sincroniza el contador global tras una carga con `shard_mut`.
    pub fn recount_entries(&mut self) -> u64 {
        let mut total = 0u64;
        for lock in &mut self.shards {
            let shard = lock
                .get_mut()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            total += shard.entries.len() as u64;
        }
        self.total_entries.store(total, Ordering::Relaxed);
        total
    }

    /// Vacía la bóveda adquiriendo cada cerrojo de escritura. Requiere que
    /// los caminantes estén estacionados (modo split tras un guardado).
    pub fn reset_shared(&self) {
        for lock in &self.shards {
            match lock.write() {
                Ok(mut shard) => shard.entries = Vec::new(),
                Err(poison) => poison.into_inner().entries = Vec::new(),
            }
        }
        self.total_entries.store(0, Ordering::Relaxed);
    }

    /// Vacía todos los shards y libera sus cuerpos dinámicos.
    pub fn reset(&mut self) {
        for lock in &mut self.shards {
            let shard = lock
                .get_mut()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            shard.entries = Vec::new();
        }
        self.total_entries.store(0, Ordering::Relaxed);
    }

    /// Vacía una ventana de shards (fusión por bloques).
    ///
    /// # Errors
    /// `ShardWindow` ante cotas fuera de [0, HASH_SIZE).
    pub fn reset_window(&mut self, start: u32, end: u32) -> Result<(), VaultError> {
        validate_window(start, end)?;
        let mut released = 0u64;
        for shard in start..end {
            let slot = self.shard_mut(shard);
            released += slot.entries.len() as u64;
            slot.entries = Vec::new();
        }
        self.total_entries.fetch_sub(released, Ordering::Relaxed);
        Ok(())
    }
}

/// Valida una ventana semiabierta [start, end) de shards.
pub(crate) fn validate_window(start: u32, end: u32) -> Result<(), VaultError> {
    if start > end || end > HASH_SIZE {
        return Err(VaultError::ShardWindow(format!(
            "window [{start}, {end}) outside [0, {HASH_SIZE})"
        )));
    }
    Ok(())
}
