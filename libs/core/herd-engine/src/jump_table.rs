// [libs/core/herd-engine/src/jump_table.rs]
/*!
 * =================================================================
 * APARATO: DETERMINISTIC JUMP TABLE (V4.0)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: MATRIZ DE SALTOS Δ_j / Δ_j·G SEMBRADA POR CLAVE
 *
 * # Mathematical Proof (Jump Magnitudes):
 * Las distancias se extraen uniformes de [1, 2^⌈rangePower/2⌉), con
 * media ≈ √W/2 y máximo < 2^(rangePower/2 + 2), el régimen óptimo del
 * método Lambda. El selector toma los bits de X por encima de la
 * máscara DP: los bits anulados por el filtro no aportan entropía.
 * =================================================================
 */

use crate::errors::EngineError;
use crate::geometry::SearchGeometry;
use canguro_core_math::{keys, AffinePoint, Scalar};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

/// Cantidad de entradas de la tabla de saltos. Potencia de dos: el selector es una máscara.
pub const NB_JUMP: usize = 32;

/// Entrada de la matriz: distancia escalar y su punto pre-computado.
#[derive(Debug, Clone)]
pub struct JumpEntry {
    /// Distancia Δ_j del salto.
    pub distance: Scalar,
    /// Punto Δ_j·G pre-computado.
    pub point: AffinePoint,
}

/// Tabla de saltos inmutable, compartida por todas las manadas de la misión.
#[derive(Debug, Clone)]
pub struct JumpTable {
    entries: Vec<JumpEntry>,
}

impl JumpTable {
    /// Construye la tabla determinista de la misión.
    ///
    /// El PRNG se siembra con los 32 bytes de `key.x`: dos procesos que
    /// persiguen la misma clave producen caminatas idénticas.
    ///
    /// # Errors
    /// Propaga fallos de derivación Δ·G.
    pub fn build(geometry: &SearchGeometry) -> Result<Self, EngineError> {
        let seed = geometry.target_key.x.to_be_bytes();
        let mut rng = StdRng::from_seed(seed);

        let jump_bits = (geometry.range_power / 2).max(1);
        let mut entries = Vec::with_capacity(NB_JUMP);
        for _ in 0..NB_JUMP {
            let distance = random_scalar_bits(&mut rng, jump_bits);
            let point = keys::base_multiply(&distance)?;
            entries.push(JumpEntry { distance, point });
        }

        debug!(
            "🦘 [JUMP_TABLE]: {} entries seeded from key.x [{} bit jumps]",
            NB_JUMP, jump_bits
        );
        Ok(Self { entries })
    }

    /// Selector de salto: bits de X por encima de la máscara DP, enmascarados.
    #[inline(always)]
    #[must_use]
    pub fn slot_for(x_low: u64, dp_size: u32) -> usize {
        ((x_low >> dp_size) as usize) & (NB_JUMP - 1)
    }

    /// Ranura alternativa del candado de simetría; nunca coincide con `slot`.
    #[inline(always)]
    #[must_use]
    pub fn alternate_slot(slot: usize) -> usize {
        (slot + NB_JUMP / 2) & (NB_JUMP - 1)
    }

    /// Entrada de la matriz por ranura.
    #[inline(always)]
    #[must_use]
    pub fn entry(&self, slot: usize) -> &JumpEntry {
        &self.entries[slot]
    }

    /// Cantidad de entradas materializadas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// La tabla jamás se construye vacía.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Escalar uniforme no nulo de `bits` bits.
pub(crate) fn random_scalar_bits(rng: &mut StdRng, bits: u32) -> Scalar {
    let clamped = bits.clamp(1, 255);
    let mut limbs = [0u64; 4];
    let full_limbs = (clamped / 64) as usize;
    for limb in limbs.iter_mut().take(full_limbs) {
        *limb = rng.gen();
    }
    let residual_bits = clamped % 64;
    if residual_bits > 0 {
        limbs[full_limbs] = rng.gen::<u64>() & ((1u64 << residual_bits) - 1);
    }
    let candidate = Scalar::from_limbs(limbs);
    if candidate.is_zero() { Scalar::ONE } else { candidate }
}
