// [libs/core/herd-engine/src/geometry.rs]
/*!
 * =================================================================
 * APARATO: MISSION GEOMETRY (V4.0 - MIDPOINT OFFSET)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: GEOMETRÍA DEL RANGO, ANCLA SALVAJE Y FILTRO DP
 *
 * # Mathematical Proof (Midpoint Translation):
 * Con M = (A+B)/2 y Q = P - M·G, la manada salvaje camina una
 * distancia con signo alrededor de cero: Q + d·G = (k - M + d)·G.
 * El tame camina el espacio trasladado d·G con d ∈ [0, W], así que
 * una colisión d_t·G = Q + d_w·G entrega k = d_t - d_w + M, la
 * fórmula del resolutor.
 * =================================================================
 */

use crate::errors::EngineError;
use canguro_core_math::{keys, AffinePoint, Scalar};

/// Cota superior del tamaño DP auto-seleccionado.
const MAX_AUTO_DP: f64 = 24.0;

/// Geometría inmutable de la misión, compartida por manadas y resolutor.
#[derive(Debug, Clone)]
pub struct SearchGeometry {
    /// Cota inferior A del rango.
    pub range_start: Scalar,
    /// Cota superior B del rango.
    pub range_end: Scalar,
    /// Ancho W = B - A.
    pub range_width: Scalar,
    /// Mitad del ancho, cota de las distancias salvajes.
    pub half_width: Scalar,
    /// Punto medio M = (A+B)/2 del rango.
    pub midpoint: Scalar,
    /// Bits significativos del ancho (potencia del rango).
    pub range_power: u32,
    /// Clave pública objetivo P.
    pub target_key: AffinePoint,
    /// Ancla salvaje Q = P - M·G.
    pub wild_anchor: AffinePoint,
    /// Bits de la máscara de puntos distinguidos.
    pub dp_size: u32,
    /// Máscara DP materializada: (1 << dp_size) - 1.
    pub dp_mask: u64,
    /// Explotación de la simetría (x, y) ≡ (x, -y).
    pub use_symmetry: bool,
}

impl SearchGeometry {
    /// Construye la geometría de la misión y deriva el ancla salvaje.
    ///
    /// # Errors
    /// `EmptyRange` si B < A; propaga fallos de derivación de puntos.
    pub fn build(
        range_start: Scalar,
        range_end: Scalar,
        target_key: AffinePoint,
        dp_size: u32,
        use_symmetry: bool,
    ) -> Result<Self, EngineError> {
        if range_end < range_start {
            return Err(EngineError::EmptyRange);
        }
        // La máscara vive en los 64 bits bajos de X; un DP mayor detendría
        // la emisión por completo.
        let dp_size = dp_size.min(56);
        let range_width = range_end.sub_mod(&range_start);
        let half_width = range_width.half_floor();
        let midpoint = range_start.average_floor(&range_end);
        let range_power = range_width.bit_length().max(1);
        let wild_anchor = keys::offset_by(&target_key, &midpoint.negate_mod())?;

        Ok(Self {
            range_start,
            range_end,
            range_width,
            half_width,
            midpoint,
            range_power,
            target_key,
            wild_anchor,
            dp_size,
            dp_mask: if dp_size == 0 { 0 } else { (1u64 << dp_size) - 1 },
            use_symmetry,
        })
    }

    /// Predicado de punto distinguido sobre los bits bajos de X.
    #[inline(always)]
    #[must_use]
    pub fn is_dp(&self, x_low: u64) -> bool {
        x_low & self.dp_mask == 0
    }

    /// Operaciones de grupo esperadas hasta la colisión (constante C ≈ 2.08),
    /// más el sobrecoste DP proporcional a la manada total.
    #[must_use]
    pub fn expected_operations(&self, total_kangaroos: u64) -> f64 {
        let width = scalar_to_f64(&self.range_width).max(1.0);
        let effective = if self.use_symmetry { width / 2.0 } else { width };
        2.08 * effective.sqrt() + (2f64).powi(self.dp_size as i32) * total_kangaroos as f64
    }
}

/// Selección automática del tamaño DP a partir del rango y la manada total.
///
/// Recorta el sobrecoste de caminata entre DPs al presupuesto de colisión:
/// dp = ⌊rangePower/2 - log2(totalKangaroos) - 2⌋, acotado a [0, 24].
#[must_use]
pub fn auto_dp_size(range_power: u32, total_kangaroos: u64) -> u32 {
    let suggested = f64::from(range_power) / 2.0
        - (total_kangaroos.max(1) as f64).log2()
        - 2.0;
    suggested.clamp(0.0, MAX_AUTO_DP) as u32
}

/// Proyección aproximada de un escalar a coma flotante (reportes y esperanzas).
#[must_use]
pub fn scalar_to_f64(value: &Scalar) -> f64 {
    let mut accumulated = 0f64;
    for (index, &limb) in value.limbs.iter().enumerate() {
        accumulated += (limb as f64) * (2f64).powi(64 * index as i32);
    }
    accumulated
}
