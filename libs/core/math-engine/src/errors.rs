// [libs/core/math-engine/src/errors.rs]
//! =================================================================
//! APARATO: MATH ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS ARITMÉTICOS Y DE CURVA
//! =================================================================

use thiserror::Error;

/// Catálogo soberano de fallos del estrato matemático L1.
#[derive(Error, Debug)]
pub enum MathError {
    /// Inversión modular de cero (denominador nulo en la ley de grupo).
    #[error("DIV_ZERO_COLLAPSE: modular inverse of zero requested")]
    ZeroInversion,

    /// El lote de inversión contiene un denominador nulo en la posición indicada.
    #[error("BATCH_INV_ZERO_COLLAPSE: zero denominator at batch slot {0}")]
    BatchZeroDenominator(usize),

    /// La coordenada X no posee raíz cuadrada en Fp (clave comprimida corrupta).
    #[error("QUADRATIC_NON_RESIDUE: x-coordinate has no square root in Fp")]
    NonResidue,

    /// El punto no satisface y^2 = x^3 + 7.
    #[error("OFF_CURVE_POINT: coordinates do not satisfy the secp256k1 equation")]
    OffCurve,

    /// Adición de un punto con su inverso (resultado en el infinito).
    #[error("POINT_AT_INFINITY: group operation collapsed to the identity")]
    PointAtInfinity,

    /// Escalar nulo o fuera del rango [1, n-1].
    #[error("SCALAR_COLLAPSE: scalar is zero or a multiple of the curve order")]
    InvalidScalar,

    /// Material de clave pública sintácticamente inválido.
    #[error("KEY_FORMAT_FAULT: {0}")]
    KeyFormat(String),

    /// Rechazo del contexto secp256k1 de respaldo.
    #[error("CONTEXT_REJECTION: {0}")]
    ContextRejection(#[from] secp256k1::Error),
}
