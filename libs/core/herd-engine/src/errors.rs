// [libs/core/herd-engine/src/errors.rs]
//! =================================================================
//! APARATO: HERD ENGINE ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DEL MOTOR DE MANADAS
//! =================================================================

use thiserror::Error;

/// Fallos del motor de manadas y de la geometría de misión.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Fallo aritmético o geométrico del estrato matemático.
    #[error("MATH_STRATA_FAULT: {0}")]
    Math(#[from] canguro_core_math::MathError),

    /// Contrato de dominio violado (empaquetado de deltas, descriptores).
    #[error("CONTRACT_FAULT: {0}")]
    Model(#[from] canguro_domain_models::ModelError),

    /// El rango de misión es vacío o invertido (B < A).
    #[error("RANGE_COLLAPSE: range end precedes range start")]
    EmptyRange,

    /// Un canguro no pudo sembrarse tras agotar los reintentos.
    #[error("SPAWN_EXHAUSTION: unable to seed a {0} kangaroo")]
    SpawnExhaustion(&'static str),
}
