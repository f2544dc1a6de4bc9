// [libs/domain/models/src/errors.rs]
//! =================================================================
//! APARATO: DOMAIN MODEL ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE CONTRATOS
//! =================================================================

use thiserror::Error;

/// Fallos de lectura o interpretación de los contratos de misión.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Acceso al fichero de configuración denegado o inexistente.
    #[error("CONFIG_IO_FAULT: {0}")]
    Io(#[from] std::io::Error),

    /// El fichero de configuración no respeta el formato de dos líneas.
    #[error("CONFIG_FORMAT_FAULT: {0}")]
    Format(String),

    /// Magnitud de distancia que excede los 126 bits empacables.
    #[error("DELTA_OVERFLOW: distance magnitude exceeds 126 bits")]
    DeltaOverflow,
}
