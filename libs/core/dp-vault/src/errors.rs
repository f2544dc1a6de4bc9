// [libs/core/dp-vault/src/errors.rs]
//! =================================================================
//! APARATO: VAULT ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE BÓVEDA Y RESPALDO
//! =================================================================

use thiserror::Error;

/// Fallos de la bóveda DP. La política del sistema es que un fallo de carga
/// o formato es fatal para la operación pero no para el programa.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Acceso físico al artefacto denegado (apertura, lectura, escritura, seek).
    #[error("VAULT_IO_FAULT: {0}")]
    Io(#[from] std::io::Error),

    /// Cabecera con número mágico ajeno al tipo solicitado.
    #[error("MAGIC_REJECTION: found {found:#010x} ({found_kind}), expected {expected:#010x} ({expected_kind})")]
    MagicMismatch {
        /// Magia encontrada en el fichero.
        found: u32,
        /// Descripción humana de la magia encontrada.
        found_kind: &'static str,
        /// Magia que la operación exigía.
        expected: u32,
        /// Descripción humana de la magia exigida.
        expected_kind: &'static str,
    },

    /// Registro o cabecera truncados antes de completar la estructura.
    #[error("FORMAT_TRUNCATION: {0}")]
    Truncated(String),

    /// Los ficheros a fusionar difieren en versión de formato.
    #[error("VERSION_SKEW: file version {left} vs {right}")]
    VersionMismatch {
        /// Versión del primer artefacto.
        left: u32,
        /// Versión del segundo artefacto.
        right: u32,
    },

    /// Los ficheros a fusionar difieren en rango o clave objetivo.
    #[error("HEADER_DIVERGENCE: {0}")]
    HeaderMismatch(String),

    /// La clave de la cabecera no reside en la curva secp256k1.
    #[error("CURVE_REJECTION: {0}")]
    Curve(#[from] canguro_core_math::MathError),

    /// Ventana de shards fuera de [0, HASH_SIZE).
    #[error("SHARD_WINDOW_FAULT: {0}")]
    ShardWindow(String),
}

impl VaultError {
    /// Clasifica el número mágico para los diagnósticos de rechazo.
    #[must_use]
    pub fn describe_magic(magic: u32) -> &'static str {
        match magic {
            crate::backup::MAGIC_WORK => "full work file (HEADW)",
            crate::backup::MAGIC_KANGAROO => "kangaroo only file (HEADK)",
            _ => "not a work file",
        }
    }
}
