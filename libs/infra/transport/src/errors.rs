// [libs/infra/transport/src/errors.rs]
//! =================================================================
//! APARATO: TRANSPORT ERRORS (V4.0)
//! RESPONSABILIDAD: CATALOGACIÓN DE FALLOS DE CABLE Y CODEC
//! =================================================================

use thiserror::Error;

/// Fallos del estrato de transporte. Los transitorios de socket se
/// reintentan con retroceso en el cliente; el resto cierra la sesión.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Fallo físico del socket (conexión, lectura, escritura).
    #[error("SOCKET_FAULT: {0}")]
    Io(#[from] std::io::Error),

    /// Sobre ilegible o corrupto en el cuerpo de la trama.
    #[error("ENVELOPE_CORRUPTION: {0}")]
    Codec(#[from] bincode::Error),

    /// Trama que excede el límite duro de 10MB.
    #[error("FRAME_OVERSIZE: declared {declared} bytes exceeds cap {cap}")]
    FrameOversize {
        /// Longitud declarada en el prefijo.
        declared: u32,
        /// Límite configurado del codec.
        cap: u32,
    },

    /// El interlocutor habla otra versión del protocolo.
    #[error("PROTOCOL_SKEW: peer version {peer} vs local {local}")]
    VersionSkew {
        /// Versión anunciada por el interlocutor.
        peer: u32,
        /// Versión local del protocolo.
        local: u32,
    },

    /// La sesión terminó antes de completar el intercambio esperado.
    #[error("SESSION_COLLAPSE: {0}")]
    SessionCollapse(String),
}
