// [libs/infra/transport/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DP TRANSPORT HUB (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SOBRES DE PROTOCOLO Y TRAMAS CON PREFIJO
 * =================================================================
 */

/// Catálogo de fallos de transporte.
pub mod errors;
/// Sobres del protocolo de coordinación servidor/cliente.
pub mod envelope;
/// Codec de tramas: prefijo de longitud u32 + cuerpo Bincode.
pub mod framing;

pub use envelope::{ProtocolEnvelope, PROTOCOL_VERSION};
pub use errors::TransportError;
pub use framing::{read_envelope, write_envelope, MAX_FRAME_BYTES};
