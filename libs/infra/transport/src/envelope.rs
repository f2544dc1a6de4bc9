// [libs/infra/transport/src/envelope.rs]
/*!
 * =================================================================
 * APARATO: PROTOCOL ENVELOPES (V4.0)
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: SOBRES DEL PROTOCOLO DE COORDINACIÓN DP
 * =================================================================
 */

use canguro_domain_models::WireDistinguishedPoint;
use serde::{Deserialize, Serialize};

/// Versión del protocolo de coordinación. Un desfase es rechazo inmediato.
pub const PROTOCOL_VERSION: u32 = 1;

/// Sobres que circulan por el cable entre servidor y clientes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProtocolEnvelope {
    /// Presentación del cliente con su versión de protocolo.
    Hello {
        /// Versión del protocolo del cliente.
        version: u32,
        /// Etiqueta del nodo para el registro del servidor.
        worker_label: String,
    },
    /// Configuración canónica de la misión (servidor → cliente).
    Config {
        /// Bits de la máscara DP vigente.
        dp_size: u32,
        /// Cota inferior A, volcado Little-Endian.
        range_start: [u8; 32],
        /// Cota superior B, volcado Little-Endian.
        range_end: [u8; 32],
        /// Coordenada X de la clave objetivo, volcado Little-Endian.
        key_x: [u8; 32],
        /// Coordenada Y de la clave objetivo, volcado Little-Endian.
        key_y: [u8; 32],
    },
    /// Lote de puntos distinguidos (cliente → servidor). Idempotente:
    /// los duplicados se absorben en silencio al reenviar tras un fallo.
    DpBatch {
        /// Registros del lote.
        records: Vec<WireDistinguishedPoint>,
    },
    /// Estado de la búsqueda (servidor → cliente). También porta el rechazo
    /// de sesión: un desfase de versión o un handshake ilegal responden con
    /// un estado cuya `fault` está poblada, y la conexión se cierra.
    Status {
        /// La clave fue resuelta; los clientes deben terminar.
        found: bool,
        /// Operaciones de grupo acumuladas por el enjambre.
        total_count: u64,
        /// Clave privada recuperada (Big-Endian), si la hay.
        private_key: Option<[u8; 32]>,
        /// Falla de protocolo legible; su presencia termina la sesión.
        fault: Option<String>,
    },
    /// Despedida ordenada de cualquiera de los extremos.
    Bye,
}
