// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: LAMBDA DOMAIN CONTRACTS HUB (V4.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATOS COMPARTIDOS ENTRE MOTOR, BÓVEDA Y CABLE
 * =================================================================
 */

/// Catálogo de fallos de los contratos de dominio.
pub mod errors;
/// Empaquetado bit-exacto de distancias DP en 128 bits (signo/clase/magnitud).
pub mod delta;
/// Registros de puntos distinguidos y ruteo de shards.
pub mod record;
/// Descriptores de misión y lectura del fichero de configuración.
pub mod search;

pub use delta::{pack_delta, unpack_delta, PackedDelta};
pub use errors::ModelError;
pub use record::{shard_index, KangarooCheckpoint, WireDistinguishedPoint, HASH_SIZE};
pub use search::{KangarooClass, SearchDescriptor};
