// [libs/core/dp-vault/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DP VAULT MASTER HUB (V4.0)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: ÍNDICE DP SHARDED, RESPALDO BINARIO Y FUSIÓN
 * =================================================================
 */

/// Catálogo de fallos de la bóveda (E/S, formato, curva).
pub mod errors;
/// Índice sharded concurrente de puntos distinguidos.
pub mod table;
/// Respaldo binario HEADW/HEADK: guardado, carga por ventanas y volcados.
pub mod backup;
/// Motor de fusión por pares y por directorio.
pub mod merge;

pub use errors::VaultError;
pub use table::{DpEntry, DpShard, DpVault, InsertOutcome};
pub use backup::{KangarooCheckpoint, WorkHeader, MAGIC_KANGAROO, MAGIC_WORK, WORK_FILE_VERSION};
pub use merge::{CollisionSink, MergeOutcome};
