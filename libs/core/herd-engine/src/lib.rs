// [libs/core/herd-engine/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HERD ENGINE MASTER HUB (V4.0)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: EVOLUCIÓN DE MANADAS Y RESOLUCIÓN DE COLISIONES
 * =================================================================
 */

/// Catálogo de fallos del motor de manadas.
pub mod errors;
/// Geometría de la misión: rango, punto medio, ancla salvaje y filtro DP.
pub mod geometry;
/// Tabla de saltos determinista sembrada desde la clave objetivo.
pub mod jump_table;
/// Coordinador de búsqueda: señales de paro, guardado y contadores.
pub mod coordinator;
/// Manada de canguros con avance por inversión de lote.
pub mod herd;
/// Resolutor de colisiones tame/wild con certificación ajena.
pub mod collision;

pub use collision::resolve_collision;
pub use coordinator::SearchCoordinator;
pub use errors::EngineError;
pub use geometry::{auto_dp_size, SearchGeometry};
pub use herd::{DistinguishedPointSink, Herd, SinkVerdict};
pub use jump_table::{JumpTable, NB_JUMP};
