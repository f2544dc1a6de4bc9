// [apps/solver-node/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SOLVER NODE LIBRARY HUB (V4.0)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN DE LOS MOTORES DEL NODO AL SHELL Y
 * AL PROVING GROUNDS
 * =================================================================
 */

/// Superficie CLI del nodo.
pub mod cli;
/// Puente descriptor ↔ geometría ↔ cabecera.
pub mod mission;
/// Pool de caminantes y orquestación de la búsqueda local.
pub mod local_search;
/// Servidor de coordinación del enjambre.
pub mod server;
/// Cliente de enjambre con enlace resiliente.
pub mod client;
/// Fusión, inspección y exportación de artefactos.
pub mod tools;
