// [libs/domain/models/src/record.rs]
/*!
 * =================================================================
 * APARATO: DISTINGUISHED POINT RECORDS (V4.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: RUTEO DE SHARDS Y CONTRATO DP DE CABLE
 * =================================================================
 */

use serde::{Deserialize, Serialize};

/// Cantidad de shards de la bóveda DP. Potencia de dos fija para el proceso.
pub const HASH_SIZE: u32 = 1 << 18;

/// Índice de shard determinista: bits de X por encima de la máscara DP.
///
/// El corrimiento excluye los bits anulados por el predicado DP, evitando
/// que todos los registros colapsen en el shard cero.
#[inline(always)]
#[must_use]
pub fn shard_index(x_bits: u128, dp_size: u32) -> u32 {
    ((x_bits >> dp_size) as u32) & (HASH_SIZE - 1)
}

/// Estado serializado de un caminante para reanudación (volcados Little-Endian).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KangarooCheckpoint {
    /// Coordenada X de la posición.
    pub px: [u8; 32],
    /// Coordenada Y de la posición.
    pub py: [u8; 32],
    /// Distancia recorrida (representante módulo n).
    pub distance: [u8; 32],
}

/// Punto distinguido tal como viaja del cliente al servidor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDistinguishedPoint {
    /// Índice de la clave bajo búsqueda (reservado; una sola clave por sesión).
    pub kangaroo_index: u32,
    /// Shard de destino pre-computado por el emisor.
    pub shard: u32,
    /// 128 bits bajos de la coordenada X.
    pub x_bits: u128,
    /// Delta empacado (signo/clase/magnitud).
    pub packed_delta: u128,
}
