// [libs/domain/models/src/delta.rs]
/*!
 * =================================================================
 * APARATO: PACKED DELTA CODEC (V4.0 - BIT PERFECT)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: EMPAQUETADO DE DISTANCIAS DP EN 128 BITS
 *
 * # Mathematical Proof (Artifact Compatibility):
 * El layout es bit-exacto con los ficheros de trabajo históricos:
 * bit 127 (bit 63 de la palabra alta) porta el signo, bit 126 porta la
 * clase del canguro (0 = TAME, 1 = WILD) y los 126 bits restantes la
 * magnitud de la distancia. Cualquier desviación rompería la fusión
 * con artefactos ya existentes en disco.
 * =================================================================
 */

use crate::errors::ModelError;
use crate::search::KangarooClass;

/// Bit de signo del delta empacado (distancia negativa módulo n).
pub const DELTA_SIGN_BIT: u128 = 1 << 127;
/// Bit de clase del delta empacado (0 = TAME, 1 = WILD).
pub const DELTA_CLASS_BIT: u128 = 1 << 126;
/// Máscara de la magnitud de 126 bits.
pub const DELTA_MAGNITUDE_MASK: u128 = (1 << 126) - 1;

/// Delta de distancia ya empacado, listo para la bóveda o el cable.
pub type PackedDelta = u128;

/// Empaqueta (magnitud, signo, clase) en el delta de 128 bits.
///
/// # Errors
/// `DeltaOverflow` si la magnitud no cabe en 126 bits.
pub fn pack_delta(
    magnitude: u128,
    is_negative: bool,
    class: KangarooClass,
) -> Result<PackedDelta, ModelError> {
    if magnitude & !DELTA_MAGNITUDE_MASK != 0 {
        return Err(ModelError::DeltaOverflow);
    }
    let mut packed = magnitude;
    if is_negative {
        packed |= DELTA_SIGN_BIT;
    }
    if class == KangarooClass::Wild {
        packed |= DELTA_CLASS_BIT;
    }
    Ok(packed)
}

/// Desempaqueta el delta en (magnitud, es_negativa, clase).
#[must_use]
pub fn unpack_delta(packed: PackedDelta) -> (u128, bool, KangarooClass) {
    let magnitude = packed & DELTA_MAGNITUDE_MASK;
    let is_negative = packed & DELTA_SIGN_BIT != 0;
    let class = if packed & DELTA_CLASS_BIT != 0 {
        KangarooClass::Wild
    } else {
        KangarooClass::Tame
    };
    (magnitude, is_negative, class)
}
