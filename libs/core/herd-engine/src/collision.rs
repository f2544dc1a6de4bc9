// [libs/core/herd-engine/src/collision.rs]
/*!
 * =================================================================
 * APARATO: COLLISION RESOLUTION ENGINE (V4.0 - FOURFOLD TRIAL)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: RECUPERACIÓN DE k DESDE PARES TAME/WILD
 *
 * # Mathematical Proof (Sign Ambiguity):
 * Posiciones colisionantes d_t·G = Q + d_w·G con Q = P - M·G entregan
 * k = d_t - d_w + M. La simetría (x, y) ≡ (x, -y) vuelve ambiguo el
 * signo de cada distancia almacenada (una reflexión niega el escalar
 * subyacente), por lo que se ensayan las cuatro asignaciones
 * (±d_t, ±d_w) y se acepta la primera certificada por el contexto
 * ajeno (k·G = P) dentro de [A, B].
 * =================================================================
 */

use crate::geometry::SearchGeometry;
use crate::herd::unpack_distance;
use canguro_core_math::{keys, Scalar};
use canguro_domain_models::KangarooClass;
use tracing::debug;

/// Las cuatro asignaciones de signo (negar_tame, negar_wild).
const SIGN_TRIALS: [(bool, bool); 4] =
    [(false, false), (false, true), (true, false), (true, true)];

/// Intenta recuperar la clave privada desde un par colisionante de deltas
/// empacados. Retorna `None` ante pares de la misma clase (evento de manada
/// propia) o cuando ningún ensayo certifica: el llamador re-siembra y sigue.
#[must_use]
pub fn resolve_collision(
    geometry: &SearchGeometry,
    existing_delta: u128,
    incoming_delta: u128,
) -> Option<Scalar> {
    let (first_distance, first_class) = unpack_distance(existing_delta);
    let (second_distance, second_class) = unpack_distance(incoming_delta);

    if first_class == second_class {
        return None;
    }

    let (tame_distance, wild_distance) = if first_class == KangarooClass::Tame {
        (first_distance, second_distance)
    } else {
        (second_distance, first_distance)
    };

    for (negate_tame, negate_wild) in SIGN_TRIALS {
        let tame = if negate_tame { tame_distance.negate_mod() } else { tame_distance };
        let wild = if negate_wild { wild_distance.negate_mod() } else { wild_distance };

        let candidate = tame.sub_mod(&wild).add_mod(&geometry.midpoint);
        if candidate < geometry.range_start || candidate > geometry.range_end {
            continue;
        }
        if keys::verify_candidate(&candidate, &geometry.target_key) {
            return Some(candidate);
        }
    }

    debug!("🫥 [FALSE_COLLISION]: fourfold trial exhausted without certification");
    None
}
