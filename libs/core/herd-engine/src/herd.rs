// [libs/core/herd-engine/src/herd.rs]
/*!
 * =================================================================
 * APARATO: KANGAROO HERD ENGINE (V4.0 - BATCH INVERSE)
 * CLASIFICACIÓN: CORE ENGINE (ESTRATO L1)
 * RESPONSABILIDAD: AVANCE POR LOTES, EMISIÓN DP Y RE-SIEMBRA
 *
 * # Mathematical Proof (Batched Advance):
 * Una iteración avanza la manada completa con UNA inversión Fermat:
 * se acumulan los denominadores (J_x - P_x) de todas las cuerdas, el
 * truco de Montgomery los invierte en bloque y cada canguro completa
 * su adición afín con 2M + 1S. Un denominador nulo no envenena el
 * lote: el canguro degenerado se re-siembra antes de la inversión.
 *
 * Disciplina de propiedad: cada hilo trabajador posee su manada en
 * exclusiva; el único estado compartido del Hot-Loop es el sumidero
 * de puntos distinguidos y el coordinador.
 * =================================================================
 */

use crate::coordinator::SearchCoordinator;
use crate::errors::EngineError;
use crate::geometry::SearchGeometry;
use crate::jump_table::{random_scalar_bits, JumpTable};
use canguro_core_math::{keys, AffinePoint, FieldElement, Scalar};
use canguro_domain_models::{
    delta, shard_index, KangarooCheckpoint, KangarooClass,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

/// Reintentos de siembra antes de declarar agotamiento.
const SPAWN_RETRIES: usize = 16;

/// Veredicto del sumidero tras absorber un punto distinguido.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkVerdict {
    /// El registro quedó indexado; la caminata continúa.
    Continue,
    /// Par (x, d) duplicado: canguro muerto, re-sembrar.
    Reseed,
    /// La clave fue resuelta o el servidor ordenó terminar.
    Stop,
}

/// Sumidero de puntos distinguidos. Implementado por la bóveda local en la
/// búsqueda en proceso y por la cola de salida hacia el servidor en modo
/// cliente; el motor no conoce la diferencia.
pub trait DistinguishedPointSink {
    /// Absorbe un DP emitido por la manada.
    fn absorb(&self, x_bits: u128, shard: u32, packed_delta: u128) -> SinkVerdict;
}

/// Un canguro de la manada. La clase se deriva de la paridad del índice
/// (par = TAME, impar = WILD), convención que la reanudación preserva.
/// TAME: posición = d·G, d ∈ [0, W]. WILD: posición = Q + d·G, |d| ≤ W/2.
#[derive(Debug, Clone)]
struct Kangaroo {
    position: AffinePoint,
    distance: Scalar,
    last_slot: usize,
    flipped_last: bool,
}

/// Manada de canguros propiedad exclusiva de un trabajador.
pub struct Herd {
    kangaroos: Vec<Kangaroo>,
    scratch_dx: Vec<FieldElement>,
    scratch_field: Vec<FieldElement>,
    slots: Vec<usize>,
    degenerate: Vec<bool>,
    rng: StdRng,
}

impl Herd {
    /// Clase del canguro por paridad de su ordinal.
    #[inline(always)]
    #[must_use]
    pub fn class_of(ordinal: usize) -> KangarooClass {
        if ordinal % 2 == 0 { KangarooClass::Tame } else { KangarooClass::Wild }
    }

    /// Siembra una manada fresca de `size` canguros (mitades tame/wild).
    ///
    /// # Errors
    /// `SpawnExhaustion` si un canguro no logra sembrarse.
    pub fn spawn(geometry: &SearchGeometry, size: usize) -> Result<Self, EngineError> {
        let mut herd = Self::hollow(size);
        for ordinal in 0..size {
            let unit = herd.seed_kangaroo(geometry, Self::class_of(ordinal))?;
            herd.kangaroos.push(unit);
        }
        Ok(herd)
    }

    /// Reconstruye una manada desde estados serializados, completando con
    /// siembras frescas si el checkpoint trae menos caminantes.
    ///
    /// # Errors
    /// `SpawnExhaustion` si la compleción de la manada falla.
    pub fn from_checkpoints(
        geometry: &SearchGeometry,
        states: &[KangarooCheckpoint],
        size: usize,
    ) -> Result<Self, EngineError> {
        let mut herd = Self::hollow(size);
        for ordinal in 0..size {
            let unit = match states.get(ordinal) {
                Some(state) => Kangaroo {
                    position: AffinePoint::from_coordinates(
                        FieldElement::from_le_bytes(&state.px),
                        FieldElement::from_le_bytes(&state.py),
                    ),
                    distance: Scalar::from_le_bytes(&state.distance),
                    last_slot: 0,
                    flipped_last: false,
                },
                None => herd.seed_kangaroo(geometry, Self::class_of(ordinal))?,
            };
            herd.kangaroos.push(unit);
        }
        Ok(herd)
    }

    /// Instantánea serializable de la manada (protocolo de guardado).
    #[must_use]
    pub fn checkpoints(&self) -> Vec<KangarooCheckpoint> {
        self.kangaroos
            .iter()
            .map(|unit| KangarooCheckpoint {
                px: unit.position.x.to_le_bytes(),
                py: unit.position.y.to_le_bytes(),
                distance: unit.distance.to_le_bytes(),
            })
            .collect()
    }

    /// Tamaño de la manada.
    #[must_use]
    pub fn len(&self) -> usize {
        self.kangaroos.len()
    }

    /// Una manada operativa nunca es vacía.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kangaroos.is_empty()
    }

    /// Una iteración completa de la manada: selección de saltos, inversión
    /// por lote, adiciones afines, simetría opcional y emisión DP.
    ///
    /// Retorna `true` si el sumidero ordenó detener la búsqueda.
    ///
    /// # Errors
    /// Propaga fallos aritméticos y de re-siembra.
    pub fn advance(
        &mut self,
        geometry: &SearchGeometry,
        jumps: &JumpTable,
        sink: &dyn DistinguishedPointSink,
        coordinator: &SearchCoordinator,
    ) -> Result<bool, EngineError> {
        let size = self.kangaroos.len();

        // 1. SELECCIÓN DE SALTOS Y DENOMINADORES
        for index in 0..size {
            let unit = &self.kangaroos[index];
            let mut slot = JumpTable::slot_for(unit.position.x.low_u64(), geometry.dp_size);
            if geometry.use_symmetry && unit.flipped_last && slot == unit.last_slot {
                // Candado anti-ciclo: el salto que desharía la reflexión previa
                slot = JumpTable::alternate_slot(slot);
            }

            let jump_x = jumps.entry(slot).point.x;
            let dx = jump_x.subtract_modular(&self.kangaroos[index].position.x);
            if dx.is_zero() {
                // Cuerda degenerada: re-siembra inmediata, fuera del lote
                self.degenerate[index] = true;
                coordinator.record_same_herd();
                let fresh = self.seed_kangaroo(geometry, Self::class_of(index))?;
                self.kangaroos[index] = fresh;
                self.slots[index] = 0;
                self.scratch_dx[index] = FieldElement::ONE;
                continue;
            }

            self.degenerate[index] = false;
            self.slots[index] = slot;
            self.scratch_dx[index] = dx;
        }

        // 2. INVERSIÓN POR LOTE (una sola exponenciación Fermat)
        FieldElement::batch_invert_in_place(&mut self.scratch_dx, &mut self.scratch_field)?;

        // 3. ADICIÓN AFÍN Y AVANCE DE DISTANCIAS
        for index in 0..size {
            if self.degenerate[index] {
                continue;
            }
            let slot = self.slots[index];
            let dx_inverse = self.scratch_dx[index];
            let entry = jumps.entry(slot);
            let unit = &mut self.kangaroos[index];

            unit.position = unit.position.add_with_inverse(&entry.point, &dx_inverse);
            unit.distance = unit.distance.add_mod(&entry.distance);
            unit.last_slot = slot;
            unit.flipped_last = false;

            if geometry.use_symmetry {
                let (canonical, flipped) = unit.position.canonical_symmetric();
                if flipped {
                    unit.position = canonical;
                    unit.distance = unit.distance.negate_mod();
                    unit.flipped_last = true;
                }
            }
        }

        coordinator.record_operations(size as u64);

        // 4. EMISIÓN DE PUNTOS DISTINGUIDOS
        for index in 0..size {
            if self.degenerate[index] {
                continue;
            }
            let x_low = self.kangaroos[index].position.x.low_u64();
            if !geometry.is_dp(x_low) {
                continue;
            }

            let class = Self::class_of(index);
            let x_bits = self.kangaroos[index].position.x.low_u128();
            let shard = shard_index(x_bits, geometry.dp_size);
            let packed = pack_distance(&self.kangaroos[index].distance, class)?;

            match sink.absorb(x_bits, shard, packed) {
                SinkVerdict::Continue => {}
                SinkVerdict::Reseed => {
                    trace!("💀 [DEAD_KANGAROO]: reseeding {} walker {}", class.label(), index);
                    coordinator.record_same_herd();
                    let fresh = self.seed_kangaroo(geometry, class)?;
                    self.kangaroos[index] = fresh;
                }
                SinkVerdict::Stop => return Ok(true),
            }
        }

        Ok(false)
    }

    // --- SIEMBRA ---

    fn hollow(size: usize) -> Self {
        Self {
            kangaroos: Vec::with_capacity(size),
            scratch_dx: vec![FieldElement::ONE; size],
            scratch_field: Vec::with_capacity(size),
            slots: vec![0; size],
            degenerate: vec![false; size],
            rng: StdRng::from_entropy(),
        }
    }

    fn seed_kangaroo(
        &mut self,
        geometry: &SearchGeometry,
        class: KangarooClass,
    ) -> Result<Kangaroo, EngineError> {
        for _ in 0..SPAWN_RETRIES {
            let candidate = match class {
                KangarooClass::Tame => {
                    // Invariante TAME: posición = d·G con d ∈ [0, W] (espacio
                    // trasladado del rango). El ancla en el cero del grupo
                    // mantiene la magnitud empacable en 126 bits para rangos
                    // altos y hace exacta la negación de d bajo simetría.
                    let relative = self.random_below(&geometry.range_width);
                    if relative.is_zero() {
                        continue;
                    }
                    keys::base_multiply(&relative).map(|position| Kangaroo {
                        position,
                        distance: relative,
                        last_slot: 0,
                        flipped_last: false,
                    })
                }
                KangarooClass::Wild => {
                    // Invariante WILD: posición = Q + d·G, |d| <= W/2
                    let magnitude = self.random_below(&geometry.half_width);
                    let signed = if self.rng.gen::<bool>() {
                        magnitude.negate_mod()
                    } else {
                        magnitude
                    };
                    keys::offset_by(&geometry.wild_anchor, &signed).map(|position| Kangaroo {
                        position,
                        distance: signed,
                        last_slot: 0,
                        flipped_last: false,
                    })
                }
            };

            if let Ok(unit) = candidate {
                return Ok(unit);
            }
        }
        Err(EngineError::SpawnExhaustion(class.label()))
    }

    /// Escalar uniforme en [0, bound) por muestreo de rechazo sobre bits.
    fn random_below(&mut self, bound: &Scalar) -> Scalar {
        if *bound <= Scalar::ONE {
            return Scalar::ZERO;
        }
        let bits = bound.bit_length();
        loop {
            let candidate = random_scalar_bits(&mut self.rng, bits);
            if candidate < *bound {
                return candidate;
            }
        }
    }
}

/// Empaqueta una distancia modular en el delta de 128 bits de la bóveda.
///
/// # Errors
/// `Model(DeltaOverflow)` si la magnitud excede los 126 bits empacables.
pub fn pack_distance(distance: &Scalar, class: KangarooClass) -> Result<u128, EngineError> {
    let (magnitude, is_negative) = distance.magnitude_and_sign();
    let magnitude_bits = magnitude
        .to_u128()
        .filter(|value| value & !delta::DELTA_MAGNITUDE_MASK == 0)
        .ok_or(canguro_domain_models::ModelError::DeltaOverflow)?;
    Ok(delta::pack_delta(magnitude_bits, is_negative, class)?)
}

/// Desempaqueta un delta de la bóveda en (distancia modular, clase).
#[must_use]
pub fn unpack_distance(packed: u128) -> (Scalar, KangarooClass) {
    let (magnitude, is_negative, class) = delta::unpack_delta(packed);
    let distance = Scalar::from_magnitude(&Scalar::from_u128(magnitude), is_negative);
    (distance, class)
}
