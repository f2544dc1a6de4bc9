// [tests/mirror/libs/domain/models/delta_packing_integrity.test.rs]
/**
 * =================================================================
 * APARATO: DELTA PACKING CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-DOMAIN
 * RESPONSABILIDAD: PARIDAD BINARIA DEL DELTA DE 128 BITS
 * =================================================================
 */

use canguro_domain_models::delta::{
    pack_delta, unpack_delta, DELTA_CLASS_BIT, DELTA_MAGNITUDE_MASK, DELTA_SIGN_BIT,
};
use canguro_domain_models::{shard_index, KangarooClass, ModelError, HASH_SIZE};

#[test]
fn certify_bit_layout_is_exact() {
    // Paridad con los artefactos históricos: bit 127 signo, bit 126 clase
    assert_eq!(DELTA_SIGN_BIT, 1u128 << 127);
    assert_eq!(DELTA_CLASS_BIT, 1u128 << 126);
    assert_eq!(DELTA_MAGNITUDE_MASK, (1u128 << 126) - 1);

    let packed = pack_delta(5, true, KangarooClass::Wild).expect("pack");
    assert_eq!(packed, (1u128 << 127) | (1u128 << 126) | 5);

    let tame_positive = pack_delta(0xABCD, false, KangarooClass::Tame).expect("pack");
    assert_eq!(tame_positive, 0xABCD);
}

#[test]
fn certify_round_trips() {
    let cases = [
        (0u128, false, KangarooClass::Tame),
        (1, true, KangarooClass::Tame),
        (DELTA_MAGNITUDE_MASK, false, KangarooClass::Wild),
        (0xFFFF_FFFF_FFFF_FFFF, true, KangarooClass::Wild),
    ];
    for (magnitude, negative, class) in cases {
        let packed = pack_delta(magnitude, negative, class).expect("pack");
        assert_eq!(unpack_delta(packed), (magnitude, negative, class));
    }
}

#[test]
fn certify_overflow_rejection() {
    // Una magnitud que pisa el bit de clase jamás se empaqueta
    let oversized = DELTA_MAGNITUDE_MASK + 1;
    assert!(matches!(
        pack_delta(oversized, false, KangarooClass::Tame),
        Err(ModelError::DeltaOverflow)
    ));
}

#[test]
fn certify_shard_routing() {
    // El ruteo descarta los bits DP y enmascara a HASH_SIZE
    let x_bits: u128 = 0b1010_1100_0000;
    assert_eq!(shard_index(x_bits, 6), 0b10_1011);
    assert_eq!(shard_index(x_bits, 0), (x_bits as u32) & (HASH_SIZE - 1));
    assert!(shard_index(u128::MAX, 10) < HASH_SIZE);
}
