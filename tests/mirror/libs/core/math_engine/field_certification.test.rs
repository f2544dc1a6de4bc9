// [tests/mirror/libs/core/math_engine/field_certification.test.rs]
/**
 * =================================================================
 * APARATO: FIELD CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CORE
 * RESPONSABILIDAD: IDENTIDADES DEL CUERPO Fp Y PLEGADO SOLINAS
 * =================================================================
 */

use canguro_core_math::field::{FieldElement, FIELD_PRIME};

fn sample_element() -> FieldElement {
    let mut bytes = [0u8; 32];
    for (index, byte) in bytes.iter_mut().enumerate() {
        *byte = (index as u8).wrapping_mul(37).wrapping_add(11);
    }
    bytes[0] = 0x3A; // garantiza valor < p
    FieldElement::from_be_bytes(&bytes)
}

#[test]
fn certify_additive_identities() {
    let alpha = sample_element();
    assert_eq!(alpha.add_modular(&FieldElement::ZERO), alpha);
    assert_eq!(alpha.subtract_modular(&alpha), FieldElement::ZERO);
    assert_eq!(alpha.add_modular(&alpha.negate_modular()), FieldElement::ZERO);
    assert_eq!(FieldElement::ZERO.negate_modular(), FieldElement::ZERO);
}

#[test]
fn certify_multiplicative_identities() {
    let alpha = sample_element();
    let beta = FieldElement::from_u64(0xDEAD_BEEF);
    let gamma = FieldElement::from_u64(0x1234_5678_9ABC_DEF1);

    assert_eq!(alpha.multiply_modular(&FieldElement::ONE), alpha);
    assert_eq!(
        alpha.multiply_modular(&beta),
        beta.multiply_modular(&alpha),
        "conmutatividad"
    );
    assert_eq!(
        alpha.multiply_modular(&beta).multiply_modular(&gamma),
        alpha.multiply_modular(&beta.multiply_modular(&gamma)),
        "asociatividad"
    );
    // Distributividad: a(b + c) = ab + ac
    assert_eq!(
        alpha.multiply_modular(&beta.add_modular(&gamma)),
        alpha.multiply_modular(&beta).add_modular(&alpha.multiply_modular(&gamma))
    );
}

#[test]
fn certify_solinas_fold_constant() {
    // (2^128)^2 = 2^256 ≡ 0x1000003D1 (mod p)
    let two_pow_128 = FieldElement::from_words([0, 0, 1, 0]);
    let folded = two_pow_128.square_modular();
    assert_eq!(folded, FieldElement::from_words([0x1_0000_03D1, 0, 0, 0]));

    // (p - 1)^2 = 1: el mayor residuo del cuerpo es involutivo al cuadrado
    let mut minus_one_words = FIELD_PRIME;
    minus_one_words[0] -= 1;
    let minus_one = FieldElement::from_words(minus_one_words);
    assert_eq!(minus_one.square_modular(), FieldElement::ONE);
}

#[test]
fn certify_fermat_inversion() {
    let alpha = sample_element();
    let inverse = alpha.invert().expect("sample is nonzero");
    assert_eq!(alpha.multiply_modular(&inverse), FieldElement::ONE);

    assert!(FieldElement::ZERO.invert().is_err());
}

#[test]
fn certify_batch_inversion_against_individual() {
    let mut batch = vec![
        sample_element(),
        FieldElement::from_u64(2),
        FieldElement::from_u64(0xFFFF_FFFF_FFFF_FFFF),
        sample_element().square_modular(),
    ];
    let reference: Vec<FieldElement> = batch
        .iter()
        .map(|element| element.invert().expect("nonzero"))
        .collect();

    let mut scratch = Vec::new();
    FieldElement::batch_invert_in_place(&mut batch, &mut scratch).expect("no zero denominators");
    assert_eq!(batch, reference);
}

#[test]
fn certify_batch_inversion_rejects_zero() {
    let mut batch = vec![FieldElement::ONE, FieldElement::ZERO, FieldElement::from_u64(3)];
    let pristine = batch.clone();
    let mut scratch = Vec::new();
    assert!(FieldElement::batch_invert_in_place(&mut batch, &mut scratch).is_err());
    assert_eq!(batch, pristine, "un lote rechazado no debe mutar");
}

#[test]
fn certify_square_root() {
    let alpha = sample_element();
    let square = alpha.square_modular();
    let root = square.sqrt().expect("squares are residues");
    assert_eq!(root.square_modular(), square);
}

#[test]
fn certify_byte_round_trips() {
    let alpha = sample_element();
    assert_eq!(FieldElement::from_be_bytes(&alpha.to_be_bytes()), alpha);
    assert_eq!(FieldElement::from_le_bytes(&alpha.to_le_bytes()), alpha);

    // Los volcados BE y LE del mismo valor son reflejos exactos
    let mut mirrored = alpha.to_be_bytes();
    mirrored.reverse();
    assert_eq!(mirrored, alpha.to_le_bytes());
}
