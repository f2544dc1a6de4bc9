// [tests/mirror/libs/core/math_engine/group_law_certification.test.rs]
/**
 * =================================================================
 * APARATO: GROUP LAW CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CORE
 * RESPONSABILIDAD: LEY DE GRUPO AFÍN CONTRA EL CONTEXTO AJENO
 *
 * La estrategia es el careo de estratos: cada operación del cuerpo
 * artesanal se contrasta con la derivación k·G del contexto
 * secp256k1, de modo que un defecto en cualquiera de los dos delata
 * al otro.
 * =================================================================
 */

use canguro_core_math::{keys, AffinePoint, MathError, Scalar};

/// Forma comprimida canónica del generador G de secp256k1.
const GENERATOR_COMPRESSED_HEX: &str =
    "0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";

#[test]
fn certify_generator_parsing() {
    let parsed = keys::parse_public_key_hex(GENERATOR_COMPRESSED_HEX).expect("canonical G");
    let derived = keys::base_multiply(&Scalar::ONE).expect("1·G");
    assert_eq!(parsed, derived);
    assert!(parsed.is_on_curve());
}

#[test]
fn certify_doubling_against_context() {
    let g = keys::base_multiply(&Scalar::ONE).expect("G");
    let doubled = g.double().expect("2G");
    let derived = keys::base_multiply(&Scalar::from_u64(2)).expect("2·G");
    assert_eq!(doubled, derived);
    assert!(doubled.is_on_curve());
}

#[test]
fn certify_chord_addition_against_context() {
    let g = keys::base_multiply(&Scalar::ONE).expect("G");
    let g2 = keys::base_multiply(&Scalar::from_u64(2)).expect("2G");
    let g3 = keys::base_multiply(&Scalar::from_u64(3)).expect("3G");

    assert_eq!(g.add(&g2).expect("G + 2G"), g3);

    // La variante del Hot-Loop con inverso pre-computado debe coincidir
    let dx = g2.x.subtract_modular(&g.x);
    let dx_inverse = dx.invert().expect("distinct abscissae");
    assert_eq!(g.add_with_inverse(&g2, &dx_inverse), g3);
}

#[test]
fn certify_larger_scalar_chain() {
    // 1000·G + 337·G = 1337·G, cruzando ambos estratos aritméticos
    let left = keys::base_multiply(&Scalar::from_u64(1000)).expect("1000G");
    let right = keys::base_multiply(&Scalar::from_u64(337)).expect("337G");
    let expected = keys::base_multiply(&Scalar::from_u64(1337)).expect("1337G");
    assert_eq!(left.add(&right).expect("suma"), expected);
    assert_eq!(keys::combine(&left, &right).expect("combine"), expected);
}

#[test]
fn certify_negation_and_infinity() {
    let g = keys::base_multiply(&Scalar::ONE).expect("G");
    let negated = g.negate();
    assert!(negated.is_on_curve());
    assert!(matches!(g.add(&negated), Err(MathError::PointAtInfinity)));
}

#[test]
fn certify_symmetric_canonicalization() {
    let point = keys::base_multiply(&Scalar::from_u64(97)).expect("97G");
    let (canonical, _flipped) = point.canonical_symmetric();
    assert!(canonical.is_on_curve());
    assert!(canonical.y <= canonical.y.negate_modular());

    // La canónica es un punto fijo de la canonicalización
    let (again, flipped_again) = canonical.canonical_symmetric();
    assert_eq!(again, canonical);
    assert!(!flipped_again);
}

#[test]
fn certify_offset_and_verification() {
    // P = 500·G; P + 44·G = 544·G
    let p = keys::base_multiply(&Scalar::from_u64(500)).expect("500G");
    let shifted = keys::offset_by(&p, &Scalar::from_u64(44)).expect("offset");
    assert_eq!(shifted, keys::base_multiply(&Scalar::from_u64(544)).expect("544G"));

    // Desplazamiento negativo módulo n: P - 100·G = 400·G
    let back = keys::offset_by(&p, &Scalar::from_u64(100).negate_mod()).expect("offset back");
    assert_eq!(back, keys::base_multiply(&Scalar::from_u64(400)).expect("400G"));

    assert!(keys::verify_candidate(&Scalar::from_u64(500), &p));
    assert!(!keys::verify_candidate(&Scalar::from_u64(501), &p));
}

#[test]
fn certify_uncompressed_round_trip() {
    let point = keys::base_multiply(&Scalar::from_u64(0xC0FFEE)).expect("point");
    let restored = AffinePoint::from_uncompressed_bytes(&point.to_uncompressed_bytes())
        .expect("round trip");
    assert_eq!(restored, point);
}
