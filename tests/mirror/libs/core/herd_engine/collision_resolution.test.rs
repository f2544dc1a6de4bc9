// [tests/mirror/libs/core/herd_engine/collision_resolution.test.rs]
/**
 * =================================================================
 * APARATO: COLLISION RESOLVER CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CORE
 * RESPONSABILIDAD: ENSAYO CUÁDRUPLE Y CERTIFICACIÓN AJENA
 * =================================================================
 */

use canguro_core_herd::herd::pack_distance;
use canguro_core_herd::{resolve_collision, SearchGeometry};
use canguro_core_math::{keys, Scalar};
use canguro_domain_models::KangarooClass;

const PRIVATE_KEY: u64 = 0x1337;

fn toy_geometry() -> SearchGeometry {
    let target = keys::base_multiply(&Scalar::from_u64(PRIVATE_KEY)).expect("target");
    SearchGeometry::build(
        Scalar::from_u64(0x1000),
        Scalar::from_u64(0x1FFF),
        target,
        4,
        false,
    )
    .expect("geometry")
}

/// Distancia salvaje coherente con una tame dada: d_w = d_t - (k - M).
fn matching_wild_distance(geometry: &SearchGeometry, tame: &Scalar) -> Scalar {
    let key = Scalar::from_u64(PRIVATE_KEY);
    tame.sub_mod(&key.sub_mod(&geometry.midpoint))
}

#[test]
fn certify_resolution_recovers_key() {
    let geometry = toy_geometry();
    let tame = Scalar::from_u64(0x0234);
    let wild = matching_wild_distance(&geometry, &tame);

    let tame_packed = pack_distance(&tame, KangarooClass::Tame).expect("pack tame");
    let wild_packed = pack_distance(&wild, KangarooClass::Wild).expect("pack wild");

    let resolved =
        resolve_collision(&geometry, tame_packed, wild_packed).expect("must certify");
    assert_eq!(resolved, Scalar::from_u64(PRIVATE_KEY));

    // El orden de llegada es indiferente: el resolutor es conmutativo
    let mirrored =
        resolve_collision(&geometry, wild_packed, tame_packed).expect("must certify");
    assert_eq!(mirrored, Scalar::from_u64(PRIVATE_KEY));
}

#[test]
fn certify_negative_wild_distance() {
    // Clave por encima del punto medio: una tame baja induce d_w negativa
    let high_key = Scalar::from_u64(0x1FF0);
    let target = keys::base_multiply(&high_key).expect("target");
    let geometry = SearchGeometry::build(
        Scalar::from_u64(0x1000),
        Scalar::from_u64(0x1FFF),
        target,
        4,
        false,
    )
    .expect("geometry");

    let tame = Scalar::from_u64(0x0100);
    let wild = tame.sub_mod(&high_key.sub_mod(&geometry.midpoint));
    assert!(wild.is_high(), "the scenario must exercise the sign bit");

    let tame_packed = pack_distance(&tame, KangarooClass::Tame).expect("pack tame");
    let wild_packed = pack_distance(&wild, KangarooClass::Wild).expect("pack wild");

    let resolved =
        resolve_collision(&geometry, tame_packed, wild_packed).expect("must certify");
    assert_eq!(resolved, high_key);
}

#[test]
fn certify_symmetry_sign_trials() {
    let geometry = toy_geometry();
    let tame = Scalar::from_u64(0x0234);
    let wild = matching_wild_distance(&geometry, &tame);

    // Una reflexión archivó la distancia salvaje negada: el ensayo
    // cuádruple debe recuperar la clave de todas formas
    let flipped_wild = wild.negate_mod();
    let tame_packed = pack_distance(&tame, KangarooClass::Tame).expect("pack tame");
    let wild_packed = pack_distance(&flipped_wild, KangarooClass::Wild).expect("pack wild");

    let resolved =
        resolve_collision(&geometry, tame_packed, wild_packed).expect("must certify");
    assert_eq!(resolved, Scalar::from_u64(PRIVATE_KEY));

    // Y también con la tame reflejada
    let flipped_tame = tame.negate_mod();
    let tame_flipped_packed =
        pack_distance(&flipped_tame, KangarooClass::Tame).expect("pack tame");
    let resolved_again = resolve_collision(&geometry, tame_flipped_packed, wild_packed)
        .expect("must certify");
    assert_eq!(resolved_again, Scalar::from_u64(PRIVATE_KEY));
}

#[test]
fn certify_same_class_is_dead_herd() {
    let geometry = toy_geometry();
    let first = pack_distance(&Scalar::from_u64(0x111), KangarooClass::Tame).expect("pack");
    let second = pack_distance(&Scalar::from_u64(0x222), KangarooClass::Tame).expect("pack");
    assert!(resolve_collision(&geometry, first, second).is_none());
}

#[test]
fn certify_sterile_collision_rejected() {
    let geometry = toy_geometry();
    // Par incoherente: ninguna asignación de signos certifica
    let tame = pack_distance(&Scalar::from_u64(0x0777), KangarooClass::Tame).expect("pack");
    let wild = pack_distance(&Scalar::from_u64(0x0111), KangarooClass::Wild).expect("pack");
    assert!(resolve_collision(&geometry, tame, wild).is_none());
}
