// [tests/mirror/libs/domain/models/config_descriptor_parsing.test.rs]
/**
 * =================================================================
 * APARATO: CONFIG DESCRIPTOR CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-DOMAIN
 * RESPONSABILIDAD: LECTOR DEL FICHERO DE CONFIGURACIÓN DE MISIÓN
 * =================================================================
 */

use canguro_domain_models::{ModelError, SearchDescriptor};

#[test]
fn certify_canonical_two_line_form() {
    let descriptor = SearchDescriptor::from_config_text(
        "1000 1FFF\n0279BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798\n",
    )
    .expect("canonical config");

    assert_eq!(descriptor.range_start_hex, "1000");
    assert_eq!(descriptor.range_end_hex, "1FFF");
    assert!(descriptor.public_key_hex.starts_with("02"));
}

#[test]
fn certify_comments_and_blanks_ignored() {
    let descriptor = SearchDescriptor::from_config_text(
        "# mission: toy range\n\n  0x1000 0x1FFF  \n# the target key\n04AABB\n",
    )
    .expect("annotated config");

    assert_eq!(descriptor.range_start_hex, "0x1000");
    assert_eq!(descriptor.range_end_hex, "0x1FFF");
    assert_eq!(descriptor.public_key_hex, "04AABB");
}

#[test]
fn certify_malformed_rejections() {
    assert!(matches!(
        SearchDescriptor::from_config_text(""),
        Err(ModelError::Format(_))
    ));
    assert!(matches!(
        SearchDescriptor::from_config_text("1000 1FFF\n"),
        Err(ModelError::Format(_))
    ));
    assert!(matches!(
        SearchDescriptor::from_config_text("1000\n02AA\n"),
        Err(ModelError::Format(_))
    ));
    // Tres cotas en la línea de rango delatan un fichero ajeno
    assert!(matches!(
        SearchDescriptor::from_config_text("1000 1FFF 2FFF\n02AA\n"),
        Err(ModelError::Format(_))
    ));
}

#[test]
fn certify_file_round_trip() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("mission.conf");
    std::fs::write(&path, "1000 1FFF\n02AABBCC\n").expect("write config");

    let descriptor = SearchDescriptor::from_config_file(&path).expect("read config");
    assert_eq!(descriptor.range_end_hex, "1FFF");

    assert!(matches!(
        SearchDescriptor::from_config_file(scratch_dir.path().join("missing.conf")),
        Err(ModelError::Io(_))
    ));
}
