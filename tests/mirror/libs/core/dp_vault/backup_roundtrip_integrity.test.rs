// [tests/mirror/libs/core/dp_vault/backup_roundtrip_integrity.test.rs]
/**
 * =================================================================
 * APARATO: BACKUP ROUNDTRIP CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CORE
 * RESPONSABILIDAD: IDA Y VUELTA BINARIA, VENTANAS Y RECHAZO DE MAGIA
 * =================================================================
 */

use canguro_core_math::{keys, Scalar};
use canguro_core_vault::{
    backup, DpVault, KangarooCheckpoint, VaultError, WorkHeader, MAGIC_KANGAROO, MAGIC_WORK,
    WORK_FILE_VERSION,
};
use canguro_domain_models::HASH_SIZE;

fn mission_header(magic: u32) -> WorkHeader {
    // Clave real sobre la curva: la validación del cargador es estricta
    let key = keys::base_multiply(&Scalar::from_u64(0x1337)).expect("key point");
    WorkHeader {
        magic,
        version: WORK_FILE_VERSION,
        dp_size: 12,
        range_start: Scalar::from_u64(0x1000).to_le_bytes(),
        range_end: Scalar::from_u64(0x1FFF).to_le_bytes(),
        key_x: key.x.to_le_bytes(),
        key_y: key.y.to_le_bytes(),
        total_count: 987_654,
        total_time: 12.5,
    }
}

fn populated_vault() -> DpVault {
    let vault = DpVault::new();
    for ordinal in 0..200u128 {
        let shard = (ordinal % 17) as u32 * 1000 % HASH_SIZE;
        vault.insert(shard, ordinal * 0x10, ordinal | (1 << 126));
    }
    vault
}

#[test]
fn certify_full_round_trip() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("mission.work");

    let vault = populated_vault();
    let walkers = vec![
        KangarooCheckpoint {
            px: Scalar::from_u64(1).to_le_bytes(),
            py: Scalar::from_u64(2).to_le_bytes(),
            distance: Scalar::from_u64(3).to_le_bytes(),
        };
        5
    ];

    let header = mission_header(MAGIC_WORK);
    backup::save_work_file(&path, &header, Some(&vault), &walkers).expect("save");

    let (restored_header, restored_vault, restored_walkers) =
        backup::load_work_file(&path).expect("load");

    assert_eq!(restored_header, header);
    assert_eq!(restored_walkers, walkers);
    assert_eq!(restored_vault.total_entries(), vault.total_entries());
    for shard in 0..HASH_SIZE {
        assert_eq!(
            restored_vault.snapshot_shard(shard),
            vault.snapshot_shard(shard),
            "shard {shard} diverges"
        );
    }
}

#[test]
fn certify_empty_kangaroo_tail_tolerated() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("snapshot.work");

    let vault = populated_vault();
    backup::save_work_file(&path, &mission_header(MAGIC_WORK), Some(&vault), &[])
        .expect("save without walkers");

    let (_header, _vault, walkers) = backup::load_work_file(&path).expect("load");
    assert!(walkers.is_empty());
}

#[test]
fn certify_magic_rejection_distinguishes_kinds() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("walkers.kangaroo");

    // Artefacto HEADK legítimo (solo canguros)
    backup::save_work_file(&path, &mission_header(MAGIC_KANGAROO), None, &[])
        .expect("save HEADK");

    // Cargarlo como HEADW debe fallar con diagnóstico, sin tabla a medias
    let Err(fault) = backup::load_work_file(&path) else {
        panic!("expected magic rejection");
    };
    match fault {
        VaultError::MagicMismatch { found, expected, found_kind, .. } => {
            assert_eq!(found, MAGIC_KANGAROO);
            assert_eq!(expected, MAGIC_WORK);
            assert!(found_kind.contains("kangaroo"));
        }
        other => panic!("expected magic rejection, got {other}"),
    }

    // Y a la inversa: abrir como HEADK sí procede
    let (header, mut reader) =
        backup::open_work_file(&path, MAGIC_KANGAROO).expect("open HEADK");
    assert_eq!(header.magic, MAGIC_KANGAROO);
    assert!(backup::read_kangaroo_tail(&mut reader).expect("tail").is_empty());
}

#[test]
fn certify_truncated_file_rejected() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("empty.work");
    std::fs::write(&path, b"").expect("touch");

    assert!(matches!(
        backup::load_work_file(&path),
        Err(VaultError::Truncated(_))
    ));
}

#[test]
fn certify_windowed_load_matches_full_load() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("windowed.work");

    let vault = populated_vault();
    backup::save_work_file(&path, &mission_header(MAGIC_WORK), Some(&vault), &[])
        .expect("save");

    // Carga por ventana: saltar los primeros 1000 shards y leer 2000
    let (_header, mut reader) = backup::open_work_file(&path, MAGIC_WORK).expect("open");
    backup::skip_shard_window(&mut reader, 1000).expect("skip");
    let window = backup::read_shard_window(&mut reader, 1000, 3000).expect("window");

    for (offset, body) in window.iter().enumerate() {
        let shard = 1000 + offset as u32;
        assert_eq!(body.entries, vault.snapshot_shard(shard), "shard {shard}");
    }
}

#[test]
fn certify_scan_statistics() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let path = scratch_dir.path().join("stats.work");

    let vault = populated_vault();
    backup::save_work_file(&path, &mission_header(MAGIC_WORK), Some(&vault), &[])
        .expect("save");

    let report = backup::inspect_work_file(&path).expect("inspect");
    assert_eq!(report.scan.total_items, vault.total_entries());
    assert_eq!(report.kangaroo_count, 0);
    assert!(report.scan.used_shards > 0);
}
