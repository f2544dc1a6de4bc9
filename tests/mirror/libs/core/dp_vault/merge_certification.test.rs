// [tests/mirror/libs/core/dp_vault/merge_certification.test.rs]
/**
 * =================================================================
 * APARATO: MERGE ENGINE CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CORE
 * RESPONSABILIDAD: CONMUTATIVIDAD, CABECERAS Y OMISIÓN POR LOTE
 * =================================================================
 */

use canguro_core_math::{keys, Scalar};
use canguro_core_vault::{
    backup, merge, CollisionSink, DpEntry, DpVault, MergeOutcome, VaultError, WorkHeader,
    MAGIC_WORK, WORK_FILE_VERSION,
};
use canguro_domain_models::HASH_SIZE;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sumidero neutro: cuenta eventos y jamás detiene el lote.
#[derive(Default)]
struct CountingSink {
    collisions: AtomicU64,
    duplicates: AtomicU64,
}

impl CollisionSink for CountingSink {
    fn on_collision(&self, _shard: u32, _existing: DpEntry, _incoming: DpEntry) -> bool {
        self.collisions.fetch_add(1, Ordering::Relaxed);
        false
    }
    fn on_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }
}

fn mission_header(dp_size: u32, total_count: u64, total_time: f64) -> WorkHeader {
    let key = keys::base_multiply(&Scalar::from_u64(0xACED)).expect("key point");
    WorkHeader {
        magic: MAGIC_WORK,
        version: WORK_FILE_VERSION,
        dp_size,
        range_start: Scalar::from_u64(0x4000).to_le_bytes(),
        range_end: Scalar::from_u64(0x7FFF).to_le_bytes(),
        key_x: key.x.to_le_bytes(),
        key_y: key.y.to_le_bytes(),
        total_count,
        total_time,
    }
}

/// Sella un artefacto con los registros indicados (shard, x, d).
fn seal_artifact(path: &Path, header: &WorkHeader, records: &[(u32, u128, u128)]) {
    let vault = DpVault::new();
    for (shard, x_bits, packed) in records {
        vault.insert(*shard, *x_bits, *packed);
    }
    backup::save_work_file(path, header, Some(&vault), &[]).expect("seal artifact");
}

#[test]
fn certify_pairwise_merge_union() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let left = scratch_dir.path().join("left.work");
    let right = scratch_dir.path().join("right.work");
    let dest = scratch_dir.path().join("merged.work");

    // Registros disjuntos más un duplicado exacto compartido
    let shared = (7u32, 0x7000u128, 0x1u128);
    seal_artifact(&left, &mission_header(14, 100, 1.5), &[(1, 0x10, 0xA), (2, 0x20, 0xB), shared]);
    seal_artifact(&right, &mission_header(12, 50, 2.5), &[(3, 0x30, 0xC), shared]);

    let sink = CountingSink::default();
    let outcome = merge::merge_work_files(&left, &right, &dest, &sink).expect("merge");

    match outcome {
        MergeOutcome::Completed { dp_size, total_count, total_time, merged_files } => {
            assert_eq!(dp_size, 12, "dp destino = min(dp1, dp2)");
            assert_eq!(total_count, 150);
            assert!((total_time - 4.0).abs() < 1e-9);
            assert_eq!(merged_files, 2);
        }
        MergeOutcome::KeyResolved => panic!("no collision material present"),
    }
    assert_eq!(sink.duplicates.load(Ordering::Relaxed), 1);
    assert_eq!(sink.collisions.load(Ordering::Relaxed), 0);

    // La unión menos duplicados: 4 registros
    let (header, vault, _walkers) = backup::load_work_file(&dest).expect("load merged");
    assert_eq!(header.total_count, 150);
    assert_eq!(vault.total_entries(), 4);
}

#[test]
fn certify_merge_commutativity() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let left = scratch_dir.path().join("alpha.work");
    let right = scratch_dir.path().join("beta.work");
    let forward = scratch_dir.path().join("forward.work");
    let backward = scratch_dir.path().join("backward.work");

    let alpha_records: Vec<(u32, u128, u128)> =
        (0..80u128).map(|i| (((i * 31) % 100) as u32, i * 2, i)).collect();
    let beta_records: Vec<(u32, u128, u128)> =
        (0..60u128).map(|i| (((i * 17) % 100) as u32, i * 2 + 1001, i)).collect();

    seal_artifact(&left, &mission_header(10, 7, 0.25), &alpha_records);
    seal_artifact(&right, &mission_header(11, 13, 0.75), &beta_records);

    let sink = CountingSink::default();
    merge::merge_work_files(&left, &right, &forward, &sink).expect("A+B");
    merge::merge_work_files(&right, &left, &backward, &sink).expect("B+A");

    let (header_fwd, vault_fwd, _w1) = backup::load_work_file(&forward).expect("fwd");
    let (header_bwd, vault_bwd, _w2) = backup::load_work_file(&backward).expect("bwd");

    assert_eq!(header_fwd.total_count, header_bwd.total_count);
    assert!((header_fwd.total_time - header_bwd.total_time).abs() < 1e-9);
    assert_eq!(header_fwd.dp_size, header_bwd.dp_size);
    for shard in 0..HASH_SIZE {
        assert_eq!(vault_fwd.snapshot_shard(shard), vault_bwd.snapshot_shard(shard));
    }
}

#[test]
fn certify_header_divergence_rejection() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let left = scratch_dir.path().join("left.work");
    let alien = scratch_dir.path().join("alien.work");
    let dest = scratch_dir.path().join("never.work");

    seal_artifact(&left, &mission_header(10, 1, 0.0), &[(1, 0x10, 0xA)]);

    // Misión ajena: mismo layout, otro rango
    let mut alien_header = mission_header(10, 1, 0.0);
    alien_header.range_end = Scalar::from_u64(0xFFFF).to_le_bytes();
    seal_artifact(&alien, &alien_header, &[(2, 0x20, 0xB)]);

    let sink = CountingSink::default();
    let fault = merge::merge_work_files(&left, &alien, &dest, &sink)
        .expect_err("range divergence must abort the pair");
    assert!(matches!(fault, VaultError::HeaderMismatch(_)));
    assert!(!dest.exists(), "no partial destination on rejection");
}

#[test]
fn certify_directory_merge_skips_incompatible() {
    let scratch_dir = tempfile::tempdir().expect("tempdir");
    let dest = scratch_dir.path().join("batch.work");

    // Dos compatibles (el mayor absorbe) y un incompatible que se omite
    seal_artifact(
        &scratch_dir.path().join("big.work"),
        &mission_header(10, 40, 1.0),
        &(0..50u128).map(|i| ((i % 30) as u32, i * 4, i)).collect::<Vec<_>>(),
    );
    seal_artifact(
        &scratch_dir.path().join("small.work"),
        &mission_header(9, 2, 0.5),
        &[(5, 0x9999, 0x3)],
    );
    let mut alien_header = mission_header(10, 1, 0.0);
    alien_header.range_start = Scalar::from_u64(0x1).to_le_bytes();
    seal_artifact(&scratch_dir.path().join("alien.work"), &alien_header, &[(6, 0x8888, 0x4)]);

    let sink = CountingSink::default();
    let outcome = merge::merge_directory(scratch_dir.path(), &dest, &sink).expect("batch merge");

    match outcome {
        MergeOutcome::Completed { dp_size, total_count, merged_files, .. } => {
            assert_eq!(merged_files, 2, "the alien artifact is skipped, not fatal");
            assert_eq!(dp_size, 9);
            assert_eq!(total_count, 42);
        }
        MergeOutcome::KeyResolved => panic!("no collision material present"),
    }

    let (_header, vault, _walkers) = backup::load_work_file(&dest).expect("load dest");
    assert_eq!(vault.total_entries(), 51);
}
