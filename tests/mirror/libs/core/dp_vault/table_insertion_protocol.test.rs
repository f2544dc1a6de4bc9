// [tests/mirror/libs/core/dp_vault/table_insertion_protocol.test.rs]
/**
 * =================================================================
 * APARATO: INSERTION PROTOCOL CERTIFIER (V4.0)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-CORE
 * RESPONSABILIDAD: ORDEN, DUPLICADOS Y COLISIONES DE LA BÓVEDA
 * =================================================================
 */

use canguro_core_vault::{DpEntry, DpShard, DpVault, InsertOutcome};
use proptest::prelude::*;

#[test]
fn certify_insertion_outcomes() {
    let vault = DpVault::new();

    assert_eq!(vault.insert(42, 0xAAAA, 0x1111), InsertOutcome::Added);
    assert_eq!(vault.total_entries(), 1);

    // Par (x, d) idéntico: canguro muerto
    assert_eq!(vault.insert(42, 0xAAAA, 0x1111), InsertOutcome::Duplicate);
    assert_eq!(vault.total_entries(), 1);

    // Misma X, distinta d: colisión con el primer testigo preservado
    match vault.insert(42, 0xAAAA, 0x2222) {
        InsertOutcome::Collision(existing) => {
            assert_eq!(existing, DpEntry { x_bits: 0xAAAA, packed_delta: 0x1111 });
        }
        other => panic!("expected collision, got {other:?}"),
    }
    // El entrante no se insertó
    assert_eq!(vault.total_entries(), 1);
    assert_eq!(
        vault.snapshot_shard(42),
        vec![DpEntry { x_bits: 0xAAAA, packed_delta: 0x1111 }]
    );
}

#[test]
fn certify_shard_isolation() {
    let vault = DpVault::new();
    assert_eq!(vault.insert(1, 0xBEEF, 0x1), InsertOutcome::Added);
    // La misma X en otro shard es un registro independiente
    assert_eq!(vault.insert(2, 0xBEEF, 0x1), InsertOutcome::Added);
    assert_eq!(vault.total_entries(), 2);
}

#[test]
fn certify_growth_policy() {
    let mut shard = DpShard::default();
    for ordinal in 0..1000u128 {
        assert_eq!(shard.insert(ordinal * 7, ordinal), InsertOutcome::Added);
    }
    assert_eq!(shard.entries.len(), 1000);
    assert!(shard.entries.capacity() >= 1000);
}

#[test]
fn certify_reset_releases_bodies() {
    let mut vault = DpVault::new();
    for ordinal in 0..64u128 {
        vault.insert((ordinal % 8) as u32, ordinal, ordinal);
    }
    assert_eq!(vault.total_entries(), 64);
    vault.reset();
    assert_eq!(vault.total_entries(), 0);
    for shard in 0..8 {
        assert!(vault.snapshot_shard(shard).is_empty());
    }
}

#[test]
fn certify_concurrent_insertion() {
    let vault = DpVault::new();
    std::thread::scope(|scope| {
        for worker in 0..4u128 {
            let vault_ref = &vault;
            scope.spawn(move || {
                for ordinal in 0..500u128 {
                    vault_ref.insert(7, worker * 10_000 + ordinal, ordinal);
                }
            });
        }
    });
    assert_eq!(vault.total_entries(), 2000);
    let entries = vault.snapshot_shard(7);
    assert!(entries.windows(2).all(|pair| pair[0].x_bits < pair[1].x_bits));
}

proptest! {
    /// Invariante: tras cualquier secuencia de inserciones el shard queda
    /// ordenado por x y sin pares (x, d) duplicados.
    #[test]
    fn certify_sorted_unique_invariant(records in prop::collection::vec((any::<u64>(), any::<u64>()), 0..200)) {
        let mut shard = DpShard::default();
        for (x, d) in &records {
            // Rango comprimido para forzar duplicados y colisiones
            let x_bits = u128::from(x % 64);
            let packed = u128::from(d % 8);
            shard.insert(x_bits, packed);
        }

        prop_assert!(shard.entries.windows(2).all(|pair| pair[0].x_bits < pair[1].x_bits));
        // Una X jamás aparece dos veces: la colisión preserva al primer testigo
        let mut seen: Vec<u128> = shard.entries.iter().map(|entry| entry.x_bits).collect();
        seen.dedup();
        prop_assert_eq!(seen.len(), shard.entries.len());
    }
}
