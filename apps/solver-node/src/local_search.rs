// [apps/solver-node/src/local_search.rs]
/*!
 * =================================================================
 * APARATO: LOCAL SEARCH ENGINE (V4.0 - HERD POOL)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L3)
 * RESPONSABILIDAD: POOL DE CAMINANTES, CHECKPOINT Y RESOLUCIÓN LOCAL
 *
 * Disciplina de concurrencia: cada hilo trabajador posee su manada en
 * exclusiva; la bóveda compartida se toca solo a través de sus
 * cerrojos por shard, y el protocolo de guardado estaciona a todos
 * los caminantes antes de congelar la tabla.
 * =================================================================
 */

use crate::cli::{CheckpointDirectives, ComputeDirectives};
use crate::mission::{
    geometry_from_header, geometry_from_descriptor, header_for, header_matches_geometry,
    range_power_of, seal_private_key, split_file_name,
};
use anyhow::{Context, Result};
use canguro_core_herd::{
    auto_dp_size, resolve_collision, DistinguishedPointSink, Herd, JumpTable, SearchCoordinator,
    SearchGeometry, SinkVerdict,
};
use canguro_core_math::Scalar;
use canguro_core_vault::{backup, DpVault, InsertOutcome, MAGIC_WORK};
use canguro_domain_models::KangarooCheckpoint;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Cadencia del supervisor de progreso.
const PROGRESS_PERIOD: Duration = Duration::from_secs(10);
/// Cadencia de sondeo del supervisor.
const SUPERVISOR_POLL: Duration = Duration::from_millis(500);

/// Sumidero local: inserciones directas en la bóveda y resolución in situ.
pub struct VaultSink<'a> {
    /// Bóveda canónica compartida.
    pub vault: &'a DpVault,
    /// Geometría de la misión (resolutor de colisiones).
    pub geometry: &'a SearchGeometry,
    /// Coordinador de la búsqueda.
    pub coordinator: &'a SearchCoordinator,
    /// Clave resuelta, si alguna colisión certificó.
    pub resolved: Mutex<Option<Scalar>>,
}

impl DistinguishedPointSink for VaultSink<'_> {
    fn absorb(&self, x_bits: u128, shard: u32, packed_delta: u128) -> SinkVerdict {
        match self.vault.insert(shard, x_bits, packed_delta) {
            InsertOutcome::Added => SinkVerdict::Continue,
            InsertOutcome::Duplicate => SinkVerdict::Reseed,
            InsertOutcome::Collision(existing) => {
                match resolve_collision(self.geometry, existing.packed_delta, packed_delta) {
                    Some(key) => {
                        *self.resolved.lock().unwrap_or_else(|poison| poison.into_inner()) =
                            Some(key);
                        self.coordinator.request_stop();
                        SinkVerdict::Stop
                    }
                    None => {
                        self.coordinator.record_same_herd();
                        SinkVerdict::Reseed
                    }
                }
            }
        }
    }
}

/// Bucle de un hilo caminante: avance de manada hasta paro cooperativo.
///
/// El hilo deposita su instantánea de canguros en `snapshot_slot` cada vez
/// que observa una solicitud de guardado, y una última vez al salir.
pub fn walker_loop(
    ordinal: usize,
    geometry: &SearchGeometry,
    jumps: &JumpTable,
    coordinator: &SearchCoordinator,
    sink: &dyn DistinguishedPointSink,
    group_size: usize,
    initial_states: Vec<KangarooCheckpoint>,
    snapshot_slot: &Mutex<Vec<KangarooCheckpoint>>,
    live_workers: &AtomicUsize,
) {
    let herd_result = if initial_states.is_empty() {
        Herd::spawn(geometry, group_size)
    } else {
        Herd::from_checkpoints(geometry, &initial_states, group_size)
    };

    let mut herd = match herd_result {
        Ok(herd) => herd,
        Err(fault) => {
            error!("❌ [WALKER_{}]: herd ignition failed: {}", ordinal, fault);
            coordinator.request_stop();
            live_workers.fetch_sub(1, Ordering::AcqRel);
            return;
        }
    };

    loop {
        if coordinator.is_stopped() {
            break;
        }
        if coordinator.save_requested() {
            deposit_snapshot(snapshot_slot, herd.checkpoints());
            coordinator.hold_for_save();
            continue;
        }

        match herd.advance(geometry, jumps, sink, coordinator) {
            Ok(false) => {}
            Ok(true) => {
                coordinator.request_stop();
                break;
            }
            Err(fault) => {
                error!("❌ [WALKER_{}]: batch collapsed: {}", ordinal, fault);
                coordinator.request_stop();
                break;
            }
        }
    }

    deposit_snapshot(snapshot_slot, herd.checkpoints());
    live_workers.fetch_sub(1, Ordering::AcqRel);
}

fn deposit_snapshot(slot: &Mutex<Vec<KangarooCheckpoint>>, snapshot: Vec<KangarooCheckpoint>) {
    *slot.lock().unwrap_or_else(|poison| poison.into_inner()) = snapshot;
}

/// Checkpoint bajo quiescencia: estaciona caminantes, congela la bóveda,
/// sella el artefacto y libera. En timeout el checkpoint previo manda.
#[allow(clippy::too_many_arguments)]
pub fn checkpoint_under_quiescence(
    geometry: &SearchGeometry,
    vault: &DpVault,
    coordinator: &SearchCoordinator,
    snapshot_slots: &[Mutex<Vec<KangarooCheckpoint>>],
    live_workers: &AtomicUsize,
    directives: &CheckpointDirectives,
    total_count: u64,
    total_time: f64,
) {
    let Some(work_file) = directives.work_file.as_ref() else {
        return;
    };

    let workers_to_park = live_workers.load(Ordering::Acquire);
    if workers_to_park > 0
        && !coordinator.quiesce_for_save(
            workers_to_park,
            Duration::from_millis(directives.save_timeout_ms),
        )
    {
        return;
    }

    let started = Instant::now();
    let kangaroos: Vec<KangarooCheckpoint> = if directives.save_kangaroos {
        snapshot_slots
            .iter()
            .flat_map(|slot| {
                slot.lock()
                    .unwrap_or_else(|poison| poison.into_inner())
                    .clone()
            })
            .collect()
    } else {
        Vec::new()
    };

    let target: PathBuf = if directives.wsplit {
        split_file_name(work_file)
    } else {
        work_file.clone()
    };

    let header = header_for(geometry, MAGIC_WORK, total_count, total_time);
    match backup::save_work_file(&target, &header, Some(vault), &kangaroos) {
        Ok(size) => {
            info!(
                "💾 [CHECKPOINT]: {} [{:.1} MB] [{} walkers] [{:.1?}]",
                target.display(),
                size as f64 / (1024.0 * 1024.0),
                kangaroos.len(),
                started.elapsed()
            );
            if directives.wsplit {
                vault.reset_shared();
            }
        }
        Err(fault) => warn!("⚠️ [CHECKPOINT_FAULT]: {}: {}", target.display(), fault),
    }

    coordinator.release_after_save();
}

/// Resultado de una búsqueda local.
pub struct SolveOutcome {
    /// Clave privada recuperada, si la búsqueda colisionó con éxito.
    pub resolved: Option<Scalar>,
    /// Operaciones de grupo ejecutadas en esta sesión.
    pub operations: u64,
}

/// Orquestación completa de `canguro solve`.
pub fn run_local_search(
    config_file: &Path,
    checkpoint: &CheckpointDirectives,
    compute: &ComputeDirectives,
    key_output: Option<&Path>,
    max_step: f64,
) -> Result<SolveOutcome> {
    warn_gpu_strata(compute);

    let descriptor = canguro_domain_models::SearchDescriptor::from_config_file(config_file)
        .with_context(|| format!("solve: cannot read {}", config_file.display()))?;

    let threads = compute.threads.unwrap_or_else(num_cpus::get).max(1);
    let group_size = compute.group_size.max(2) & !1;
    let total_kangaroos = (threads * group_size) as u64;

    // Reanudación: la cabecera del artefacto manda sobre el descriptor.
    let mut offset_count = 0u64;
    let mut offset_time = 0f64;
    let mut loaded_vault: Option<DpVault> = None;
    let mut loaded_states: Vec<KangarooCheckpoint> = Vec::new();
    let mut loaded_header: Option<canguro_core_vault::WorkHeader> = None;

    if let Some(input) = checkpoint.input_work.as_ref() {
        info!("📂 [RESUME]: loading {}", input.display());
        let (header, vault, states) = backup::load_work_file(input)
            .with_context(|| format!("load: {}", input.display()))?;
        offset_count = header.total_count;
        offset_time = header.total_time;
        loaded_vault = Some(vault);
        loaded_states = states;
        loaded_header = Some(header);
    }

    let dp_size = compute
        .dp_size
        .or(loaded_header.as_ref().map(|header| header.dp_size))
        .unwrap_or_else(|| {
            let power = range_power_of(&descriptor).unwrap_or(1);
            auto_dp_size(power, total_kangaroos)
        });

    let geometry = match loaded_header.as_ref() {
        Some(header) => geometry_from_header(header, dp_size, compute.use_symmetry)?,
        None => geometry_from_descriptor(&descriptor, dp_size, compute.use_symmetry)?,
    };
    if let Some(header) = loaded_header.as_ref() {
        if !header_matches_geometry(header, &geometry) {
            // La geometría proviene de la cabecera; la divergencia solo puede
            // venir de un descriptor ajeno. Se reporta y la cabecera manda.
            warn!("⚠️ [RESUME]: config file differs from work file; work file wins");
        }
    }

    let jumps = JumpTable::build(&geometry)?;
    let vault = loaded_vault.unwrap_or_default();
    let coordinator = Arc::new(SearchCoordinator::new());
    let expected = geometry.expected_operations(total_kangaroos);

    info!("🚀 [SOLVE]: range [0x{}, 0x{}]", geometry.range_start.to_hex(), geometry.range_end.to_hex());
    info!(
        "🚀 [SOLVE]: dp {} | {} threads × {} kangaroos | expected 2^{:.2} ops{}",
        geometry.dp_size,
        threads,
        group_size,
        expected.log2(),
        if geometry.use_symmetry { " | symmetry" } else { "" }
    );

    let stop_handle = Arc::clone(&coordinator);
    ctrlc::set_handler(move || {
        warn!("⚠️ [SIGNAL]: termination requested; sealing current strata");
        stop_handle.request_stop();
    })
    .context("solve: cannot register signal handler")?;

    let sink = VaultSink {
        vault: &vault,
        geometry: &geometry,
        coordinator: &*coordinator,
        resolved: Mutex::new(None),
    };

    let snapshot_slots: Vec<Mutex<Vec<KangarooCheckpoint>>> =
        (0..threads).map(|_| Mutex::new(Vec::new())).collect();
    let live_workers = AtomicUsize::new(threads);
    let session_start = Instant::now();

    std::thread::scope(|scope| {
        for ordinal in 0..threads {
            let initial: Vec<KangarooCheckpoint> = loaded_states
                .iter()
                .skip(ordinal * group_size)
                .take(group_size)
                .copied()
                .collect();
            let slot = &snapshot_slots[ordinal];
            let geometry_ref = &geometry;
            let jumps_ref = &jumps;
            let sink_ref = &sink;
            let coordinator_ref = &*coordinator;
            let live_ref = &live_workers;
            scope.spawn(move || {
                walker_loop(
                    ordinal,
                    geometry_ref,
                    jumps_ref,
                    coordinator_ref,
                    sink_ref,
                    group_size,
                    initial,
                    slot,
                    live_ref,
                );
            });
        }

        if loaded_states.len() > threads * group_size {
            warn!(
                "⚠️ [RESUME]: {} serialized walkers exceed the pool; surplus discarded",
                loaded_states.len() - threads * group_size
            );
        }

        // SUPERVISOR: progreso, checkpoints periódicos y cota de abandono
        let mut last_progress = Instant::now();
        let mut last_save = Instant::now();
        while !coordinator.is_stopped() && live_workers.load(Ordering::Acquire) > 0 {
            std::thread::sleep(SUPERVISOR_POLL);

            if last_progress.elapsed() >= PROGRESS_PERIOD {
                let operations = coordinator.operations.load(Ordering::Relaxed);
                let rate = operations as f64 / session_start.elapsed().as_secs_f64().max(1e-6);
                info!(
                    "🦘 [PROGRESS]: 2^{:.2} ops [{:.2} MK/s] [{} DP] [dead {}] [{:.1}%]",
                    ((offset_count + operations).max(1) as f64).log2(),
                    rate / 1.0e6,
                    vault.total_entries(),
                    coordinator.same_herd_collisions.load(Ordering::Relaxed),
                    ((offset_count + operations) as f64 / expected * 100.0).min(100.0)
                );
                last_progress = Instant::now();
            }

            if checkpoint.work_file.is_some()
                && last_save.elapsed() >= Duration::from_secs(checkpoint.save_period_seconds)
            {
                checkpoint_under_quiescence(
                    &geometry,
                    &vault,
                    &coordinator,
                    &snapshot_slots,
                    &live_workers,
                    checkpoint,
                    offset_count + coordinator.operations.load(Ordering::Relaxed),
                    offset_time + session_start.elapsed().as_secs_f64(),
                );
                last_save = Instant::now();
            }

            if max_step > 0.0 {
                let operations = coordinator.operations.load(Ordering::Relaxed);
                if (offset_count + operations) as f64 > max_step * expected {
                    warn!("🛑 [MAX_STEP]: operation budget exhausted; stopping search");
                    coordinator.request_stop();
                }
            }
        }
    });

    let operations = coordinator.operations.load(Ordering::Relaxed);
    let resolved = sink
        .resolved
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .take();

    // Checkpoint final con todos los caminantes ya terminados.
    checkpoint_under_quiescence(
        &geometry,
        &vault,
        &coordinator,
        &snapshot_slots,
        &live_workers,
        checkpoint,
        offset_count + operations,
        offset_time + session_start.elapsed().as_secs_f64(),
    );

    match &resolved {
        Some(key) => {
            seal_private_key(key, &geometry.target_key, key_output)?;
        }
        None => info!(
            "🏁 [SOLVE]: stopped without resolution after 2^{:.2} ops",
            ((offset_count + operations).max(1) as f64).log2()
        ),
    }

    Ok(SolveOutcome { resolved, operations })
}

/// El estrato GPU es un colaborador externo; sin él, se advierte y se
/// continúa con el enjambre CPU.
pub fn warn_gpu_strata(compute: &ComputeDirectives) {
    if compute.use_gpu || compute.gpu_grid.is_some() || compute.gpu_ids.is_some() {
        warn!("⚠️ [GPU_STRATA]: GPU engine not linked in this build; falling back to CPU herds");
    }
}
