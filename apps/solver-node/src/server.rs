// [apps/solver-node/src/server.rs]
/*!
 * =================================================================
 * APARATO: COORDINATION SERVER (V4.0 - SINGLE WRITER)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L3)
 * RESPONSABILIDAD: BÓVEDA CANÓNICA, INGESTA DP Y DIFUSIÓN DE CONFIG
 *
 * Disciplina de escritura: todas las conexiones encauzan sus lotes a
 * un único drenador; la ingesta se suspende (`saveRequest`) mientras
 * un checkpoint congela la bóveda. Los duplicados reenviados por
 * clientes tras un fallo de socket se absorben en silencio.
 * =================================================================
 */

use crate::cli::CheckpointDirectives;
use crate::mission::{
    geometry_from_descriptor, geometry_from_header, header_for, header_matches_geometry,
    range_power_of, seal_private_key, split_file_name,
};
use anyhow::{Context, Result};
use canguro_core_herd::{auto_dp_size, resolve_collision, SearchCoordinator, SearchGeometry};
use canguro_core_math::Scalar;
use canguro_core_vault::{backup, DpVault, InsertOutcome, MAGIC_WORK};
use canguro_domain_models::{shard_index, SearchDescriptor, WireDistinguishedPoint};
use canguro_infra_transport::{read_envelope, write_envelope, ProtocolEnvelope, PROTOCOL_VERSION};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Manada asumida del enjambre cuando el DP se auto-selecciona sin datos.
const ASSUMED_SWARM_KANGAROOS: u64 = 1 << 16;
/// Pausa de la compuerta de ingesta durante un checkpoint.
const INGEST_GATE_POLL: Duration = Duration::from_millis(50);

/// Estado compartido del servidor de coordinación.
pub struct ServerState {
    geometry: SearchGeometry,
    vault: DpVault,
    coordinator: SearchCoordinator,
    ingest_gate: AtomicBool,
    resolved: Mutex<Option<Scalar>>,
    connected_clients: AtomicUsize,
    key_output: Option<PathBuf>,
}

impl ServerState {
    fn resolved_key_bytes(&self) -> Option<[u8; 32]> {
        self.resolved
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .as_ref()
            .map(Scalar::to_be_bytes)
    }
}

/// Orquestación completa de `canguro server`.
pub fn run_server(
    config_file: &Path,
    port: u16,
    checkpoint: &CheckpointDirectives,
    dp_override: Option<u32>,
    key_output: Option<&Path>,
) -> Result<()> {
    let descriptor = SearchDescriptor::from_config_file(config_file)
        .with_context(|| format!("server: cannot read {}", config_file.display()))?;

    // Reanudación de la bóveda canónica
    let mut offset_count = 0u64;
    let mut offset_time = 0f64;
    let mut loaded_vault: Option<DpVault> = None;
    let mut loaded_header: Option<canguro_core_vault::WorkHeader> = None;
    if let Some(input) = checkpoint.input_work.as_ref() {
        info!("📂 [SERVER_RESUME]: loading {}", input.display());
        let (header, vault, _walkers) = backup::load_work_file(input)
            .with_context(|| format!("load: {}", input.display()))?;
        offset_count = header.total_count;
        offset_time = header.total_time;
        loaded_vault = Some(vault);
        loaded_header = Some(header);
    }

    let dp_size = dp_override
        .or(loaded_header.as_ref().map(|header| header.dp_size))
        .unwrap_or_else(|| {
            let power = range_power_of(&descriptor).unwrap_or(1);
            auto_dp_size(power, ASSUMED_SWARM_KANGAROOS)
        });

    let geometry = match loaded_header.as_ref() {
        Some(header) => geometry_from_header(header, dp_size, false)?,
        None => geometry_from_descriptor(&descriptor, dp_size, false)?,
    };
    if let Some(header) = loaded_header.as_ref() {
        if !header_matches_geometry(header, &geometry) {
            warn!("⚠️ [SERVER_RESUME]: config file differs from work file; work file wins");
        }
    }

    let state = Arc::new(ServerState {
        geometry,
        vault: loaded_vault.unwrap_or_default(),
        coordinator: SearchCoordinator::new(),
        ingest_gate: AtomicBool::new(false),
        resolved: Mutex::new(None),
        connected_clients: AtomicUsize::new(0),
        key_output: key_output.map(Path::to_path_buf),
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("server: runtime ignition failed")?;

    runtime.block_on(serve(state, port, checkpoint.clone(), offset_count, offset_time))
}

async fn serve(
    state: Arc<ServerState>,
    port: u16,
    checkpoint: CheckpointDirectives,
    offset_count: u64,
    offset_time: f64,
) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("server: cannot bind port {port}"))?;
    info!(
        "🛰️  [SERVER_ONLINE]: port {} | dp {} | {} DP loaded",
        port,
        state.geometry.dp_size,
        state.vault.total_entries()
    );

    // DRENADOR ÚNICO: toda inserción pasa por esta tarea
    let (ingest_tx, ingest_rx) = mpsc::channel::<Vec<WireDistinguishedPoint>>(64);
    let drain_state = Arc::clone(&state);
    let drain_handle = tokio::spawn(drain_batches(drain_state, ingest_rx));

    // DAEMON DE CHECKPOINT PERIÓDICO
    let save_state = Arc::clone(&state);
    let save_directives = checkpoint.clone();
    let session_start = Instant::now();
    let save_handle = tokio::spawn(async move {
        let period = Duration::from_secs(save_directives.save_period_seconds.max(1));
        loop {
            tokio::time::sleep(period).await;
            if save_state.coordinator.is_stopped() {
                break;
            }
            save_server_work(
                &save_state,
                &save_directives,
                offset_count,
                offset_time + session_start.elapsed().as_secs_f64(),
            );
        }
    });

    // BUCLE DE ACEPTACIÓN
    loop {
        if state.coordinator.is_stopped() {
            break;
        }
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let client_state = Arc::clone(&state);
                        let client_tx = ingest_tx.clone();
                        tokio::spawn(async move {
                            if let Err(fault) = handle_client(client_state, stream, client_tx).await {
                                warn!("⚠️ [CLIENT_SESSION]: {}: {}", peer, fault);
                            }
                        });
                    }
                    Err(fault) => warn!("⚠️ [ACCEPT_FAULT]: {}", fault),
                }
            }
            _ = tokio::time::sleep(Duration::from_secs(1)) => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("⚠️ [SIGNAL]: termination requested; sealing server strata");
                state.coordinator.request_stop();
            }
        }
    }

    // Gracia de despedida: las sesiones vivas deben observar Status{found}
    let grace_deadline = Instant::now() + Duration::from_secs(10);
    while state.connected_clients.load(Ordering::Acquire) > 0 && Instant::now() < grace_deadline {
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    drop(ingest_tx);
    let _ = drain_handle.await;
    save_handle.abort();

    // Checkpoint final autoritativo
    save_server_work(
        &state,
        &checkpoint,
        offset_count,
        offset_time + session_start.elapsed().as_secs_f64(),
    );

    let resolved = state
        .resolved
        .lock()
        .unwrap_or_else(|poison| poison.into_inner())
        .clone();
    if let Some(key) = resolved {
        seal_private_key(&key, &state.geometry.target_key, state.key_output.as_deref())?;
    }
    info!("🏁 [SERVER_OFFLINE]: shutdown sequence concluded");
    Ok(())
}

/// Tarea drenadora: única escritora de la bóveda canónica.
async fn drain_batches(
    state: Arc<ServerState>,
    mut ingest_rx: mpsc::Receiver<Vec<WireDistinguishedPoint>>,
) {
    while let Some(batch) = ingest_rx.recv().await {
        if state.coordinator.is_stopped() {
            // La clave ya fue resuelta: se drena y descarta para que las
            // sesiones sigan recibiendo Status{found} hasta despedirse
            continue;
        }
        for record in batch {
            // El shard se recalcula: la bóveda no confía en ruteo ajeno
            let shard = shard_index(record.x_bits, state.geometry.dp_size);
            match state.vault.insert(shard, record.x_bits, record.packed_delta) {
                InsertOutcome::Added => {}
                InsertOutcome::Duplicate => state.coordinator.record_same_herd(),
                InsertOutcome::Collision(existing) => {
                    if let Some(key) = resolve_collision(
                        &state.geometry,
                        existing.packed_delta,
                        record.packed_delta,
                    ) {
                        info!("🎯 [SERVER]: collision certified; key resolved");
                        *state
                            .resolved
                            .lock()
                            .unwrap_or_else(|poison| poison.into_inner()) = Some(key);
                        state.coordinator.request_stop();
                        break;
                    }
                    state.coordinator.record_same_herd();
                }
            }
        }
    }
}

/// Sesión de un cliente: handshake de versión, difusión de config, ingesta.
async fn handle_client(
    state: Arc<ServerState>,
    mut stream: TcpStream,
    ingest_tx: mpsc::Sender<Vec<WireDistinguishedPoint>>,
) -> Result<()> {
    let hello = read_envelope(&mut stream).await?;
    let worker_label = match hello {
        ProtocolEnvelope::Hello { version, worker_label } if version == PROTOCOL_VERSION => {
            worker_label
        }
        ProtocolEnvelope::Hello { version, .. } => {
            warn!(
                "🚫 [VERSION_SKEW]: client speaks v{} (local v{})",
                version, PROTOCOL_VERSION
            );
            write_envelope(
                &mut stream,
                &protocol_fault_status(format!(
                    "protocol v{version} unsupported; server speaks v{PROTOCOL_VERSION}"
                )),
            )
            .await?;
            return Ok(());
        }
        _ => {
            write_envelope(
                &mut stream,
                &protocol_fault_status("handshake must open with Hello".to_string()),
            )
            .await?;
            return Ok(());
        }
    };

    let connected = state.connected_clients.fetch_add(1, Ordering::AcqRel) + 1;
    info!("🤝 [CLIENT_JOINED]: {} [{} online]", worker_label, connected);

    let config = ProtocolEnvelope::Config {
        dp_size: state.geometry.dp_size,
        range_start: state.geometry.range_start.to_le_bytes(),
        range_end: state.geometry.range_end.to_le_bytes(),
        key_x: state.geometry.target_key.x.to_le_bytes(),
        key_y: state.geometry.target_key.y.to_le_bytes(),
    };
    write_envelope(&mut stream, &config).await?;

    let session_result: Result<()> = async {
        loop {
            let envelope = read_envelope(&mut stream).await?;
            match envelope {
                ProtocolEnvelope::DpBatch { records } => {
                    // Compuerta de checkpoint: la ingesta espera al sellado
                    while state.ingest_gate.load(Ordering::Acquire) {
                        tokio::time::sleep(INGEST_GATE_POLL).await;
                    }
                    if !records.is_empty() {
                        ingest_tx
                            .send(records)
                            .await
                            .map_err(|_| anyhow::anyhow!("ingest channel collapsed"))?;
                    }
                    let status = ProtocolEnvelope::Status {
                        found: state.coordinator.is_stopped(),
                        total_count: state.vault.total_entries(),
                        private_key: state.resolved_key_bytes(),
                        fault: None,
                    };
                    write_envelope(&mut stream, &status).await?;
                }
                ProtocolEnvelope::Bye => break,
                other => {
                    warn!("⚠️ [UNEXPECTED_ENVELOPE]: {:?}", std::mem::discriminant(&other));
                }
            }
        }
        Ok(())
    }
    .await;

    let remaining = state.connected_clients.fetch_sub(1, Ordering::AcqRel) - 1;
    info!("👋 [CLIENT_LEFT]: {} [{} online]", worker_label, remaining);
    session_result
}

/// Estado de rechazo: cualquier falla de handshake viaja como `Status` con
/// `fault` poblada, y la conexión se cierra acto seguido.
fn protocol_fault_status(reason: String) -> ProtocolEnvelope {
    ProtocolEnvelope::Status {
        found: false,
        total_count: 0,
        private_key: None,
        fault: Some(reason),
    }
}

/// `SaveServerWork`: suspende la ingesta, sella la bóveda y (en modo split)
/// la vacía para el siguiente segmento.
fn save_server_work(
    state: &ServerState,
    directives: &CheckpointDirectives,
    total_count: u64,
    total_time: f64,
) {
    let Some(work_file) = directives.work_file.as_ref() else {
        return;
    };

    state.ingest_gate.store(true, Ordering::Release);
    // Margen para que el drenador agote el lote en curso
    std::thread::sleep(Duration::from_millis(200));

    let target = if directives.wsplit {
        split_file_name(work_file)
    } else {
        work_file.clone()
    };
    let header = header_for(&state.geometry, MAGIC_WORK, total_count, total_time);
    let started = Instant::now();

    match backup::save_work_file(&target, &header, Some(&state.vault), &[]) {
        Ok(size) => {
            info!(
                "💾 [SERVER_CHECKPOINT]: {} [{:.1} MB] [{:.1?}]",
                target.display(),
                size as f64 / (1024.0 * 1024.0),
                started.elapsed()
            );
            if directives.wsplit {
                state.vault.reset_shared();
            }
        }
        Err(fault) => error!("❌ [SERVER_CHECKPOINT_FAULT]: {}: {}", target.display(), fault),
    }

    state.ingest_gate.store(false, Ordering::Release);
}
