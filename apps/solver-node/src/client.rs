// [apps/solver-node/src/client.rs]
/*!
 * =================================================================
 * APARATO: SWARM CLIENT (V4.0 - RESILIENT UPLINK)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CONFIG REMOTA, MANADAS LOCALES Y STREAMING DP
 *
 * El cómputo es síncrono (hilos de manada) y el cable es asíncrono:
 * los caminantes empujan DPs por un canal sin bloqueo y la tarea de
 * enlace los reenvía en lotes. Un fallo transitorio de socket se
 * reintenta con retroceso reenviando el mismo lote: el servidor es
 * idempotente (los duplicados retornan ADD_DUPLICATE).
 * =================================================================
 */

use crate::cli::ComputeDirectives;
use crate::local_search::{walker_loop, warn_gpu_strata};
use crate::mission::{header_for, point_from_le, seal_private_key};
use anyhow::{anyhow, Context, Result};
use canguro_core_herd::{
    DistinguishedPointSink, JumpTable, SearchCoordinator, SearchGeometry, SinkVerdict,
};
use canguro_core_math::Scalar;
use canguro_core_vault::{backup, MAGIC_KANGAROO};
use canguro_domain_models::{KangarooCheckpoint, WireDistinguishedPoint};
use canguro_infra_transport::{
    read_envelope, write_envelope, ProtocolEnvelope, TransportError, PROTOCOL_VERSION,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Tope de registros por lote DP.
const DP_BATCH_LIMIT: usize = 1024;
/// Cadencia máxima entre descargas del lote hacia el servidor.
const DP_FLUSH_PERIOD: Duration = Duration::from_secs(2);
/// Retroceso entre reintentos de conexión.
const RECONNECT_BACKOFF: Duration = Duration::from_secs(5);
/// Reintentos de conexión antes de declarar el enlace muerto.
const MAX_RECONNECT_ATTEMPTS: u32 = 24;

/// Directivas de operación del cliente.
pub struct ClientSettings {
    /// Dirección `ip:puerto` del servidor.
    pub server_address: String,
    /// Checkpoint HEADK opcional.
    pub work_file: Option<PathBuf>,
    /// Reanudación HEADK opcional.
    pub input_work: Option<PathBuf>,
    /// Periodo de checkpoint en segundos.
    pub save_period_seconds: u64,
    /// Timeout de red en milisegundos.
    pub network_timeout_ms: u64,
    /// Etiqueta del nodo.
    pub worker_label: String,
}

/// Sumidero de manada en modo cliente: encola hacia la tarea de enlace.
struct UplinkSink {
    sender: mpsc::UnboundedSender<WireDistinguishedPoint>,
}

impl DistinguishedPointSink for UplinkSink {
    fn absorb(&self, x_bits: u128, shard: u32, packed_delta: u128) -> SinkVerdict {
        let record = WireDistinguishedPoint {
            kangaroo_index: 0,
            shard,
            x_bits,
            packed_delta,
        };
        if self.sender.send(record).is_err() {
            return SinkVerdict::Stop;
        }
        SinkVerdict::Continue
    }
}

/// Orquestación completa de `canguro client`.
pub fn run_client(settings: ClientSettings, compute: &ComputeDirectives) -> Result<()> {
    warn_gpu_strata(compute);
    if compute.use_symmetry {
        warn!("⚠️ [CLIENT]: symmetry is a local-solve feature; swarm walks plain");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("client: runtime ignition failed")?;
    runtime.block_on(client_session(settings, compute.clone()))
}

async fn client_session(settings: ClientSettings, compute: ComputeDirectives) -> Result<()> {
    let network_timeout = Duration::from_millis(settings.network_timeout_ms.max(250));

    // 1. ENLACE TÁCTICO Y CONFIGURACIÓN CANÓNICA
    let mut stream = connect_with_retry(&settings.server_address, network_timeout).await?;
    let geometry = handshake(&mut stream, &settings.worker_label, network_timeout).await?;
    info!(
        "🤝 [CLIENT]: config accepted | dp {} | range [0x{}, 0x{}]",
        geometry.dp_size,
        geometry.range_start.to_hex(),
        geometry.range_end.to_hex()
    );

    let jumps = Arc::new(JumpTable::build(&geometry)?);
    let geometry = Arc::new(geometry);
    let coordinator = Arc::new(SearchCoordinator::new());

    // 2. REANUDACIÓN HEADK
    let mut offset_count = 0u64;
    let mut offset_time = 0f64;
    let mut loaded_states: Vec<KangarooCheckpoint> = Vec::new();
    if let Some(input) = settings.input_work.as_ref() {
        let (header, mut reader) = backup::open_work_file(input, MAGIC_KANGAROO)
            .with_context(|| format!("load: {}", input.display()))?;
        loaded_states = backup::read_kangaroo_tail(&mut reader)?;
        offset_count = header.total_count;
        offset_time = header.total_time;
        info!(
            "📂 [CLIENT_RESUME]: {} walkers restored from {}",
            loaded_states.len(),
            input.display()
        );
    }

    // 3. MANADAS LOCALES (cómputo síncrono, enlace asíncrono)
    let threads = compute.threads.unwrap_or_else(num_cpus::get).max(1);
    let group_size = compute.group_size.max(2) & !1;
    let (dp_tx, mut dp_rx) = mpsc::unbounded_channel::<WireDistinguishedPoint>();
    let sink = Arc::new(UplinkSink { sender: dp_tx });

    let snapshot_slots: Arc<Vec<Mutex<Vec<KangarooCheckpoint>>>> =
        Arc::new((0..threads).map(|_| Mutex::new(Vec::new())).collect());
    let live_workers = Arc::new(AtomicUsize::new(threads));

    let stop_handle = Arc::clone(&coordinator);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("⚠️ [SIGNAL]: termination requested; sealing walker strata");
            stop_handle.request_stop();
        }
    });

    let mut walker_handles = Vec::with_capacity(threads);
    for ordinal in 0..threads {
        let geometry_arc = Arc::clone(&geometry);
        let jumps_arc = Arc::clone(&jumps);
        let coordinator_arc = Arc::clone(&coordinator);
        let sink_arc = Arc::clone(&sink);
        let slots_arc = Arc::clone(&snapshot_slots);
        let live_arc = Arc::clone(&live_workers);
        let initial: Vec<KangarooCheckpoint> = loaded_states
            .iter()
            .skip(ordinal * group_size)
            .take(group_size)
            .copied()
            .collect();
        walker_handles.push(std::thread::spawn(move || {
            walker_loop(
                ordinal,
                &geometry_arc,
                &jumps_arc,
                &coordinator_arc,
                &*sink_arc,
                group_size,
                initial,
                &slots_arc[ordinal],
                &live_arc,
            );
        }));
    }

    // 4. DAEMON DE CHECKPOINT HEADK (hilo síncrono, protocolo de parque)
    let checkpoint_handle = settings.work_file.clone().map(|work_file| {
        let geometry_arc = Arc::clone(&geometry);
        let coordinator_arc = Arc::clone(&coordinator);
        let slots_arc = Arc::clone(&snapshot_slots);
        let live_arc = Arc::clone(&live_workers);
        let period = Duration::from_secs(settings.save_period_seconds.max(1));
        let session_start = Instant::now();
        std::thread::spawn(move || {
            let mut last_save = Instant::now();
            while !coordinator_arc.is_stopped() {
                std::thread::sleep(Duration::from_millis(500));
                if last_save.elapsed() < period {
                    continue;
                }
                let workers = live_arc.load(Ordering::Acquire);
                if workers > 0
                    && !coordinator_arc.quiesce_for_save(workers, Duration::from_millis(3000))
                {
                    last_save = Instant::now();
                    continue;
                }
                let walkers: Vec<KangarooCheckpoint> = slots_arc
                    .iter()
                    .flat_map(|slot| {
                        slot.lock().unwrap_or_else(|poison| poison.into_inner()).clone()
                    })
                    .collect();
                let header = header_for(
                    &geometry_arc,
                    MAGIC_KANGAROO,
                    offset_count + coordinator_arc.operations.load(Ordering::Relaxed),
                    offset_time + session_start.elapsed().as_secs_f64(),
                );
                match backup::save_work_file(&work_file, &header, None, &walkers) {
                    Ok(_) => info!(
                        "💾 [CLIENT_CHECKPOINT]: {} [{} walkers]",
                        work_file.display(),
                        walkers.len()
                    ),
                    Err(fault) => {
                        warn!("⚠️ [CLIENT_CHECKPOINT_FAULT]: {}: {}", work_file.display(), fault)
                    }
                }
                coordinator_arc.release_after_save();
                last_save = Instant::now();
            }
        })
    });

    // 5. BUCLE DE ENLACE: lotes DP → servidor, Status → coordinador
    let uplink_result = uplink_loop(
        &mut stream,
        &mut dp_rx,
        &settings,
        &geometry,
        &coordinator,
        network_timeout,
    )
    .await;

    coordinator.request_stop();
    for handle in walker_handles {
        let _ = handle.join();
    }
    if let Some(handle) = checkpoint_handle {
        let _ = handle.join();
    }

    let _ = write_envelope(&mut stream, &ProtocolEnvelope::Bye).await;
    uplink_result
}

/// Bucle de enlace: acumula, descarga, reintenta y observa el estado.
async fn uplink_loop(
    stream: &mut TcpStream,
    dp_rx: &mut mpsc::UnboundedReceiver<WireDistinguishedPoint>,
    settings: &ClientSettings,
    geometry: &SearchGeometry,
    coordinator: &SearchCoordinator,
    network_timeout: Duration,
) -> Result<()> {
    let mut pending: Vec<WireDistinguishedPoint> = Vec::new();
    let mut last_flush = Instant::now();

    loop {
        if coordinator.is_stopped() && pending.is_empty() {
            return Ok(());
        }

        // Acumulación con cadencia acotada
        let budget = DP_FLUSH_PERIOD.saturating_sub(last_flush.elapsed());
        let drained =
            tokio::time::timeout(budget.max(Duration::from_millis(50)), dp_rx.recv()).await;
        if let Ok(Some(record)) = drained {
            pending.push(record);
            if pending.len() < DP_BATCH_LIMIT && last_flush.elapsed() < DP_FLUSH_PERIOD {
                continue;
            }
        }
        if pending.is_empty() && last_flush.elapsed() < DP_FLUSH_PERIOD {
            continue;
        }

        // Descarga del lote (idempotente: se reenvía íntegro tras un fallo)
        let batch = ProtocolEnvelope::DpBatch { records: pending.clone() };
        let exchange: Result<ProtocolEnvelope, TransportError> = async {
            write_envelope(stream, &batch).await?;
            tokio::time::timeout(network_timeout, read_envelope(stream))
                .await
                .map_err(|_| {
                    TransportError::SessionCollapse("status reply timed out".to_string())
                })?
        }
        .await;

        match exchange {
            Ok(ProtocolEnvelope::Status { fault: Some(reason), .. }) => {
                coordinator.request_stop();
                return Err(TransportError::SessionCollapse(reason))
                    .context("client: server faulted the session");
            }
            Ok(ProtocolEnvelope::Status { found, total_count, private_key, fault: None }) => {
                pending.clear();
                last_flush = Instant::now();
                if found {
                    info!("🎯 [CLIENT]: server reports key resolved [swarm {} DP]", total_count);
                    if let Some(bytes) = private_key {
                        let key = Scalar::from_be_bytes(&bytes);
                        seal_private_key(&key, &geometry.target_key, None)?;
                    }
                    coordinator.request_stop();
                    return Ok(());
                }
            }
            Ok(other) => {
                warn!("⚠️ [CLIENT]: unexpected envelope {:?}", std::mem::discriminant(&other));
            }
            Err(fault) => {
                if coordinator.is_stopped() {
                    return Ok(());
                }
                warn!("🔌 [UPLINK_FAULT]: {}; reconnecting with same batch", fault);
                *stream = connect_with_retry(&settings.server_address, network_timeout).await?;
                let refreshed =
                    handshake(stream, &settings.worker_label, network_timeout).await?;
                if refreshed.dp_size != geometry.dp_size
                    || refreshed.range_start != geometry.range_start
                    || refreshed.range_end != geometry.range_end
                    || refreshed.target_key != geometry.target_key
                {
                    coordinator.request_stop();
                    return Err(anyhow!(
                        "PROTOCOL_DIVERGENCE: server mission changed across reconnect"
                    ));
                }
            }
        }
    }
}

/// Conexión con reintentos y retroceso fijo (el servidor puede llegar tarde).
async fn connect_with_retry(address: &str, network_timeout: Duration) -> Result<TcpStream> {
    for attempt in 1..=MAX_RECONNECT_ATTEMPTS {
        match tokio::time::timeout(network_timeout, TcpStream::connect(address)).await {
            Ok(Ok(stream)) => {
                stream.set_nodelay(true).ok();
                return Ok(stream);
            }
            Ok(Err(fault)) => warn!(
                "🔌 [CONNECT_RETRY {}/{}]: {}: {}",
                attempt, MAX_RECONNECT_ATTEMPTS, address, fault
            ),
            Err(_) => warn!(
                "🔌 [CONNECT_RETRY {}/{}]: {}: connect timed out",
                attempt, MAX_RECONNECT_ATTEMPTS, address
            ),
        }
        tokio::time::sleep(RECONNECT_BACKOFF).await;
    }
    Err(anyhow!("NETWORK_UNREACHABLE: {address} never answered"))
}

/// Handshake Hello/Config; un rechazo de versión es fatal (código 3).
async fn handshake(
    stream: &mut TcpStream,
    worker_label: &str,
    network_timeout: Duration,
) -> Result<SearchGeometry> {
    write_envelope(
        stream,
        &ProtocolEnvelope::Hello {
            version: PROTOCOL_VERSION,
            worker_label: worker_label.to_string(),
        },
    )
    .await?;

    let reply = tokio::time::timeout(network_timeout, read_envelope(stream))
        .await
        .map_err(|_| TransportError::SessionCollapse("config reply timed out".to_string()))??;

    match reply {
        ProtocolEnvelope::Config { dp_size, range_start, range_end, key_x, key_y } => {
            let target = point_from_le(&key_x, &key_y);
            if !target.is_on_curve() {
                return Err(anyhow!("PROTOCOL_FAULT: server key does not lie on the curve"));
            }
            Ok(SearchGeometry::build(
                Scalar::from_le_bytes(&range_start),
                Scalar::from_le_bytes(&range_end),
                target,
                dp_size,
                false,
            )?)
        }
        ProtocolEnvelope::Status { fault: Some(reason), .. } => {
            Err(TransportError::SessionCollapse(reason))
                .context("client: server refused the session")
        }
        _ => Err(anyhow!("PROTOCOL_FAULT: expected Config after Hello")),
    }
}
