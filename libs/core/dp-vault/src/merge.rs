// [libs/core/dp-vault/src/merge.rs]
/*!
 * =================================================================
 * APARATO: WORK FILE MERGE ENGINE (V4.0 - SHARD PARALLEL)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: FUSIÓN POR PARES Y POR DIRECTORIO CON DETECCIÓN
 *
 * # Mathematical Proof (Bounded Blocks):
 * La fusión por pares procesa bloques de HASH_SIZE/64 shards: ambas
 * ventanas residen en RAM solo durante su bloque, y 2^⌊log2 cores⌋
 * trabajadores cubren rangos de shards disjuntos, por lo que ninguna
 * inserción compite por el mismo cerrojo. Una colisión durante la
 * fusión puede resolver la clave y abortar el resto del lote.
 * =================================================================
 */

use crate::backup::{
    open_work_file, read_shard_window, write_header, write_kangaroo_tail, write_shard_window,
    WorkHeader, MAGIC_WORK,
};
use crate::errors::VaultError;
use crate::table::{DpEntry, DpShard, DpVault, InsertOutcome};
use canguro_domain_models::HASH_SIZE;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Bloque de shards por iteración de la fusión por pares (RAM acotada).
const MERGE_BLOCK: u32 = HASH_SIZE / 64;

/// Receptor de eventos de la fusión. `on_collision` retorna `true` cuando la
/// pareja resolvió la clave privada (fin de búsqueda).
pub trait CollisionSink: Sync {
    /// Par colisionante (existente, entrante) del shard indicado.
    fn on_collision(&self, shard: u32, existing: DpEntry, incoming: DpEntry) -> bool;
    /// Registro (x, d) ya presente: evento de manada propia.
    fn on_duplicate(&self) {}
}

/// Veredicto de una operación de fusión.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MergeOutcome {
    /// Fusión completada y artefacto destino sellado.
    Completed {
        /// DP size del destino (mínimo de las entradas).
        dp_size: u32,
        /// Operaciones acumuladas de las entradas fusionadas.
        total_count: u64,
        /// Tiempo de pared acumulado de las entradas fusionadas.
        total_time: f64,
        /// Ficheros efectivamente absorbidos.
        merged_files: u32,
    },
    /// Una colisión de la fusión resolvió la clave; no se escribió destino.
    KeyResolved,
}

/// Potencia de dos de trabajadores: 2^⌊log2(cores)⌋.
#[must_use]
pub fn merge_worker_count() -> usize {
    let cores = num_cpus::get().max(1);
    1 << (usize::BITS as usize - 1 - cores.leading_zeros() as usize)
}

/// Fusión por pares: `file1 + file2 → dest` (tmp + rename atómico).
///
/// # Errors
/// Rechazos de cabecera (magia, versión, rango, clave) y fallos de E/S.
/// Un rechazo libera ambos descriptores sin tocar el destino.
pub fn merge_work_files(
    file1: &Path,
    file2: &Path,
    dest: &Path,
    sink: &dyn CollisionSink,
) -> Result<MergeOutcome, VaultError> {
    let (header1, mut reader1) = open_work_file(file1, MAGIC_WORK)?;
    header1.validate_key_on_curve()?;

    let (header2, mut reader2) = open_work_file(file2, MAGIC_WORK)?;
    header2.validate_key_on_curve()?;

    if header1.version != header2.version {
        return Err(VaultError::VersionMismatch {
            left: header1.version,
            right: header2.version,
        });
    }
    if !header1.same_mission(&header2) {
        return Err(VaultError::HeaderMismatch(
            "range or key differs between inputs".to_string(),
        ));
    }

    let merged_header = WorkHeader {
        magic: MAGIC_WORK,
        version: header1.version,
        dp_size: header1.dp_size.min(header2.dp_size),
        range_start: header1.range_start,
        range_end: header1.range_end,
        key_x: header1.key_x,
        key_y: header1.key_y,
        total_count: header1.total_count + header2.total_count,
        total_time: header1.total_time + header2.total_time,
    };

    let tmp_path = PathBuf::from(format!("{}.tmp", dest.display()));
    let tmp_file = File::create(&tmp_path)?;
    let mut writer = BufWriter::new(tmp_file);
    write_header(&mut writer, &merged_header)?;

    let worker_count = merge_worker_count();
    let stride = (MERGE_BLOCK as usize / worker_count).max(1) as u32;
    info!(
        "🧬 [MERGE_IGNITION]: {} + {} → {} [{} workers]",
        file1.display(),
        file2.display(),
        dest.display(),
        worker_count
    );

    let mut vault = DpVault::new();
    let key_resolved = AtomicBool::new(false);

    let mut block_start = 0u32;
    while block_start < HASH_SIZE && !key_resolved.load(Ordering::Relaxed) {
        let block_end = block_start + MERGE_BLOCK;

        let window1 = read_shard_window(&mut reader1, block_start, block_end)?;
        crate::backup::absorb_shard_window(&mut vault, block_start, window1);
        let window2 = read_shard_window(&mut reader2, block_start, block_end)?;

        merge_window_threaded(
            &vault,
            &window2,
            block_start,
            block_end,
            stride,
            sink,
            &key_resolved,
        );

        if key_resolved.load(Ordering::Relaxed) {
            break;
        }

        write_shard_window(&mut writer, &vault, block_start, block_end)?;
        vault.reset_window(block_start, block_end)?;
        block_start = block_end;
    }

    if key_resolved.load(Ordering::Relaxed) {
        drop(writer);
        let _ = std::fs::remove_file(&tmp_path);
        return Ok(MergeOutcome::KeyResolved);
    }

    write_kangaroo_tail(&mut writer, &[])?;
    drop(writer);
    let _ = std::fs::remove_file(dest);
    std::fs::rename(&tmp_path, dest)?;

    Ok(MergeOutcome::Completed {
        dp_size: merged_header.dp_size,
        total_count: merged_header.total_count,
        total_time: merged_header.total_time,
        merged_files: 2,
    })
}

/// Fusión N-aria de un directorio: el fichero mayor absorbe al resto.
///
/// Un fichero incompatible se omite con advertencia sin abortar el lote.
///
/// # Errors
/// Fallos de E/S del directorio o del artefacto destino.
pub fn merge_directory(
    dirname: &Path,
    dest: &Path,
    sink: &dyn CollisionSink,
) -> Result<MergeOutcome, VaultError> {
    let mut candidates: Vec<(PathBuf, u64)> = Vec::new();
    for entry in std::fs::read_dir(dirname)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            candidates.push((entry.path(), metadata.len()));
        }
    }
    candidates.sort_by(|left, right| right.1.cmp(&left.1));

    let worker_count = merge_worker_count();
    let stride = (HASH_SIZE as usize / worker_count).max(1) as u32;

    let mut vault = DpVault::new();
    let mut baseline: Option<WorkHeader> = None;
    let mut accumulated_dp = 0u32;
    let mut accumulated_count = 0u64;
    let mut accumulated_time = 0f64;
    let mut merged_files = 0u32;
    let key_resolved = AtomicBool::new(false);

    for (path, size) in &candidates {
        info!(
            "📥 [MERGE_DIR]: loading {} ({} MB)",
            path.display(),
            size / (1024 * 1024)
        );

        let (header, mut reader) = match open_work_file(path, MAGIC_WORK) {
            Ok(opened) => opened,
            Err(fault) => {
                warn!("⚠️ [MERGE_SKIP]: {}: {}", path.display(), fault);
                continue;
            }
        };
        if let Err(fault) = header.validate_key_on_curve() {
            warn!("⚠️ [MERGE_SKIP]: {}: {}", path.display(), fault);
            continue;
        }

        match &baseline {
            None => {
                let window = match read_shard_window(&mut reader, 0, HASH_SIZE) {
                    Ok(window) => window,
                    Err(fault) => {
                        warn!("⚠️ [MERGE_SKIP]: {}: {}", path.display(), fault);
                        continue;
                    }
                };
                crate::backup::absorb_shard_window(&mut vault, 0, window);
                accumulated_dp = header.dp_size;
                accumulated_count = header.total_count;
                accumulated_time = header.total_time;
                baseline = Some(header);
                merged_files = 1;
            }
            Some(reference) => {
                if header.version != reference.version {
                    warn!(
                        "⚠️ [MERGE_SKIP]: {}: version {} differs from {}",
                        path.display(),
                        header.version,
                        reference.version
                    );
                    continue;
                }
                if !header.same_mission(reference) {
                    warn!(
                        "⚠️ [MERGE_SKIP]: {}: range or key differs from the batch",
                        path.display()
                    );
                    continue;
                }

                let window = match read_shard_window(&mut reader, 0, HASH_SIZE) {
                    Ok(window) => window,
                    Err(fault) => {
                        warn!("⚠️ [MERGE_SKIP]: {}: {}", path.display(), fault);
                        continue;
                    }
                };

                merge_window_threaded(
                    &vault,
                    &window,
                    0,
                    HASH_SIZE,
                    stride,
                    sink,
                    &key_resolved,
                );

                if key_resolved.load(Ordering::Relaxed) {
                    return Ok(MergeOutcome::KeyResolved);
                }

                accumulated_dp = accumulated_dp.min(header.dp_size);
                accumulated_count += header.total_count;
                accumulated_time += header.total_time;
                merged_files += 1;
            }
        }
    }

    let Some(reference) = baseline else {
        return Err(VaultError::Truncated(format!(
            "no loadable work file in {}",
            dirname.display()
        )));
    };

    if merged_files < 2 {
        warn!("⚠️ [MERGE_DIR]: fewer than two compatible files; nothing to seal");
    }

    let final_header = WorkHeader {
        magic: MAGIC_WORK,
        version: reference.version,
        dp_size: accumulated_dp,
        range_start: reference.range_start,
        range_end: reference.range_end,
        key_x: reference.key_x,
        key_y: reference.key_y,
        total_count: accumulated_count,
        total_time: accumulated_time,
    };
    crate::backup::save_work_file(dest, &final_header, Some(&vault), &[])?;

    Ok(MergeOutcome::Completed {
        dp_size: accumulated_dp,
        total_count: accumulated_count,
        total_time: accumulated_time,
        merged_files,
    })
}

/// Inserta la ventana secundaria en la bóveda canónica con trabajadores
/// sobre rangos de shards disjuntos.
fn merge_window_threaded(
    vault: &DpVault,
    window: &[DpShard],
    window_start: u32,
    window_end: u32,
    stride: u32,
    sink: &dyn CollisionSink,
    key_resolved: &AtomicBool,
) {
    rayon::scope(|scope| {
        let mut range_start = window_start;
        while range_start < window_end {
            let range_end = (range_start + stride).min(window_end);
            scope.spawn(move |_| {
                for shard in range_start..range_end {
                    if key_resolved.load(Ordering::Relaxed) {
                        return;
                    }
                    let body = &window[(shard - window_start) as usize];
                    for entry in &body.entries {
                        match vault.insert(shard, entry.x_bits, entry.packed_delta) {
                            InsertOutcome::Added => {}
                            InsertOutcome::Duplicate => sink.on_duplicate(),
                            InsertOutcome::Collision(existing) => {
                                let incoming = DpEntry {
                                    x_bits: entry.x_bits,
                                    packed_delta: entry.packed_delta,
                                };
                                if sink.on_collision(shard, existing, incoming) {
                                    key_resolved.store(true, Ordering::Relaxed);
                                    return;
                                }
                            }
                        }
                    }
                }
            });
            range_start = range_end;
        }
    });
}
