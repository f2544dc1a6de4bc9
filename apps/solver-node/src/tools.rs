// [apps/solver-node/src/tools.rs]
/*!
 * =================================================================
 * APARATO: WORK FILE TOOLING (V4.0)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FUSIÓN, INSPECCIÓN Y EXPORTACIÓN DE ARTEFACTOS
 * =================================================================
 */

use crate::mission::{geometry_from_header, seal_private_key};
use anyhow::{Context, Result};
use canguro_core_herd::{resolve_collision, SearchGeometry};
use canguro_core_math::{keys, Scalar};
use canguro_core_vault::{
    backup, merge, CollisionSink, DpEntry, MergeOutcome, MAGIC_WORK,
};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use tracing::info;

/// Sumidero de fusión: resuelve colisiones contra la geometría del lote.
pub struct MergeResolutionSink {
    geometry: SearchGeometry,
    resolved: Mutex<Option<Scalar>>,
    dead_kangaroos: AtomicU64,
}

impl MergeResolutionSink {
    /// Construye el sumidero para la misión de los ficheros a fusionar.
    #[must_use]
    pub fn new(geometry: SearchGeometry) -> Self {
        Self {
            geometry,
            resolved: Mutex::new(None),
            dead_kangaroos: AtomicU64::new(0),
        }
    }

    /// Clave resuelta durante la fusión, si la hubo.
    #[must_use]
    pub fn resolved(&self) -> Option<Scalar> {
        self.resolved
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }

    /// Canguros muertos observados (duplicados y colisiones estériles).
    #[must_use]
    pub fn dead_kangaroos(&self) -> u64 {
        self.dead_kangaroos.load(Ordering::Relaxed)
    }
}

impl CollisionSink for MergeResolutionSink {
    fn on_collision(&self, _shard: u32, existing: DpEntry, incoming: DpEntry) -> bool {
        match resolve_collision(&self.geometry, existing.packed_delta, incoming.packed_delta) {
            Some(key) => {
                *self
                    .resolved
                    .lock()
                    .unwrap_or_else(|poison| poison.into_inner()) = Some(key);
                true
            }
            None => {
                self.dead_kangaroos.fetch_add(1, Ordering::Relaxed);
                false
            }
        }
    }

    fn on_duplicate(&self) {
        self.dead_kangaroos.fetch_add(1, Ordering::Relaxed);
    }
}

/// `canguro merge`: fusión por pares con resolución oportunista.
pub fn run_merge(file1: &Path, file2: &Path, dest: &Path) -> Result<()> {
    let (header, _reader) = backup::open_work_file(file1, MAGIC_WORK)
        .with_context(|| format!("merge: {}", file1.display()))?;
    let geometry = geometry_from_header(&header, header.dp_size, false)?;
    let sink = MergeResolutionSink::new(geometry);

    let outcome = merge::merge_work_files(file1, file2, dest, &sink)
        .context("merge: operation failed")?;
    report_merge(&sink, outcome)
}

/// `canguro merge-dir`: fusión N-aria de un directorio.
pub fn run_merge_dir(directory: &Path, dest: &Path) -> Result<()> {
    // La geometría del lote se toma del mayor fichero legible, el mismo
    // que la fusión usará como tabla canónica.
    let mut candidates: Vec<(std::path::PathBuf, u64)> = Vec::new();
    for entry in std::fs::read_dir(directory)
        .with_context(|| format!("merge-dir: cannot read {}", directory.display()))?
    {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if metadata.is_file() {
            candidates.push((entry.path(), metadata.len()));
        }
    }
    candidates.sort_by(|left, right| right.1.cmp(&left.1));

    let geometry = candidates
        .iter()
        .find_map(|(path, _size)| {
            let (header, _reader) = backup::open_work_file(path, MAGIC_WORK).ok()?;
            geometry_from_header(&header, header.dp_size, false).ok()
        })
        .context("merge-dir: no loadable work file in directory")?;

    let sink = MergeResolutionSink::new(geometry);
    let outcome = merge::merge_directory(directory, dest, &sink)
        .context("merge-dir: operation failed")?;
    report_merge(&sink, outcome)
}

fn report_merge(sink: &MergeResolutionSink, outcome: MergeOutcome) -> Result<()> {
    match outcome {
        MergeOutcome::Completed { dp_size, total_count, total_time, merged_files } => {
            info!(
                "🧬 [MERGE_DONE]: {} files | dp {} | count 2^{:.2} | {} | dead {}",
                merged_files,
                dp_size,
                (total_count.max(1) as f64).log2(),
                format_duration(total_time),
                sink.dead_kangaroos()
            );
        }
        MergeOutcome::KeyResolved => {
            let key = sink
                .resolved()
                .context("merge: resolution signalled without key material")?;
            seal_private_key(&key, &sink.geometry.target_key, None)?;
        }
    }
    Ok(())
}

/// `canguro info`: volcado de cabecera y estadísticas sin cargar cuerpos.
pub fn run_info(file: &Path) -> Result<()> {
    let report = backup::inspect_work_file(file)
        .with_context(|| format!("info: {}", file.display()))?;
    let header = &report.header;

    let key_point = crate::mission::point_from_le(&header.key_x, &header.key_y);
    let key_hex = keys::to_compressed_hex(&key_point).unwrap_or_else(|_| "<invalid>".to_string());

    println!("Version   : {}", header.version);
    println!("DP bits   : {}", header.dp_size);
    println!("Start     : 0x{}", Scalar::from_le_bytes(&header.range_start).to_hex());
    println!("Stop      : 0x{}", Scalar::from_le_bytes(&header.range_end).to_hex());
    println!("Key       : {key_hex}");
    println!(
        "Count     : {} 2^{:.3}",
        header.total_count,
        (header.total_count.max(1) as f64).log2()
    );
    println!("Time      : {}", format_duration(header.total_time));
    println!(
        "Table     : {} items [max shard {}] [used {}/{}] [{:.1} MB]",
        report.scan.total_items,
        report.scan.max_shard_items,
        report.scan.used_shards,
        canguro_domain_models::HASH_SIZE,
        report.scan.total_items as f64 * 32.0 / (1024.0 * 1024.0)
    );
    println!("Kangaroos : {}", report.kangaroo_count);
    Ok(())
}

/// `canguro export`: volcados textuales tame/wild del artefacto.
pub fn run_export(file: &Path, tame_output: &Path, wild_output: &Path) -> Result<()> {
    let summary = backup::export_text_dumps(file, tame_output, wild_output)
        .with_context(|| format!("export: {}", file.display()))?;
    println!(
        "DP Count  : {} 2^{:.3}",
        summary.tame + summary.wild,
        ((summary.tame + summary.wild).max(1) as f64).log2()
    );
    println!("DP Tame   : {} → {}", summary.tame, tame_output.display());
    println!("DP Wild   : {} → {}", summary.wild, wild_output.display());
    Ok(())
}

/// Formato humano `[DD:]HH:MM:SS` de una duración en segundos.
#[must_use]
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;
    let residual = total % 60;
    if days > 0 {
        format!("{days:02}:{hours:02}:{minutes:02}:{residual:02}")
    } else {
        format!("{hours:02}:{minutes:02}:{residual:02}")
    }
}
