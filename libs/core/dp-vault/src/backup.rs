// [libs/core/dp-vault/src/backup.rs]
/*!
 * =================================================================
 * APARATO: WORK FILE BACKUP ENGINE (V4.0 - BIT PERFECT)
 * CLASIFICACIÓN: CORE INFRASTRUCTURE (ESTRATO L1)
 * RESPONSABILIDAD: RESPALDO BINARIO HEADW/HEADK Y CARGA POR VENTANAS
 *
 * # Mathematical Proof (Bounded RAM Restore):
 * La carga por ventanas [S, E) avanza por las cabeceras de longitud de
 * los shards previos y salta sus cuerpos con seeks relativos, de modo
 * que la RAM pico de una fusión queda acotada por el bloque y no por
 * el artefacto completo.
 * =================================================================
 */

use crate::errors::VaultError;
use crate::table::{validate_window, DpEntry, DpShard, DpVault};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use canguro_core_math::{AffinePoint, FieldElement};
use canguro_domain_models::{delta, HASH_SIZE};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{info, warn};

/// Magia de un fichero de trabajo completo (cabecera + bóveda + cola).
pub const MAGIC_WORK: u32 = 0xFA6A_8001;
/// Magia de un fichero de solo canguros (clientes; la config vive en el servidor).
pub const MAGIC_KANGAROO: u32 = 0xFA6A_8002;
/// Versión del formato de respaldo.
pub const WORK_FILE_VERSION: u32 = 0;

/// Cabecera de un fichero de trabajo. Los escalares son volcados Little-Endian.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkHeader {
    /// Magia del artefacto (`MAGIC_WORK` o `MAGIC_KANGAROO`).
    pub magic: u32,
    /// Versión de formato.
    pub version: u32,
    /// Tamaño de la máscara DP; solo significativo bajo `MAGIC_WORK`.
    pub dp_size: u32,
    /// Cota inferior A del rango.
    pub range_start: [u8; 32],
    /// Cota superior B del rango.
    pub range_end: [u8; 32],
    /// Coordenada X de la clave objetivo.
    pub key_x: [u8; 32],
    /// Coordenada Y de la clave objetivo.
    pub key_y: [u8; 32],
    /// Operaciones de grupo acumuladas; monótona a través de fusiones.
    pub total_count: u64,
    /// Segundos de pared acumulados; monótona a través de fusiones.
    pub total_time: f64,
}

impl WorkHeader {
    /// Reconstruye y valida la clave objetivo sobre la curva.
    ///
    /// # Errors
    /// `Curve` si las coordenadas no satisfacen la ecuación de Weierstrass.
    pub fn validate_key_on_curve(&self) -> Result<AffinePoint, VaultError> {
        let x = FieldElement::from_le_bytes(&self.key_x);
        let y = FieldElement::from_le_bytes(&self.key_y);
        let point = AffinePoint::from_coordinates(x, y);
        if !point.is_on_curve() {
            return Err(VaultError::Curve(canguro_core_math::MathError::OffCurve));
        }
        Ok(point)
    }

    /// Compatibilidad de misión: mismo rango y misma clave objetivo.
    #[must_use]
    pub fn same_mission(&self, other: &Self) -> bool {
        self.range_start == other.range_start
            && self.range_end == other.range_end
            && self.key_x == other.key_x
            && self.key_y == other.key_y
    }
}

pub use canguro_domain_models::KangarooCheckpoint;

// --- CABECERAS ---

/// Lee y valida la cabecera contra la magia solicitada.
///
/// # Errors
/// `MagicMismatch` con diagnóstico HEADW/HEADK; `Truncated` ante EOF prematuro.
pub fn read_header<R: Read>(reader: &mut R, expected_magic: u32) -> Result<WorkHeader, VaultError> {
    let magic = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| VaultError::Truncated("empty or headerless file".to_string()))?;

    if magic != expected_magic {
        return Err(VaultError::MagicMismatch {
            found: magic,
            found_kind: VaultError::describe_magic(magic),
            expected: expected_magic,
            expected_kind: VaultError::describe_magic(expected_magic),
        });
    }

    let version = reader.read_u32::<LittleEndian>()?;
    let dp_size = if magic == MAGIC_WORK {
        reader.read_u32::<LittleEndian>()?
    } else {
        0
    };

    let mut range_start = [0u8; 32];
    let mut range_end = [0u8; 32];
    let mut key_x = [0u8; 32];
    let mut key_y = [0u8; 32];
    reader.read_exact(&mut range_start)?;
    reader.read_exact(&mut range_end)?;
    reader.read_exact(&mut key_x)?;
    reader.read_exact(&mut key_y)?;

    let total_count = reader.read_u64::<LittleEndian>()?;
    let total_time = reader.read_f64::<LittleEndian>()?;

    Ok(WorkHeader {
        magic,
        version,
        dp_size,
        range_start,
        range_end,
        key_x,
        key_y,
        total_count,
        total_time,
    })
}

/// Abre un fichero de trabajo y posiciona el lector tras la cabecera.
///
/// # Errors
/// Propaga fallos de E/S y los rechazos de `read_header`.
pub fn open_work_file(
    path: &Path,
    expected_magic: u32,
) -> Result<(WorkHeader, BufReader<File>), VaultError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let header = read_header(&mut reader, expected_magic)?;
    Ok((header, reader))
}

/// Escribe la cabecera en el layout empacado Little-Endian.
///
/// # Errors
/// Propaga fallos de escritura.
pub fn write_header<W: Write>(writer: &mut W, header: &WorkHeader) -> Result<(), VaultError> {
    writer.write_u32::<LittleEndian>(header.magic)?;
    writer.write_u32::<LittleEndian>(header.version)?;
    if header.magic == MAGIC_WORK {
        writer.write_u32::<LittleEndian>(header.dp_size)?;
    }
    writer.write_all(&header.range_start)?;
    writer.write_all(&header.range_end)?;
    writer.write_all(&header.key_x)?;
    writer.write_all(&header.key_y)?;
    writer.write_u64::<LittleEndian>(header.total_count)?;
    writer.write_f64::<LittleEndian>(header.total_time)?;
    Ok(())
}

// --- CUERPO DE LA BÓVEDA ---

/// Serializa la ventana de shards [start, end) de la bóveda.
///
/// # Errors
/// `ShardWindow` ante cotas ilegales; fallos de escritura.
pub fn write_shard_window<W: Write>(
    writer: &mut W,
    vault: &DpVault,
    start: u32,
    end: u32,
) -> Result<(), VaultError> {
    validate_window(start, end)?;
    for shard in start..end {
        let entries = vault.snapshot_shard(shard);
        writer.write_u32::<LittleEndian>(entries.len() as u32)?;
        // maxItem es una pista de capacidad; los lectores la ignoran
        writer.write_u32::<LittleEndian>(entries.capacity() as u32)?;
        for entry in &entries {
            writer.write_u128::<LittleEndian>(entry.x_bits)?;
            writer.write_u128::<LittleEndian>(entry.packed_delta)?;
        }
    }
    Ok(())
}

/// Lee la ventana de shards [start, end) desde la posición actual del lector.
///
/// # Errors
/// `Truncated` si un cuerpo de shard termina antes de su longitud declarada.
pub fn read_shard_window<R: Read>(
    reader: &mut R,
    start: u32,
    end: u32,
) -> Result<Vec<DpShard>, VaultError> {
    validate_window(start, end)?;
    let mut window = Vec::with_capacity((end - start) as usize);
    for shard in start..end {
        let item_count = reader.read_u32::<LittleEndian>().map_err(|_| {
            VaultError::Truncated(format!("missing length header for shard {shard}"))
        })?;
        let _capacity_hint = reader.read_u32::<LittleEndian>()?;

        let mut body = DpShard::default();
        body.reserve_for_load(item_count as usize);
        for _ in 0..item_count {
            let x_bits = reader.read_u128::<LittleEndian>().map_err(|_| {
                VaultError::Truncated(format!("truncated record in shard {shard}"))
            })?;
            let packed_delta = reader.read_u128::<LittleEndian>().map_err(|_| {
                VaultError::Truncated(format!("truncated record in shard {shard}"))
            })?;
            body.entries.push(DpEntry { x_bits, packed_delta });
        }
        window.push(body);
    }
    Ok(window)
}

/// Avanza el lector saltando `count` cuerpos de shard sin materializarlos.
///
/// # Errors
/// `Truncated` si las cabeceras de longitud se agotan antes de `count`.
pub fn skip_shard_window<R: Read + Seek>(reader: &mut R, count: u32) -> Result<u64, VaultError> {
    let mut skipped_items = 0u64;
    for ordinal in 0..count {
        let item_count = reader.read_u32::<LittleEndian>().map_err(|_| {
            VaultError::Truncated(format!("missing length header while skipping shard {ordinal}"))
        })?;
        let _capacity_hint = reader.read_u32::<LittleEndian>()?;
        reader.seek(SeekFrom::Current(i64::from(item_count) * 32))?;
        skipped_items += u64::from(item_count);
    }
    Ok(skipped_items)
}

/// Integra una ventana ya leída en la bóveda bajo propiedad exclusiva.
pub fn absorb_shard_window(vault: &mut DpVault, start: u32, window: Vec<DpShard>) {
    for (offset, shard) in window.into_iter().enumerate() {
        *vault.shard_mut(start + offset as u32) = shard;
    }
    vault.recount_entries();
}

// --- COLA DE CANGUROS ---

/// Escribe la cola de estados de caminantes (u64 de conteo + ternas de 96 bytes).
///
/// # Errors
/// Propaga fallos de escritura.
pub fn write_kangaroo_tail<W: Write>(
    writer: &mut W,
    kangaroos: &[KangarooCheckpoint],
) -> Result<(), VaultError> {
    writer.write_u64::<LittleEndian>(kangaroos.len() as u64)?;
    for state in kangaroos {
        writer.write_all(&state.px)?;
        writer.write_all(&state.py)?;
        writer.write_all(&state.distance)?;
    }
    Ok(())
}

/// Lee la cola de caminantes. Un artefacto sin cola equivale a cero canguros.
///
/// # Errors
/// `Truncated` si el conteo declarado excede los registros presentes.
pub fn read_kangaroo_tail<R: Read>(reader: &mut R) -> Result<Vec<KangarooCheckpoint>, VaultError> {
    let declared = match reader.read_u64::<LittleEndian>() {
        Ok(value) => value,
        Err(fault) if fault.kind() == ErrorKind::UnexpectedEof => return Ok(Vec::new()),
        Err(fault) => return Err(VaultError::Io(fault)),
    };

    let mut kangaroos = Vec::with_capacity(declared.min(1 << 20) as usize);
    for ordinal in 0..declared {
        let mut state = KangarooCheckpoint {
            px: [0u8; 32],
            py: [0u8; 32],
            distance: [0u8; 32],
        };
        let read_all = reader
            .read_exact(&mut state.px)
            .and_then(|()| reader.read_exact(&mut state.py))
            .and_then(|()| reader.read_exact(&mut state.distance));
        if read_all.is_err() {
            return Err(VaultError::Truncated(format!(
                "kangaroo tail declares {declared} walkers but ends at {ordinal}"
            )));
        }
        kangaroos.push(state);
    }
    Ok(kangaroos)
}

// --- OPERACIONES DE ARTEFACTO COMPLETO ---

/// Escribe un fichero de trabajo completo y retorna su tamaño en bytes.
///
/// `vault` es obligatorio bajo `MAGIC_WORK` e ignorado bajo `MAGIC_KANGAROO`.
///
/// # Errors
/// Propaga fallos de E/S y de ventana.
pub fn save_work_file(
    path: &Path,
    header: &WorkHeader,
    vault: Option<&DpVault>,
    kangaroos: &[KangarooCheckpoint],
) -> Result<u64, VaultError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    write_header(&mut writer, header)?;
    if header.magic == MAGIC_WORK {
        let table = vault.ok_or_else(|| {
            VaultError::Truncated("HEADW save requested without a table".to_string())
        })?;
        write_shard_window(&mut writer, table, 0, HASH_SIZE)?;
    }
    write_kangaroo_tail(&mut writer, kangaroos)?;

    writer.flush()?;
    let size = writer.get_ref().metadata()?.len();
    Ok(size)
}

/// Restaura un fichero de trabajo completo: cabecera validada, bóveda y cola.
///
/// La bóveda se construye fresca: un rechazo de cabecera jamás deja estado
/// parcial en tablas pre-existentes.
///
/// # Errors
/// Rechazos de magia/curva y fallos de E/S o formato.
pub fn load_work_file(
    path: &Path,
) -> Result<(WorkHeader, DpVault, Vec<KangarooCheckpoint>), VaultError> {
    let (header, mut reader) = open_work_file(path, MAGIC_WORK)?;
    header.validate_key_on_curve()?;

    let mut vault = DpVault::new();
    let window = read_shard_window(&mut reader, 0, HASH_SIZE)?;
    absorb_shard_window(&mut vault, 0, window);

    let kangaroos = read_kangaroo_tail(&mut reader)?;
    info!(
        "📦 [VAULT_RESTORED]: {} DP, {} walkers, count 2^{:.2}",
        vault.total_entries(),
        kangaroos.len(),
        (header.total_count.max(1) as f64).log2()
    );
    Ok((header, vault, kangaroos))
}

// --- INSPECCIÓN Y VOLCADOS ---

/// Estadísticas de un escaneo por cabeceras de longitud (sin materializar cuerpos).
#[derive(Debug, Clone, Copy, Default)]
pub struct TableScan {
    /// Registros totales declarados.
    pub total_items: u64,
    /// Ocupación del shard más cargado.
    pub max_shard_items: u32,
    /// Shards con al menos un registro.
    pub used_shards: u32,
}

/// Recorre las cabeceras de los `HASH_SIZE` shards acumulando estadísticas.
///
/// # Errors
/// `Truncated` si el cuerpo de la tabla se agota antes del último shard.
pub fn scan_shard_stats<R: Read + Seek>(reader: &mut R) -> Result<TableScan, VaultError> {
    let mut scan = TableScan::default();
    for shard in 0..HASH_SIZE {
        let item_count = reader.read_u32::<LittleEndian>().map_err(|_| {
            VaultError::Truncated(format!("table body ends before shard {shard}"))
        })?;
        let _capacity_hint = reader.read_u32::<LittleEndian>()?;
        reader.seek(SeekFrom::Current(i64::from(item_count) * 32))?;

        scan.total_items += u64::from(item_count);
        scan.max_shard_items = scan.max_shard_items.max(item_count);
        if item_count > 0 {
            scan.used_shards += 1;
        }
    }
    Ok(scan)
}

/// Reporte de inspección de un artefacto HEADW.
#[derive(Debug, Clone)]
pub struct WorkFileReport {
    /// Cabecera validada.
    pub header: WorkHeader,
    /// Estadísticas del cuerpo de la tabla.
    pub scan: TableScan,
    /// Caminantes serializados en la cola.
    pub kangaroo_count: u64,
}

/// Inspecciona cabecera y estadísticas sin cargar cuerpos en RAM.
///
/// # Errors
/// Rechazos de magia/curva y fallos de E/S.
pub fn inspect_work_file(path: &Path) -> Result<WorkFileReport, VaultError> {
    let (header, mut reader) = open_work_file(path, MAGIC_WORK)?;
    header.validate_key_on_curve()?;
    let scan = scan_shard_stats(&mut reader)?;
    let kangaroo_count = read_kangaroo_tail(&mut reader)?.len() as u64;
    Ok(WorkFileReport { header, scan, kangaroo_count })
}

/// Resumen del volcado textual tame/wild.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportSummary {
    /// Registros TAME volcados.
    pub tame: u64,
    /// Registros WILD volcados.
    pub wild: u64,
}

/// Vuelca la tabla a `tame.txt` / `wild.txt` en el formato textual histórico.
///
/// El índice de shard se imprime truncado con la máscara 0x3FFFF, tal como
/// esperan los consumidores existentes de estos volcados.
///
/// # Errors
/// Rechazos de cabecera y fallos de E/S.
pub fn export_text_dumps(
    work_path: &Path,
    tame_path: &Path,
    wild_path: &Path,
) -> Result<ExportSummary, VaultError> {
    let (header, mut reader) = open_work_file(work_path, MAGIC_WORK)?;
    header.validate_key_on_curve()?;

    let tame_file = OpenOptions::new().create(true).append(true).open(tame_path)?;
    let wild_file = OpenOptions::new().create(true).append(true).open(wild_path)?;
    let mut tame_writer = BufWriter::new(tame_file);
    let mut wild_writer = BufWriter::new(wild_file);

    let mut summary = ExportSummary::default();
    for shard in 0..HASH_SIZE {
        let item_count = reader.read_u32::<LittleEndian>().map_err(|_| {
            VaultError::Truncated(format!("table body ends before shard {shard}"))
        })?;
        let _capacity_hint = reader.read_u32::<LittleEndian>()?;

        for _ in 0..item_count {
            let x_bits = reader.read_u128::<LittleEndian>()?;
            let packed = reader.read_u128::<LittleEndian>()?;
            let (magnitude, is_negative, class) = delta::unpack_delta(packed);

            let prefix = format!(
                "{:05x}{:016x}{:016x} ",
                shard & 0x3FFFF,
                (x_bits >> 64) as u64,
                x_bits as u64
            );
            let body = format!("{:016x}{:016x}\n", (magnitude >> 64) as u64, magnitude as u64);

            match class {
                canguro_domain_models::KangarooClass::Tame => {
                    tame_writer.write_all(prefix.as_bytes())?;
                    tame_writer.write_all(body.as_bytes())?;
                    summary.tame += 1;
                }
                canguro_domain_models::KangarooClass::Wild => {
                    wild_writer.write_all(prefix.as_bytes())?;
                    if is_negative {
                        wild_writer.write_all(b"-")?;
                    }
                    wild_writer.write_all(body.as_bytes())?;
                    summary.wild += 1;
                }
            }
        }
    }

    tame_writer.flush()?;
    wild_writer.flush()?;

    if summary.tame + summary.wild == 0 {
        warn!("⚠️ [EXPORT_EMPTY]: work file holds no distinguished points yet");
    }
    Ok(summary)
}
