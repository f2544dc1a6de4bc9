// [apps/solver-node/src/mission.rs]
/*!
 * =================================================================
 * APARATO: MISSION ASSEMBLY (V4.0)
 * CLASIFICACIÓN: APPLICATION LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PUENTE DESCRIPTOR ↔ GEOMETRÍA ↔ CABECERA
 * =================================================================
 */

use anyhow::{Context, Result};
use canguro_core_herd::SearchGeometry;
use canguro_core_math::{keys, AffinePoint, FieldElement, Scalar};
use canguro_core_vault::{WorkHeader, MAGIC_WORK, WORK_FILE_VERSION};
use canguro_domain_models::SearchDescriptor;
use chrono::Local;
use std::path::{Path, PathBuf};

/// Materializa la geometría de misión desde el descriptor textual.
pub fn geometry_from_descriptor(
    descriptor: &SearchDescriptor,
    dp_size: u32,
    use_symmetry: bool,
) -> Result<SearchGeometry> {
    let range_start = Scalar::from_hex_str(&descriptor.range_start_hex)
        .context("solve: invalid range start")?;
    let range_end =
        Scalar::from_hex_str(&descriptor.range_end_hex).context("solve: invalid range end")?;
    let target_key = keys::parse_public_key_hex(&descriptor.public_key_hex)
        .context("solve: invalid public key")?;

    Ok(SearchGeometry::build(
        range_start,
        range_end,
        target_key,
        dp_size,
        use_symmetry,
    )?)
}

/// Potencia del rango sin materializar la geometría completa (auto-DP).
pub fn range_power_of(descriptor: &SearchDescriptor) -> Result<u32> {
    let range_start = Scalar::from_hex_str(&descriptor.range_start_hex)
        .context("solve: invalid range start")?;
    let range_end =
        Scalar::from_hex_str(&descriptor.range_end_hex).context("solve: invalid range end")?;
    Ok(range_end.sub_mod(&range_start).bit_length().max(1))
}

/// Reconstruye la geometría desde una cabecera de fichero de trabajo.
pub fn geometry_from_header(
    header: &WorkHeader,
    dp_size: u32,
    use_symmetry: bool,
) -> Result<SearchGeometry> {
    let target_key = header
        .validate_key_on_curve()
        .context("load: key does not lie on elliptic curve")?;
    Ok(SearchGeometry::build(
        Scalar::from_le_bytes(&header.range_start),
        Scalar::from_le_bytes(&header.range_end),
        target_key,
        dp_size,
        use_symmetry,
    )?)
}

/// Sella una cabecera de trabajo desde la geometría vigente.
pub fn header_for(
    geometry: &SearchGeometry,
    magic: u32,
    total_count: u64,
    total_time: f64,
) -> WorkHeader {
    WorkHeader {
        magic,
        version: WORK_FILE_VERSION,
        dp_size: geometry.dp_size,
        range_start: geometry.range_start.to_le_bytes(),
        range_end: geometry.range_end.to_le_bytes(),
        key_x: geometry.target_key.x.to_le_bytes(),
        key_y: geometry.target_key.y.to_le_bytes(),
        total_count,
        total_time,
    }
}

/// Verifica que una cabecera cargada corresponda a la misión vigente.
pub fn header_matches_geometry(header: &WorkHeader, geometry: &SearchGeometry) -> bool {
    let reference = header_for(geometry, MAGIC_WORK, 0, 0.0);
    reference.same_mission(header)
}

/// Punto afín desde los volcados LE de una cabecera (sin validación).
pub fn point_from_le(key_x: &[u8; 32], key_y: &[u8; 32]) -> AffinePoint {
    AffinePoint::from_coordinates(
        FieldElement::from_le_bytes(key_x),
        FieldElement::from_le_bytes(key_y),
    )
}

/// Nombre del artefacto de un guardado split: `<base>_<marca temporal>`.
pub fn split_file_name(base: &Path) -> PathBuf {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    PathBuf::from(format!("{}_{stamp}", base.display()))
}

/// Sella la clave recuperada en el fichero de salida y en el registro.
pub fn seal_private_key(
    key: &Scalar,
    target: &AffinePoint,
    output: Option<&Path>,
) -> Result<()> {
    let compressed = keys::to_compressed_hex(target).unwrap_or_else(|_| "<invalid>".to_string());
    tracing::info!("🎯 [KEY_RESOLVED]: Priv 0x{}", key.to_hex());
    tracing::info!("🎯 [KEY_RESOLVED]: Pub  {}", compressed);

    if let Some(path) = output {
        use std::io::Write;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("output: cannot open {}", path.display()))?;
        writeln!(file, "Pub : {compressed}")?;
        writeln!(file, "Priv: 0x{}", key.to_hex())?;
    }
    Ok(())
}
