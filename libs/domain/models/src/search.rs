// [libs/domain/models/src/search.rs]
/*!
 * =================================================================
 * APARATO: SEARCH MISSION DESCRIPTORS (V4.0)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DESCRIPTOR DE MISIÓN Y LECTOR DE CONFIGURACIÓN
 * =================================================================
 */

use crate::errors::ModelError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Clase de un canguro dentro de la manada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KangarooClass {
    /// Trayectoria anclada al rango conocido: posición (A + d)·G.
    Tame,
    /// Trayectoria anclada al objetivo: posición Q + d·G con Q = P - ((A+B)/2)·G.
    Wild,
}

impl KangarooClass {
    /// Etiqueta corta para logs y volcados de texto.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Tame => "tame",
            Self::Wild => "wild",
        }
    }
}

/// Descriptor textual de la misión, tal como se lee del fichero de configuración.
///
/// Las coordenadas se mantienen en hexadecimal: la validación de curva y la
/// reducción modular pertenecen al estrato matemático, no al contrato.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchDescriptor {
    /// Cota inferior A del rango, hexadecimal.
    pub range_start_hex: String,
    /// Cota superior B del rango, hexadecimal.
    pub range_end_hex: String,
    /// Clave pública objetivo, hexadecimal SEC1 (02/03 comprimida o 04 plana).
    pub public_key_hex: String,
}

impl SearchDescriptor {
    /// Lee el descriptor desde el fichero de configuración de dos líneas.
    ///
    /// Línea 1: `A B` (cotas hexadecimales). Línea 2: clave pública hex.
    /// Líneas en blanco y comentarios `#` se ignoran.
    ///
    /// # Errors
    /// `Io` ante fallo de lectura; `Format` si faltan líneas o campos.
    pub fn from_config_file<P: AsRef<Path>>(path: P) -> Result<Self, ModelError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_config_text(&raw)
    }

    /// Variante pura sobre el texto ya cargado (facilita la certificación).
    ///
    /// # Errors
    /// `Format` si el contenido no respeta el contrato de dos líneas.
    pub fn from_config_text(raw: &str) -> Result<Self, ModelError> {
        let mut meaningful_lines = raw
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'));

        let range_line = meaningful_lines
            .next()
            .ok_or_else(|| ModelError::Format("missing range line".to_string()))?;
        let key_line = meaningful_lines
            .next()
            .ok_or_else(|| ModelError::Format("missing public key line".to_string()))?;

        let mut bounds = range_line.split_whitespace();
        let range_start_hex = bounds
            .next()
            .ok_or_else(|| ModelError::Format("missing range start".to_string()))?
            .to_string();
        let range_end_hex = bounds
            .next()
            .ok_or_else(|| ModelError::Format("missing range end".to_string()))?
            .to_string();
        if bounds.next().is_some() {
            return Err(ModelError::Format(
                "range line carries more than two bounds".to_string(),
            ));
        }

        Ok(Self {
            range_start_hex,
            range_end_hex,
            public_key_hex: key_line.to_string(),
        })
    }
}
