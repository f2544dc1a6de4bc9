// [libs/core/math-engine/src/keys.rs]
/*!
 * =================================================================
 * APARATO: KEY DERIVATION & CERTIFICATION ENGINE (V4.0)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: DERIVACIÓN k·G, COMBINACIÓN Y CERTIFICACIÓN AJENA
 *
 * # Mathematical Proof (Independent Verification):
 * Toda clave candidata recuperada por el resolutor de colisiones se
 * certifica contra el contexto 'secp256k1' (tablas de pre-cómputo del
 * generador), una aritmética ajena al cuerpo Fp artesanal del Hot-Loop.
 * Un falso positivo exigiría que ambos estratos fallen de forma idéntica.
 * =================================================================
 */

use crate::errors::MathError;
use crate::point::AffinePoint;
use crate::scalar::Scalar;
use secp256k1::{All, PublicKey, Secp256k1, SecretKey};
use std::sync::LazyLock;

/// Singleton del contexto secp256k1 con tablas de multiplicación pre-computadas.
static GLOBAL_CONTEXT: LazyLock<Secp256k1<All>> = LazyLock::new(Secp256k1::new);

/// Acceso al contexto global de curva elíptica.
#[inline]
#[must_use]
pub fn global_context() -> &'static Secp256k1<All> {
    &GLOBAL_CONTEXT
}

/// Reconstruye un punto afín desde hexadecimal SEC1 (comprimido 02/03 o plano 04).
///
/// # Errors
/// `KeyFormat` ante hex ilegal; `ContextRejection` si el punto no pertenece
/// a la curva según el contexto de respaldo.
pub fn parse_public_key_hex(input: &str) -> Result<AffinePoint, MathError> {
    let trimmed = input.trim().trim_start_matches("0x").trim_start_matches("0X");
    let raw = hex::decode(trimmed)
        .map_err(|fault| MathError::KeyFormat(format!("invalid public key hex: {fault}")))?;
    if raw.len() != 33 && raw.len() != 65 {
        return Err(MathError::KeyFormat(format!(
            "SEC1 payload of {} bytes (expected 33 or 65)",
            raw.len()
        )));
    }
    let parsed = PublicKey::from_slice(&raw)?;
    affine_from_public_key(&parsed)
}

/// Derivación de base fija: k·G con k en [1, n-1].
///
/// # Errors
/// `InvalidScalar` para k = 0; `ContextRejection` ante material ilegal.
pub fn base_multiply(k: &Scalar) -> Result<AffinePoint, MathError> {
    if k.is_zero() {
        return Err(MathError::InvalidScalar);
    }
    let secret = SecretKey::from_slice(&k.to_be_bytes())?;
    let derived = PublicKey::from_secret_key(global_context(), &secret);
    affine_from_public_key(&derived)
}

/// Suma de puntos a través del contexto de respaldo: a + b.
///
/// # Errors
/// `ContextRejection` si la suma colapsa al punto en el infinito.
pub fn combine(a: &AffinePoint, b: &AffinePoint) -> Result<AffinePoint, MathError> {
    let left = public_key_from_affine(a)?;
    let right = public_key_from_affine(b)?;
    let merged = left.combine(&right)?;
    affine_from_public_key(&merged)
}

/// Desplazamiento escalar de un punto: P + delta·G (delta interpretado mod n).
///
/// # Errors
/// Propaga los fallos de derivación y combinación.
pub fn offset_by(point: &AffinePoint, delta: &Scalar) -> Result<AffinePoint, MathError> {
    if delta.is_zero() {
        return Ok(*point);
    }
    combine(point, &base_multiply(delta)?)
}

/// Certificación de clave candidata: ¿k·G = target?
#[must_use]
pub fn verify_candidate(k: &Scalar, target: &AffinePoint) -> bool {
    match base_multiply(k) {
        Ok(derived) => derived == *target,
        Err(_) => false,
    }
}

/// Serializa un punto afín en hexadecimal SEC1 comprimido.
///
/// # Errors
/// `ContextRejection` si las coordenadas no forman un punto válido.
pub fn to_compressed_hex(point: &AffinePoint) -> Result<String, MathError> {
    let key = public_key_from_affine(point)?;
    Ok(hex::encode(key.serialize()))
}

// --- PUENTES DE REPRESENTACIÓN ---

fn affine_from_public_key(key: &PublicKey) -> Result<AffinePoint, MathError> {
    AffinePoint::from_uncompressed_bytes(&key.serialize_uncompressed())
}

fn public_key_from_affine(point: &AffinePoint) -> Result<PublicKey, MathError> {
    Ok(PublicKey::from_slice(&point.to_uncompressed_bytes())?)
}
