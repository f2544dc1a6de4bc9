// [libs/core/math-engine/src/point.rs]
/*!
 * =================================================================
 * APARATO: AFFINE POINT ENGINE (V4.0 - BATCH SYNERGY)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: LEY DE GRUPO AFÍN CON INVERSO COMPARTIDO
 *
 * # Mathematical Proof (Chord Addition):
 * Para P1 ≠ ±P2: λ = (y2-y1)/(x2-x1), x3 = λ² - x1 - x2,
 * y3 = λ(x1-x3) - y1. El Hot-Loop de la manada entrega el inverso
 * (x2-x1)^-1 pre-computado por lote, dejando la suma en 2M + 1S.
 * =================================================================
 */

use crate::errors::MathError;
use crate::field::FieldElement;

/// Coeficiente independiente de la ecuación de Weierstrass y² = x³ + 7.
const CURVE_B: FieldElement = FieldElement::from_words([7, 0, 0, 0]);

/// Punto afín sobre secp256k1. Los constructores garantizan pertenencia a la curva.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AffinePoint {
    /// Coordenada X en Fp.
    pub x: FieldElement,
    /// Coordenada Y en Fp.
    pub y: FieldElement,
}

impl AffinePoint {
    /// Constructor directo desde coordenadas. No valida pertenencia.
    #[inline(always)]
    #[must_use]
    pub const fn from_coordinates(x: FieldElement, y: FieldElement) -> Self {
        Self { x, y }
    }

    /// Predicado de pertenencia: y² = x³ + 7.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        let left = self.y.square_modular();
        let right = self
            .x
            .square_modular()
            .multiply_modular(&self.x)
            .add_modular(&CURVE_B);
        left == right
    }

    /// Adición de cuerda con el inverso de (other.x - self.x) ya resuelto.
    ///
    /// El invariante del llamador es que ambas X difieren; el motor de la
    /// manada descarta los canguros degenerados antes de armar el lote.
    #[inline(always)]
    #[must_use]
    pub fn add_with_inverse(&self, other: &Self, dx_inverse: &FieldElement) -> Self {
        let slope = other.y.subtract_modular(&self.y).multiply_modular(dx_inverse);
        let x3 = slope
            .square_modular()
            .subtract_modular(&self.x)
            .subtract_modular(&other.x);
        let y3 = self
            .x
            .subtract_modular(&x3)
            .multiply_modular(&slope)
            .subtract_modular(&self.y);
        Self { x: x3, y: y3 }
    }

    /// Adición completa de dos puntos, resolviendo la inversión internamente.
    ///
    /// # Errors
    /// - `PointAtInfinity` si other = -self.
    /// - Propaga fallos de inversión del cuerpo.
    pub fn add(&self, other: &Self) -> Result<Self, MathError> {
        if self.x == other.x {
            if self.y == other.y {
                return self.double();
            }
            return Err(MathError::PointAtInfinity);
        }
        let dx = other.x.subtract_modular(&self.x);
        let dx_inverse = dx.invert()?;
        Ok(self.add_with_inverse(other, &dx_inverse))
    }

    /// Duplicación afín: λ = 3x² / 2y.
    ///
    /// # Errors
    /// `PointAtInfinity` si y = 0 (punto de orden dos; inexistente en secp256k1).
    pub fn double(&self) -> Result<Self, MathError> {
        if self.y.is_zero() {
            return Err(MathError::PointAtInfinity);
        }
        let x_squared = self.x.square_modular();
        let numerator = x_squared.add_modular(&x_squared).add_modular(&x_squared);
        let denominator = self.y.add_modular(&self.y);
        let slope = numerator.multiply_modular(&denominator.invert()?);
        let x3 = slope
            .square_modular()
            .subtract_modular(&self.x)
            .subtract_modular(&self.x);
        let y3 = self
            .x
            .subtract_modular(&x3)
            .multiply_modular(&slope)
            .subtract_modular(&self.y);
        Ok(Self { x: x3, y: y3 })
    }

    /// Punto opuesto: (x, p - y).
    #[inline(always)]
    #[must_use]
    pub fn negate(&self) -> Self {
        Self { x: self.x, y: self.y.negate_modular() }
    }

    /// Canonicaliza bajo la simetría (x, y) ≡ (x, -y): conserva la Y menor.
    /// Retorna el punto canónico y si hubo reflexión.
    #[inline(always)]
    #[must_use]
    pub fn canonical_symmetric(&self) -> (Self, bool) {
        let mirrored_y = self.y.negate_modular();
        if mirrored_y < self.y {
            (Self { x: self.x, y: mirrored_y }, true)
        } else {
            (*self, false)
        }
    }

    /// Serialización SEC1 no comprimida (prefijo 0x04).
    #[must_use]
    pub fn to_uncompressed_bytes(&self) -> [u8; 65] {
        let mut buffer = [0u8; 65];
        buffer[0] = 0x04;
        buffer[1..33].copy_from_slice(&self.x.to_be_bytes());
        buffer[33..65].copy_from_slice(&self.y.to_be_bytes());
        buffer
    }

    /// Reconstrucción desde serialización SEC1 no comprimida, con validación.
    ///
    /// # Errors
    /// `KeyFormat` ante prefijo ajeno a 0x04; `OffCurve` si falla la ecuación.
    pub fn from_uncompressed_bytes(bytes: &[u8; 65]) -> Result<Self, MathError> {
        if bytes[0] != 0x04 {
            return Err(MathError::KeyFormat(format!(
                "unexpected SEC1 prefix 0x{:02x}",
                bytes[0]
            )));
        }
        let x = FieldElement::from_be_bytes(&bytes[1..33].try_into().unwrap());
        let y = FieldElement::from_be_bytes(&bytes[33..65].try_into().unwrap());
        let point = Self { x, y };
        if !point.is_on_curve() {
            return Err(MathError::OffCurve);
        }
        Ok(point)
    }
}
