// [libs/core/math-engine/src/lib.rs]
#![deny(missing_docs)]

/*!
 * =================================================================
 * APARATO: LAMBDA MATH MASTER HUB (V4.0 - SOVEREIGN SYNC)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: ARITMÉTICA SECP256K1 PARA EL BARRIDO CANGURO
 *
 * # Mathematical Proof (Dual Strata):
 * El aparato separa dos estratos aritméticos: el cuerpo Fp artesanal
 * (field/point) que alimenta el Hot-Loop de saltos con inversión por
 * lote, y el contexto 'secp256k1' (keys) que deriva y certifica claves
 * fuera del bucle. Una clave recuperada solo se acepta si el estrato
 * ajeno confirma k·G = P.
 * =================================================================
 */

/// Catálogo de fallos aritméticos y geométricos del sistema.
pub mod errors;
/// Aritmética del cuerpo finito Fp (p = 2^256 - 2^32 - 977) con plegado Solinas.
pub mod field;
/// Gestión de puntos afines y ley de grupo con inverso compartido.
pub mod point;
/// Aritmética módulo n (orden de la curva secp256k1).
pub mod scalar;
/// Derivación, combinación y certificación de claves vía contexto secp256k1.
pub mod keys;

pub use errors::MathError;
pub use field::FieldElement;
pub use point::AffinePoint;
pub use scalar::Scalar;
