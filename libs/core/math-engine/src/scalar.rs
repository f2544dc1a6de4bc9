// [libs/core/math-engine/src/scalar.rs]
/*!
 * =================================================================
 * APARATO: SCALAR ORDER ENGINE (V4.0 - LAMBDA HARDENED)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: ARITMÉTICA MODULO N (ORDEN DE LA CURVA SECP256K1)
 *
 * # Mathematical Proof (Atomic Reduction):
 * Como n > 2^255, todo valor de 256 bits dista de su residuo módulo n
 * en a lo sumo una sustracción de n. Las distancias de los canguros se
 * portan en este anillo: "negativa" significa representante > n/2, y
 * la magnitud real es n - d.
 * =================================================================
 */

use crate::errors::MathError;

/// El orden 'n' de la curva secp256k1, palabras de 64 bits Little-Endian.
/// n = FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFE BAAEDCE6 AF48A03B BFD25E8C D0364141
pub const CURVE_ORDER: [u64; 4] = [
    0xBFD25E8CD0364141,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0xFFFFFFFFFFFFFFFF,
];

/// Umbral de signo: n / 2. Representantes por encima codifican distancias negativas.
pub const HALF_ORDER: [u64; 4] = [
    0xDFE92F46681B20A0,
    0x5D576E7357A4501D,
    0xFFFFFFFFFFFFFFFF,
    0x7FFFFFFFFFFFFFFF,
];

/// Escalar de 256 bits interpretado módulo el orden n de la curva.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Scalar {
    /// Palabras de 64 bits Little-Endian; invariante: valor < n.
    pub limbs: [u64; 4],
}

impl Scalar {
    /// Escalar nulo.
    pub const ZERO: Self = Self { limbs: [0; 4] };
    /// Escalar unidad.
    pub const ONE: Self = Self { limbs: [1, 0, 0, 0] };

    /// Constructor desde palabras Little-Endian con reducción atómica.
    #[must_use]
    pub fn from_limbs(limbs: [u64; 4]) -> Self {
        let mut candidate = Self { limbs };
        if candidate.is_geq_order() {
            candidate = candidate.subtract_order();
        }
        candidate
    }

    /// Constructor atómico desde un valor de 64 bits.
    #[inline(always)]
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self { limbs: [value, 0, 0, 0] }
    }

    /// Constructor atómico desde un valor de 128 bits.
    #[inline(always)]
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self { limbs: [value as u64, (value >> 64) as u64, 0, 0] }
    }

    /// Construye desde un buffer Big-Endian de 32 bytes, reduciendo módulo n.
    #[must_use]
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (index, limb) in limbs.iter_mut().enumerate() {
            let start = (3 - index) * 8;
            *limb = u64::from_be_bytes(bytes[start..start + 8].try_into().unwrap());
        }
        Self::from_limbs(limbs)
    }

    /// Construye desde un volcado Little-Endian de 32 bytes (ficheros de trabajo).
    #[must_use]
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (index, limb) in limbs.iter_mut().enumerate() {
            let start = index * 8;
            *limb = u64::from_le_bytes(bytes[start..start + 8].try_into().unwrap());
        }
        Self::from_limbs(limbs)
    }

    /// Construye desde una cadena hexadecimal (con o sin prefijo 0x).
    ///
    /// # Errors
    /// Retorna `MathError::KeyFormat` ante hex inválido o de más de 64 dígitos.
    pub fn from_hex_str(input: &str) -> Result<Self, MathError> {
        let trimmed = input.trim().trim_start_matches("0x").trim_start_matches("0X");
        if trimmed.is_empty() || trimmed.len() > 64 {
            return Err(MathError::KeyFormat(format!(
                "hex scalar length {} out of bounds",
                trimmed.len()
            )));
        }
        let padded = format!("{trimmed:0>64}");
        let raw = hex::decode(&padded)
            .map_err(|fault| MathError::KeyFormat(format!("invalid hex scalar: {fault}")))?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&raw);
        Ok(Self::from_be_bytes(&bytes))
    }

    /// Serializa al estándar Big-Endian de 32 bytes.
    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for index in 0..4 {
            let start = (3 - index) * 8;
            bytes[start..start + 8].copy_from_slice(&self.limbs[index].to_be_bytes());
        }
        bytes
    }

    /// Serializa como volcado Little-Endian de 32 bytes (ficheros de trabajo).
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for index in 0..4 {
            let start = index * 8;
            bytes[start..start + 8].copy_from_slice(&self.limbs[index].to_le_bytes());
        }
        bytes
    }

    /// Representación hexadecimal minúscula sin ceros a la izquierda.
    #[must_use]
    pub fn to_hex(&self) -> String {
        let full = hex::encode(self.to_be_bytes());
        let trimmed = full.trim_start_matches('0');
        if trimmed.is_empty() { "0".to_string() } else { trimmed.to_string() }
    }

    /// Proyección a u128 si las palabras altas son nulas.
    #[must_use]
    pub fn to_u128(&self) -> Option<u128> {
        if self.limbs[2] == 0 && self.limbs[3] == 0 {
            Some((self.limbs[0] as u128) | ((self.limbs[1] as u128) << 64))
        } else {
            None
        }
    }

    // --- ANILLO MODULO N ---

    /// Adición modular: (self + other) mod n.
    #[must_use]
    pub fn add_mod(&self, other: &Self) -> Self {
        let mut result = [0u64; 4];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let sum = (self.limbs[i] as u128) + (other.limbs[i] as u128) + carry;
            result[i] = sum as u64;
            carry = sum >> 64;
        }
        if carry != 0 {
            // Desbordó 2^256: sumar el complemento 2^256 - n equivale a restar n.
            let complement = Self::order_complement();
            let mut spill: u128 = 0;
            for i in 0..4 {
                let sum = (result[i] as u128) + (complement[i] as u128) + spill;
                result[i] = sum as u64;
                spill = sum >> 64;
            }
            return Self { limbs: result };
        }
        Self::from_limbs(result)
    }

    /// Sustracción modular: (self - other) mod n.
    #[must_use]
    pub fn sub_mod(&self, other: &Self) -> Self {
        let mut result = [0u64; 4];
        let mut borrow: i128 = 0;
        for i in 0..4 {
            let difference =
                (self.limbs[i] as i128) - (other.limbs[i] as i128) - borrow;
            if difference < 0 {
                result[i] = (difference + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                result[i] = difference as u64;
                borrow = 0;
            }
        }
        if borrow != 0 {
            let mut carry: u128 = 0;
            for i in 0..4 {
                let sum = (result[i] as u128) + (CURVE_ORDER[i] as u128) + carry;
                result[i] = sum as u64;
                carry = sum >> 64;
            }
        }
        Self { limbs: result }
    }

    /// Negación modular: (n - self) mod n.
    #[must_use]
    pub fn negate_mod(&self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        Self { limbs: CURVE_ORDER }.sub_mod(self)
    }

    /// Reconstruye el representante modular desde magnitud y signo.
    #[must_use]
    pub fn from_magnitude(magnitude: &Self, is_negative: bool) -> Self {
        if is_negative { magnitude.negate_mod() } else { *magnitude }
    }

    /// Descompone en (magnitud, es_negativa) según el umbral n/2.
    #[must_use]
    pub fn magnitude_and_sign(&self) -> (Self, bool) {
        if self.is_high() {
            (self.negate_mod(), true)
        } else {
            (*self, false)
        }
    }

    /// Determina si el representante excede n/2 (distancia negativa).
    #[must_use]
    pub fn is_high(&self) -> bool {
        for i in (0..4).rev() {
            if self.limbs[i] > HALF_ORDER[i] {
                return true;
            }
            if self.limbs[i] < HALF_ORDER[i] {
                return false;
            }
        }
        false
    }

    /// Promedio entero inferior: (self + other) >> 1, exacto en 257 bits.
    #[must_use]
    pub fn average_floor(&self, other: &Self) -> Self {
        let mut extended = [0u64; 5];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let sum = (self.limbs[i] as u128) + (other.limbs[i] as u128) + carry;
            extended[i] = sum as u64;
            carry = sum >> 64;
        }
        extended[4] = carry as u64;

        let mut result = [0u64; 4];
        for i in 0..4 {
            result[i] = (extended[i] >> 1) | (extended[i + 1] << 63);
        }
        Self::from_limbs(result)
    }

    /// Mitad entera inferior del escalar (corrimiento de un bit).
    #[must_use]
    pub fn half_floor(&self) -> Self {
        let mut result = [0u64; 4];
        for i in 0..3 {
            result[i] = (self.limbs[i] >> 1) | (self.limbs[i + 1] << 63);
        }
        result[3] = self.limbs[3] >> 1;
        Self { limbs: result }
    }

    /// Determina si el escalar es nulo.
    #[inline(always)]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    /// Posición del bit más significativo activo, más uno (0 para el nulo).
    #[must_use]
    pub fn bit_length(&self) -> u32 {
        for i in (0..4).rev() {
            if self.limbs[i] != 0 {
                return (i as u32) * 64 + (64 - self.limbs[i].leading_zeros());
            }
        }
        0
    }

    // --- AUXILIARES TÉCNICOS ---

    #[inline(always)]
    fn is_geq_order(&self) -> bool {
        for i in (0..4).rev() {
            if self.limbs[i] > CURVE_ORDER[i] {
                return true;
            }
            if self.limbs[i] < CURVE_ORDER[i] {
                return false;
            }
        }
        true
    }

    fn subtract_order(&self) -> Self {
        let mut result = [0u64; 4];
        let mut borrow: i128 = 0;
        for i in 0..4 {
            let difference =
                (self.limbs[i] as i128) - (CURVE_ORDER[i] as i128) - borrow;
            if difference < 0 {
                result[i] = (difference + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                result[i] = difference as u64;
                borrow = 0;
            }
        }
        Self { limbs: result }
    }

    /// Complemento del orden: 2^256 - n.
    fn order_complement() -> [u64; 4] {
        let mut complement = [0u64; 4];
        let mut borrow: i128 = 0;
        for i in 0..4 {
            let difference = 0i128 - (CURVE_ORDER[i] as i128) - borrow;
            if difference < 0 {
                complement[i] = (difference + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                complement[i] = difference as u64;
                borrow = 0;
            }
        }
        complement
    }
}

impl PartialOrd for Scalar {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scalar {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for i in (0..4).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                std::cmp::Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        std::cmp::Ordering::Equal
    }
}
