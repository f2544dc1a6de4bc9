// [libs/core/math-engine/src/field.rs]
/*!
 * =================================================================
 * APARATO: FINITE FIELD ELEMENT ENGINE (V4.0 - SOLINAS GOLD)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: ARITMÉTICA MODULAR SECP256K1 DEL HOT-LOOP
 *
 * # Mathematical Proof (secp256k1 Field):
 * Opera sobre el cuerpo finito definido por p = 2^256 - 2^32 - 977.
 * Como 2^256 ≡ 0x1000003D1 (mod p), el producto de 512 bits se reduce
 * con dos plegados Solinas consecutivos: el primero absorbe las cuatro
 * palabras altas, el segundo absorbe el acarreo residual (< 2^34), y a
 * lo sumo restan dos sustracciones condicionales de p.
 * La representación interna utiliza 4 palabras de 64 bits Little-Endian.
 * =================================================================
 */

use crate::errors::MathError;

/// El primo de la curva secp256k1 (p = 2^256 - 2^32 - 977), palabras Little-Endian.
pub const FIELD_PRIME: [u64; 4] = [
    0xFFFFFFFEFFFFFC2F,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
];

/// Constante de plegado Solinas: 2^256 mod p.
const SOLINAS_FOLD: u128 = 0x1000003D1;

/// Exponente de la raíz cuadrada (p + 1) / 4; válido porque p ≡ 3 (mod 4).
const SQRT_EXPONENT: [u64; 4] = [
    0xFFFFFFFFBFFFFF0C,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0x3FFFFFFFFFFFFFFF,
];

/// Elemento del cuerpo finito Fp. El valor reside siempre en [0, p-1].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldElement {
    /// Palabras de 64 bits Little-Endian.
    pub words: [u64; 4],
}

impl FieldElement {
    /// Elemento nulo del cuerpo.
    pub const ZERO: Self = Self { words: [0; 4] };
    /// Elemento unidad del cuerpo.
    pub const ONE: Self = Self { words: [1, 0, 0, 0] };

    /// Constructor atómico desde un escalar de 64 bits.
    #[inline(always)]
    #[must_use]
    pub const fn from_u64(value: u64) -> Self {
        Self { words: [value, 0, 0, 0] }
    }

    /// Constructor directo desde palabras de 64 bits. Asume valor < p.
    #[inline(always)]
    #[must_use]
    pub const fn from_words(words: [u64; 4]) -> Self {
        Self { words }
    }

    /// Construye un elemento desde un buffer Big-Endian de 32 bytes.
    /// Aplica una reducción de un solo paso si el valor es >= p.
    #[must_use]
    pub fn from_be_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (index, word) in words.iter_mut().enumerate() {
            let start = (3 - index) * 8;
            *word = u64::from_be_bytes(bytes[start..start + 8].try_into().unwrap());
        }
        let mut element = Self { words };
        if element.is_geq_prime() {
            element = element.subtract_prime();
        }
        element
    }

    /// Construye un elemento desde un volcado Little-Endian de 32 bytes
    /// (formato de los ficheros de trabajo).
    #[must_use]
    pub fn from_le_bytes(bytes: &[u8; 32]) -> Self {
        let mut words = [0u64; 4];
        for (index, word) in words.iter_mut().enumerate() {
            let start = index * 8;
            *word = u64::from_le_bytes(bytes[start..start + 8].try_into().unwrap());
        }
        let mut element = Self { words };
        if element.is_geq_prime() {
            element = element.subtract_prime();
        }
        element
    }

    /// Serializa al estándar Big-Endian de 32 bytes (interoperabilidad SEC1).
    #[inline(always)]
    #[must_use]
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for index in 0..4 {
            let start = (3 - index) * 8;
            bytes[start..start + 8].copy_from_slice(&self.words[index].to_be_bytes());
        }
        bytes
    }

    /// Serializa como volcado Little-Endian de 32 bytes (ficheros de trabajo).
    #[inline(always)]
    #[must_use]
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let mut bytes = [0u8; 32];
        for index in 0..4 {
            let start = index * 8;
            bytes[start..start + 8].copy_from_slice(&self.words[index].to_le_bytes());
        }
        bytes
    }

    /// Palabra baja del elemento; alimenta el predicado DP y el selector de salto.
    #[inline(always)]
    #[must_use]
    pub fn low_u64(&self) -> u64 {
        self.words[0]
    }

    /// Las 128 posiciones bajas del elemento, empacadas en u128.
    #[inline(always)]
    #[must_use]
    pub fn low_u128(&self) -> u128 {
        (self.words[0] as u128) | ((self.words[1] as u128) << 64)
    }

    // --- INTERFAZ ARITMÉTICA NOMINAL ---

    /// Adición modular: (self + other) mod p.
    #[inline(always)]
    #[must_use]
    pub fn add_modular(&self, other: &Self) -> Self {
        let mut result = [0u64; 4];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let sum = (self.words[i] as u128) + (other.words[i] as u128) + carry;
            result[i] = sum as u64;
            carry = sum >> 64;
        }
        let mut element = Self { words: result };
        if carry != 0 || element.is_geq_prime() {
            element = element.subtract_prime();
        }
        element
    }

    /// Sustracción modular: (self - other) mod p.
    #[inline(always)]
    #[must_use]
    pub fn subtract_modular(&self, other: &Self) -> Self {
        let mut result = [0u64; 4];
        let mut borrow: i128 = 0;
        for i in 0..4 {
            let difference =
                (self.words[i] as i128) - (other.words[i] as i128) - borrow;
            if difference < 0 {
                result[i] = (difference + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                result[i] = difference as u64;
                borrow = 0;
            }
        }
        let mut element = Self { words: result };
        if borrow != 0 {
            element = element.add_prime();
        }
        element
    }

    /// Negación modular: (p - self) mod p.
    #[inline(always)]
    #[must_use]
    pub fn negate_modular(&self) -> Self {
        if self.is_zero() {
            return Self::ZERO;
        }
        Self { words: FIELD_PRIME }.subtract_modular(self)
    }

    /// Multiplicación modular: (self * other) mod p vía producto 512 + doble plegado.
    #[inline(always)]
    #[must_use]
    pub fn multiply_modular(&self, other: &Self) -> Self {
        let mut wide = [0u64; 8];
        for i in 0..4 {
            let mut carry: u128 = 0;
            for j in 0..4 {
                let product = (self.words[i] as u128) * (other.words[j] as u128)
                    + (wide[i + j] as u128)
                    + carry;
                wide[i + j] = product as u64;
                carry = product >> 64;
            }
            wide[i + 4] = carry as u64;
        }
        Self::reduce_wide(&wide)
    }

    /// Cuadrado modular: (self^2) mod p.
    #[inline(always)]
    #[must_use]
    pub fn square_modular(&self) -> Self {
        self.multiply_modular(self)
    }

    /// Plegado Solinas del producto de 512 bits al rango [0, p-1].
    #[inline(always)]
    fn reduce_wide(wide: &[u64; 8]) -> Self {
        // Primer plegado: low + high * (2^256 mod p)
        let mut folded = [0u64; 4];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let term =
                (wide[i] as u128) + (wide[i + 4] as u128) * SOLINAS_FOLD + carry;
            folded[i] = term as u64;
            carry = term >> 64;
        }

        // Segundo plegado: el acarreo residual es < 2^34
        let low = (folded[0] as u128) + carry * SOLINAS_FOLD;
        let mut result = [0u64; 4];
        result[0] = low as u64;
        let mut propagation = low >> 64;
        for i in 1..4 {
            let word = (folded[i] as u128) + propagation;
            result[i] = word as u64;
            propagation = word >> 64;
        }

        // Desbordamiento final: 2^256 ≡ SOLINAS_FOLD, y ya no puede re-acarrear
        if propagation != 0 {
            let word = (result[0] as u128) + SOLINAS_FOLD;
            result[0] = word as u64;
            let mut spill = word >> 64;
            let mut index = 1;
            while spill != 0 && index < 4 {
                let next = (result[index] as u128) + spill;
                result[index] = next as u64;
                spill = next >> 64;
                index += 1;
            }
        }

        let mut element = Self { words: result };
        while element.is_geq_prime() {
            element = element.subtract_prime();
        }
        element
    }

    /// Exponenciación modular por cuadrados sucesivos (exponente en palabras LE).
    #[must_use]
    pub fn pow_words(&self, exponent: &[u64; 4]) -> Self {
        let mut base = *self;
        let mut accumulator = Self::ONE;
        for &word in exponent {
            let mut remaining = word;
            for _ in 0..64 {
                if remaining & 1 == 1 {
                    accumulator = accumulator.multiply_modular(&base);
                }
                base = base.square_modular();
                remaining >>= 1;
            }
        }
        accumulator
    }

    /// Inversión modular vía Pequeño Teorema de Fermat (self^(p-2)).
    ///
    /// # Errors
    /// Retorna `MathError::ZeroInversion` si el elemento es nulo.
    pub fn invert(&self) -> Result<Self, MathError> {
        if self.is_zero() {
            return Err(MathError::ZeroInversion);
        }
        let mut exponent = FIELD_PRIME;
        exponent[0] -= 2;
        Ok(self.pow_words(&exponent))
    }

    /// Raíz cuadrada modular: self^((p+1)/4), válida porque p ≡ 3 (mod 4).
    ///
    /// # Errors
    /// Retorna `MathError::NonResidue` si el elemento no es residuo cuadrático.
    pub fn sqrt(&self) -> Result<Self, MathError> {
        let candidate = self.pow_words(&SQRT_EXPONENT);
        if candidate.square_modular() == *self {
            Ok(candidate)
        } else {
            Err(MathError::NonResidue)
        }
    }

    /// Inversión por lote (Montgomery Trick) sobre el slice completo, in situ.
    ///
    /// Amortiza el coste Fermat: una sola inversión real por ráfaga de la
    /// manada, el resto son tres multiplicaciones por elemento.
    ///
    /// # Errors
    /// Retorna `MathError::BatchZeroDenominator` con el índice del primer
    /// denominador nulo; el lote no se modifica en ese caso.
    pub fn batch_invert_in_place(
        elements: &mut [Self],
        scratch: &mut Vec<Self>,
    ) -> Result<(), MathError> {
        let count = elements.len();
        if count == 0 {
            return Ok(());
        }

        scratch.clear();
        scratch.reserve(count);

        let mut running_product = Self::ONE;
        for (index, element) in elements.iter().enumerate() {
            if element.is_zero() {
                return Err(MathError::BatchZeroDenominator(index));
            }
            running_product = running_product.multiply_modular(element);
            scratch.push(running_product);
        }

        let mut inverse_accumulator = running_product.invert()?;
        for index in (1..count).rev() {
            let inverted = inverse_accumulator.multiply_modular(&scratch[index - 1]);
            inverse_accumulator = inverse_accumulator.multiply_modular(&elements[index]);
            elements[index] = inverted;
        }
        elements[0] = inverse_accumulator;

        Ok(())
    }

    /// Determina si el elemento es el cero del cuerpo.
    #[inline(always)]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&word| word == 0)
    }

    /// Paridad del representante canónico en [0, p-1].
    #[inline(always)]
    #[must_use]
    pub fn is_odd(&self) -> bool {
        (self.words[0] & 1) == 1
    }

    // --- AUXILIARES TÉCNICOS ---

    #[inline(always)]
    fn is_geq_prime(&self) -> bool {
        for i in (0..4).rev() {
            if self.words[i] > FIELD_PRIME[i] {
                return true;
            }
            if self.words[i] < FIELD_PRIME[i] {
                return false;
            }
        }
        true
    }

    fn subtract_prime(&self) -> Self {
        let mut result = [0u64; 4];
        let mut borrow: i128 = 0;
        for i in 0..4 {
            let difference =
                (self.words[i] as i128) - (FIELD_PRIME[i] as i128) - borrow;
            if difference < 0 {
                result[i] = (difference + (1i128 << 64)) as u64;
                borrow = 1;
            } else {
                result[i] = difference as u64;
                borrow = 0;
            }
        }
        Self { words: result }
    }

    fn add_prime(&self) -> Self {
        let mut result = [0u64; 4];
        let mut carry: u128 = 0;
        for i in 0..4 {
            let sum = (self.words[i] as u128) + (FIELD_PRIME[i] as u128) + carry;
            result[i] = sum as u64;
            carry = sum >> 64;
        }
        Self { words: result }
    }
}

impl PartialOrd for FieldElement {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FieldElement {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        for i in (0..4).rev() {
            match self.words[i].cmp(&other.words[i]) {
                std::cmp::Ordering::Equal => continue,
                ordering => return ordering,
            }
        }
        std::cmp::Ordering::Equal
    }
}
