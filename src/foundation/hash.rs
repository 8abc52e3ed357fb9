use std::{fmt, str::FromStr};

use crate::foundation::error::{CryptomatteError, CryptomatteResult};

/// A 32-bit Cryptomatte identifier.
///
/// The hex, integer and float forms are views over the same bit pattern; only the
/// `u32` is stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct HashValue(pub u32);

impl HashValue {
    /// Parse exactly 8 hexadecimal digits (either case).
    pub fn from_hex(text: &str) -> CryptomatteResult<Self> {
        if text.len() != 8 {
            return Err(CryptomatteError::malformed_hash(format!(
                "expected 8 hex digits, got {} characters in '{text}'",
                text.len()
            )));
        }
        if !text.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CryptomatteError::malformed_hash(format!(
                "'{text}' contains non-hexadecimal characters"
            )));
        }
        u32::from_str_radix(text, 16)
            .map(Self)
            .map_err(|e| CryptomatteError::malformed_hash(format!("'{text}': {e}")))
    }

    /// Inverse of [`HashValue::to_f32`]: reinterpret the float's bits.
    pub fn from_f32(v: f32) -> Self {
        Self(v.to_bits())
    }

    /// Raw 32-bit value.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    /// 8 lowercase, zero-padded hex digits.
    pub fn to_hex(self) -> String {
        format!("{:08x}", self.0)
    }

    /// The same 32 bits reinterpreted as an IEEE-754 single.
    pub fn to_f32(self) -> f32 {
        f32::from_bits(self.0)
    }
}

impl fmt::Display for HashValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

impl From<u32> for HashValue {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Hash methods a Cryptomatte layer may declare.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum HashMethod {
    /// MurmurHash3 x86 32-bit, seed 0.
    #[default]
    #[serde(rename = "MurmurHash3_32")]
    MurmurHash3_32,
}

impl HashMethod {
    const ALL: &'static [HashMethod] = &[HashMethod::MurmurHash3_32];

    /// Name as written in image attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MurmurHash3_32 => "MurmurHash3_32",
        }
    }

    fn hasher(self) -> fn(&[u8]) -> u32 {
        match self {
            Self::MurmurHash3_32 => cryptomatte_murmur3,
        }
    }

    /// Hash `name` into a [`HashValue`].
    pub fn hash(self, name: &str) -> HashValue {
        HashValue((self.hasher())(name.as_bytes()))
    }
}

impl FromStr for HashMethod {
    type Err = CryptomatteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CryptomatteError::unsupported_hash_method(s))
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conversions from the 32-bit hash to the value stored in id channels.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub enum ConversionMethod {
    /// Bit-cast of the `u32` into an `f32`.
    #[default]
    #[serde(rename = "uint32_to_float32")]
    Uint32ToFloat32,
}

impl ConversionMethod {
    const ALL: &'static [ConversionMethod] = &[ConversionMethod::Uint32ToFloat32];

    /// Name as written in image attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uint32ToFloat32 => "uint32_to_float32",
        }
    }

    fn converter(self) -> fn(u32) -> f32 {
        match self {
            Self::Uint32ToFloat32 => f32::from_bits,
        }
    }

    /// Convert a hash into its id-channel sample.
    pub fn convert(self, v: HashValue) -> f32 {
        (self.converter())(v.0)
    }
}

impl FromStr for ConversionMethod {
    type Err = CryptomatteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| CryptomatteError::unsupported_conversion_method(s))
    }
}

impl fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Hash `name` with the method named `method`.
pub fn hash_name(name: &str, method: &str) -> CryptomatteResult<HashValue> {
    Ok(method.parse::<HashMethod>()?.hash(name))
}

/// Reinterpret `v` with the conversion named `method`.
pub fn hash_to_float(v: HashValue, method: &str) -> CryptomatteResult<f32> {
    Ok(method.parse::<ConversionMethod>()?.convert(v))
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Murmur3x86_32(u32);

impl Murmur3x86_32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    pub(crate) fn new(seed: u32) -> Self {
        Self(seed)
    }

    fn mix_k(k: u32) -> u32 {
        k.wrapping_mul(Self::C1)
            .rotate_left(15)
            .wrapping_mul(Self::C2)
    }

    /// One-shot hash of `bytes`; the block/tail split needs the full input.
    pub(crate) fn hash(self, bytes: &[u8]) -> u32 {
        let mut h = self.0;

        let mut blocks = bytes.chunks_exact(4);
        for block in &mut blocks {
            let k = u32::from_le_bytes([block[0], block[1], block[2], block[3]]);
            h ^= Self::mix_k(k);
            h = h.rotate_left(13).wrapping_mul(5).wrapping_add(0xe654_6b64);
        }

        let tail = blocks.remainder();
        if !tail.is_empty() {
            let mut k = 0u32;
            for (i, &b) in tail.iter().enumerate() {
                k |= u32::from(b) << (8 * i);
            }
            h ^= Self::mix_k(k);
        }

        h ^= bytes.len() as u32;
        h ^= h >> 16;
        h = h.wrapping_mul(0x85eb_ca6b);
        h ^= h >> 13;
        h = h.wrapping_mul(0xc2b2_ae35);
        h ^ (h >> 16)
    }
}

// Ids whose float view would be denormal, inf or NaN get bit 23 flipped.
fn cryptomatte_murmur3(bytes: &[u8]) -> u32 {
    let h = Murmur3x86_32::new(0).hash(bytes);
    let exponent = (h >> 23) & 0xff;
    if exponent == 0 || exponent == 0xff {
        h ^ (1 << 23)
    } else {
        h
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/hash.rs"]
mod tests;
