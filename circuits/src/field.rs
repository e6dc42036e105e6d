//! Prime field arithmetic over p = 2^251 + 17·2^192 + 1
//!
//! Every value produced by arithmetic or reduction is in `[0, p)`. The only
//! way to hold a non-canonical value is decoding raw proof bytes, which the
//! verifier range-checks explicitly.

use num_bigint::{BigInt, BigUint, Sign};
use num_traits::{FromPrimitive, One, Zero};
use serde::{Serialize, Serializer};
use std::fmt;
use std::ops::{Add, Mul};
use std::sync::OnceLock;

use crate::error::FieldError;

/// Byte width of an encoded field element
pub const FIELD_BYTES: usize = 32;

/// Fixed-point scale applied to float inputs before reduction
pub const FLOAT_SCALE: f64 = 1e10;

/// The field modulus, shared by every component
pub fn modulus() -> &'static BigUint {
    static MODULUS: OnceLock<BigUint> = OnceLock::new();
    MODULUS.get_or_init(|| {
        (BigUint::one() << 251u32) + (BigUint::from(17u32) << 192u32) + BigUint::one()
    })
}

/// Element of the prime field
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct FieldElement(BigUint);

impl FieldElement {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Reduce an arbitrary signed integer into `[0, p)`.
    ///
    /// Negative inputs wrap (`-1` maps to `p - 1`) instead of failing.
    pub fn reduce(raw: &BigInt) -> Self {
        let p = BigInt::from_biguint(Sign::Plus, modulus().clone());
        let mut r = raw % &p;
        if r.sign() == Sign::Minus {
            r += &p;
        }
        let (_, magnitude) = r.into_parts();
        Self(magnitude)
    }

    /// Reduce an unsigned integer into `[0, p)`
    pub fn from_biguint(raw: BigUint) -> Self {
        Self(raw % modulus())
    }

    pub fn from_i128(raw: i128) -> Self {
        Self::reduce(&BigInt::from(raw))
    }

    /// Scale a float by 1e10, truncate toward zero, then reduce.
    pub fn from_scaled_f64(value: f64) -> Result<Self, FieldError> {
        let scaled = (value * FLOAT_SCALE).trunc();
        if !scaled.is_finite() {
            return Err(FieldError::NonFinite(value));
        }
        let raw = BigInt::from_f64(scaled).ok_or(FieldError::NonFinite(value))?;
        Ok(Self::reduce(&raw))
    }

    /// Decode 32 big-endian bytes without reducing.
    ///
    /// Used only by the proof codec so the verifier can see out-of-range words.
    pub(crate) fn from_be_bytes_unreduced(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// Encode as exactly 32 big-endian bytes, `None` if the value is wider
    pub fn to_be_bytes(&self) -> Option<[u8; FIELD_BYTES]> {
        let raw = self.0.to_bytes_be();
        if raw.len() > FIELD_BYTES {
            return None;
        }
        let mut out = [0u8; FIELD_BYTES];
        out[FIELD_BYTES - raw.len()..].copy_from_slice(&raw);
        Some(out)
    }

    /// Whether the value lies in `[0, p)`
    pub fn is_canonical(&self) -> bool {
        self.0 < *modulus()
    }

    pub fn square(&self) -> Self {
        self * self
    }

    /// S-box: x^5 via x^2, x^4, x^4·x
    pub fn pow5(&self) -> Self {
        let x2 = self.square();
        let x4 = x2.square();
        &x4 * self
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", self.0.to_str_radix(16))
    }

    /// Parse decimal or `0x`-prefixed hex, reducing the result
    pub fn parse(s: &str) -> Option<Self> {
        let raw = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex_digits) => BigUint::parse_bytes(hex_digits.as_bytes(), 16)?,
            None => BigUint::parse_bytes(s.as_bytes(), 10)?,
        };
        Some(Self::from_biguint(raw))
    }
}

impl From<u64> for FieldElement {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for FieldElement {
    fn from(value: u128) -> Self {
        // 2^128 < p, no reduction needed
        Self(BigUint::from(value))
    }
}

impl From<bool> for FieldElement {
    fn from(value: bool) -> Self {
        Self::from(u64::from(value))
    }
}

impl Add for &FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: &FieldElement) -> FieldElement {
        FieldElement((&self.0 + &rhs.0) % modulus())
    }
}

impl Add for FieldElement {
    type Output = FieldElement;

    fn add(self, rhs: FieldElement) -> FieldElement {
        &self + &rhs
    }
}

impl Mul for &FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: &FieldElement) -> FieldElement {
        FieldElement((&self.0 * &rhs.0) % modulus())
    }
}

impl Mul for FieldElement {
    type Output = FieldElement;

    fn mul(self, rhs: FieldElement) -> FieldElement {
        &self * &rhs
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_hex())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
