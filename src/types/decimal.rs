//! # Arbitrary-Precision Decimals
//!
//! [`Decimal`] stores a sign, a base-10 digit sequence and a base-10 exponent:
//!
//! ```text
//! value = (-1)^negative × digits × 10^exponent
//! ```
//!
//! plus the special forms NaN, +Infinity and -Infinity. Digits are kept as
//! written, so `1.50` is `[1, 5, 0] × 10^-2` and `1.5` is `[1, 5] × 10^-1`.
//! The two compare equal; the value encoding preserves the difference, the
//! key encoding does not.
//!
//! Digits borrow from a `DatumAlloc` arena when produced by a decoder and are
//! owned when produced by parsing or `from_i128`.
//!
//! ## Ordering
//!
//! ```text
//! NaN < -Infinity < negative finite < zero < positive finite < +Infinity
//! ```
//!
//! NaN equals NaN and -0 equals 0, matching SQL sort semantics.

use crate::error::CodecError;
use eyre::{bail, Result};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecimalForm {
    Finite,
    Infinite,
    NaN,
}

#[derive(Debug, Clone)]
pub struct Decimal<'a> {
    form: DecimalForm,
    negative: bool,
    exponent: i32,
    digits: Cow<'a, [u8]>,
}

impl<'a> Decimal<'a> {
    pub fn nan() -> Self {
        Self::special(DecimalForm::NaN, false)
    }

    pub fn infinity() -> Self {
        Self::special(DecimalForm::Infinite, false)
    }

    pub fn neg_infinity() -> Self {
        Self::special(DecimalForm::Infinite, true)
    }

    pub fn zero() -> Self {
        Self {
            form: DecimalForm::Finite,
            negative: false,
            exponent: 0,
            digits: Cow::Borrowed(&[]),
        }
    }

    fn special(form: DecimalForm, negative: bool) -> Self {
        Self {
            form,
            negative,
            exponent: 0,
            digits: Cow::Borrowed(&[]),
        }
    }

    /// Builds a finite decimal from its parts. Every digit must be in `0..=9`.
    pub fn from_parts(
        negative: bool,
        digits: impl Into<Cow<'a, [u8]>>,
        exponent: i32,
    ) -> Result<Self> {
        let digits = digits.into();
        if let Some(bad) = digits.iter().find(|d| **d > 9) {
            bail!(CodecError::invalid(format!("decimal digit out of range: {}", bad)));
        }
        Ok(Self::from_parts_unchecked(negative, digits, exponent))
    }

    pub(crate) fn from_parts_unchecked(
        negative: bool,
        digits: Cow<'a, [u8]>,
        exponent: i32,
    ) -> Self {
        Self {
            form: DecimalForm::Finite,
            negative,
            exponent,
            digits,
        }
    }

    pub fn form(&self) -> DecimalForm {
        self.form
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn exponent(&self) -> i32 {
        self.exponent
    }

    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    pub fn is_nan(&self) -> bool {
        self.form == DecimalForm::NaN
    }

    pub fn is_zero(&self) -> bool {
        self.form == DecimalForm::Finite && self.digits.iter().all(|d| *d == 0)
    }

    /// Returns the significant digits (no leading or trailing zeros) and the
    /// exponent `e` such that `|value| = 0.d1d2...dk × 10^e`. Zero yields an
    /// empty digit slice.
    pub fn significant(&self) -> (&[u8], i64) {
        let digits: &[u8] = &self.digits;
        let Some(first) = digits.iter().position(|d| *d != 0) else {
            return (&[], 0);
        };
        let last = digits.iter().rposition(|d| *d != 0).unwrap_or(first);
        let trailing = digits.len() - 1 - last;
        let sig = &digits[first..=last];
        let e10 = self.exponent as i64 + trailing as i64 + sig.len() as i64;
        (sig, e10)
    }

    fn rank(&self) -> u8 {
        match self.form {
            DecimalForm::NaN => 0,
            DecimalForm::Infinite if self.negative => 1,
            DecimalForm::Finite => 2,
            DecimalForm::Infinite => 3,
        }
    }

    fn sign_class(&self) -> i8 {
        if self.is_zero() {
            0
        } else if self.negative {
            -1
        } else {
            1
        }
    }

    /// Compares two decimals by numeric value, independent of scale.
    pub fn compare(&self, other: &Decimal) -> Ordering {
        match self.rank().cmp(&other.rank()) {
            Ordering::Equal => {}
            unequal => return unequal,
        }
        if self.form != DecimalForm::Finite {
            return Ordering::Equal;
        }

        let (sa, sb) = (self.sign_class(), other.sign_class());
        if sa != sb {
            return sa.cmp(&sb);
        }
        if sa == 0 {
            return Ordering::Equal;
        }

        let (da, ea) = self.significant();
        let (db, eb) = other.significant();
        let magnitude = ea.cmp(&eb).then_with(|| da.cmp(db));
        if sa < 0 {
            magnitude.reverse()
        } else {
            magnitude
        }
    }

    /// True when the digits live in a heap buffer of their own.
    pub(crate) fn owns_heap(&self) -> bool {
        matches!(&self.digits, Cow::Owned(d) if d.capacity() > 0)
    }

    pub fn into_owned(self) -> Decimal<'static> {
        Decimal {
            form: self.form,
            negative: self.negative,
            exponent: self.exponent,
            digits: Cow::Owned(self.digits.into_owned()),
        }
    }
}

impl Decimal<'static> {
    /// Builds `coefficient × 10^exponent`.
    pub fn from_i128(coefficient: i128, exponent: i32) -> Self {
        let digits: Vec<u8> = coefficient
            .unsigned_abs()
            .to_string()
            .bytes()
            .map(|b| b - b'0')
            .collect();
        Decimal::from_parts_unchecked(coefficient < 0, Cow::Owned(digits), exponent)
    }
}

impl PartialEq for Decimal<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Decimal<'_> {}

impl PartialOrd for Decimal<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Decimal<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl FromStr for Decimal<'static> {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (negative, body) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        if body.eq_ignore_ascii_case("nan") {
            return Ok(Decimal::nan());
        }
        if body.eq_ignore_ascii_case("infinity") || body.eq_ignore_ascii_case("inf") {
            return Ok(Decimal::special(DecimalForm::Infinite, negative));
        }

        let (mantissa, exp_part) = match body.find(|c: char| c == 'e' || c == 'E') {
            Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
            None => (body, None),
        };
        let mut exponent: i64 = match exp_part {
            Some(e) => e.parse::<i64>().map_err(|err| {
                CodecError::invalid(format!("invalid decimal exponent '{}': {}", e, err))
            })?,
            None => 0,
        };

        let mut digits = Vec::with_capacity(mantissa.len());
        let mut seen_point = false;
        for c in mantissa.bytes() {
            match c {
                b'0'..=b'9' => {
                    digits.push(c - b'0');
                    if seen_point {
                        exponent -= 1;
                    }
                }
                b'.' if !seen_point => seen_point = true,
                _ => bail!(CodecError::invalid(format!("invalid decimal literal '{}'", s))),
            }
        }
        if digits.is_empty() {
            bail!(CodecError::invalid(format!("invalid decimal literal '{}'", s)));
        }
        let exponent = i32::try_from(exponent).map_err(|_| {
            CodecError::overflow(format!("decimal exponent out of range in '{}'", s))
        })?;

        Ok(Decimal::from_parts_unchecked(negative, Cow::Owned(digits), exponent))
    }
}

impl fmt::Display for Decimal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.form {
            DecimalForm::NaN => return f.write_str("NaN"),
            DecimalForm::Infinite if self.negative => return f.write_str("-Infinity"),
            DecimalForm::Infinite => return f.write_str("Infinity"),
            DecimalForm::Finite => {}
        }

        if self.negative && !self.is_zero() {
            f.write_str("-")?;
        }
        let mut digits: String = self.digits.iter().map(|d| (b'0' + d) as char).collect();
        if digits.is_empty() {
            digits.push('0');
        }

        if self.exponent >= 0 {
            let int_part = digits.trim_start_matches('0');
            if int_part.is_empty() {
                return f.write_str("0");
            }
            if self.exponent > 20 {
                return write!(f, "{}E+{}", int_part, self.exponent);
            }
            return write!(f, "{}{}", int_part, "0".repeat(self.exponent as usize));
        }

        let scale = self.exponent.unsigned_abs() as usize;
        if scale > 40 {
            return write!(f, "{}E{}", digits, self.exponent);
        }
        if digits.len() > scale {
            let (int_part, frac_part) = digits.split_at(digits.len() - scale);
            let int_part = int_part.trim_start_matches('0');
            let int_part = if int_part.is_empty() { "0" } else { int_part };
            write!(f, "{}.{}", int_part, frac_part)
        } else {
            write!(f, "0.{}{}", "0".repeat(scale - digits.len()), digits)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal<'static> {
        s.parse().unwrap()
    }

    #[test]
    fn scale_does_not_affect_equality() {
        assert_eq!(dec("1.50"), dec("1.5"));
        assert_eq!(dec("100"), dec("1e2"));
        assert_eq!(dec("0.000"), dec("-0"));
    }

    #[test]
    fn ordering_across_magnitudes() {
        assert!(dec("1.50") < dec("2.5"));
        assert!(dec("-2.5") < dec("-1.50"));
        assert!(dec("0.12") < dec("0.1201"));
        assert!(dec("-0.1201") < dec("-0.12"));
        assert!(dec("99") < dec("100"));
        assert!(dec("-100") < dec("-99"));
        assert!(dec("-0.001") < dec("0"));
    }

    #[test]
    fn special_forms_order_outside_finite_values() {
        let nan = Decimal::nan();
        let neg_inf = Decimal::neg_infinity();
        let inf = Decimal::infinity();
        assert!(nan < neg_inf);
        assert!(neg_inf < dec("-1e300"));
        assert!(dec("1e300") < inf);
        assert_eq!(nan, Decimal::nan());
    }

    #[test]
    fn significant_strips_zeros() {
        let d = dec("001.2300");
        let (digits, e10) = d.significant();
        assert_eq!(digits, &[1, 2, 3]);
        assert_eq!(e10, 1);

        let small = dec("0.005");
        assert_eq!(small.significant(), (&[5u8][..], -2));
    }

    #[test]
    fn display_preserves_scale() {
        assert_eq!(dec("1.50").to_string(), "1.50");
        assert_eq!(dec("-0.05").to_string(), "-0.05");
        assert_eq!(dec("12e2").to_string(), "1200");
        assert_eq!(Decimal::from_i128(-12345, -2).to_string(), "-123.45");
        assert_eq!(dec("-inf").to_string(), "-Infinity");
    }

    #[test]
    fn rejects_garbage() {
        assert!("1.2.3".parse::<Decimal>().is_err());
        assert!("abc".parse::<Decimal>().is_err());
        assert!("".parse::<Decimal>().is_err());
        assert!(Decimal::from_parts(false, vec![1, 10], 0).is_err());
    }
}
