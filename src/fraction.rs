//! Exact rational arithmetic for aspect-ratio math.
//!
//! Caps fixation compares and derives pixel-aspect-ratio and
//! display-aspect-ratio values. All of it happens in integer
//! numerator/denominator space so results are reproducible bit-for-bit;
//! no floating point is involved on the negotiation path.

use std::cmp::Ordering;
use std::fmt;

/// Largest numerator/denominator kept after reduction.
///
/// Products of two 32-bit fractions can exceed `u32`; when exact
/// reduction cannot bring them back down, the value is approximated by
/// the best rational with terms below this bound (continued-fraction
/// convergents), which is also what keeps denominator searches bounded.
const TERM_BOUND: u64 = u32::MAX as u64;

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        let t = b;
        b = a % b;
        a = t;
    }
    a.max(1)
}

/// A reduced fraction `num/den` (8 bytes, Copy).
///
/// Always stored in lowest terms with a non-zero denominator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Fraction {
    num: u32,
    den: u32,
}

impl Fraction {
    /// The identity ratio `1/1`.
    pub const ONE: Self = Self { num: 1, den: 1 };

    /// Create a reduced fraction.
    ///
    /// A zero denominator is treated as 1 so the type stays total;
    /// callers validating peer input should reject it beforehand.
    pub fn new(num: u32, den: u32) -> Self {
        let den = den.max(1);
        let g = gcd(num as u64, den as u64) as u32;
        Self {
            num: num / g,
            den: den / g,
        }
    }

    /// Numerator in lowest terms.
    #[inline]
    pub fn num(&self) -> u32 {
        self.num
    }

    /// Denominator in lowest terms.
    #[inline]
    pub fn den(&self) -> u32 {
        self.den
    }

    /// True for `n/n` ratios (square pixels when used as a PAR).
    #[inline]
    pub fn is_one(&self) -> bool {
        self.num == self.den
    }

    /// Build a fraction from 64-bit terms.
    ///
    /// Reduces exactly; if the reduced terms still exceed 32 bits the
    /// closest convergent with bounded terms is returned instead.
    pub fn from_ratio(num: u64, den: u64) -> Self {
        let den = den.max(1);
        let g = gcd(num, den);
        let (num, den) = (num / g, den / g);
        if num <= TERM_BOUND && den <= TERM_BOUND {
            return Self {
                num: num as u32,
                den: den as u32,
            };
        }
        approximate(num, den)
    }

    /// Multiply two fractions exactly, reducing the 64-bit product.
    pub fn mul(&self, other: &Self) -> Self {
        Self::from_ratio(
            self.num as u64 * other.num as u64,
            self.den as u64 * other.den as u64,
        )
    }

    /// Multiply by the reciprocal of `other`.
    pub fn div(&self, other: &Self) -> Self {
        Self::from_ratio(
            self.num as u64 * other.den as u64,
            self.den as u64 * other.num.max(1) as u64,
        )
    }

    /// Reciprocal (`den/num`).
    pub fn invert(&self) -> Self {
        Self {
            num: self.den,
            den: self.num.max(1),
        }
    }

    /// Scale an integer by this fraction, rounding to nearest.
    ///
    /// Saturates at `u32::MAX`; never divides by zero.
    pub fn scale(&self, value: u32) -> u32 {
        scale_round(value, self.num as u64, self.den as u64)
    }

    /// Absolute distance to another fraction, as an unreduced ratio.
    ///
    /// `|a/b - c/d| = |ad - cb| / bd`. Returned unreduced so callers can
    /// compare two distances by cross-multiplication without losing
    /// precision.
    fn distance(&self, other: &Self) -> (u64, u64) {
        let ad = self.num as u64 * other.den as u64;
        let cb = other.num as u64 * self.den as u64;
        (ad.abs_diff(cb), self.den as u64 * other.den as u64)
    }

    /// True if `self` is strictly closer to `target` than `other` is.
    ///
    /// Ties report false, so scan-order callers keep the first match.
    pub fn closer_to(&self, target: &Self, other: &Self) -> bool {
        let (n1, d1) = self.distance(target);
        let (n2, d2) = other.distance(target);
        (n1 as u128) * (d2 as u128) < (n2 as u128) * (d1 as u128)
    }
}

impl Default for Fraction {
    fn default() -> Self {
        Self::ONE
    }
}

impl PartialOrd for Fraction {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fraction {
    fn cmp(&self, other: &Self) -> Ordering {
        // Compare as fractions: a/b vs c/d => a*d vs c*b
        let lhs = self.num as u64 * other.den as u64;
        let rhs = other.num as u64 * self.den as u64;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Fraction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

impl From<(u32, u32)> for Fraction {
    fn from((num, den): (u32, u32)) -> Self {
        Self::new(num, den)
    }
}

/// Scale `value * num / den` in 128-bit space, rounding to nearest.
pub(crate) fn scale_round(value: u32, num: u64, den: u64) -> u32 {
    let den = den.max(1) as u128;
    let scaled = (value as u128 * num as u128 + den / 2) / den;
    scaled.min(u32::MAX as u128) as u32
}

/// Best rational approximation with terms bounded by [`TERM_BOUND`].
///
/// Walks the continued-fraction convergents of `num/den` and keeps the
/// last one whose numerator and denominator both fit. A ratio whose
/// integer part alone exceeds the bound saturates to `TERM_BOUND/1`.
fn approximate(mut num: u64, mut den: u64) -> Fraction {
    let (mut p0, mut q0) = (0u64, 1u64);
    let (mut p1, mut q1) = (1u64, 0u64);

    while den != 0 {
        let a = num / den;
        let p2 = a.checked_mul(p1).and_then(|v| v.checked_add(p0));
        let q2 = a.checked_mul(q1).and_then(|v| v.checked_add(q0));
        match (p2, q2) {
            (Some(p2), Some(q2)) if p2 <= TERM_BOUND && q2 <= TERM_BOUND => {
                (p0, q0) = (p1, q1);
                (p1, q1) = (p2, q2);
            }
            _ => break,
        }
        (num, den) = (den, num % den);
    }

    if q1 == 0 {
        // no convergent fit; the value is beyond representable range
        return Fraction {
            num: TERM_BOUND as u32,
            den: 1,
        };
    }
    Fraction {
        num: p1 as u32,
        den: q1 as u32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_on_construction() {
        let f = Fraction::new(30000, 1001);
        assert_eq!((f.num(), f.den()), (30000, 1001));
        let g = Fraction::new(720 * 10, 480 * 11);
        assert_eq!((g.num(), g.den()), (15, 11));
    }

    #[test]
    fn zero_denominator_is_total() {
        let f = Fraction::new(4, 0);
        assert_eq!(f.den(), 1);
    }

    #[test]
    fn ordering_uses_cross_multiplication() {
        let a = Fraction::new(1, 3);
        let b = Fraction::new(2, 5);
        assert!(a < b);
        assert_eq!(Fraction::new(2, 4), Fraction::new(1, 2));
    }

    #[test]
    fn multiply_is_exact() {
        // 1920/1080 * 10/11 = 160/99
        let dar = Fraction::new(1920, 1080).mul(&Fraction::new(10, 11));
        assert_eq!((dar.num(), dar.den()), (160, 99));
    }

    #[test]
    fn scale_rounds_to_nearest() {
        // 576 * 15/11 = 785.45..
        let f = Fraction::new(15, 11);
        assert_eq!(f.scale(576), 785);
        // 576 * 16/11 = 837.8..
        assert_eq!(Fraction::new(16, 11).scale(576), 838);
    }

    #[test]
    fn oversized_integer_part_saturates() {
        let f = Fraction::from_ratio(u64::MAX, 1);
        assert_eq!((f.num(), f.den()), (u32::MAX, 1));
        let g = Fraction::from_ratio((u32::MAX as u64) * 2, 1);
        assert_eq!((g.num(), g.den()), (u32::MAX, 1));
    }

    #[test]
    fn oversized_terms_are_approximated() {
        let big = (u32::MAX as u64) * 3 + 1;
        let f = Fraction::from_ratio(big, big - 2);
        // value is within rounding distance of 1
        assert!(f.num() == f.den() || f.num().abs_diff(f.den()) <= 1);
    }

    #[test]
    fn closer_to_prefers_first_on_tie() {
        let target = Fraction::new(1, 1);
        let a = Fraction::new(2, 1);
        let b = Fraction::new(1, 2);
        // |2 - 1| = 1, |1/2 - 1| = 1/2: b is strictly closer
        assert!(b.closer_to(&target, &a));
        assert!(!a.closer_to(&target, &b));
        // equal distances: neither is "closer"
        assert!(!a.closer_to(&target, &a));
    }
}
