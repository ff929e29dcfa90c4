//! Capability descriptors for format negotiation.
//!
//! A [`VideoCaps`] is one alternative the downstream side can accept:
//! a pixel-format constraint plus dimension and pixel-aspect-ratio
//! constraints. A [`CapsSet`] is an ordered collection of alternatives,
//! "any one of these is acceptable".
//!
//! The constraint lattice [`CapsValue`] supports intersection (finding
//! common ground), fixation (choosing a value) and nearest-value
//! snapping (the workhorse of geometry fixation).
//!
//! ```rust
//! use prism::caps::{CapsValue, VideoCaps};
//! use prism::format::PixelFormat;
//!
//! // Downstream accepts NV12 or RGBA at up to 4K
//! let caps = VideoCaps {
//!     pixel_format: CapsValue::List(vec![PixelFormat::Nv12, PixelFormat::Rgba]),
//!     width: CapsValue::Range { min: 64, max: 4096 },
//!     height: CapsValue::Range { min: 64, max: 4096 },
//!     ..VideoCaps::any()
//! };
//! assert!(!caps.is_fixed());
//! ```

use crate::format::{InterlaceMode, PixelFormat, VideoFormat};
use crate::fraction::Fraction;
use smallvec::SmallVec;

// ============================================================================
// CapsValue - constraint value for negotiation
// ============================================================================

/// A value that can be fixed, range, list, or any.
///
/// Used in caps negotiation to express constraints on format
/// parameters. List order is preference order; it is preserved by every
/// operation so negotiation stays deterministic.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum CapsValue<T> {
    /// Exact value (fully constrained).
    Fixed(T),
    /// Range of acceptable values (inclusive).
    Range {
        /// Minimum acceptable value.
        min: T,
        /// Maximum acceptable value.
        max: T,
    },
    /// List of acceptable values (ordered by preference, first is best).
    List(Vec<T>),
    /// Any value accepted (unconstrained).
    #[default]
    Any,
}

impl<T: Clone + Ord> CapsValue<T> {
    /// Check if a value is accepted by this constraint.
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Self::Fixed(v) => v == value,
            Self::Range { min, max } => value >= min && value <= max,
            Self::List(values) => values.contains(value),
            Self::Any => true,
        }
    }

    /// Intersect two constraints, finding common values.
    ///
    /// Returns `None` if there's no overlap.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        match (self, other) {
            (Self::Any, other) => Some(other.clone()),
            (this, Self::Any) => Some(this.clone()),

            (Self::Fixed(a), Self::Fixed(b)) => (a == b).then(|| Self::Fixed(a.clone())),

            (Self::Fixed(v), Self::Range { min, max })
            | (Self::Range { min, max }, Self::Fixed(v)) => {
                (v >= min && v <= max).then(|| Self::Fixed(v.clone()))
            }

            (Self::Fixed(v), Self::List(list)) | (Self::List(list), Self::Fixed(v)) => {
                list.contains(v).then(|| Self::Fixed(v.clone()))
            }

            (
                Self::Range {
                    min: min1,
                    max: max1,
                },
                Self::Range {
                    min: min2,
                    max: max2,
                },
            ) => {
                let new_min = min1.max(min2);
                let new_max = max1.min(max2);
                if new_min > new_max {
                    None
                } else if new_min == new_max {
                    Some(Self::Fixed(new_min.clone()))
                } else {
                    Some(Self::Range {
                        min: new_min.clone(),
                        max: new_max.clone(),
                    })
                }
            }

            // Range vs List: filter list to values in range
            (Self::Range { min, max }, Self::List(list))
            | (Self::List(list), Self::Range { min, max }) => {
                let filtered: Vec<T> = list
                    .iter()
                    .filter(|v| *v >= min && *v <= max)
                    .cloned()
                    .collect();
                Self::from_values(filtered)
            }

            // List vs List: common values, preserving order from the first
            (Self::List(list1), Self::List(list2)) => {
                let common: Vec<T> = list1
                    .iter()
                    .filter(|v| list2.contains(v))
                    .cloned()
                    .collect();
                Self::from_values(common)
            }
        }
    }

    fn from_values(values: Vec<T>) -> Option<Self> {
        match values.len() {
            0 => None,
            1 => values.into_iter().next().map(Self::Fixed),
            _ => Some(Self::List(values)),
        }
    }

    /// Fixate: choose a single value from the constraint.
    ///
    /// Returns the preferred value (first in list, min in range).
    /// Returns `None` for `Any` (cannot fixate without a target).
    pub fn fixate(&self) -> Option<T> {
        match self {
            Self::Fixed(v) => Some(v.clone()),
            Self::Range { min, .. } => Some(min.clone()),
            Self::List(values) => values.first().cloned(),
            Self::Any => None,
        }
    }

    /// Check if this is a fixed value.
    #[inline]
    pub fn is_fixed(&self) -> bool {
        matches!(self, Self::Fixed(_))
    }

    /// Check if this accepts any value.
    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    /// Get the fixed value if this is fixed.
    #[inline]
    pub fn as_fixed(&self) -> Option<&T> {
        match self {
            Self::Fixed(v) => Some(v),
            _ => None,
        }
    }

    /// True if a range constraint is internally inconsistent (min > max).
    ///
    /// Never produced by this crate's own relaxation; can arise from a
    /// peer-merged range and must fail negotiation.
    pub fn is_degenerate(&self) -> bool {
        match self {
            Self::Range { min, max } => min > max,
            Self::List(values) => values.is_empty(),
            _ => false,
        }
    }

    /// True if every value this constraint accepts is also accepted by
    /// `other` (non-strict subset).
    ///
    /// Conservative for `Range` vs `List`: reported as not-a-subset
    /// rather than enumerating the range.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        match (self, other) {
            (_, Self::Any) => true,
            (Self::Any, _) => false,

            (Self::Fixed(v), _) => other.accepts(v),

            (
                Self::Range {
                    min: min1,
                    max: max1,
                },
                Self::Range {
                    min: min2,
                    max: max2,
                },
            ) => min2 <= min1 && max1 <= max2,
            (Self::Range { min, max }, Self::Fixed(v)) => min == v && max == v,
            (Self::Range { .. }, Self::List(_)) => false,

            (Self::List(values), _) => values.iter().all(|v| other.accepts(v)),
        }
    }
}

impl CapsValue<u32> {
    /// Snap an integer target to the nearest accepted value.
    ///
    /// Fixed returns the fixed value, ranges clamp, lists pick the
    /// closest entry (first wins on ties), `Any` accepts the target.
    /// Returns `None` for degenerate constraints.
    pub fn snap(&self, target: u32) -> Option<u32> {
        match self {
            Self::Fixed(v) => Some(*v),
            Self::Range { min, max } => (min <= max).then(|| target.clamp(*min, *max)),
            Self::List(values) => values
                .iter()
                .copied()
                .reduce(|best, v| {
                    if v.abs_diff(target) < best.abs_diff(target) {
                        v
                    } else {
                        best
                    }
                }),
            Self::Any => Some(target),
        }
    }
}

impl CapsValue<Fraction> {
    /// Snap a fraction target to the nearest accepted value.
    ///
    /// Distances are compared with exact cross-multiplication; ties
    /// keep the earlier candidate.
    pub fn snap(&self, target: Fraction) -> Option<Fraction> {
        match self {
            Self::Fixed(v) => Some(*v),
            Self::Range { min, max } => {
                if min > max {
                    None
                } else if target < *min {
                    Some(*min)
                } else if target > *max {
                    Some(*max)
                } else {
                    Some(target)
                }
            }
            Self::List(values) => values
                .iter()
                .copied()
                .reduce(|best, v| if v.closer_to(&target, &best) { v } else { best }),
            Self::Any => Some(target),
        }
    }
}

impl<T: Clone + Ord> From<T> for CapsValue<T> {
    fn from(value: T) -> Self {
        Self::Fixed(value)
    }
}

impl<T: Clone + Ord> From<std::ops::RangeInclusive<T>> for CapsValue<T> {
    fn from(range: std::ops::RangeInclusive<T>) -> Self {
        let (min, max) = range.into_inner();
        Self::Range { min, max }
    }
}

// ============================================================================
// VideoCaps - one capability descriptor
// ============================================================================

/// One alternative format descriptor in a capability set.
///
/// A descriptor is *fixed* when pixel format, width and height all hold
/// a single concrete value; an absent PAR counts as `1/1`.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct VideoCaps {
    /// Pixel format constraint.
    pub pixel_format: CapsValue<PixelFormat>,
    /// Width constraint in pixels.
    pub width: CapsValue<u32>,
    /// Height constraint in pixels.
    pub height: CapsValue<u32>,
    /// Pixel-aspect-ratio constraint; `None` means the field is absent
    /// (treated as `1/1` where an algorithm step needs a value).
    pub par: Option<CapsValue<Fraction>>,
    /// Interlace mode; `None` accepts any.
    pub interlace: Option<InterlaceMode>,
}

impl VideoCaps {
    /// A descriptor with no constraints.
    pub fn any() -> Self {
        Self::default()
    }

    /// A descriptor constrained to one pixel format, dimensions open.
    pub fn for_format(format: PixelFormat) -> Self {
        Self {
            pixel_format: CapsValue::Fixed(format),
            ..Self::default()
        }
    }

    /// A fully fixed descriptor mirroring a concrete format.
    pub fn from_fixed(format: &VideoFormat) -> Self {
        Self {
            pixel_format: CapsValue::Fixed(format.pixel_format),
            width: CapsValue::Fixed(format.width),
            height: CapsValue::Fixed(format.height),
            par: Some(CapsValue::Fixed(format.par)),
            interlace: Some(format.interlace),
        }
    }

    /// Set fixed dimensions.
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = CapsValue::Fixed(width);
        self.height = CapsValue::Fixed(height);
        self
    }

    /// Set dimension ranges.
    pub fn with_size_range(mut self, min_w: u32, max_w: u32, min_h: u32, max_h: u32) -> Self {
        self.width = CapsValue::Range {
            min: min_w,
            max: max_w,
        };
        self.height = CapsValue::Range {
            min: min_h,
            max: max_h,
        };
        self
    }

    /// Set a fixed pixel aspect ratio.
    pub fn with_par(mut self, par: Fraction) -> Self {
        self.par = Some(CapsValue::Fixed(par));
        self
    }

    /// True when every transform-relevant field is a single value.
    pub fn is_fixed(&self) -> bool {
        self.pixel_format.is_fixed()
            && self.width.is_fixed()
            && self.height.is_fixed()
            && self.par.as_ref().map_or(true, CapsValue::is_fixed)
    }

    /// Convert to a concrete format, if fixed.
    ///
    /// An absent PAR becomes `1/1`; an absent interlace mode becomes
    /// progressive.
    pub fn to_format(&self) -> Option<VideoFormat> {
        let pixel_format = *self.pixel_format.as_fixed()?;
        let width = *self.width.as_fixed()?;
        let height = *self.height.as_fixed()?;
        let par = match &self.par {
            Some(v) => *v.as_fixed()?,
            None => Fraction::ONE,
        };
        Some(VideoFormat {
            width,
            height,
            pixel_format,
            par,
            interlace: self.interlace.unwrap_or_default(),
        })
    }

    /// Intersect two descriptors field by field.
    pub fn intersect(&self, other: &Self) -> Option<Self> {
        let par = match (&self.par, &other.par) {
            (None, None) => None,
            (Some(p), None) | (None, Some(p)) => Some(p.clone()),
            (Some(a), Some(b)) => Some(a.intersect(b)?),
        };
        let interlace = match (self.interlace, other.interlace) {
            (None, i) | (i, None) => i,
            (Some(a), Some(b)) => {
                if a == b {
                    Some(a)
                } else {
                    return None;
                }
            }
        };
        Some(Self {
            pixel_format: self.pixel_format.intersect(&other.pixel_format)?,
            width: self.width.intersect(&other.width)?,
            height: self.height.intersect(&other.height)?,
            par,
            interlace,
        })
    }

    /// Non-strict subset check: everything `self` accepts, `other` does.
    pub fn is_subset_of(&self, other: &Self) -> bool {
        let par_subset = match (&self.par, &other.par) {
            (_, None) => true,
            (None, Some(p)) => p.accepts(&Fraction::ONE),
            (Some(a), Some(b)) => a.is_subset_of(b),
        };
        let interlace_subset = match (self.interlace, other.interlace) {
            (_, None) => true,
            (None, Some(_)) => false,
            (Some(a), Some(b)) => a == b,
        };
        self.pixel_format.is_subset_of(&other.pixel_format)
            && self.width.is_subset_of(&other.width)
            && self.height.is_subset_of(&other.height)
            && par_subset
            && interlace_subset
    }
}

// ============================================================================
// CapsSet - ordered set of alternatives
// ============================================================================

/// Ordered, deduplicated sequence of format descriptors.
///
/// Order is insertion order and is preserved through every operation;
/// the dedup/merge rules are scan-order dependent, so this is
/// deliberately a sequence and never a hash set. A descriptor that is a
/// non-strict subset of an earlier one is dropped on append.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct CapsSet {
    entries: SmallVec<[VideoCaps; 4]>,
}

impl CapsSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a set holding one descriptor.
    pub fn single(caps: VideoCaps) -> Self {
        let mut set = Self::new();
        set.push(caps);
        set
    }

    /// Append a descriptor unless an earlier one already subsumes it.
    ///
    /// Returns true if the descriptor was kept.
    pub fn push(&mut self, caps: VideoCaps) -> bool {
        if self.entries.iter().any(|earlier| caps.is_subset_of(earlier)) {
            return false;
        }
        self.entries.push(caps);
        true
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the set holds no descriptors.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Descriptor at `index`.
    pub fn get(&self, index: usize) -> Option<&VideoCaps> {
        self.entries.get(index)
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &VideoCaps> {
        self.entries.iter()
    }

    /// Intersect against another set.
    ///
    /// Descriptors are paired in `self`-major order (every descriptor
    /// of `self` against every descriptor of `other`), so the first
    /// set's preference order dominates the result.
    pub fn intersect(&self, other: &Self) -> Self {
        let mut result = Self::new();
        for a in &self.entries {
            for b in &other.entries {
                if let Some(caps) = a.intersect(b) {
                    result.push(caps);
                }
            }
        }
        result
    }
}

impl FromIterator<VideoCaps> for CapsSet {
    fn from_iter<I: IntoIterator<Item = VideoCaps>>(iter: I) -> Self {
        let mut set = Self::new();
        for caps in iter {
            set.push(caps);
        }
        set
    }
}

impl<'a> IntoIterator for &'a CapsSet {
    type Item = &'a VideoCaps;
    type IntoIter = std::slice::Iter<'a, VideoCaps>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
