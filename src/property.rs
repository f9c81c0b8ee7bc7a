//! Constrained scalar values attached to events and transitions.
//!
//! A [`Property`] describes a single annotated quantity such as the time of an event, the
//! concentration of the observed species or its derivative. Every property is in one of three
//! states, described by its [`Extent`]:
//!
//! | state    | meaning                                                  |
//! | -------- | -------------------------------------------------------- |
//! | unset    | nothing is required of the quantity                      |
//! | point    | the quantity must equal a single value                   |
//! | interval | the quantity must lie between a lower and an upper bound |
//!
//! Independently of its state, a property always carries a finite reference point (its
//! [center](Property::center)) which is used to seed future interactions even when the property
//! is unset.
//!
//! The behavior of each operation depends on the [`Variant`] of the property:
//!
//!   1. **Positive** properties (time, event concentration) live in `(0, ∞)`. A missing lower
//!      bound means `0` and a missing upper bound means `+∞`. Dragging a bound past the opposite
//!      one collapses the property into a point at the bound that was not moved.
//!   2. **Relative positive** properties (transition concentration) behave like positive ones,
//!      but their reference is derived from the neighbouring events and they have no point
//!      state, so a collapse unsets them instead.
//!   3. **Cyclic** properties (derivatives) represent a slope. The lower bound may exceed the
//!      upper one, in which case the property denotes a wrap-around sector. Bounds may be
//!      infinite (a vertical slope). Cyclic properties cannot be moved.
//!   4. **Relative cyclic** properties (transition derivative) are cyclic properties whose
//!      reference is the slope between the neighbouring events.
//!
//! ```rust
//! use ltl_annotator::property::{Bound, Property};
//!
//! let mut time = Property::positive_interval(2.0, 10.0).unwrap();
//! assert_eq!(time.center(), 6.0);
//!
//! // Moving the lower bound past the upper one collapses the property into a point
//! time.set_bound(Bound::Lower, 12.0).unwrap();
//! assert!(time.is_point());
//! assert_eq!(time.center(), 10.0);
//! ```

use std::fmt::{Display, Formatter};

use thiserror::Error;

/// One of the two end points of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    Upper,
    Lower,
}

impl Bound {
    /// Both bounds in the order used when combining properties.
    pub const ALL: [Bound; 2] = [Bound::Upper, Bound::Lower];

    /// The opposite end point.
    pub fn other(self) -> Self {
        match self {
            Self::Upper => Self::Lower,
            Self::Lower => Self::Upper,
        }
    }

    /// Value of a missing bound of a positive property.
    fn positive_infinity(self) -> f64 {
        match self {
            Self::Upper => f64::INFINITY,
            Self::Lower => 0.0,
        }
    }

    /// Value of a missing bound of a cyclic property.
    fn cyclic_infinity(self) -> f64 {
        match self {
            Self::Upper => f64::INFINITY,
            Self::Lower => f64::NEG_INFINITY,
        }
    }

    /// Returns `true` if setting this bound to `value` would cross `other`, the value of the
    /// opposite end point.
    fn exceeds(self, value: f64, other: f64) -> bool {
        match self {
            Self::Upper => value < other,
            Self::Lower => value > other,
        }
    }

    /// Returns `true` if `candidate` describes a wider interval than `current` for this bound.
    pub(crate) fn is_wider(self, candidate: f64, current: f64) -> bool {
        match self {
            Self::Upper => candidate > current,
            Self::Lower => candidate < current,
        }
    }
}

impl Display for Bound {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upper => write!(f, "upper"),
            Self::Lower => write!(f, "lower"),
        }
    }
}

/// Domain and reference behavior of a [`Property`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Value in `(0, ∞)` with its own reference point.
    Positive,

    /// Value in `(0, ∞)` whose reference is derived from the neighbouring events.
    RelativePositive,

    /// Slope with its own fixed reference, may wrap around.
    Cyclic,

    /// Slope whose reference is derived from the neighbouring events, may wrap around.
    RelativeCyclic,
}

impl Variant {
    pub fn is_cyclic(self) -> bool {
        matches!(self, Self::Cyclic | Self::RelativeCyclic)
    }

    pub fn is_relative(self) -> bool {
        matches!(self, Self::RelativePositive | Self::RelativeCyclic)
    }
}

impl Display for Variant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Positive => write!(f, "positive"),
            Self::RelativePositive => write!(f, "relative positive"),
            Self::Cyclic => write!(f, "cyclic"),
            Self::RelativeCyclic => write!(f, "relative cyclic"),
        }
    }
}

/// State of a property.
///
/// An interval of a positive property stores only the bounds that were explicitly set, a missing
/// bound is infinite. Cyclic intervals always store both bounds, possibly as infinities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Extent {
    Unset,
    Point(f64),
    Interval { lower: Option<f64>, upper: Option<f64> },
}

impl Extent {
    fn stored(&self, bound: Bound) -> Option<f64> {
        match (self, bound) {
            (Self::Interval { upper, .. }, Bound::Upper) => *upper,
            (Self::Interval { lower, .. }, Bound::Lower) => *lower,
            _ => None,
        }
    }

    fn with_bound(bound: Bound, value: f64, other: Option<f64>) -> Self {
        match bound {
            Bound::Upper => Self::Interval { lower: other, upper: Some(value) },
            Bound::Lower => Self::Interval { lower: Some(value), upper: other },
        }
    }
}

/// Errors produced when a property is given a value outside of its domain or asked to perform an
/// operation its variant does not support.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum PropertyError {
    #[error("Positive property cannot have value lesser or equal to zero: [{0}]")]
    NonPositive(f64),

    #[error("Property value is not a number")]
    NotANumber,

    #[error("Cannot {operation} a {variant} property")]
    Unsupported { operation: &'static str, variant: Variant },
}

pub(crate) fn check_positive(value: f64) -> Result<f64, PropertyError> {
    if value.is_nan() {
        Err(PropertyError::NotANumber)
    } else if value <= 0.0 {
        Err(PropertyError::NonPositive(value))
    } else {
        Ok(value)
    }
}

/// A constrained scalar value, see the [module documentation](self) for the semantics of each
/// variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property {
    variant: Variant,
    reference: f64,
    extent: Extent,
}

impl Property {
    /// Create an unset positive property with the given reference point.
    pub fn positive(reference: f64) -> Result<Self, PropertyError> {
        Ok(Self {
            variant: Variant::Positive,
            reference: check_positive(reference)?,
            extent: Extent::Unset,
        })
    }

    /// Create a positive property fixed to a single value.
    pub fn positive_point(value: f64) -> Result<Self, PropertyError> {
        let value = check_positive(value)?;

        Ok(Self {
            variant: Variant::Positive,
            reference: value,
            extent: Extent::Point(value),
        })
    }

    /// Create a bounded positive property centered between its bounds. Bounds given in the wrong
    /// order are swapped, equal bounds produce a point.
    pub fn positive_interval(lower: f64, upper: f64) -> Result<Self, PropertyError> {
        let lower = check_positive(lower)?;
        let upper = check_positive(upper)?;

        if lower == upper {
            return Self::positive_point(lower);
        }

        let (lower, upper) = if lower > upper { (upper, lower) } else { (lower, upper) };

        Ok(Self {
            variant: Variant::Positive,
            reference: (lower + upper) / 2.0,
            extent: Extent::Interval {
                lower: Some(lower),
                upper: Some(upper),
            },
        })
    }

    /// Create an unset cyclic property with a fixed reference slope.
    pub fn cyclic(reference: f64) -> Self {
        Self {
            variant: Variant::Cyclic,
            reference,
            extent: Extent::Unset,
        }
    }

    /// Create an unset relative positive property. Its reference is resolved by the owning
    /// timeline.
    pub fn relative_positive() -> Self {
        Self {
            variant: Variant::RelativePositive,
            reference: 0.0,
            extent: Extent::Unset,
        }
    }

    /// Create an unset relative cyclic property. Its reference is resolved by the owning
    /// timeline.
    pub fn relative_cyclic() -> Self {
        Self {
            variant: Variant::RelativeCyclic,
            reference: 0.0,
            extent: Extent::Unset,
        }
    }

    /// Assemble a property from already validated parts.
    pub(crate) fn from_parts(variant: Variant, reference: f64, extent: Extent) -> Self {
        Self { variant, reference, extent }
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn extent(&self) -> Extent {
        self.extent
    }

    /// The reference point. Always finite, also for unset properties.
    pub fn center(&self) -> f64 {
        self.reference
    }

    pub fn is_set(&self) -> bool {
        !matches!(self.extent, Extent::Unset)
    }

    pub fn is_point(&self) -> bool {
        matches!(self.extent, Extent::Point(_))
    }

    /// Value of a point property.
    pub fn point_value(&self) -> Option<f64> {
        match self.extent {
            Extent::Point(value) => Some(value),
            _ => None,
        }
    }

    /// Returns `true` if the given bound was explicitly set. Points have no bounds.
    pub fn has_bound(&self, bound: Bound) -> bool {
        self.extent.stored(bound).is_some()
    }

    /// Returns `true` if both bounds were explicitly set.
    pub fn has_bounds(&self) -> bool {
        self.has_bound(Bound::Lower) && self.has_bound(Bound::Upper)
    }

    /// Value of the given end point, or [`None`] if the property is unset.
    ///
    /// A point has both end points equal to its value. A missing bound of a positive property is
    /// reported as `0` for the lower and `+∞` for the upper end point.
    pub fn bound(&self, bound: Bound) -> Option<f64> {
        match self.extent {
            Extent::Unset => None,
            Extent::Point(value) => Some(value),
            Extent::Interval { .. } => {
                let missing = if self.variant.is_cyclic() {
                    bound.cyclic_infinity()
                } else {
                    bound.positive_infinity()
                };

                Some(self.extent.stored(bound).unwrap_or(missing))
            }
        }
    }

    /// Set the given bound and move the reference point accordingly.
    ///
    /// Positive properties are recentered between their bounds, other variants keep their
    /// reference point.
    pub fn set_bound(&mut self, bound: Bound, value: f64) -> Result<(), PropertyError> {
        self.stretch_bound(bound, value)?;
        self.refresh_reference();

        Ok(())
    }

    /// Set the given bound without changing the reference point. Used while dragging.
    pub fn stretch_bound(&mut self, bound: Bound, value: f64) -> Result<(), PropertyError> {
        match self.variant {
            Variant::Positive => self.stretch_positive(bound, value),
            Variant::RelativePositive => self.stretch_relative(bound, value),
            Variant::Cyclic | Variant::RelativeCyclic => self.stretch_cyclic(bound, value),
        }
    }

    fn stretch_positive(&mut self, bound: Bound, value: f64) -> Result<(), PropertyError> {
        let extent = match self.extent {
            Extent::Unset => Extent::Point(self.reference),
            extent => extent,
        };

        let other = match extent {
            Extent::Point(point) => Some(point),
            extent => extent.stored(bound.other()),
        };

        if let Some(other) = other {
            if bound.exceeds(value, other) {
                self.reference = other;
                self.extent = Extent::Point(other);
                return Ok(());
            }
        }

        let value = check_positive(value)?;

        self.extent = match extent {
            Extent::Point(point) => Extent::with_bound(bound, value, Some(point)),
            extent => Extent::with_bound(bound, value, extent.stored(bound.other())),
        };

        Ok(())
    }

    fn stretch_relative(&mut self, bound: Bound, value: f64) -> Result<(), PropertyError> {
        let other = self.extent.stored(bound.other());

        if let Some(other) = other {
            if bound.exceeds(value, other) {
                self.extent = Extent::Unset;
                return Ok(());
            }
        }

        let value = check_positive(value)?;
        self.extent = Extent::with_bound(bound, value, other);

        Ok(())
    }

    fn stretch_cyclic(&mut self, bound: Bound, value: f64) -> Result<(), PropertyError> {
        if value.is_nan() {
            return Err(PropertyError::NotANumber);
        }

        let other = match self.extent {
            Extent::Unset => bound.other().cyclic_infinity(),
            Extent::Point(point) => point,
            Extent::Interval { .. } => self
                .extent
                .stored(bound.other())
                .unwrap_or_else(|| bound.other().cyclic_infinity()),
        };

        self.extent = Extent::with_bound(bound, value, Some(other));

        Ok(())
    }

    /// Translate the reference point to `value`, shifting the point value or any set bounds by the
    /// same amount.
    ///
    /// A translation that would move the lower bound to zero or below is shortened so that the
    /// lower bound lands exactly at zero, which leaves the property without a lower bound. Only
    /// positive properties can be moved.
    pub fn move_to(&mut self, value: f64) -> Result<(), PropertyError> {
        if self.variant != Variant::Positive {
            return Err(self.unsupported("move"));
        }

        let value = check_positive(value)?;
        let mut delta = value - self.reference;
        let mut clamped = false;

        if let Some(lower) = self.extent.stored(Bound::Lower) {
            if lower + delta <= 0.0 {
                delta = -lower;
                clamped = true;
            }
        }

        self.reference += delta;
        self.extent = match self.extent {
            Extent::Unset => Extent::Unset,
            Extent::Point(point) => Extent::Point(point + delta),
            Extent::Interval { lower, upper } => {
                let lower = if clamped { None } else { lower.map(|lower| lower + delta) };
                let upper = upper.map(|upper| upper + delta);

                match (lower, upper) {
                    (None, None) => Extent::Unset,
                    (lower, upper) => Extent::Interval { lower, upper },
                }
            }
        };

        Ok(())
    }

    /// Make the given end point infinite. Unbinding the only remaining bound unsets the property.
    /// A positive point has no bound left and is unset, a cyclic point keeps its value as the
    /// opposite end point.
    pub fn unbind(&mut self, bound: Bound) {
        let other = match self.extent {
            Extent::Point(point) if self.variant.is_cyclic() => Some(point),
            Extent::Unset | Extent::Point(_) => None,
            extent => extent.stored(bound.other()),
        };

        self.extent = match other {
            Some(other) if self.variant.is_cyclic() && other.is_finite() => {
                Extent::with_bound(bound, bound.cyclic_infinity(), Some(other))
            }
            Some(other) if !self.variant.is_cyclic() => Extent::with_bound(bound.other(), other, None),
            _ => Extent::Unset,
        };
    }

    /// Collapse the property into a single value.
    ///
    /// Positive properties keep their point value, collapse to the midpoint of two bounds or to the
    /// reference point otherwise. Cyclic properties collapse to their finite upper bound, their
    /// finite lower bound or their reference slope, in that order. Relative positive properties
    /// have no point state.
    pub fn make_point(&mut self) -> Result<(), PropertyError> {
        match self.variant {
            Variant::RelativePositive => Err(self.unsupported("make a point from")),
            Variant::Positive => {
                let value = match self.extent {
                    Extent::Point(point) => point,
                    Extent::Interval {
                        lower: Some(lower),
                        upper: Some(upper),
                    } => (lower + upper) / 2.0,
                    _ => self.reference,
                };

                self.reference = value;
                self.extent = Extent::Point(value);
                Ok(())
            }
            Variant::Cyclic | Variant::RelativeCyclic => {
                let value = match self.extent {
                    Extent::Point(point) => point,
                    Extent::Interval { lower, upper } => upper
                        .filter(|upper| upper.is_finite())
                        .or_else(|| lower.filter(|lower| lower.is_finite()))
                        .unwrap_or(self.reference),
                    Extent::Unset => self.reference,
                };

                self.extent = Extent::Point(value);
                Ok(())
            }
        }
    }

    /// Make the property not set. The reference point is kept.
    pub fn unset(&mut self) {
        self.extent = Extent::Unset;
    }

    /// Recenter a bounded positive property between its bounds. Does nothing for other variants.
    pub fn refresh_reference(&mut self) {
        if self.variant != Variant::Positive {
            return;
        }

        if let Extent::Interval {
            lower: Some(lower),
            upper: Some(upper),
        } = self.extent
        {
            self.reference = (lower + upper) / 2.0;
        }
    }

    /// Replace the reference of a relative property with a value computed from its neighbours.
    pub(crate) fn resolve(&mut self, reference: f64) {
        debug_assert!(self.variant.is_relative());

        if reference.is_finite() {
            self.reference = reference;
        }
    }

    fn unsupported(&self, operation: &'static str) -> PropertyError {
        PropertyError::Unsupported {
            operation,
            variant: self.variant,
        }
    }
}

impl Display for Property {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.extent {
            Extent::Unset => write!(f, "({})", self.reference),
            Extent::Point(value) => write!(f, "{}", value),
            Extent::Interval { lower, upper } => {
                write!(f, "{}: (", self.reference)?;

                if let Some(lower) = lower {
                    write!(f, "{}", lower)?;
                }

                write!(f, ", ")?;

                if let Some(upper) = upper {
                    write!(f, "{}", upper)?;
                }

                write!(f, ")")
            }
        }
    }
}
