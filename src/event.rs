use std::fmt::{Display, Formatter};

use ordered_float::OrderedFloat;

use crate::coordinates::{Point, Rect, Transformation, INT_END};
use crate::property::{Bound, Property, PropertyError};

/// Stable identifier of an event inside a timeline.
///
/// Identifiers are assigned by the timeline when an event is added and never reused, so
/// transitions can refer to their neighbours without holding references to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EventId(pub(crate) u64);

impl EventId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl Display for EventId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A point in the course of a time series, constrained in time, concentration and derivative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Event {
    id: EventId,
    time: Property,
    concentration: Property,
    derivative: Property,
}

impl Event {
    /// Create an event with nothing set, referencing the given point of the time series.
    pub fn new(time: f64, concentration: f64) -> Result<Self, PropertyError> {
        Ok(Self::from_properties(
            Property::positive(time)?,
            Property::positive(concentration)?,
            Property::cyclic(0.0),
        ))
    }

    /// Create an event requiring exactly the given time and concentration.
    pub fn point(time: f64, concentration: f64) -> Result<Self, PropertyError> {
        Ok(Self::from_properties(
            Property::positive_point(time)?,
            Property::positive_point(concentration)?,
            Property::cyclic(0.0),
        ))
    }

    pub fn from_properties(time: Property, concentration: Property, derivative: Property) -> Self {
        Self {
            id: EventId::default(),
            time,
            concentration,
            derivative,
        }
    }

    pub fn id(&self) -> EventId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: EventId) {
        self.id = id;
    }

    pub fn time(&self) -> &Property {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut Property {
        &mut self.time
    }

    pub fn concentration(&self) -> &Property {
        &self.concentration
    }

    pub fn concentration_mut(&mut self) -> &mut Property {
        &mut self.concentration
    }

    pub fn derivative(&self) -> &Property {
        &self.derivative
    }

    pub fn derivative_mut(&mut self) -> &mut Property {
        &mut self.derivative
    }

    /// Key by which events are ordered in a timeline.
    pub fn time_key(&self) -> OrderedFloat<f64> {
        OrderedFloat(self.time.center())
    }

    /// Returns `true` if none of the properties is set.
    pub fn is_empty(&self) -> bool {
        !self.time.is_set() && !self.concentration.is_set() && !self.derivative.is_set()
    }

    /// Preference of this event among overlapping ones, smaller values are preferred.
    ///
    /// | priority | shape                                   |
    /// | -------- | --------------------------------------- |
    /// | 0        | single point                            |
    /// | 1        | interval in concentration               |
    /// | 2        | interval in time                        |
    /// | 3        | bounded interval in both                |
    /// | 4        | interval in both, unbounded on any side |
    ///
    /// The values are only guidelines, do not use them to discern the shape of an event.
    pub fn selection_priority(&self) -> u8 {
        let time_narrow = is_narrow(&self.time);
        let concentration_narrow = is_narrow(&self.concentration);

        match (time_narrow, concentration_narrow) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => 2,
            (false, false) if self.time.has_bounds() && self.concentration.has_bounds() => 3,
            (false, false) => 4,
        }
    }

    /// Returns `true` if the on-screen point `p` lies inside the area covered by this event.
    pub fn contains(&self, p: Point, coord: &Transformation) -> bool {
        let size = coord.size();

        let (x1, x2) = if is_narrow(&self.time) {
            let x = coord.x(self.time.center());
            (x - INT_END, x + INT_END)
        } else {
            let x1 = self.stored(&self.time, Bound::Lower).map_or(0.0, |lower| coord.x(lower));
            let x2 = self.stored(&self.time, Bound::Upper).map_or(size.x, |upper| coord.x(upper));
            (x1, x2)
        };

        let (y1, y2) = if is_narrow(&self.concentration) {
            let y = coord.y(self.concentration.center());
            (y - INT_END, y + INT_END)
        } else {
            let y1 = self.stored(&self.concentration, Bound::Upper).map_or(0.0, |upper| coord.y(upper));
            let y2 = self.stored(&self.concentration, Bound::Lower).map_or(size.y, |lower| coord.y(lower));
            (y1, y2)
        };

        Rect { x1, y1, x2, y2 }.contains(p)
    }

    fn stored(&self, property: &Property, bound: Bound) -> Option<f64> {
        property.has_bound(bound).then(|| property.bound(bound)).flatten()
    }
}

/// A property drawn as a single line rather than an area.
fn is_narrow(property: &Property) -> bool {
    property.is_point() || !property.is_set()
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {}]", self.time, self.concentration)
    }
}
