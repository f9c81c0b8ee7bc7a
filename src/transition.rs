use crate::config::TimelineContext;
use crate::coordinates::{Point, Transformation, INT_END};
use crate::event::{Event, EventId};
use crate::property::{Bound, Property, PropertyError};

/// The course of the time series between two adjacent events.
///
/// Neighbours are referenced by [`EventId`]. A missing neighbour means the transition lies at the
/// start or at the end of the timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    left: Option<EventId>,
    right: Option<EventId>,
    concentration: Property,
    derivative: Property,
}

impl Transition {
    /// Create an empty transition between the given events.
    pub fn new(left: Option<EventId>, right: Option<EventId>) -> Self {
        Self {
            left,
            right,
            concentration: Property::relative_positive(),
            derivative: Property::relative_cyclic(),
        }
    }

    pub fn left(&self) -> Option<EventId> {
        self.left
    }

    pub fn right(&self) -> Option<EventId> {
        self.right
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

    /// Returns `true` if neither property is set. Empty transitions are not persisted.
    pub fn is_empty(&self) -> bool {
        !self.concentration.is_set() && !self.derivative.is_set()
    }

    /// Returns `true` if both transitions lie between the same events.
    pub fn same_neighbours(&self, other: &Self) -> bool {
        self.left == other.left && self.right == other.right
    }

    /// Split this transition by the event `middle` into two copies, the first ending and the
    /// second starting at `middle`.
    pub fn split(&self, middle: EventId) -> (Self, Self) {
        let mut left = *self;
        let mut right = *self;

        left.right = Some(middle);
        right.left = Some(middle);

        (left, right)
    }

    /// Join this transition with the one directly to its right.
    ///
    /// The result spans from the left neighbour of `self` to the right neighbour of `right`. For
    /// every bound of each property the wider of the two values is kept, a bound only set on the
    /// right transition is copied over.
    pub fn right_join(&self, right: &Self) -> Result<Self, PropertyError> {
        let mut joined = *self;
        joined.right = right.right;

        for bound in Bound::ALL {
            widen(&mut joined.concentration, &self.concentration, &right.concentration, bound)?;
            widen(&mut joined.derivative, &self.derivative, &right.derivative, bound)?;
        }

        Ok(joined)
    }

    /// Recompute the references of the relative properties from the neighbouring events.
    ///
    /// The concentration reference is the mean of the neighbours' concentrations and the
    /// derivative reference is the slope between them. A missing neighbour is replaced by the
    /// start or the end of the time axis as given by `context`.
    pub fn resolve(&mut self, left: Option<&Event>, right: Option<&Event>, context: &TimelineContext) {
        let (left_time, left_concentration) = left
            .map(|event| (event.time().center(), event.concentration().center()))
            .unwrap_or((0.0, context.concentration_end));
        let (right_time, right_concentration) = right
            .map(|event| (event.time().center(), event.concentration().center()))
            .unwrap_or((context.time_end, context.concentration_end));

        self.concentration
            .resolve((left_concentration + right_concentration) / 2.0);
        self.derivative
            .resolve((right_concentration - left_concentration) / (right_time - left_time));
    }

    /// Returns `true` if the on-screen point `p` lies on this transition.
    ///
    /// A point inside the time span of the transition hits it if it lies inside the concentration
    /// band or close enough to the line connecting the neighbouring events. Missing neighbours are
    /// placed at the edges of the canvas, halfway up.
    pub fn contains(&self, p: Point, coord: &Transformation, left: Option<&Event>, right: Option<&Event>) -> bool {
        let time = coord.time(p.x);

        if left.map_or(false, |event| event.time().center() > time) {
            return false;
        }

        if right.map_or(false, |event| event.time().center() < time) {
            return false;
        }

        let concentration = coord.concentration(p.y);
        let within = |bound: Bound, inside: fn(f64, f64) -> bool| {
            match self.concentration.bound(bound) {
                Some(value) if self.concentration.has_bound(bound) => inside(value, concentration),
                _ => true,
            }
        };

        if self.concentration.is_set()
            && within(Bound::Upper, |upper, value| upper >= value)
            && within(Bound::Lower, |lower, value| lower <= value)
        {
            return true;
        }

        let size = coord.size();
        let start = left.map_or(Point::new(0.0, size.y / 2.0), |event| {
            coord.to_screen(event.time().center(), event.concentration().center())
        });
        let end = right.map_or(Point::new(size.x, size.y / 2.0), |event| {
            coord.to_screen(event.time().center(), event.concentration().center())
        });

        let slope = (end.y - start.y) / (end.x - start.x);
        let tolerance = INT_END * (slope * slope + 1.0).sqrt();
        let on_line = slope * (p.x - start.x) + start.y;

        (on_line - p.y).abs() <= tolerance
    }
}

fn widen(joined: &mut Property, left: &Property, right: &Property, bound: Bound) -> Result<(), PropertyError> {
    if !right.has_bound(bound) {
        return Ok(());
    }

    match (left.bound(bound), right.bound(bound)) {
        (Some(current), Some(candidate)) if left.has_bound(bound) => {
            if bound.is_wider(candidate, current) {
                joined.set_bound(bound, candidate)?;
            }
        }
        (_, Some(candidate)) => joined.set_bound(bound, candidate)?,
        _ => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::Transition;
    use crate::config::TimelineContext;
    use crate::coordinates::{Point, Transformation};
    use crate::event::{Event, EventId};
    use crate::property::{Bound, PropertyError};

    #[test]
    fn split() {
        let original = Transition::new(Some(EventId(1)), Some(EventId(2)));
        let (left, right) = original.split(EventId(3));

        assert_eq!(left.left(), Some(EventId(1)));
        assert_eq!(left.right(), Some(EventId(3)));
        assert_eq!(right.left(), Some(EventId(3)));
        assert_eq!(right.right(), Some(EventId(2)));
    }

    #[test]
    fn join_keeps_wider_bounds() -> Result<(), PropertyError> {
        let mut left = Transition::new(None, Some(EventId(1)));
        left.concentration_mut().set_bound(Bound::Lower, 2.0)?;
        left.concentration_mut().set_bound(Bound::Upper, 5.0)?;

        let mut right = Transition::new(Some(EventId(1)), None);
        right.concentration_mut().set_bound(Bound::Lower, 1.0)?;
        right.concentration_mut().set_bound(Bound::Upper, 8.0)?;

        let joined = left.right_join(&right)?;

        assert_eq!(joined.left(), None);
        assert_eq!(joined.right(), None);
        assert_eq!(joined.concentration().bound(Bound::Upper), Some(8.0));
        assert_eq!(joined.concentration().bound(Bound::Lower), Some(1.0));
        Ok(())
    }

    #[test]
    fn join_copies_one_sided_bounds() -> Result<(), PropertyError> {
        let left = Transition::new(None, Some(EventId(1)));

        let mut right = Transition::new(Some(EventId(1)), None);
        right.derivative_mut().set_bound(Bound::Upper, 3.0)?;

        let joined = left.right_join(&right)?;

        assert!(joined.derivative().is_set());
        assert_eq!(joined.derivative().bound(Bound::Upper), Some(3.0));
        assert_eq!(joined.derivative().bound(Bound::Lower), Some(f64::NEG_INFINITY));
        assert!(!joined.concentration().is_set());
        Ok(())
    }

    #[test]
    fn join_of_split_is_identity() -> Result<(), PropertyError> {
        let mut original = Transition::new(None, None);
        original.concentration_mut().set_bound(Bound::Upper, 4.0)?;
        original.derivative_mut().set_bound(Bound::Lower, -1.0)?;

        let (left, right) = original.split(EventId(7));
        assert_eq!(left.right_join(&right)?, original);
        Ok(())
    }

    #[test]
    fn resolve_between_events() -> Result<(), PropertyError> {
        let left = Event::point(1.0, 2.0)?;
        let right = Event::point(3.0, 6.0)?;
        let context = TimelineContext::new(10.0, 1.0);

        let mut transition = Transition::new(None, None);
        transition.resolve(Some(&left), Some(&right), &context);

        assert_relative_eq!(transition.concentration().center(), 4.0);
        assert_relative_eq!(transition.derivative().center(), 2.0);
        Ok(())
    }

    #[test]
    fn resolve_at_the_ends() -> Result<(), PropertyError> {
        let event = Event::point(2.0, 5.0)?;
        let context = TimelineContext::new(10.0, 1.0);

        let mut first = Transition::new(None, None);
        first.resolve(None, Some(&event), &context);
        assert_relative_eq!(first.concentration().center(), 3.0);
        assert_relative_eq!(first.derivative().center(), 2.0);

        let mut last = Transition::new(None, None);
        last.resolve(Some(&event), None, &context);
        assert_relative_eq!(last.concentration().center(), 3.0);
        assert_relative_eq!(last.derivative().center(), -0.5);
        Ok(())
    }

    #[test]
    fn contains_line_and_band() -> Result<(), PropertyError> {
        let coord = Transformation::new(100.0, 100.0);
        let left = Event::point(10.0, 50.0)?;
        let right = Event::point(30.0, 50.0)?;

        let mut transition = Transition::new(None, None);
        assert!(transition.contains(Point::new(20.0, 52.0), &coord, Some(&left), Some(&right)));
        assert!(!transition.contains(Point::new(20.0, 20.0), &coord, Some(&left), Some(&right)));
        assert!(!transition.contains(Point::new(40.0, 50.0), &coord, Some(&left), Some(&right)));

        transition.concentration_mut().set_bound(Bound::Lower, 70.0)?;
        assert!(transition.contains(Point::new(20.0, 20.0), &coord, Some(&left), Some(&right)));
        Ok(())
    }
}
