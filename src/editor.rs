//! Handles for editing a single primitive.
//!
//! An editor owns a working copy of the primitive it was created for. Edits only change the
//! working copy, the timeline stays untouched until the editor is finished and the resulting
//! [`ModelChange`] is applied. Editors for existing primitives are handed out by
//! [`Timeline::select_event`](crate::timeline::Timeline::select_event),
//! [`Timeline::select_transition`](crate::timeline::Timeline::select_transition) and
//! [`Timeline::select_at`](crate::timeline::Timeline::select_at), new events are drawn with an
//! [`EventCreator`].

use thiserror::Error;

use crate::changes::ModelChange;
use crate::coordinates::{Point, Rect, Transformation, INT_END};
use crate::event::Event;
use crate::property::{Bound, Property, PropertyError};
use crate::transition::Transition;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EditorError {
    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("Event is not being moved")]
    NotMoving,

    #[error("Event is being moved")]
    Moving,
}

/// Quantity of an event shown along one of the axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Time,
    Concentration,
}

/// Editor of the primitive found by hit testing.
#[derive(Debug, Clone)]
pub enum Editor {
    Event(EventEditor),
    Transition(TransitionEditor),
}

impl Editor {
    pub fn index(&self) -> usize {
        match self {
            Self::Event(editor) => editor.index(),
            Self::Transition(editor) => editor.index(),
        }
    }

    pub fn finish(self) -> ModelChange {
        match self {
            Self::Event(editor) => editor.finish(),
            Self::Transition(editor) => editor.finish(),
        }
    }

    pub fn delete(self) -> Result<ModelChange, EditorError> {
        match self {
            Self::Event(editor) => editor.delete(),
            Self::Transition(editor) => Ok(editor.delete()),
        }
    }
}

/// Editor of an existing event.
#[derive(Debug, Clone)]
pub struct EventEditor {
    original: Event,
    working: Event,
    index: usize,
    coord: Transformation,
    limits: (f64, f64),
    origin: Option<Point>,
}

impl EventEditor {
    /// `limits` are the times of the neighbouring events, or the ends of the time axis, between
    /// which the event may be moved.
    pub(crate) fn new(event: Event, index: usize, coord: Transformation, limits: (f64, f64)) -> Self {
        Self {
            original: event,
            working: event,
            index,
            coord,
            limits,
            origin: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn original(&self) -> &Event {
        &self.original
    }

    pub fn event(&self) -> &Event {
        &self.working
    }

    /// Direct access to the working copy, e.g. for typed in values.
    pub fn event_mut(&mut self) -> &mut Event {
        &mut self.working
    }

    pub fn contains(&self, p: Point) -> bool {
        self.working.contains(p, &self.coord)
    }

    pub fn is_moving(&self) -> bool {
        self.origin.is_some()
    }

    /// Start moving the event if the on-screen point `p` lies on it. Returns `false` otherwise.
    pub fn start_move(&mut self, p: Point) -> Result<bool, EditorError> {
        if self.is_moving() {
            return Err(EditorError::Moving);
        }

        if !self.contains(p) {
            return Ok(false);
        }

        self.origin = Some(self.coord.to_model(p));
        Ok(true)
    }

    /// Move the event by the distance between `p` and the point where moving started.
    ///
    /// The time stays strictly between the neighbouring events and the concentration stays inside
    /// the visible range, a move in a direction that would leave them is ignored.
    pub fn move_to(&mut self, p: Point) -> Result<(), EditorError> {
        let origin = self.origin.ok_or(EditorError::NotMoving)?;
        let target = self.coord.to_model(p);

        let time = target.x - origin.x + self.original.time().center();
        let concentration = target.y - origin.y + self.original.concentration().center();

        let (lower, upper) = self.limits;
        if time > lower && time < upper {
            self.working.time_mut().move_to(time)?;
        }

        if concentration > 0.0 && concentration < self.coord.concentration_bound() {
            self.working.concentration_mut().move_to(concentration)?;
        }

        Ok(())
    }

    /// Finish moving at `p` and produce the change.
    pub fn end_move(mut self, p: Point) -> Result<ModelChange, EditorError> {
        self.move_to(p)?;
        self.origin = None;

        Ok(self.finish())
    }

    /// Drag one edge of the area of the event to `value`, given in model coordinates.
    ///
    /// An edge dragged past the reference point is ignored and an edge dragged out of the visible
    /// range is unbound. With `symmetric`, the opposite edge is mirrored around the reference point
    /// and dragging past the reference point collapses the property into a point.
    pub fn drag_edge(&mut self, axis: Axis, bound: Bound, value: f64, symmetric: bool) -> Result<(), EditorError> {
        let maximum = match axis {
            Axis::Time => self.coord.time_bound(),
            Axis::Concentration => self.coord.concentration_bound(),
        };

        let property = match axis {
            Axis::Time => self.working.time_mut(),
            Axis::Concentration => self.working.concentration_mut(),
        };

        drag_edge(property, bound, value, maximum, symmetric)
    }

    /// Drag the corner of the area of the event to the on-screen point `p`.
    ///
    /// Releasing the drag close to the reference point turns the event back into a point.
    pub fn drag_point(&mut self, p: Point, symmetric: bool) -> Result<(), EditorError> {
        drag_point(&mut self.working, Some(&self.original), &self.coord, p, symmetric)
    }

    /// Produce the change replacing the original event with the working copy.
    pub fn finish(mut self) -> ModelChange {
        self.working.concentration_mut().refresh_reference();
        ModelChange::modify_event(self.original, self.working)
    }

    /// Produce the change deleting the event.
    pub fn delete(self) -> Result<ModelChange, EditorError> {
        if self.is_moving() {
            return Err(EditorError::Moving);
        }

        Ok(ModelChange::delete_event())
    }
}

/// Editor of a new event drawn from a starting point.
#[derive(Debug, Clone)]
pub struct EventCreator {
    working: Event,
    coord: Transformation,
}

impl EventCreator {
    /// Start a new point event at the on-screen point `origin`.
    pub fn new(coord: Transformation, origin: Point) -> Result<Self, PropertyError> {
        let model = coord.to_model(origin);

        Ok(Self {
            working: Event::point(model.x, model.y)?,
            coord,
        })
    }

    pub fn event(&self) -> &Event {
        &self.working
    }

    pub fn event_mut(&mut self) -> &mut Event {
        &mut self.working
    }

    /// Stretch the new event towards the on-screen point `p`.
    pub fn drag(&mut self, p: Point, symmetric: bool) -> Result<(), EditorError> {
        drag_point(&mut self.working, None, &self.coord, p, symmetric)
    }

    /// Produce the change adding the new event.
    pub fn finish(mut self) -> ModelChange {
        self.working.concentration_mut().refresh_reference();
        ModelChange::create_event(self.working)
    }
}

/// Editor of an existing transition.
#[derive(Debug, Clone)]
pub struct TransitionEditor {
    original: Transition,
    working: Transition,
    index: usize,
    coord: Transformation,
}

impl TransitionEditor {
    pub(crate) fn new(transition: Transition, index: usize, coord: Transformation) -> Self {
        Self {
            original: transition,
            working: transition,
            index,
            coord,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn original(&self) -> &Transition {
        &self.original
    }

    pub fn transition(&self) -> &Transition {
        &self.working
    }

    pub fn transition_mut(&mut self) -> &mut Transition {
        &mut self.working
    }

    /// Drag one edge of the concentration band to `value`. An edge dragged out of the visible
    /// range is unbound.
    pub fn drag_edge(&mut self, bound: Bound, value: f64) -> Result<(), EditorError> {
        let maximum = self.coord.concentration_bound();
        let concentration = self.working.concentration_mut();

        match bound {
            Bound::Upper if value > maximum => concentration.unbind(bound),
            Bound::Lower if value <= 0.0 => concentration.unbind(bound),
            _ => concentration.stretch_bound(bound, value)?,
        }

        Ok(())
    }

    /// Produce the change replacing the original transition with the working copy.
    pub fn finish(self) -> ModelChange {
        ModelChange::modify_transition(self.original, self.working)
    }

    /// Produce the change removing every constraint from the transition.
    pub fn delete(self) -> ModelChange {
        let empty = Transition::new(self.working.left(), self.working.right());
        ModelChange::modify_transition(self.original, empty)
    }
}

fn drag_edge(property: &mut Property, bound: Bound, value: f64, maximum: f64, symmetric: bool) -> Result<(), EditorError> {
    let outside = |bound: Bound, value: f64| match bound {
        Bound::Upper => value > maximum,
        Bound::Lower => value <= 0.0,
    };

    let reference = property.center();
    let delta = value - reference;
    let crossed = match bound {
        Bound::Upper => delta < 0.0,
        Bound::Lower => delta > 0.0,
    };

    if !symmetric {
        if crossed {
            return Ok(());
        }

        if outside(bound, value) {
            property.unbind(bound);
        } else {
            property.stretch_bound(bound, value)?;
        }

        return Ok(());
    }

    if crossed {
        property.make_point()?;
        return Ok(());
    }

    for (bound, value) in [(bound, value), (bound.other(), reference - delta)] {
        if outside(bound, value) {
            property.unbind(bound);
        } else {
            property.stretch_bound(bound, value)?;
        }
    }

    Ok(())
}

fn drag_point(
    event: &mut Event,
    original: Option<&Event>,
    coord: &Transformation,
    p: Point,
    symmetric: bool,
) -> Result<(), EditorError> {
    let center = coord.to_screen(event.time().center(), event.concentration().center());

    if Rect::around(center, INT_END).contains(p) {
        let (time_set, concentration_set) = original.map_or((true, true), |original| {
            (original.time().is_set(), original.concentration().is_set())
        });

        reset(event.time_mut(), time_set)?;
        reset(event.concentration_mut(), concentration_set)?;
        return Ok(());
    }

    let target = coord.to_model(p);
    stretch_towards(event.time_mut(), target.x, coord.time_bound(), symmetric)?;
    stretch_towards(event.concentration_mut(), target.y, coord.concentration_bound(), symmetric)?;

    Ok(())
}

fn reset(property: &mut Property, set: bool) -> Result<(), PropertyError> {
    if set {
        property.make_point()
    } else {
        property.unset();
        Ok(())
    }
}

/// Stretch `property` so that one of its end points lies at `value` and the other one at the
/// reference point, or mirrored around it when `symmetric`.
fn stretch_towards(property: &mut Property, value: f64, maximum: f64, symmetric: bool) -> Result<(), PropertyError> {
    let reference = property.center();
    let delta = value - reference;
    if delta == 0.0 {
        return Ok(());
    }

    let bound = if delta > 0.0 { Bound::Upper } else { Bound::Lower };

    let opposite = if symmetric { reference - delta } else { reference };
    if opposite <= 0.0 || opposite > maximum {
        property.unbind(bound.other());
    } else {
        property.stretch_bound(bound.other(), opposite)?;
    }

    if value <= 0.0 || value > maximum {
        property.unbind(bound);
    } else {
        property.stretch_bound(bound, value)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Axis, EditorError, EventCreator};
    use crate::changes::ModelChange;
    use crate::coordinates::{Point, Transformation};
    use crate::event::Event;
    use crate::property::{Bound, Extent};
    use crate::timeline::{Timeline, TimelineError};

    fn coord() -> Transformation {
        Transformation::new(100.0, 100.0)
    }

    fn timeline() -> Result<Timeline, TimelineError> {
        let mut timeline = Timeline::new();
        timeline.add_event(Event::point(20.0, 50.0)?)?;
        timeline.add_event(Event::point(40.0, 50.0)?)?;
        timeline.add_event(Event::point(60.0, 50.0)?)?;
        Ok(timeline)
    }

    #[test]
    fn move_is_clamped_between_neighbours() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;
        let mut editor = timeline.select_event(1, &coord)?;

        assert!(!editor.start_move(Point::new(90.0, 90.0))?);
        assert!(editor.start_move(Point::new(40.0, 50.0))?);

        editor.move_to(Point::new(50.0, 40.0))?;
        assert_eq!(editor.event().time().center(), 50.0);
        assert_eq!(editor.event().concentration().center(), 60.0);

        // past the next event, only the concentration follows
        editor.move_to(Point::new(70.0, 30.0))?;
        assert_eq!(editor.event().time().center(), 50.0);
        assert_eq!(editor.event().concentration().center(), 70.0);

        let mut change = editor.end_move(Point::new(45.0, 30.0))?;
        change.apply(&mut timeline)?;

        assert_eq!(timeline.events()[1].time().center(), 45.0);
        assert_eq!(timeline.selection(), None);
        Ok(())
    }

    #[test]
    fn move_requires_start() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;
        let mut editor = timeline.select_event(0, &coord)?;

        assert_eq!(editor.move_to(Point::new(10.0, 10.0)), Err(EditorError::NotMoving));

        editor.start_move(Point::new(20.0, 50.0))?;
        assert!(matches!(editor.delete(), Err(EditorError::Moving)));
        Ok(())
    }

    #[test]
    fn drag_edge() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;
        let mut editor = timeline.select_event(0, &coord)?;

        editor.drag_edge(Axis::Time, Bound::Upper, 25.0, false)?;
        assert_eq!(editor.event().time().bound(Bound::Lower), Some(20.0));
        assert_eq!(editor.event().time().bound(Bound::Upper), Some(25.0));

        // dragged past the reference point, ignored
        editor.drag_edge(Axis::Time, Bound::Upper, 15.0, false)?;
        assert_eq!(editor.event().time().bound(Bound::Upper), Some(25.0));

        editor.drag_edge(Axis::Time, Bound::Upper, 150.0, false)?;
        assert!(!editor.event().time().has_bound(Bound::Upper));
        Ok(())
    }

    #[test]
    fn symmetric_drag_edge() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;
        let mut editor = timeline.select_event(1, &coord)?;

        editor.drag_edge(Axis::Concentration, Bound::Upper, 60.0, true)?;
        assert_eq!(editor.event().concentration().bound(Bound::Lower), Some(40.0));
        assert_eq!(editor.event().concentration().bound(Bound::Upper), Some(60.0));

        editor.drag_edge(Axis::Concentration, Bound::Upper, 45.0, true)?;
        assert_eq!(editor.event().concentration().extent(), Extent::Point(50.0));
        Ok(())
    }

    #[test]
    fn drag_point_and_back() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;
        let mut editor = timeline.select_event(1, &coord)?;

        editor.drag_point(Point::new(50.0, 40.0), false)?;
        assert_eq!(editor.event().time().bound(Bound::Lower), Some(40.0));
        assert_eq!(editor.event().time().bound(Bound::Upper), Some(50.0));
        assert_eq!(editor.event().concentration().bound(Bound::Lower), Some(50.0));
        assert_eq!(editor.event().concentration().bound(Bound::Upper), Some(60.0));

        editor.drag_point(Point::new(41.0, 49.0), false)?;
        assert!(editor.event().time().is_point());
        assert!(editor.event().concentration().is_point());
        Ok(())
    }

    #[test]
    fn create_event() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;

        let mut creator = EventCreator::new(coord, Point::new(30.0, 80.0))?;
        creator.drag(Point::new(34.0, 80.0), false)?;

        let mut change = creator.finish();
        assert!(matches!(change, ModelChange::CreateEvent { .. }));
        change.apply(&mut timeline)?;

        let event = timeline.events()[1];
        assert_eq!(event.time().bound(Bound::Lower), Some(30.0));
        assert_eq!(event.time().bound(Bound::Upper), Some(34.0));
        assert_eq!(event.concentration().point_value(), Some(20.0));
        Ok(())
    }

    #[test]
    fn delete_transition_empties_it() -> Result<(), Box<dyn std::error::Error>> {
        let coord = coord();
        let mut timeline = timeline()?;

        let mut editor = timeline.select_transition(2, &coord)?;
        editor.drag_edge(Bound::Upper, 70.0)?;
        editor.finish().apply(&mut timeline)?;
        assert!(!timeline.transitions()[2].is_empty());

        let editor = timeline.select_transition(2, &coord)?;
        editor.delete().apply(&mut timeline)?;
        assert!(timeline.transitions()[2].is_empty());
        Ok(())
    }
}
