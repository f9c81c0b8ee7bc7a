//! Ordered sequence of events separated by transitions.
//!
//! A [`Timeline`] always holds one more transition than it holds events, the transition at index
//! `i` lies between the events at indices `i - 1` and `i`:
//!
//! ```text
//! T0  E0  T1  E1  T2  ...  En-1  Tn
//! ```
//!
//! Events are ordered by the reference point of their time. Adding an event splits the transition
//! it lands in, deleting an event joins the two transitions around it.
//!
//! At most one primitive is open for editing at any time. Selecting a primitive hands out an
//! editor (see [`crate::editor`]) and locks the timeline until the primitive is modified or the
//! selection is released with [`Timeline::unselect`]. The structural operations refuse to run
//! while the lock is held.
//!
//! ```rust
//! use ltl_annotator::event::Event;
//! use ltl_annotator::timeline::Timeline;
//!
//! let mut timeline = Timeline::new();
//! timeline.add_event(Event::point(5.0, 10.0).unwrap()).unwrap();
//! timeline.add_event(Event::point(2.0, 4.0).unwrap()).unwrap();
//!
//! assert_eq!(timeline.events().len(), 2);
//! assert_eq!(timeline.transitions().len(), 3);
//! assert_eq!(timeline.events()[0].time().center(), 2.0);
//! ```

use either::Either;
use thiserror::Error;
use tracing::{debug, error};

use crate::config::TimelineContext;
use crate::coordinates::{Point, Transformation};
use crate::editor::{Editor, EventEditor, TransitionEditor};
use crate::event::{Event, EventId};
use crate::property::PropertyError;
use crate::transition::Transition;

/// Errors caused by values that do not fit the timeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("Modified event does not fit between its neighbours: [{0}]")]
    EventOutOfOrder(f64),

    #[error("Modified transition does not have the same neighbours as the original")]
    NeighbourMismatch,
}

/// Errors caused by calling timeline operations in the wrong order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    #[error("Another primitive is already selected")]
    Busy,

    #[error("No primitive is selected")]
    NothingSelected,

    #[error("The selected primitive is not of the requested kind")]
    WrongSelection,

    #[error("There is no change to undo")]
    NothingToUndo,

    #[error("There is no change to redo")]
    NothingToRedo,

    #[error("The change has not been applied yet")]
    NotApplied,

    #[error("Index out of range: [{0}]")]
    IndexOutOfRange(usize),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimelineError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Property(#[from] PropertyError),
}

/// Position of an added or deleted event together with the transitions around it.
///
/// `left` and `right` are the transitions adjacent to the event while it is part of the timeline,
/// `joined` is the single transition occupying the gap when it is not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventLocation {
    pub index: usize,
    pub left: Transition,
    pub right: Transition,
    pub joined: Transition,
}

/// The primitive currently open for editing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Event(usize),
    Transition(usize),
}

#[derive(Debug, Clone)]
pub struct Timeline {
    events: Vec<Event>,
    transitions: Vec<Transition>,
    selection: Option<Selection>,
    context: TimelineContext,
    next_id: u64,
}

impl Timeline {
    /// Create a timeline containing a single empty transition.
    pub fn new() -> Self {
        Self::with_context(TimelineContext::default())
    }

    pub fn with_context(context: TimelineContext) -> Self {
        let mut timeline = Self {
            events: Vec::new(),
            transitions: vec![Transition::new(None, None)],
            selection: None,
            context,
            next_id: 1,
        };

        timeline.resolve();
        timeline
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn selection(&self) -> Option<Selection> {
        self.selection
    }

    pub fn context(&self) -> &TimelineContext {
        &self.context
    }

    /// Replace the axis information and recompute the relative references of all transitions.
    pub fn set_context(&mut self, context: TimelineContext) {
        self.context = context;
        self.resolve();
    }

    /// Index of the event with the given identifier.
    pub fn position(&self, id: EventId) -> Option<usize> {
        self.events.iter().position(|event| event.id() == id)
    }

    /// Remove all events and release the selection.
    pub fn clear(&mut self) {
        self.selection = None;
        self.events.clear();
        self.transitions.clear();
        self.transitions.push(Transition::new(None, None));
        self.resolve();

        debug!("timeline cleared");
    }

    /// Add an event after all events with a lesser or equal time and split the transition it
    /// lands in.
    ///
    /// The event is given a fresh identifier.
    pub fn add_event(&mut self, mut event: Event) -> Result<EventLocation, TimelineError> {
        self.ensure_idle()?;

        event.set_id(self.allocate_id());

        let key = event.time_key();
        let index = self
            .events
            .iter()
            .position(|existing| existing.time_key() > key)
            .unwrap_or(self.events.len());

        let joined = self.transitions[index];
        let (left, right) = joined.split(event.id());

        self.events.insert(index, event);
        self.transitions.splice(index..=index, [left, right]);
        self.resolve();

        debug!(index, id = %event.id(), "added event {}", event);

        Ok(EventLocation {
            index,
            left: self.transitions[index],
            right: self.transitions[index + 1],
            joined,
        })
    }

    /// Delete the selected event and join the transitions around it.
    pub fn delete_event(&mut self) -> Result<EventLocation, TimelineError> {
        let index = self.selected_event()?;

        let left = self.transitions[index];
        let right = self.transitions[index + 1];
        let joined = left.right_join(&right)?;

        let event = self.events.remove(index);
        self.transitions.splice(index..=index + 1, [joined]);
        self.selection = None;
        self.resolve();

        debug!(index, id = %event.id(), "deleted event {}", event);

        Ok(EventLocation {
            index,
            left,
            right,
            joined,
        })
    }

    /// Put an event back at `index` with the given transitions around it. Inverse of
    /// [`Timeline::remove_event`].
    pub fn insert_event(&mut self, event: Event, index: usize, left: Transition, right: Transition) -> Result<(), TimelineError> {
        self.ensure_idle()?;

        if index > self.events.len() {
            return Err(self.out_of_range(index));
        }

        self.next_id = self.next_id.max(event.id().value() + 1);
        self.events.insert(index, event);
        self.transitions.splice(index..=index, [left, right]);
        self.resolve();

        debug!(index, id = %event.id(), "inserted event {}", event);
        Ok(())
    }

    /// Remove the event at `index` and put `joined` in its place. Inverse of
    /// [`Timeline::insert_event`].
    pub fn remove_event(&mut self, index: usize, joined: Transition) -> Result<(), TimelineError> {
        self.ensure_idle()?;

        if index >= self.events.len() {
            return Err(self.out_of_range(index));
        }

        let event = self.events.remove(index);
        self.transitions.splice(index..=index + 1, [joined]);
        self.resolve();

        debug!(index, id = %event.id(), "removed event {}", event);
        Ok(())
    }

    /// Replace the selected event and release the selection.
    ///
    /// The new event keeps the identifier of the selected one. Its time must not be lesser than
    /// the time of the previous event and must be lesser than the time of the next one.
    pub fn modify_event(&mut self, mut event: Event) -> Result<usize, TimelineError> {
        let index = self.selected_event()?;
        let key = event.time_key();

        let before = index.checked_sub(1).and_then(|previous| self.events.get(previous));
        let after = self.events.get(index + 1);

        if before.map_or(false, |previous| key < previous.time_key()) || after.map_or(false, |next| key >= next.time_key()) {
            return Err(DomainError::EventOutOfOrder(event.time().center()).into());
        }

        event.set_id(self.events[index].id());
        self.events[index] = event;
        self.selection = None;
        self.resolve();

        debug!(index, id = %event.id(), "modified event {}", event);
        Ok(index)
    }

    /// Select the event at `index` and replace it.
    pub fn modify_event_at(&mut self, event: Event, index: usize) -> Result<usize, TimelineError> {
        self.select(Selection::Event(index))?;
        self.modify_event(event).map_err(|err| {
            self.selection = None;
            err
        })
    }

    /// Replace the selected transition and release the selection.
    pub fn modify_transition(&mut self, mut transition: Transition) -> Result<usize, TimelineError> {
        let index = self.selected_transition()?;

        if !self.transitions[index].same_neighbours(&transition) {
            return Err(DomainError::NeighbourMismatch.into());
        }

        transition.resolve(self.left_of(index), self.right_of(index), &self.context);
        self.transitions[index] = transition;
        self.selection = None;

        debug!(index, "modified transition");
        Ok(index)
    }

    /// Select the transition at `index` and replace it.
    pub fn modify_transition_at(&mut self, transition: Transition, index: usize) -> Result<usize, TimelineError> {
        self.select(Selection::Transition(index))?;
        self.modify_transition(transition).map_err(|err| {
            self.selection = None;
            err
        })
    }

    /// Open the event at `index` for editing.
    pub fn select_event(&mut self, index: usize, coord: &Transformation) -> Result<EventEditor, TimelineError> {
        self.select(Selection::Event(index))?;
        Ok(self.event_editor(index, coord))
    }

    /// Open the transition at `index` for editing.
    pub fn select_transition(&mut self, index: usize, coord: &Transformation) -> Result<TransitionEditor, TimelineError> {
        self.select(Selection::Transition(index))?;
        Ok(self.transition_editor(index, coord))
    }

    /// Open the primitive under the on-screen point `p` for editing.
    ///
    /// Events take precedence over transitions. Among overlapping events the one with the lowest
    /// [selection priority](Event::selection_priority) wins, ties go to the earlier event.
    pub fn select_at(&mut self, p: Point, coord: &Transformation) -> Result<Option<Editor>, TimelineError> {
        self.ensure_idle()?;

        let event = self
            .events
            .iter()
            .enumerate()
            .filter(|(_, event)| event.contains(p, coord))
            .min_by_key(|(_, event)| event.selection_priority())
            .map(|(index, _)| index);

        if let Some(index) = event {
            self.selection = Some(Selection::Event(index));
            return Ok(Some(Editor::Event(self.event_editor(index, coord))));
        }

        let transition = (0..self.transitions.len())
            .find(|&index| self.transitions[index].contains(p, coord, self.left_of(index), self.right_of(index)));

        Ok(transition.map(|index| {
            self.selection = Some(Selection::Transition(index));
            Editor::Transition(self.transition_editor(index, coord))
        }))
    }

    /// Release the selection without changing anything.
    pub fn unselect(&mut self) {
        self.selection = None;
    }

    /// Events and transitions in timeline order, skipping the primitive open for editing.
    pub fn primitives(&self) -> impl Iterator<Item = Either<&Event, &Transition>> + '_ {
        let selection = self.selection;

        self.transitions.iter().enumerate().flat_map(move |(index, transition)| {
            let transition = (selection != Some(Selection::Transition(index))).then_some(Either::Right(transition));
            let event = self
                .events
                .get(index)
                .filter(|_| selection != Some(Selection::Event(index)))
                .map(Either::Left);

            transition.into_iter().chain(event)
        })
    }

    /// Events not open for editing.
    pub fn events_visible(&self) -> impl Iterator<Item = &Event> + '_ {
        self.primitives().filter_map(|primitive| primitive.left())
    }

    /// Transitions not open for editing.
    pub fn transitions_visible(&self) -> impl Iterator<Item = &Transition> + '_ {
        self.primitives().filter_map(|primitive| primitive.right())
    }

    /// Event to the left of the transition at `index`.
    pub fn left_of(&self, index: usize) -> Option<&Event> {
        index.checked_sub(1).and_then(|left| self.events.get(left))
    }

    /// Event to the right of the transition at `index`.
    pub fn right_of(&self, index: usize) -> Option<&Event> {
        self.events.get(index)
    }

    fn select(&mut self, selection: Selection) -> Result<(), TimelineError> {
        self.ensure_idle()?;

        let (index, len) = match selection {
            Selection::Event(index) => (index, self.events.len()),
            Selection::Transition(index) => (index, self.transitions.len()),
        };

        if index >= len {
            return Err(self.out_of_range(index));
        }

        self.selection = Some(selection);
        Ok(())
    }

    fn event_editor(&self, index: usize, coord: &Transformation) -> EventEditor {
        let lower = self.left_of(index).map_or(0.0, |event| event.time().center());
        let upper = self.events.get(index + 1).map_or(coord.time_bound(), |event| event.time().center());

        EventEditor::new(self.events[index], index, *coord, (lower, upper))
    }

    fn transition_editor(&self, index: usize, coord: &Transformation) -> TransitionEditor {
        TransitionEditor::new(self.transitions[index], index, *coord)
    }

    fn selected_event(&self) -> Result<usize, SequenceError> {
        match self.selection {
            Some(Selection::Event(index)) => Ok(index),
            Some(Selection::Transition(_)) => Err(sequence_error(SequenceError::WrongSelection)),
            None => Err(sequence_error(SequenceError::NothingSelected)),
        }
    }

    fn selected_transition(&self) -> Result<usize, SequenceError> {
        match self.selection {
            Some(Selection::Transition(index)) => Ok(index),
            Some(Selection::Event(_)) => Err(sequence_error(SequenceError::WrongSelection)),
            None => Err(sequence_error(SequenceError::NothingSelected)),
        }
    }

    fn ensure_idle(&self) -> Result<(), SequenceError> {
        match self.selection {
            Some(_) => Err(sequence_error(SequenceError::Busy)),
            None => Ok(()),
        }
    }

    fn out_of_range(&self, index: usize) -> TimelineError {
        sequence_error(SequenceError::IndexOutOfRange(index)).into()
    }

    fn allocate_id(&mut self) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Recompute the references of the relative transition properties.
    fn resolve(&mut self) {
        for index in 0..self.transitions.len() {
            let left = index.checked_sub(1).and_then(|left| self.events.get(left));
            let right = self.events.get(index);
            self.transitions[index].resolve(left, right, &self.context);
        }
    }
}

fn sequence_error(err: SequenceError) -> SequenceError {
    error!("{}", err);
    err
}

impl Default for Timeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Timelines are equal if they hold the same events and transitions, the selection is ignored.
impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        self.events == other.events && self.transitions == other.transitions
    }
}
