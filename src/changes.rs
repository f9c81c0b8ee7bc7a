use std::fmt::{Display, Formatter};

use tracing::debug;

use crate::event::Event;
use crate::timeline::{EventLocation, SequenceError, Selection, Timeline, TimelineError};
use crate::transition::Transition;

/// A reversible modification of a timeline.
///
/// A change captures everything needed to revert it while it is applied. Undoing and redoing
/// replay the captured values, so the timeline ends up exactly in the state it was in before the
/// change, or after it.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelChange {
    CreateEvent {
        event: Event,
        location: Option<EventLocation>,
    },
    DeleteEvent {
        event: Option<Event>,
        location: Option<EventLocation>,
    },
    ModifyEvent {
        original: Event,
        modified: Event,
        index: Option<usize>,
    },
    ModifyTransition {
        original: Transition,
        modified: Transition,
        index: Option<usize>,
    },
}

impl ModelChange {
    pub fn create_event(event: Event) -> Self {
        Self::CreateEvent { event, location: None }
    }

    /// Deletion of the event selected when the change is applied.
    pub fn delete_event() -> Self {
        Self::DeleteEvent {
            event: None,
            location: None,
        }
    }

    pub fn modify_event(original: Event, modified: Event) -> Self {
        Self::ModifyEvent {
            original,
            modified,
            index: None,
        }
    }

    pub fn modify_transition(original: Transition, modified: Transition) -> Self {
        Self::ModifyTransition {
            original,
            modified,
            index: None,
        }
    }

    pub fn is_applied(&self) -> bool {
        match self {
            Self::CreateEvent { location, .. } | Self::DeleteEvent { location, .. } => location.is_some(),
            Self::ModifyEvent { index, .. } | Self::ModifyTransition { index, .. } => index.is_some(),
        }
    }

    /// Perform the change for the first time and capture what is needed to revert it.
    ///
    /// Modifications and deletions act on the primitive currently selected in the timeline.
    pub fn apply(&mut self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        match self {
            Self::CreateEvent { event, location } => {
                let added = timeline.add_event(*event)?;
                *event = timeline.events()[added.index];
                *location = Some(added);
            }
            Self::DeleteEvent { event, location } => {
                let selected = match timeline.selection() {
                    Some(Selection::Event(index)) => timeline.events().get(index).copied(),
                    _ => None,
                };

                *location = Some(timeline.delete_event()?);
                *event = selected;
            }
            Self::ModifyEvent { modified, index, .. } => {
                let position = timeline.modify_event(*modified)?;
                *modified = timeline.events()[position];
                *index = Some(position);
            }
            Self::ModifyTransition { modified, index, .. } => {
                *index = Some(timeline.modify_transition(*modified)?);
            }
        }

        debug!("applied {}", self);
        Ok(())
    }

    /// Revert an applied change.
    pub fn undo(&self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        match self {
            Self::CreateEvent { location, .. } => {
                let location = applied(location)?;
                timeline.remove_event(location.index, location.joined)?;
            }
            Self::DeleteEvent { event, location } => {
                let location = applied(location)?;
                let event = applied(event)?;
                timeline.insert_event(*event, location.index, location.left, location.right)?;
            }
            Self::ModifyEvent { original, index, .. } => {
                timeline.modify_event_at(*original, *applied(index)?)?;
            }
            Self::ModifyTransition { original, index, .. } => {
                timeline.modify_transition_at(*original, *applied(index)?)?;
            }
        }

        debug!("undone {}", self);
        Ok(())
    }

    /// Perform a reverted change again.
    pub fn redo(&self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        match self {
            Self::CreateEvent { event, location } => {
                let location = applied(location)?;
                timeline.insert_event(*event, location.index, location.left, location.right)?;
            }
            Self::DeleteEvent { location, .. } => {
                let location = applied(location)?;
                timeline.remove_event(location.index, location.joined)?;
            }
            Self::ModifyEvent { modified, index, .. } => {
                timeline.modify_event_at(*modified, *applied(index)?)?;
            }
            Self::ModifyTransition { modified, index, .. } => {
                timeline.modify_transition_at(*modified, *applied(index)?)?;
            }
        }

        debug!("redone {}", self);
        Ok(())
    }
}

fn applied<T>(captured: &Option<T>) -> Result<&T, SequenceError> {
    captured.as_ref().ok_or(SequenceError::NotApplied)
}

impl Display for ModelChange {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateEvent { event, .. } => write!(f, "creation of event {}", event),
            Self::DeleteEvent { event: Some(event), .. } => write!(f, "deletion of event {}", event),
            Self::DeleteEvent { event: None, .. } => write!(f, "deletion of selected event"),
            Self::ModifyEvent { original, modified, .. } => write!(f, "modification of event {} to {}", original, modified),
            Self::ModifyTransition { index: Some(index), .. } => write!(f, "modification of transition {}", index),
            Self::ModifyTransition { index: None, .. } => write!(f, "modification of selected transition"),
        }
    }
}
