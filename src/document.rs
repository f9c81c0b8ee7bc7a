//! Persistent form of a timeline.
//!
//! A [`Document`] lists the events of a timeline, each with an integer identifier, followed by
//! the transitions that are not empty. A transition names its neighbours by their identifiers,
//! a missing neighbour places it at the start or at the end of the timeline.
//!
//! ```json
//! {
//!   "events": [
//!     { "id": 0, "time": { "set": true, "reference": 5.0 }, "concentration": { "set": false, "reference": 2.0 } }
//!   ],
//!   "transitions": [
//!     { "left": 0, "derivative": { "set": true, "lower": 0.5, "upper": "inf" } }
//!   ]
//! }
//! ```
//!
//! Loading validates the whole document before any timeline is built, a document that fails to
//! validate leaves nothing behind.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::TimelineContext;
use crate::event::{Event, EventId};
use crate::property::{check_positive as positive, Bound, Extent, Property, PropertyError, Variant};
use crate::timeline::{Timeline, TimelineError};
use crate::transition::Transition;

/// Errors in the values of a single property record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error(transparent)]
    Property(#[from] PropertyError),

    #[error("Reference [{reference}] lies outside of the {bound} bound [{value}]")]
    ReferenceOutOfBounds { reference: f64, bound: Bound, value: f64 },

    #[error("Cyclic property has a lower bound but no upper bound")]
    LowerWithoutUpper,

    #[error("Property without a point state is set without bounds")]
    MissingBounds,

    #[error("Lower bound [{lower}] exceeds the upper bound [{upper}]")]
    BoundsOrder { lower: f64, upper: f64 },
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Could not access document: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document at line {line}, column {column}: {source}")]
    Syntax {
        line: usize,
        column: usize,
        source: serde_json::Error,
    },

    #[error("Duplicate event id [{0}]")]
    DuplicateId(u64),

    #[error("Invalid {field} of event [{id}]: {source}")]
    Event {
        id: u64,
        field: &'static str,
        source: RecordError,
    },

    #[error("Transition [{position}] refers to an event which does not exist [{id}]")]
    UnknownEvent { position: usize, id: u64 },

    #[error("Transition [{position}] fills a gap which already has a transition")]
    DuplicateTransition { position: usize },

    #[error("Transition [{position}] lies between events which are not adjacent")]
    NotAdjacent { position: usize },

    #[error("Invalid {field} of transition [{position}]: {source}")]
    Transition {
        position: usize,
        field: &'static str,
        source: RecordError,
    },

    #[error(transparent)]
    Timeline(#[from] TimelineError),
}

impl From<serde_json::Error> for DocumentError {
    fn from(source: serde_json::Error) -> Self {
        Self::Syntax {
            line: source.line(),
            column: source.column(),
            source,
        }
    }
}

/// Serialization of bounds, which may be infinite for slopes.
mod bound_value {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            None => serializer.serialize_none(),
            Some(value) if value.is_finite() => serializer.serialize_some(value),
            Some(value) if value.is_sign_positive() => serializer.serialize_some("inf"),
            Some(_) => serializer.serialize_some("-inf"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        match Option::<Repr>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Repr::Number(value)) => Ok(Some(value)),
            Some(Repr::Text(text)) => match text.as_str() {
                "inf" => Ok(Some(f64::INFINITY)),
                "-inf" => Ok(Some(f64::NEG_INFINITY)),
                other => Err(D::Error::custom(format!("invalid bound value: {}", other))),
            },
        }
    }
}

/// A property as stored in a document.
///
/// A set positive property without bounds is a point at its reference. A set cyclic property with
/// only an upper bound is a point at that bound, its reference is kept separately.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub set: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<f64>,

    #[serde(default, with = "bound_value", skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,

    #[serde(default, with = "bound_value", skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
}

impl PropertyRecord {
    pub fn from_property(property: &Property) -> Self {
        let (set, lower, upper, reference) = match property.extent() {
            Extent::Unset => (false, None, None, property.center()),
            Extent::Point(value) if property.variant().is_cyclic() => (true, None, Some(value), property.center()),
            Extent::Point(value) => (true, None, None, value),
            Extent::Interval { lower, upper } => (true, lower, upper, property.center()),
        };

        Self {
            set,
            reference: Some(reference),
            lower,
            upper,
        }
    }

    /// Rebuild a property of the given variant. Relative references are recomputed by the
    /// timeline and not read from the record.
    pub fn to_property(&self, variant: Variant) -> Result<Property, RecordError> {
        let reference = match variant {
            Variant::Positive => positive(self.reference.unwrap_or(1.0))?,
            Variant::Cyclic => self.reference.unwrap_or(0.0),
            Variant::RelativePositive | Variant::RelativeCyclic => 0.0,
        };

        if !self.set {
            return Ok(Property::from_parts(variant, reference, Extent::Unset));
        }

        if variant.is_cyclic() {
            return self.to_cyclic(variant, reference);
        }

        let lower = self.lower.map(positive).transpose()?;
        let upper = self.upper.map(positive).transpose()?;

        if lower.is_none() && upper.is_none() {
            return match variant {
                Variant::Positive => Ok(Property::from_parts(variant, reference, Extent::Point(reference))),
                _ => Err(RecordError::MissingBounds),
            };
        }

        if let (Some(lower), Some(upper)) = (lower, upper) {
            if lower > upper {
                return Err(RecordError::BoundsOrder { lower, upper });
            }
        }

        if variant == Variant::Positive {
            if let Some(value) = upper.filter(|&upper| upper < reference) {
                return Err(RecordError::ReferenceOutOfBounds {
                    reference,
                    bound: Bound::Upper,
                    value,
                });
            }

            if let Some(value) = lower.filter(|&lower| lower > reference) {
                return Err(RecordError::ReferenceOutOfBounds {
                    reference,
                    bound: Bound::Lower,
                    value,
                });
            }
        }

        Ok(Property::from_parts(variant, reference, Extent::Interval { lower, upper }))
    }

    fn to_cyclic(&self, variant: Variant, reference: f64) -> Result<Property, RecordError> {
        let extent = match (self.lower, self.upper) {
            (None, None) => Extent::Point(self.reference.unwrap_or(reference)),
            (Some(_), None) => return Err(RecordError::LowerWithoutUpper),
            (None, Some(upper)) => Extent::Point(upper),
            (Some(lower), Some(upper)) => Extent::Interval {
                lower: Some(lower),
                upper: Some(upper),
            },
        };

        let nan = match extent {
            Extent::Point(value) => value.is_nan(),
            Extent::Interval {
                lower: Some(lower),
                upper: Some(upper),
            } => lower.is_nan() || upper.is_nan(),
            _ => false,
        };

        if nan {
            return Err(PropertyError::NotANumber.into());
        }

        Ok(Property::from_parts(variant, reference, extent))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: u64,
    pub time: PropertyRecord,
    pub concentration: PropertyRecord,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivative: Option<PropertyRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TransitionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concentration: Option<PropertyRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub derivative: Option<PropertyRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub events: Vec<EventRecord>,

    #[serde(default)]
    pub transitions: Vec<TransitionRecord>,
}

impl Document {
    /// Describe `timeline`. Events are identified by their position, empty transitions are left
    /// out.
    pub fn from_timeline(timeline: &Timeline) -> Self {
        let events = timeline
            .events()
            .iter()
            .enumerate()
            .map(|(index, event)| EventRecord {
                id: index as u64,
                time: PropertyRecord::from_property(event.time()),
                concentration: PropertyRecord::from_property(event.concentration()),
                derivative: Some(PropertyRecord::from_property(event.derivative())),
            })
            .collect();

        let last = timeline.transitions().len() - 1;
        let transitions = timeline
            .transitions()
            .iter()
            .enumerate()
            .filter(|(_, transition)| !transition.is_empty())
            .map(|(index, transition)| TransitionRecord {
                left: index.checked_sub(1).map(|left| left as u64),
                right: (index != last).then_some(index as u64),
                concentration: Some(PropertyRecord::from_property(transition.concentration())),
                derivative: Some(PropertyRecord::from_property(transition.derivative())),
            })
            .collect();

        Self { events, transitions }
    }

    /// Build a timeline from the records, validating them along the way.
    pub fn to_timeline(&self, context: TimelineContext) -> Result<Timeline, DocumentError> {
        let mut timeline = Timeline::with_context(context);
        let mut ids: HashMap<u64, EventId> = HashMap::new();

        for record in &self.events {
            if ids.contains_key(&record.id) {
                return Err(DocumentError::DuplicateId(record.id));
            }

            let event = event(record)?;
            let location = timeline.add_event(event)?;
            ids.insert(record.id, timeline.events()[location.index].id());
        }

        let mut filled = HashSet::new();

        for (position, record) in self.transitions.iter().enumerate() {
            let find = |id: Option<u64>| -> Result<Option<EventId>, DocumentError> {
                id.map(|id| ids.get(&id).copied().ok_or(DocumentError::UnknownEvent { position, id }))
                    .transpose()
            };

            let left = find(record.left)?;
            let right = find(record.right)?;

            let gap = match left {
                Some(left) => timeline.position(left).map_or(0, |index| index + 1),
                None => 0,
            };

            let expected = timeline.events().get(gap).map(Event::id);
            if right != expected {
                return Err(DocumentError::NotAdjacent { position });
            }

            if !filled.insert(gap) {
                return Err(DocumentError::DuplicateTransition { position });
            }

            let transition = transition(record, position, left, right)?;
            timeline.modify_transition_at(transition, gap)?;
        }

        Ok(timeline)
    }

    pub fn from_json(input: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(input)?)
    }

    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read and validate the document stored at `path`.
    pub fn load<P: AsRef<Path>>(path: P, context: TimelineContext) -> Result<Timeline, DocumentError> {
        let path = path.as_ref();
        let input = fs::read_to_string(path)?;

        let timeline = Self::from_json(&input)
            .and_then(|document| document.to_timeline(context))
            .map_err(|err| {
                warn!(path = %path.display(), "rejected document: {}", err);
                err
            })?;

        info!(path = %path.display(), events = timeline.events().len(), "loaded document");
        Ok(timeline)
    }

    /// Store `timeline` at `path`.
    pub fn save<P: AsRef<Path>>(timeline: &Timeline, path: P) -> Result<(), DocumentError> {
        let path = path.as_ref();
        fs::write(path, Self::from_timeline(timeline).to_json()?)?;

        info!(path = %path.display(), events = timeline.events().len(), "saved document");
        Ok(())
    }
}

fn event(record: &EventRecord) -> Result<Event, DocumentError> {
    let field = |field: &'static str, property: &PropertyRecord, variant: Variant| {
        property.to_property(variant).map_err(|source| DocumentError::Event {
            id: record.id,
            field,
            source,
        })
    };

    let time = field("time", &record.time, Variant::Positive)?;
    let concentration = field("concentration", &record.concentration, Variant::Positive)?;
    let derivative = match &record.derivative {
        Some(derivative) => field("derivative", derivative, Variant::Cyclic)?,
        None => Property::cyclic(0.0),
    };

    Ok(Event::from_properties(time, concentration, derivative))
}

fn transition(
    record: &TransitionRecord,
    position: usize,
    left: Option<EventId>,
    right: Option<EventId>,
) -> Result<Transition, DocumentError> {
    let field = |field: &'static str, property: &Option<PropertyRecord>, variant: Variant| {
        property
            .as_ref()
            .map(|property| property.to_property(variant))
            .transpose()
            .map_err(|source| DocumentError::Transition { position, field, source })
    };

    let mut transition = Transition::new(left, right);

    if let Some(concentration) = field("concentration", &record.concentration, Variant::RelativePositive)? {
        *transition.concentration_mut() = concentration;
    }

    if let Some(derivative) = field("derivative", &record.derivative, Variant::RelativeCyclic)? {
        *transition.derivative_mut() = derivative;
    }

    Ok(transition)
}
