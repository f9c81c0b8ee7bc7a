#![deny(clippy::all)]

//! Annotate time series with qualitative constraints and synthesize Linear Temporal Logic
//! formulas from them.
//!
//! Constraints are placed on a [`Timeline`] of events separated by transitions. Events constrain
//! the time, the concentration and the derivative of the series at some instant, transitions
//! constrain the concentration and the derivative between two events. The timeline is folded into
//! a formula with [`synthesize`].
//!
//! ```rust
//! use ltl_annotator::{synthesize, Event, FormulaSyntax, Timeline};
//!
//! let mut timeline = Timeline::new();
//! timeline.add_event(Event::point(1.0, 5.0).unwrap()).unwrap();
//! timeline.add_event(Event::point(2.0, 6.0).unwrap()).unwrap();
//!
//! let formula = synthesize(&timeline, &FormulaSyntax::default());
//! assert_eq!(formula, "F(((t=1)&([X]=5))&(X(F((t=2)&([X]=6)))))");
//! ```
//!
//! Interactive edits go through a [`Session`], which records every change so that it can be
//! undone and tracks whether the timeline was modified since it was last saved.

pub mod changes;
pub mod config;
pub mod coordinates;
pub mod document;
pub mod editor;
pub mod event;
pub mod history;
pub mod property;
#[cfg(feature = "series")]
pub mod series;
pub mod session;
pub mod synthesis;
pub mod timeline;
pub mod transition;

pub use crate::changes::ModelChange;
pub use crate::config::{Config, FormulaSyntax, TimelineContext};
pub use crate::event::{Event, EventId};
pub use crate::history::ChangeLog;
pub use crate::property::{Bound, Property, PropertyError};
pub use crate::session::{Session, SessionError};
pub use crate::synthesis::synthesize;
pub use crate::timeline::{Timeline, TimelineError};
pub use crate::transition::Transition;
