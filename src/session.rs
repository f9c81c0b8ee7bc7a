//! Editing session over a single timeline.
//!
//! A [`Session`] owns the timeline being annotated together with its change log and settings.
//! Editors handed out by the selection methods produce a [`ModelChange`] when they finish, which
//! is then passed to [`Session::apply`] so that it can be undone later.
//!
//! ```rust
//! use ltl_annotator::changes::ModelChange;
//! use ltl_annotator::event::Event;
//! use ltl_annotator::session::Session;
//!
//! let mut session = Session::default();
//! session.apply(ModelChange::create_event(Event::point(5.0, 10.0).unwrap())).unwrap();
//! assert_eq!(session.synthesize(), "F((t=5)&([X]=10))");
//!
//! session.undo().unwrap();
//! assert_eq!(session.synthesize(), "");
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::changes::ModelChange;
use crate::config::{Config, ConfigError, TimelineContext};
use crate::coordinates::{Point, Transformation};
use crate::document::{Document, DocumentError};
use crate::editor::{Editor, EditorError, EventEditor, TransitionEditor};
use crate::history::ChangeLog;
use crate::synthesis::synthesize;
use crate::timeline::{Timeline, TimelineError};

#[cfg(feature = "series")]
use crate::series::{SeriesError, SeriesFormat, TimeSeries};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Timeline(#[from] TimelineError),

    #[error(transparent)]
    Editor(#[from] EditorError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[cfg(feature = "series")]
    #[error(transparent)]
    Series(#[from] SeriesError),

    #[error("No file is associated with the session")]
    NoPath,
}

#[derive(Debug, Clone)]
pub struct Session {
    timeline: Timeline,
    log: ChangeLog,
    config: Config,
    path: Option<PathBuf>,

    #[cfg(feature = "series")]
    series: Option<TimeSeries>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            timeline: Timeline::with_context(config.context),
            log: ChangeLog::new(),
            config,
            path: None,

            #[cfg(feature = "series")]
            series: None,
        }
    }

    /// Session using the settings stored at `path`.
    pub fn from_config_path<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        Ok(Self::new(Config::from_path(path)?))
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// File the timeline was last loaded from or saved to.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn has_changed(&self) -> bool {
        self.log.has_changed()
    }

    pub fn can_undo(&self) -> bool {
        self.log.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.log.can_redo()
    }

    pub fn apply(&mut self, change: ModelChange) -> Result<(), SessionError> {
        Ok(self.log.apply(change, &mut self.timeline)?)
    }

    /// Apply the change produced by finishing `editor`.
    pub fn finish(&mut self, editor: Editor) -> Result<(), SessionError> {
        self.apply(editor.finish())
    }

    /// Delete the primitive open in `editor`.
    pub fn delete(&mut self, editor: Editor) -> Result<(), SessionError> {
        let change = editor.delete()?;
        self.apply(change)
    }

    pub fn undo(&mut self) -> Result<(), SessionError> {
        Ok(self.log.undo(&mut self.timeline)?)
    }

    pub fn redo(&mut self) -> Result<(), SessionError> {
        Ok(self.log.redo(&mut self.timeline)?)
    }

    pub fn select_event(&mut self, index: usize, coord: &Transformation) -> Result<EventEditor, SessionError> {
        Ok(self.timeline.select_event(index, coord)?)
    }

    pub fn select_transition(&mut self, index: usize, coord: &Transformation) -> Result<TransitionEditor, SessionError> {
        Ok(self.timeline.select_transition(index, coord)?)
    }

    pub fn select_at(&mut self, p: Point, coord: &Transformation) -> Result<Option<Editor>, SessionError> {
        Ok(self.timeline.select_at(p, coord)?)
    }

    /// Abandon the edit in progress.
    pub fn cancel(&mut self) {
        self.timeline.unselect();
    }

    /// Start over with an empty timeline.
    pub fn new_formula(&mut self) {
        self.timeline.clear();
        self.log = ChangeLog::new();
        self.path = None;

        info!("started a new formula");
    }

    pub fn synthesize(&self) -> String {
        synthesize(&self.timeline, &self.config.syntax)
    }

    /// Change the axis information used by the ends of the timeline.
    pub fn set_context(&mut self, context: TimelineContext) {
        self.config.context = context;
        self.timeline.set_context(context);
    }

    /// Replace the timeline with the one stored at `path`. The session is left untouched if the
    /// document is rejected.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SessionError> {
        let path = path.as_ref();

        self.timeline = Document::load(path, self.config.context)?;
        self.log = ChangeLog::new();
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Store the timeline at `path` and remember it for [`Session::save`].
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P) -> Result<(), SessionError> {
        let path = path.as_ref();

        Document::save(&self.timeline, path)?;
        self.log.mark();
        self.path = Some(path.to_path_buf());
        Ok(())
    }

    /// Store the timeline at the path it was last loaded from or saved to.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        self.save_as(path)
    }
}

#[cfg(feature = "series")]
impl Session {
    pub fn series(&self) -> Option<&TimeSeries> {
        self.series.as_ref()
    }

    /// Show `series` on a canvas of the given size. The context of the timeline follows the
    /// series, the returned transformation fits it to the canvas.
    pub fn set_series(&mut self, series: TimeSeries, width: f64, height: f64) -> Transformation {
        let coord = series.transformation(width, height);

        self.set_context(TimelineContext::from_transformation(&coord));
        self.series = Some(series);
        coord
    }

    pub fn load_series<P: AsRef<Path>>(
        &mut self,
        path: P,
        format: &SeriesFormat,
        width: f64,
        height: f64,
    ) -> Result<Transformation, SessionError> {
        let path = path.as_ref();
        let series = TimeSeries::load(path, format)?;

        info!(path = %path.display(), points = series.points().len(), "loaded time series");
        Ok(self.set_series(series, width, height))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{Session, SessionError};
    use crate::changes::ModelChange;
    use crate::config::Config;
    use crate::coordinates::Transformation;
    use crate::document::Document;
    use crate::editor::Editor;
    use crate::event::Event;
    use crate::property::Bound;

    #[test]
    fn save_mark_follows_saves() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("formula.json");
        let mut session = Session::default();

        assert!(!session.has_changed());

        session.apply(ModelChange::create_event(Event::point(5.0, 10.0)?))?;
        assert!(session.has_changed());

        session.save_as(&path)?;
        assert!(!session.has_changed());
        assert_eq!(session.path(), Some(path.as_path()));

        session.undo()?;
        assert!(session.has_changed());

        session.redo()?;
        assert!(!session.has_changed());
        Ok(())
    }

    #[test]
    fn load_replaces_timeline() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("formula.json");

        let mut first = Session::default();
        first.apply(ModelChange::create_event(Event::point(1.0, 5.0)?))?;
        first.apply(ModelChange::create_event(Event::point(2.0, 6.0)?))?;
        first.save_as(&path)?;

        let mut second = Session::default();
        second.apply(ModelChange::create_event(Event::point(3.0, 3.0)?))?;
        second.load(&path)?;

        assert_eq!(
            Document::from_timeline(second.timeline()),
            Document::from_timeline(first.timeline())
        );
        assert_eq!(second.synthesize(), first.synthesize());
        assert!(!second.can_undo());
        assert!(!second.has_changed());
        Ok(())
    }

    #[test]
    fn rejected_load_keeps_timeline() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("broken.json");
        std::fs::write(&path, "{ \"events\": [")?;

        let mut session = Session::default();
        session.apply(ModelChange::create_event(Event::point(3.0, 3.0)?))?;
        let before = session.timeline().clone();

        assert!(matches!(session.load(&path), Err(SessionError::Document(_))));
        assert_eq!(session.timeline(), &before);
        assert!(session.can_undo());
        assert_eq!(session.path(), None);
        Ok(())
    }

    #[test]
    fn save_requires_path() {
        let mut session = Session::default();
        assert!(matches!(session.save(), Err(SessionError::NoPath)));
    }

    #[test]
    fn edit_through_editors() -> Result<(), Box<dyn Error>> {
        let coord = Transformation::new(100.0, 100.0);
        let mut session = Session::new(Config::default());
        session.apply(ModelChange::create_event(Event::point(5.0, 10.0)?))?;

        let mut editor = session.select_transition(1, &coord)?;
        editor.drag_edge(Bound::Lower, 20.0)?;
        assert!(session.select_event(0, &coord).is_err());

        session.finish(Editor::Transition(editor))?;
        assert_eq!(session.synthesize(), "F(((t=5)&([X]=10))&(X(G([X]>20))))");

        let editor = session.select_event(0, &coord)?;
        session.delete(Editor::Event(editor))?;
        assert_eq!(session.synthesize(), "G([X]>20)");

        session.undo()?;
        session.undo()?;
        assert_eq!(session.synthesize(), "F((t=5)&([X]=10))");
        Ok(())
    }

    #[test]
    fn cancel_releases_selection() -> Result<(), Box<dyn Error>> {
        let coord = Transformation::new(100.0, 100.0);
        let mut session = Session::default();

        let _editor = session.select_transition(0, &coord)?;
        session.cancel();
        session.apply(ModelChange::create_event(Event::point(5.0, 10.0)?))?;

        assert_eq!(session.timeline().events().len(), 1);
        Ok(())
    }

    #[test]
    fn new_formula_resets() -> Result<(), Box<dyn Error>> {
        let mut session = Session::default();
        session.apply(ModelChange::create_event(Event::point(5.0, 10.0)?))?;

        session.new_formula();

        assert!(session.timeline().events().is_empty());
        assert!(!session.can_undo());
        assert!(!session.has_changed());
        Ok(())
    }

    #[cfg(feature = "series")]
    #[test]
    fn series_sets_context() -> Result<(), Box<dyn Error>> {
        use crate::coordinates::PADDING;
        use crate::series::{SeriesFormat, TimeSeries};

        let mut session = Session::default();
        let series = TimeSeries::parse("0,1,0\n20,5,0\n", &SeriesFormat::csv())?;
        let coord = session.set_series(series, 200.0, 100.0 + PADDING);

        approx::assert_relative_eq!(coord.time_bound(), 20.0);
        approx::assert_relative_eq!(session.timeline().context().time_end, 20.0);
        approx::assert_relative_eq!(session.config().context.concentration_end, 3.75);
        assert!(session.series().is_some());
        Ok(())
    }
}
