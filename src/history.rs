use tracing::debug;

use crate::changes::ModelChange;
use crate::timeline::{SequenceError, Timeline, TimelineError};

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Change(ModelChange),
    SaveMark,
}

/// Undo and redo stacks of applied changes, together with a mark of the last saved state.
///
/// The mark moves between the stacks along with the change it follows, so undoing back to the
/// saved state (or redoing forward to it) makes [`ChangeLog::has_changed`] return `false` again.
#[derive(Debug, Clone)]
pub struct ChangeLog {
    applied: Vec<Entry>,
    undone: Vec<Entry>,
}

impl ChangeLog {
    /// Create a log whose current state is considered saved.
    pub fn new() -> Self {
        Self {
            applied: vec![Entry::SaveMark],
            undone: Vec::new(),
        }
    }

    /// Apply `change` to `timeline` and record it. Any undone changes are discarded.
    pub fn apply(&mut self, mut change: ModelChange, timeline: &mut Timeline) -> Result<(), TimelineError> {
        change.apply(timeline)?;

        self.applied.push(Entry::Change(change));
        self.undone.clear();

        Ok(())
    }

    /// Revert the last applied change.
    pub fn undo(&mut self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        let marked = self.applied.last() == Some(&Entry::SaveMark);
        if marked {
            self.applied.pop();
        }

        let change = match self.applied.pop() {
            Some(Entry::Change(change)) => change,
            _ => {
                if marked {
                    self.applied.push(Entry::SaveMark);
                }
                return Err(SequenceError::NothingToUndo.into());
            }
        };

        if let Err(err) = change.undo(timeline) {
            self.applied.push(Entry::Change(change));
            if marked {
                self.applied.push(Entry::SaveMark);
            }
            return Err(err);
        }

        if marked {
            self.undone.push(Entry::SaveMark);
        }
        self.undone.push(Entry::Change(change));

        debug!(applied = self.applied.len(), undone = self.undone.len(), "undo");
        Ok(())
    }

    /// Perform the last undone change again.
    pub fn redo(&mut self, timeline: &mut Timeline) -> Result<(), TimelineError> {
        let change = match self.undone.pop() {
            Some(Entry::Change(change)) => change,
            Some(Entry::SaveMark) | None => return Err(SequenceError::NothingToRedo.into()),
        };

        if let Err(err) = change.redo(timeline) {
            self.undone.push(Entry::Change(change));
            return Err(err);
        }

        self.applied.push(Entry::Change(change));

        if self.undone.last() == Some(&Entry::SaveMark) {
            self.undone.pop();
            self.applied.push(Entry::SaveMark);
        }

        debug!(applied = self.applied.len(), undone = self.undone.len(), "redo");
        Ok(())
    }

    /// Mark the current state as saved.
    pub fn mark(&mut self) {
        self.applied.retain(|entry| *entry != Entry::SaveMark);
        self.undone.retain(|entry| *entry != Entry::SaveMark);
        self.applied.push(Entry::SaveMark);
    }

    /// Returns `true` if the current state differs from the last saved one.
    pub fn has_changed(&self) -> bool {
        self.applied.last() != Some(&Entry::SaveMark)
    }

    pub fn can_undo(&self) -> bool {
        self.applied.iter().any(|entry| matches!(entry, Entry::Change(_)))
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }
}

impl Default for ChangeLog {
    fn default() -> Self {
        Self::new()
    }
}
