/// ProgressTracker: which level is current and which are solved.
///
/// Loaded once from the store at construction and written back after every
/// mutation. The in-memory state is authoritative: a store that fails to
/// read or write is logged and otherwise ignored.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use super::save::{KeyValueStore, ProgressRecord, PROGRESS_KEY};

pub struct ProgressTracker<S: KeyValueStore> {
    store: S,
    total: usize,
    current: usize,
    completed: BTreeSet<usize>,
}

impl<S: KeyValueStore> ProgressTracker<S> {
    /// Restore progress for a catalog of `total_levels` levels.
    pub fn new(store: S, total_levels: usize) -> Self {
        let record = load_record(&store, total_levels);
        debug!(
            current = record.current_level_index,
            completed = record.completed_level_indexes.len(),
            "progress restored"
        );
        ProgressTracker {
            store,
            total: total_levels,
            current: record.current_level_index,
            completed: record.completed_level_indexes,
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn total_levels(&self) -> usize {
        self.total
    }

    pub fn is_completed(&self, index: usize) -> EngineResult<bool> {
        if index >= self.total {
            return Err(EngineError::OutOfRange { index, len: self.total });
        }
        Ok(self.completed.contains(&index))
    }

    /// Sorted indexes of solved levels.
    pub fn completed_indexes(&self) -> Vec<usize> {
        self.completed.iter().copied().collect()
    }

    pub fn complete_current(&mut self) {
        if self.completed.insert(self.current) {
            info!(index = self.current, "level completed");
        }
        self.persist();
    }

    pub fn can_advance(&self) -> bool {
        self.current + 1 < self.total
    }

    pub fn advance(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        self.current += 1;
        self.persist();
        true
    }

    pub fn can_retreat(&self) -> bool {
        self.current > 0
    }

    pub fn retreat(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        self.current -= 1;
        self.persist();
        true
    }

    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.total {
            return false;
        }
        self.current = index;
        self.persist();
        true
    }

    /// Whole-number share of solved levels, rounded half away from zero.
    pub fn progress_percentage(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (100.0 * self.completed.len() as f64 / self.total as f64).round() as u32
    }

    pub fn reset_progress(&mut self) {
        info!("progress reset");
        self.current = 0;
        self.completed.clear();
        self.persist();
    }

    fn persist(&mut self) {
        let record = ProgressRecord {
            current_level_index: self.current,
            completed_level_indexes: self.completed.clone(),
        };
        let written = record
            .encode()
            .and_then(|text| self.store.set(PROGRESS_KEY, &text));
        if let Err(e) = written {
            warn!(error = %e, "could not save progress");
        }
    }
}

/// Read the stored record, falling back to a fresh start on any problem.
fn load_record<S: KeyValueStore>(store: &S, total: usize) -> ProgressRecord {
    let text = match store.get(PROGRESS_KEY) {
        Ok(Some(text)) => text,
        Ok(None) => return ProgressRecord::default(),
        Err(e) => {
            warn!(error = %e, "could not read saved progress, starting fresh");
            return ProgressRecord::default();
        }
    };

    let mut record = match ProgressRecord::decode(&text) {
        Ok(record) => record,
        Err(e) => {
            warn!(error = %e, "saved progress is malformed, starting fresh");
            return ProgressRecord::default();
        }
    };

    if record.current_level_index >= total {
        warn!(
            index = record.current_level_index,
            total, "saved level index out of range, starting fresh"
        );
        return ProgressRecord::default();
    }

    let before = record.completed_level_indexes.len();
    record.completed_level_indexes.retain(|&i| i < total);
    if record.completed_level_indexes.len() != before {
        warn!(dropped = before - record.completed_level_indexes.len(), "dropped unknown completed levels");
    }
    record
}
