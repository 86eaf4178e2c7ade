use std::collections::{BTreeMap, btree_map::Values};

use crate::models::RunRecord;

/// Runs keyed by run number.
///
/// The same run can be seen by more than one status query while it moves between
/// states; the last sighting wins. Run numbers are only comparable within one
/// workflow, which is the scope every listing query is restricted to.
#[derive(Debug, Clone, Default)]
pub struct RunIndex {
    runs: BTreeMap<u64, RunRecord>,
}

impl RunIndex {
    pub fn new() -> Self { Self::default() }

    pub fn insert(&mut self, record: RunRecord) -> Option<RunRecord> {
        self.runs.insert(record.run_number, record)
    }

    /// Runs ordered by ascending run number.
    pub fn forward(&self) -> Values<'_, u64, RunRecord> { self.runs.values() }

    /// Runs ordered by descending run number.
    pub fn backward(&self) -> std::iter::Rev<Values<'_, u64, RunRecord>> {
        self.runs.values().rev()
    }

    pub fn get(&self, run_number: u64) -> Option<&RunRecord> { self.runs.get(&run_number) }

    pub fn len(&self) -> usize { self.runs.len() }

    pub fn is_empty(&self) -> bool { self.runs.is_empty() }
}

impl Extend<RunRecord> for RunIndex {
    fn extend<T: IntoIterator<Item = RunRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

impl FromIterator<RunRecord> for RunIndex {
    fn from_iter<T: IntoIterator<Item = RunRecord>>(iter: T) -> Self {
        let mut index = Self::new();
        index.extend(iter);
        index
    }
}
