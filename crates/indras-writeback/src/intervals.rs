//! Continuous intervals: the set of dirty runs of one file
//!
//! Writes land via [`ContinuousIntervals::add_interval`], which trims or
//! splits every run the new bytes overlap and then joins the write to any
//! run it touches end to end. Afterwards the runs are pairwise disjoint and
//! never adjacent.
//!
//! ```text
//!   existing:        [====A====]          [==B==]
//!   write:                 [####]
//!   after trim:      [=A'=]      [A"]     [==B==]
//!   after join:      [=A'=####A"]         [==B==]
//! ```
//!
//! The structure is single-threaded; callers serialize access per file.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::node::IntervalNode;
use crate::pool::{BufferPool, SharedBufferPool};
use crate::run::IntervalRun;

/// Unordered collection of disjoint, non-adjacent [`IntervalRun`]s
#[derive(Debug)]
pub struct ContinuousIntervals<P: BufferPool = SharedBufferPool> {
    runs: Vec<IntervalRun<P>>,
    pool: Arc<P>,
}

impl Default for ContinuousIntervals<SharedBufferPool> {
    fn default() -> Self {
        Self::new()
    }
}

impl ContinuousIntervals<SharedBufferPool> {
    /// Create an empty collection backed by the process-wide pool
    pub fn new() -> Self {
        Self::with_pool(SharedBufferPool::global())
    }
}

impl<P: BufferPool> ContinuousIntervals<P> {
    /// Create an empty collection backed by `pool`
    pub fn with_pool(pool: Arc<P>) -> Self {
        Self {
            runs: Vec::new(),
            pool,
        }
    }

    /// The pool lending buffers to this collection's runs
    pub fn pool(&self) -> &Arc<P> {
        &self.pool
    }

    /// Number of runs currently buffered
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// The buffered runs, in no particular order
    pub fn runs(&self) -> impl Iterator<Item = &IntervalRun<P>> {
        self.runs.iter()
    }

    /// Sum of all run sizes
    pub fn total_size(&self) -> i64 {
        self.runs.iter().map(IntervalRun::size).sum()
    }

    /// Buffer `data` at `offset`, overwriting whatever it overlaps
    ///
    /// Empty writes are ignored. The write must end at or before `i64::MAX`;
    /// a write whose end would overflow is dropped.
    pub fn add_interval(&mut self, data: impl Into<Bytes>, offset: i64) {
        let data = data.into();
        if data.is_empty() {
            return;
        }
        let Some(stop) = i64::try_from(data.len())
            .ok()
            .and_then(|len| offset.checked_add(len))
        else {
            debug!(offset, size = data.len(), "Dropping write past the offset range");
            return;
        };
        let start = offset;

        let existing = std::mem::take(&mut self.runs);
        let mut survivors = Vec::with_capacity(existing.len() + 1);
        for run in existing {
            let (run_start, run_end) = (run.offset(), run.end());
            if run_end <= start || stop <= run_start {
                survivors.push(run);
                continue;
            }
            if run_start < start {
                survivors.push(run.sub_range(run_start, start));
            }
            if stop < run_end {
                survivors.push(run.sub_range(stop, run_end));
            }
            debug!(run_start, run_end, start, stop, "Run overwritten by write");
            run.destroy();
        }
        self.runs = survivors;

        let next = self.runs.iter().position(|run| run.offset() == stop);
        let prev = self.runs.iter().position(|run| run.end() == start);

        match (prev, next) {
            (Some(prev), Some(next)) => {
                self.runs[prev].append_to_tail(&data);
                let next_run = self.runs.remove(next);
                let prev = if prev > next { prev - 1 } else { prev };
                self.runs[prev].absorb(next_run);
            }
            (Some(prev), None) => self.runs[prev].append_to_tail(&data),
            (None, Some(next)) => {
                self.runs[next].prepend_to_head(IntervalNode::new(data, offset));
            }
            (None, None) => {
                debug!(
                    offset,
                    size = stop - start,
                    runs = self.runs.len() + 1,
                    "New dirty run"
                );
                let node = IntervalNode::new(data, offset);
                self.runs.push(IntervalRun::new(node, Arc::clone(&self.pool)));
            }
        }
    }

    /// Copy buffered bytes of `[start_offset, start_offset + dest.len())` into `dest`
    ///
    /// Returns the highest offset covered by any run, or 0 if nothing in the
    /// window is buffered. Uncovered bytes of `dest` are left untouched. The
    /// window is clamped at `i64::MAX`.
    pub fn read_data_at(&self, dest: &mut [u8], start_offset: i64) -> i64 {
        let window_end = start_offset.saturating_add(dest.len() as i64);
        let mut max_stop = 0;
        for run in &self.runs {
            let start = start_offset.max(run.offset());
            let stop = window_end.min(run.end());
            if start < stop {
                let at = (start - start_offset) as usize;
                run.read_data(&mut dest[at..], start, stop);
                max_stop = max_stop.max(stop);
            }
        }
        max_stop
    }

    /// Take out the largest run for write-back
    ///
    /// Equal sizes go to the run with the smallest offset. Returns `None`
    /// when nothing non-empty is buffered. The caller owns the run and
    /// destroys it once its chunks are persisted.
    pub fn remove_largest_interval_list(&mut self) -> Option<IntervalRun<P>> {
        let mut best: Option<(usize, i64, i64)> = None;
        for (index, run) in self.runs.iter().enumerate() {
            let (size, offset) = (run.size(), run.offset());
            best = match best {
                None if size > 0 => Some((index, size, offset)),
                Some((_, best_size, best_offset))
                    if size > best_size || (size == best_size && offset < best_offset) =>
                {
                    Some((index, size, offset))
                }
                other => other,
            };
        }

        let (index, size, offset) = best?;
        debug!(
            offset,
            size,
            remaining = self.runs.len() - 1,
            "Evicting largest run"
        );
        Some(self.runs.remove(index))
    }

    /// Destroy every buffered run
    pub fn clear(&mut self) {
        self.runs.drain(..).for_each(IntervalRun::destroy);
    }
}
