//! # Indras Writeback
//!
//! Write-back buffering for sparse, possibly overlapping writes to a file.
//!
//! Random writes are coalesced into contiguous dirty runs before they are
//! flushed to chunk storage. Later writes win where they overlap earlier
//! ones, reads are served from the buffered bytes, and the flush path pulls
//! out the largest run first.
//!
//! ## Features
//!
//! - **ContinuousIntervals**: overlap-resolving insertion, point reads and
//!   largest-run eviction over a set of disjoint runs
//! - **IntervalRun**: a gap-free chain of nodes with sub-range extraction
//!   and a streaming reader for upload
//! - **BufferPool**: injectable buffer allocator; repeated tail appends grow
//!   one pooled buffer instead of an ever longer node chain
//! - **SharedBufferPool**: the default process-wide free-list pool
//!
//! ## Example
//!
//! ```rust
//! use std::io::Read;
//! use indras_writeback::ContinuousIntervals;
//!
//! let mut dirty = ContinuousIntervals::new();
//! dirty.add_interval("AAAAAA", 0);
//! dirty.add_interval("BB", 2);
//!
//! let mut buf = [0u8; 6];
//! assert_eq!(dirty.read_data_at(&mut buf, 0), 6);
//! assert_eq!(&buf, b"AABBAA");
//!
//! let run = dirty.remove_largest_interval_list().unwrap();
//! let mut upload = Vec::new();
//! run.to_reader().read_to_end(&mut upload).unwrap();
//! assert_eq!((run.offset(), upload.as_slice()), (0, &b"AABBAA"[..]));
//! run.destroy();
//! ```

pub mod config;
pub mod error;
pub mod intervals;
pub mod node;
pub mod pool;
pub mod run;

// Re-exports
pub use config::PoolConfig;
pub use error::{WritebackError, WritebackResult};
pub use intervals::ContinuousIntervals;
pub use node::{IntervalNode, Payload};
pub use pool::{BufferPool, PoolStats, SharedBufferPool};
pub use run::{IntervalRun, RunChunks, RunReader};
