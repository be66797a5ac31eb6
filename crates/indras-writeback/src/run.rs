//! Interval runs: maximal contiguous buffered byte ranges
//!
//! A run owns a gap-free chain of [`IntervalNode`]s ordered by offset.
//! Every pool-lent buffer held by its nodes goes back to the pool exactly
//! once, when the run is destroyed or dropped.

use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::node::{IntervalNode, Payload};
use crate::pool::BufferPool;

/// A contiguous buffered span `[offset(), end())` backed by one or more nodes
///
/// Invariant: for consecutive nodes `a`, `b`, `a.end() == b.offset()`.
#[derive(Debug)]
pub struct IntervalRun<P: BufferPool> {
    nodes: VecDeque<IntervalNode>,
    pool: Arc<P>,
}

impl<P: BufferPool> IntervalRun<P> {
    /// Create a run holding a single node
    pub fn new(node: IntervalNode, pool: Arc<P>) -> Self {
        let mut nodes = VecDeque::with_capacity(1);
        nodes.push_back(node);
        Self { nodes, pool }
    }

    fn from_nodes(nodes: VecDeque<IntervalNode>, pool: Arc<P>) -> Self {
        debug_assert!(!nodes.is_empty(), "run must hold at least one node");
        Self { nodes, pool }
    }

    fn head(&self) -> &IntervalNode {
        &self.nodes[0]
    }

    fn tail(&self) -> &IntervalNode {
        &self.nodes[self.nodes.len() - 1]
    }

    /// Start offset of the run
    pub fn offset(&self) -> i64 {
        self.head().offset()
    }

    /// Number of bytes covered by the run
    pub fn size(&self) -> i64 {
        self.tail().end() - self.head().offset()
    }

    /// Exclusive end offset of the run
    pub fn end(&self) -> i64 {
        self.tail().end()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Grow the tail node in place with `data`
    ///
    /// The tail payload is promoted into a pool buffer on first growth, so
    /// a stream of sequential appends extends one buffer rather than the
    /// node chain.
    pub fn append_to_tail(&mut self, data: &[u8]) {
        trace!(
            run_start = self.offset(),
            run_end = self.end(),
            appended = data.len(),
            "Appending to run tail"
        );
        if let Some(tail) = self.nodes.back_mut() {
            tail.payload_mut().extend(data, self.pool.as_ref());
        }
    }

    /// Insert `node` as the new head
    ///
    /// The node must end exactly where the run starts.
    pub fn prepend_to_head(&mut self, node: IntervalNode) {
        debug_assert_eq!(node.end(), self.offset(), "prepended node must touch the run");
        trace!(
            node_start = node.offset(),
            run_start = self.offset(),
            run_end = self.end(),
            "Prepending to run head"
        );
        self.nodes.push_front(node);
    }

    /// Splice `next` onto the tail of this run, taking ownership of its nodes
    ///
    /// `next` must start exactly where this run ends. Its buffers are now
    /// owned by `self` and are not released.
    pub fn absorb(&mut self, mut next: IntervalRun<P>) {
        debug_assert_eq!(self.end(), next.offset(), "absorbed run must touch the tail");
        trace!(
            run_start = self.offset(),
            joint = next.offset(),
            run_end = next.end(),
            "Splicing neighbouring runs"
        );
        self.nodes.append(&mut next.nodes);
    }

    /// Copy the bytes of `[start, stop)` into `dest`
    ///
    /// `dest[0]` corresponds to `start`. Offsets outside the run are
    /// skipped; bytes of `dest` with no buffered source are left untouched.
    pub fn read_data(&self, dest: &mut [u8], start: i64, stop: i64) {
        for node in &self.nodes {
            if let Some((from, bytes)) = node.overlap(start, stop) {
                let at = (from - start) as usize;
                dest[at..at + bytes.len()].copy_from_slice(bytes);
            }
        }
    }

    /// Build an independent run with the bytes overlapping `[start, stop)`
    ///
    /// Owned payloads are shared as shallow views. Pooled payloads are copied
    /// out since their buffers return to the pool with this run. The range
    /// must intersect the run.
    pub fn sub_range(&self, start: i64, stop: i64) -> IntervalRun<P> {
        let nodes: VecDeque<IntervalNode> = self
            .nodes
            .iter()
            .filter_map(|node| {
                let (from, bytes) = node.overlap(start, stop)?;
                let data = match node.payload() {
                    Payload::Owned(owned) => {
                        let skip = (from - node.offset()) as usize;
                        owned.slice(skip..skip + bytes.len())
                    }
                    Payload::Pooled(_) => Bytes::copy_from_slice(bytes),
                };
                Some(IntervalNode::new(data, from))
            })
            .collect();
        IntervalRun::from_nodes(nodes, Arc::clone(&self.pool))
    }

    /// The node payloads in offset order
    ///
    /// A single forward pass; nothing is copied.
    pub fn chunks(&self) -> RunChunks<'_> {
        RunChunks {
            inner: self.nodes.iter(),
        }
    }

    /// A reader yielding the run's bytes in offset order
    pub fn to_reader(&self) -> RunReader<'_> {
        RunReader {
            chunks: self.chunks(),
            current: &[],
        }
    }

    /// Release every pool buffer held by the run
    pub fn destroy(self) {
        drop(self);
    }
}

impl<P: BufferPool> Drop for IntervalRun<P> {
    fn drop(&mut self) {
        // Absorbed runs were emptied by the splice
        if self.nodes.is_empty() {
            return;
        }
        let pooled = self.nodes.iter().filter(|n| n.payload().is_pooled()).count();
        debug!(
            offset = self.offset(),
            size = self.size(),
            pooled,
            "Destroying run"
        );
        for node in self.nodes.drain(..) {
            if let Some(buf) = node.into_payload().into_pooled() {
                self.pool.release(buf);
            }
        }
    }
}

/// Iterator over the node payloads of a run
#[derive(Debug)]
pub struct RunChunks<'a> {
    inner: std::collections::vec_deque::Iter<'a, IntervalNode>,
}

impl<'a> Iterator for RunChunks<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(IntervalNode::bytes)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// `Read` adapter chaining the node payloads of a run
#[derive(Debug)]
pub struct RunReader<'a> {
    chunks: RunChunks<'a>,
    current: &'a [u8],
}

impl Read for RunReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.current.is_empty() {
            match self.chunks.next() {
                Some(chunk) => self.current = chunk,
                None => return Ok(0),
            }
        }
        let n = self.current.len().min(buf.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = &self.current[n..];
        Ok(n)
    }
}
