//! Interval nodes: the smallest unit of buffered payload

use bytes::{Bytes, BytesMut};

use crate::pool::BufferPool;

/// Storage behind a node
///
/// A node starts out holding the caller's bytes directly. When a run grows
/// its tail, the tail payload is promoted into a pool-lent buffer that can
/// absorb further appends in place.
#[derive(Debug)]
pub enum Payload {
    /// Bytes handed in by the writer, possibly a shallow view
    Owned(Bytes),
    /// A buffer lent by the pool; must go back to it on release
    Pooled(BytesMut),
}

impl Payload {
    /// View the payload bytes, whichever variant holds them
    pub fn as_slice(&self) -> &[u8] {
        match self {
            Payload::Owned(bytes) => &bytes[..],
            Payload::Pooled(buf) => &buf[..],
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_pooled(&self) -> bool {
        matches!(self, Payload::Pooled(_))
    }

    /// Move owned bytes into a pool buffer. No-op if already pooled.
    pub fn promote<P: BufferPool + ?Sized>(&mut self, pool: &P) {
        if let Payload::Owned(bytes) = self {
            let mut buf = pool.acquire();
            buf.clear();
            buf.extend_from_slice(&bytes[..]);
            *self = Payload::Pooled(buf);
        }
    }

    /// Append bytes in place, promoting first if needed
    pub fn extend<P: BufferPool + ?Sized>(&mut self, data: &[u8], pool: &P) {
        self.promote(pool);
        if let Payload::Pooled(buf) = self {
            buf.extend_from_slice(data);
        }
    }

    /// The pool buffer to hand back, if any
    pub fn into_pooled(self) -> Option<BytesMut> {
        match self {
            Payload::Owned(_) => None,
            Payload::Pooled(buf) => Some(buf),
        }
    }
}

/// A buffered byte range `[offset, offset + size)`
#[derive(Debug)]
pub struct IntervalNode {
    offset: i64,
    payload: Payload,
}

impl IntervalNode {
    /// Create a node holding the writer's bytes directly
    pub fn new(data: Bytes, offset: i64) -> Self {
        Self {
            offset,
            payload: Payload::Owned(data),
        }
    }

    pub fn offset(&self) -> i64 {
        self.offset
    }

    /// Size in bytes; always the payload length
    pub fn size(&self) -> i64 {
        self.payload.len() as i64
    }

    pub fn end(&self) -> i64 {
        self.offset + self.size()
    }

    /// The effective payload, regardless of storage
    pub fn bytes(&self) -> &[u8] {
        self.payload.as_slice()
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub(crate) fn payload_mut(&mut self) -> &mut Payload {
        &mut self.payload
    }

    pub(crate) fn into_payload(self) -> Payload {
        self.payload
    }

    /// Bytes of this node overlapping `[start, stop)`, with their absolute start
    ///
    /// Returns `None` when the ranges do not intersect.
    pub(crate) fn overlap(&self, start: i64, stop: i64) -> Option<(i64, &[u8])> {
        let node_start = start.max(self.offset);
        let node_stop = stop.min(self.end());
        if node_start >= node_stop {
            return None;
        }
        let from = (node_start - self.offset) as usize;
        let to = (node_stop - self.offset) as usize;
        Some((node_start, &self.bytes()[from..to]))
    }
}
