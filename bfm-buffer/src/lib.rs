//! Segmented bidirectional byte buffer.
//!
//! An append-dominated byte store with independent read and write cursors.
//! Storage is either a chain of fixed-minimum-size segments or, with
//! [`BufferOptions::CONTINUOUS_STORAGE`], a single segment grown by
//! reallocation. Already-read bytes can be retained for backward seeking
//! ([`BufferOptions::KEEP_BYTES`]), drained segments are recycled through a
//! free list, and an optional [`BufferSource`] refills the buffer when the
//! reader drains it.
//!
//! Cursors are `(segment, offset)` pairs into an index-based segment arena,
//! so no operation can observe a dangling segment reference; see the
//! `segment` module.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(unused_must_use)]

use std::io;

use bitflags::bitflags;
use thiserror::Error;

use crate::segment::{Segment, SegmentArena, SegmentId};

mod segment;

/// Minimum capacity of any newly allocated segment.
pub const MIN_SEGMENT_SIZE: usize = 0x4000;

bitflags! {
    /// Option bits accepted by [`ByteBuffer::new`] and [`ByteBuffer::clear`].
    ///
    /// Unknown bits are ignored.
    pub struct BufferOptions: u32 {
        /// Keep all bytes in one segment grown by reallocation instead of a
        /// segment chain.
        const CONTINUOUS_STORAGE = 1 << 0;
        /// Retain already-read bytes so the read cursor can seek backwards
        /// and report an absolute offset.
        const KEEP_BYTES = 1 << 1;
        /// `clear` only: drop just the segments the reader is done with.
        const DISCARD_READ = 1 << 2;
        /// `clear` only: recycle dropped segments through the free list
        /// instead of releasing them.
        const REUSE_STORAGE = 1 << 3;
    }
}

/// Read-cursor repositioning modes for [`ByteBuffer::seek`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seek {
    /// Move the read cursor back by the given number of bytes. Restores at
    /// most as many bytes as are still attached to the chain.
    Restore(usize),
    /// Place the read cursor at an absolute stream offset. Requires
    /// [`BufferOptions::KEEP_BYTES`].
    Set(usize),
}

/// Errors produced by buffer read and seek operations.
#[derive(Debug, Error)]
pub enum BufferError {
    /// The attached source failed while refilling the buffer.
    #[error("buffer source failed: {0}")]
    Source(#[from] io::Error),
    /// The requested seek is unsupported in the current configuration or
    /// outside the retained byte range.
    #[error("unsupported seek target")]
    InvalidSeek,
}

impl From<BufferError> for io::Error {
    fn from(error: BufferError) -> Self {
        match error {
            BufferError::Source(inner) => inner,
            BufferError::InvalidSeek => io::Error::new(io::ErrorKind::InvalidInput, error),
        }
    }
}

/// Result alias for buffer operations.
pub type Result<T, E = BufferError> = core::result::Result<T, E>;

/// Pull source attached to a [`ByteBuffer`].
///
/// Called when the reader drains the buffer. The implementation pushes new
/// bytes through [`ByteBuffer::write_bytes`] and reports how many it
/// delivered; `Ok(0)` means end of stream. The buffer detaches the source
/// for the duration of the call, so the callback may grow the buffer freely
/// but cannot observe itself.
pub trait BufferSource {
    /// Refill `buffer`, returning the number of bytes pushed.
    fn read(&mut self, buffer: &mut ByteBuffer) -> io::Result<usize>;
}

/// Segmented byte buffer with FIFO read/write cursors.
///
/// ```
/// use bfm_buffer::{BufferOptions, ByteBuffer};
///
/// let mut buffer = ByteBuffer::new(0, BufferOptions::KEEP_BYTES);
/// buffer.write_bytes(b"abc");
///
/// let mut out = [0; 3];
/// assert_eq!(buffer.read_bytes(&mut out).unwrap(), 3);
/// assert_eq!(&out, b"abc");
/// assert_eq!(buffer.offset(), Some(3));
/// ```
pub struct ByteBuffer {
    info: BufferOptions,
    arena: SegmentArena,
    first: Option<SegmentId>,
    read: Option<SegmentId>,
    write: Option<SegmentId>,
    read_pos: usize,
    write_pos: usize,
    /// Total capacity of all chain segments.
    capacity: usize,
    /// Cumulative capacity of segments dropped off the front of the chain.
    read_size: usize,
    free: Option<SegmentId>,
    source: Option<Box<dyn BufferSource>>,
}

impl ByteBuffer {
    /// Create a buffer, preallocating `initial_size` bytes of storage when
    /// it is non-zero. Only the storage-shape bits of `options` are
    /// consulted; unknown bits are ignored.
    pub fn new(initial_size: usize, options: BufferOptions) -> Self {
        let mut buffer = ByteBuffer {
            info: options & (BufferOptions::CONTINUOUS_STORAGE | BufferOptions::KEEP_BYTES),
            arena: SegmentArena::default(),
            first: None,
            read: None,
            write: None,
            read_pos: 0,
            write_pos: 0,
            capacity: 0,
            read_size: 0,
            free: None,
            source: None,
        };

        if initial_size > 0 {
            buffer.push_storage(initial_size);
        }

        buffer
    }

    /// Attach a pull source consulted when the reader drains the buffer.
    pub fn set_source(&mut self, source: Box<dyn BufferSource>) {
        self.source = Some(source);
    }

    /// Detach and return the pull source, if any.
    pub fn take_source(&mut self) -> Option<Box<dyn BufferSource>> {
        self.source.take()
    }

    /// Append `bytes` at the write cursor, growing storage as needed.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let mut rest = bytes;

        while !rest.is_empty() {
            match self.write {
                Some(id) if self.write_pos < self.arena[id].capacity() => {
                    let take = (self.arena[id].capacity() - self.write_pos).min(rest.len());
                    let start = self.write_pos;
                    self.arena[id].data_mut()[start..start + take]
                        .copy_from_slice(&rest[..take]);
                    self.write_pos += take;
                    rest = &rest[take..];
                }
                _ => self.push_storage(rest.len()),
            }
        }
    }

    /// Append a single byte.
    pub fn write_byte(&mut self, byte: u8) {
        self.write_bytes(&[byte]);
    }

    /// Read up to `bytes.len()` bytes at the read cursor, in FIFO order.
    /// Returns the number of bytes delivered; short reads signal end of
    /// stream. Source failures propagate.
    pub fn read_bytes(&mut self, bytes: &mut [u8]) -> Result<usize> {
        let mut filled = 0;

        loop {
            if let Some(id) = self.read {
                let limit = self.read_limit(id);
                let take = (limit - self.read_pos).min(bytes.len() - filled);
                let start = self.read_pos;
                bytes[filled..filled + take]
                    .copy_from_slice(&self.arena[id].data()[start..start + take]);
                self.read_pos += take;
                filled += take;
            }

            if filled == bytes.len() || self.shift_storage()? == 0 {
                return Ok(filled);
            }
        }
    }

    /// Advance the read cursor by up to `size` bytes without copying them
    /// out. Returns the number of bytes discarded.
    pub fn skip_bytes(&mut self, size: usize) -> Result<usize> {
        let mut skipped = 0;

        loop {
            if let Some(id) = self.read {
                let limit = self.read_limit(id);
                let take = (limit - self.read_pos).min(size - skipped);
                self.read_pos += take;
                skipped += take;
            }

            if skipped == size || self.shift_storage()? == 0 {
                return Ok(skipped);
            }
        }
    }

    /// Read one byte; `None` at end of stream.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut byte = [0; 1];

        match self.read_bytes(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Reposition the read cursor. Returns the number of bytes restored for
    /// [`Seek::Restore`], or the new absolute offset for [`Seek::Set`].
    pub fn seek(&mut self, seek: Seek) -> Result<usize> {
        match seek {
            Seek::Restore(count) => Ok(self.restore_bytes(count)),
            Seek::Set(offset) => {
                if !self.info.contains(BufferOptions::KEEP_BYTES) {
                    return Err(BufferError::InvalidSeek);
                }
                self.seek_to_offset(offset)?;
                Ok(offset)
            }
        }
    }

    /// Release storage.
    ///
    /// With [`BufferOptions::DISCARD_READ`], only segments strictly before
    /// the read segment are dropped and the buffer contents stay intact.
    /// Otherwise every chain segment is dropped and the cursors reset to the
    /// empty state. Dropped segments go to the free list when
    /// [`BufferOptions::REUSE_STORAGE`] is set, back to the allocator
    /// otherwise. The free list itself survives until the buffer is dropped.
    pub fn clear(&mut self, options: BufferOptions) {
        let reuse = options.contains(BufferOptions::REUSE_STORAGE);

        if options.contains(BufferOptions::DISCARD_READ) {
            let Some(read) = self.read else { return };

            while let Some(first) = self.first {
                if first == read {
                    break;
                }

                let capacity = self.arena[first].capacity();
                self.first = self.arena[first].next;
                if let Some(next) = self.first {
                    self.arena[next].prev = None;
                }
                self.capacity -= capacity;
                self.read_size += capacity;
                self.retire(first, reuse);
            }
        } else {
            let mut cursor = self.first;
            while let Some(id) = cursor {
                cursor = self.arena[id].next;
                self.retire(id, reuse);
            }

            self.first = None;
            self.read = None;
            self.write = None;
            self.read_pos = 0;
            self.write_pos = 0;
            self.capacity = 0;
            self.read_size = 0;
        }
    }

    /// Number of bytes currently available to read.
    pub fn len(&self) -> usize {
        let Some(read) = self.read else { return 0 };

        let mut size = self.read_limit(read) - self.read_pos;
        if Some(read) == self.write {
            return size;
        }

        let mut cursor = self.arena[read].next;
        while let Some(id) = cursor {
            size += self.read_limit(id);
            if Some(id) == self.write {
                break;
            }
            cursor = self.arena[id].next;
        }

        size
    }

    /// Whether no bytes are available to read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Absolute read offset from the start of the stream. Only available
    /// when already-read bytes are retained ([`BufferOptions::KEEP_BYTES`]).
    pub fn offset(&self) -> Option<usize> {
        if !self.info.contains(BufferOptions::KEEP_BYTES) {
            return None;
        }

        let mut offset = self.read_size;
        let mut cursor = self.first;

        while let Some(id) = cursor {
            if Some(id) == self.read {
                return Some(offset + self.read_pos);
            }
            offset += self.arena[id].capacity();
            cursor = self.arena[id].next;
        }

        Some(offset)
    }

    /// The readable region as a single slice. Continuous storage only.
    pub fn bytes(&self) -> Option<&[u8]> {
        if !self.info.contains(BufferOptions::CONTINUOUS_STORAGE) {
            return None;
        }

        let id = self.read?;
        Some(&self.arena[id].data()[self.read_pos..self.write_pos])
    }

    /// Readable end of `id`'s payload: the write cursor when the reader and
    /// writer share a segment, the full capacity otherwise.
    fn read_limit(&self, id: SegmentId) -> usize {
        if Some(id) == self.write {
            self.write_pos
        } else {
            self.arena[id].capacity()
        }
    }

    /// Grow storage so at least `preferred` more bytes fit, either by
    /// reallocating the single continuous segment or by appending a chain
    /// segment (recycled from the free list when possible).
    fn push_storage(&mut self, preferred: usize) {
        if self.info.contains(BufferOptions::CONTINUOUS_STORAGE) {
            self.grow_continuous(preferred);
        } else {
            self.push_segment(preferred);
        }
    }

    fn grow_continuous(&mut self, preferred: usize) {
        let Some(id) = self.write else {
            let capacity = grow_size(preferred);
            let id = self.arena.insert(Segment::new(capacity));
            self.first = Some(id);
            self.read = Some(id);
            self.write = Some(id);
            self.capacity = capacity;
            return;
        };

        // Without byte retention the reader's leavings are dead weight;
        // slide the live region to the front before growing.
        if !self.info.contains(BufferOptions::KEEP_BYTES) && self.read_pos > 0 {
            let (read_pos, write_pos) = (self.read_pos, self.write_pos);
            self.arena[id].data_mut().copy_within(read_pos..write_pos, 0);
            self.write_pos -= read_pos;
            self.read_pos = 0;
        }

        let want = grow_size(self.write_pos + preferred);
        if want > self.arena[id].capacity() {
            self.arena[id].grow(want);
            self.capacity = want;
        }
    }

    fn push_segment(&mut self, preferred: usize) {
        let id = match self.pop_free() {
            Some(id) => id,
            None => self.arena.insert(Segment::new(grow_size(preferred))),
        };

        self.arena[id].prev = self.write;
        self.arena[id].next = None;

        match self.write {
            Some(write) => self.arena[write].next = Some(id),
            None => {
                self.first = Some(id);
                self.read = Some(id);
                self.read_pos = 0;
            }
        }

        self.capacity += self.arena[id].capacity();
        self.write = Some(id);
        self.write_pos = 0;
    }

    /// Move the reader past its drained segment, or pull the source when the
    /// chain is exhausted. Returns the number of bytes newly available to
    /// read; `Ok(0)` is end of stream.
    fn shift_storage(&mut self) -> Result<usize> {
        if !self.info.contains(BufferOptions::CONTINUOUS_STORAGE) {
            if let Some(id) = self.read {
                if let Some(next) = self.arena[id].next {
                    if self.info.contains(BufferOptions::KEEP_BYTES) {
                        // The drained segment stays attached; restore and
                        // absolute seeks may revisit it.
                    } else {
                        let capacity = self.arena[id].capacity();
                        self.first = Some(next);
                        self.arena[next].prev = None;
                        self.capacity -= capacity;
                        self.read_size += capacity;
                        self.push_free(id);
                    }

                    self.read = Some(next);
                    self.read_pos = 0;

                    let available = self.read_limit(next);
                    if available > 0 {
                        return Ok(available);
                    }
                }
            }
        }

        self.pull_source()
    }

    fn pull_source(&mut self) -> Result<usize> {
        let Some(mut source) = self.source.take() else {
            return Ok(0);
        };

        let pulled = source.read(self);
        self.source = Some(source);

        Ok(pulled?)
    }

    fn restore_bytes(&mut self, count: usize) -> usize {
        let mut restored = 0;

        while restored < count {
            let Some(id) = self.read else { break };

            let take = self.read_pos.min(count - restored);
            self.read_pos -= take;
            restored += take;

            if restored == count {
                break;
            }

            match self.arena[id].prev {
                Some(prev) => {
                    self.read = Some(prev);
                    self.read_pos = self.arena[prev].capacity();
                }
                None => break,
            }
        }

        restored
    }

    fn seek_to_offset(&mut self, offset: usize) -> Result<()> {
        let mut remaining = offset
            .checked_sub(self.read_size)
            .ok_or(BufferError::InvalidSeek)?;
        let mut cursor = self.first.ok_or(BufferError::InvalidSeek)?;

        loop {
            if remaining <= self.read_limit(cursor) {
                self.read = Some(cursor);
                self.read_pos = remaining;
                return Ok(());
            }

            if Some(cursor) == self.write {
                return Err(BufferError::InvalidSeek);
            }

            remaining -= self.arena[cursor].capacity();
            cursor = self.arena[cursor].next.ok_or(BufferError::InvalidSeek)?;
        }
    }

    fn retire(&mut self, id: SegmentId, reuse: bool) {
        if reuse {
            self.push_free(id);
        } else {
            self.arena.remove(id);
        }
    }

    fn push_free(&mut self, id: SegmentId) {
        self.arena[id].prev = None;
        self.arena[id].next = self.free;
        self.free = Some(id);
    }

    fn pop_free(&mut self) -> Option<SegmentId> {
        let id = self.free?;
        self.free = self.arena[id].next;
        self.arena[id].next = None;
        Some(id)
    }
}

impl Default for ByteBuffer {
    fn default() -> Self {
        ByteBuffer::new(0, BufferOptions::empty())
    }
}

impl core::fmt::Debug for ByteBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ByteBuffer")
            .field("info", &self.info)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("has_source", &self.source.is_some())
            .finish_non_exhaustive()
    }
}

impl io::Write for ByteBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl io::Read for ByteBuffer {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(io::Error::from)
    }
}

/// Preferred sizes are padded by a quarter and never fall below the minimum
/// segment size.
fn grow_size(preferred: usize) -> usize {
    (preferred + preferred / 4).max(MIN_SEGMENT_SIZE)
}
