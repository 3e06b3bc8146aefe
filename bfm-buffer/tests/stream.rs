use std::collections::VecDeque;
use std::io::{self, Read, Write};

use bfm_buffer::{BufferError, BufferOptions, BufferSource, ByteBuffer, Seek, MIN_SEGMENT_SIZE};
use quickcheck_macros::quickcheck;
use rand::{rngs::StdRng, Rng, SeedableRng};

fn pattern(len: usize, seed: u64) -> Vec<u8> {
    let rng = &mut StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

/// Write in chunks small enough that the chain actually grows segment by
/// segment instead of absorbing everything into one oversized allocation.
fn write_chunked(buffer: &mut ByteBuffer, bytes: &[u8]) {
    for chunk in bytes.chunks(1000) {
        buffer.write_bytes(chunk);
    }
}

#[test]
fn cross_segment_write_then_read() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::KEEP_BYTES);
    let data = pattern(20_000, 2322);
    assert!(data.len() > MIN_SEGMENT_SIZE);

    write_chunked(&mut buffer, &data);
    assert_eq!(buffer.len(), data.len());

    let mut sink = vec![0; data.len()];
    assert_eq!(buffer.read_bytes(&mut sink).unwrap(), data.len());
    assert_eq!(sink, data);
    assert_eq!(buffer.offset(), Some(20_000));
    assert!(buffer.is_empty());
}

#[test]
fn seek_restore_rereads_the_same_bytes() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::KEEP_BYTES);
    let data = pattern(40_000, 7);
    write_chunked(&mut buffer, &data);

    let mut first = vec![0; data.len()];
    assert_eq!(buffer.read_bytes(&mut first).unwrap(), data.len());

    assert_eq!(buffer.seek(Seek::Restore(data.len())).unwrap(), data.len());
    assert_eq!(buffer.offset(), Some(0));

    let mut second = vec![0; data.len()];
    assert_eq!(buffer.read_bytes(&mut second).unwrap(), data.len());
    assert_eq!(first, second);
    assert_eq!(first, data);
}

#[test]
fn restore_stops_at_recycled_segments() {
    // Without byte retention, drained segments leave the chain; a restore
    // can only back up within the segment the reader is in.
    let mut buffer = ByteBuffer::new(0, BufferOptions::empty());
    let data = pattern(40_000, 11);
    write_chunked(&mut buffer, &data);

    let mut sink = vec![0; data.len()];
    assert_eq!(buffer.read_bytes(&mut sink).unwrap(), data.len());

    let restored = buffer.seek(Seek::Restore(data.len())).unwrap();
    assert!(restored < data.len());
}

#[test]
fn absolute_seek_repositions_the_reader() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::KEEP_BYTES);
    let data = pattern(40_000, 13);
    write_chunked(&mut buffer, &data);

    let mut sink = vec![0; data.len()];
    assert_eq!(buffer.read_bytes(&mut sink).unwrap(), data.len());

    // Somewhere inside a later segment.
    let target = 20_000;
    assert_eq!(buffer.seek(Seek::Set(target)).unwrap(), target);
    assert_eq!(buffer.offset(), Some(target));

    let mut tail = vec![0; data.len() - target];
    assert_eq!(buffer.read_bytes(&mut tail).unwrap(), tail.len());
    assert_eq!(tail, &data[target..]);
}

#[test]
fn absolute_seek_needs_keep_bytes() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::empty());
    buffer.write_bytes(b"abc");

    assert!(matches!(
        buffer.seek(Seek::Set(0)),
        Err(BufferError::InvalidSeek)
    ));
    assert_eq!(buffer.offset(), None);
}

#[test]
fn absolute_seek_rejects_unwritten_offsets() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::KEEP_BYTES);
    buffer.write_bytes(b"abc");

    assert_eq!(buffer.seek(Seek::Set(3)).unwrap(), 3);
    assert!(matches!(
        buffer.seek(Seek::Set(4)),
        Err(BufferError::InvalidSeek)
    ));
}

#[test]
fn read_byte_and_skip() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::empty());
    buffer.write_bytes(&[1, 2, 3, 4, 5]);

    assert_eq!(buffer.read_byte().unwrap(), Some(1));
    assert_eq!(buffer.skip_bytes(3).unwrap(), 3);
    assert_eq!(buffer.read_byte().unwrap(), Some(5));
    assert_eq!(buffer.read_byte().unwrap(), None);
    assert_eq!(buffer.skip_bytes(9).unwrap(), 0);
}

struct ChunkSource {
    chunks: VecDeque<Vec<u8>>,
}

impl BufferSource for ChunkSource {
    fn read(&mut self, buffer: &mut ByteBuffer) -> io::Result<usize> {
        match self.chunks.pop_front() {
            Some(chunk) => {
                buffer.write_bytes(&chunk);
                Ok(chunk.len())
            }
            None => Ok(0),
        }
    }
}

struct FailingSource;

impl BufferSource for FailingSource {
    fn read(&mut self, _buffer: &mut ByteBuffer) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "source broke"))
    }
}

#[test]
fn source_refills_a_drained_buffer() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::empty());
    buffer.set_source(Box::new(ChunkSource {
        chunks: VecDeque::from([b"hello ".to_vec(), b"world".to_vec()]),
    }));

    let mut sink = vec![0; 16];
    let got = buffer.read_bytes(&mut sink).unwrap();
    assert_eq!(&sink[..got], b"hello world");

    // Exhausted source reads as end of stream.
    assert_eq!(buffer.read_byte().unwrap(), None);
}

#[test]
fn source_refills_continuous_storage() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::CONTINUOUS_STORAGE);
    buffer.set_source(Box::new(ChunkSource {
        chunks: VecDeque::from([pattern(MIN_SEGMENT_SIZE, 3), pattern(MIN_SEGMENT_SIZE, 4)]),
    }));

    let mut sink = vec![0; 2 * MIN_SEGMENT_SIZE];
    assert_eq!(buffer.read_bytes(&mut sink).unwrap(), sink.len());
    assert_eq!(&sink[..MIN_SEGMENT_SIZE], pattern(MIN_SEGMENT_SIZE, 3));
}

#[test]
fn source_errors_propagate() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::empty());
    buffer.write_bytes(b"ab");
    buffer.set_source(Box::new(FailingSource));

    let mut sink = vec![0; 4];
    assert!(matches!(
        buffer.read_bytes(&mut sink),
        Err(BufferError::Source(_))
    ));

    // The buffer itself stays usable; detaching the source unblocks it.
    buffer.take_source();
    buffer.write_bytes(b"cd");
    let mut sink = vec![0; 2];
    assert_eq!(buffer.read_bytes(&mut sink).unwrap(), 2);
    assert_eq!(&sink, b"cd");
}

#[test]
fn io_traits_delegate_to_the_cursors() {
    let mut buffer = ByteBuffer::new(0, BufferOptions::empty());
    buffer.write_all(b"through std::io").unwrap();
    buffer.flush().unwrap();

    let mut out = Vec::new();
    buffer.read_to_end(&mut out).unwrap();
    assert_eq!(out, b"through std::io");
}

fn fifo_matches(options: BufferOptions, ops: &[(Vec<u8>, u8)]) -> bool {
    let mut buffer = ByteBuffer::new(0, options);
    let mut model: VecDeque<u8> = VecDeque::new();

    for (data, read_len) in ops {
        buffer.write_bytes(data);
        model.extend(data.iter().copied());

        let mut sink = vec![0; usize::from(*read_len)];
        let Ok(got) = buffer.read_bytes(&mut sink) else {
            return false;
        };

        let expected = sink.len().min(model.len());
        if got != expected {
            return false;
        }

        let front: Vec<u8> = model.drain(..got).collect();
        if sink[..got] != front[..] {
            return false;
        }
    }

    let mut rest = vec![0; model.len()];
    buffer.read_bytes(&mut rest).ok() == Some(model.len()) && rest == Vec::from(model)
}

#[quickcheck]
fn reads_are_a_prefix_of_writes(ops: Vec<(Vec<u8>, u8)>) -> bool {
    fifo_matches(BufferOptions::empty(), &ops)
        && fifo_matches(BufferOptions::KEEP_BYTES, &ops)
        && fifo_matches(BufferOptions::CONTINUOUS_STORAGE, &ops)
        && fifo_matches(
            BufferOptions::CONTINUOUS_STORAGE | BufferOptions::KEEP_BYTES,
            &ops,
        )
}

#[quickcheck]
fn offset_tracks_bytes_read(chunks: Vec<Vec<u8>>) -> bool {
    let mut buffer = ByteBuffer::new(0, BufferOptions::KEEP_BYTES);
    let mut total = 0;

    for chunk in &chunks {
        buffer.write_bytes(chunk);
        total += chunk.len();
    }

    let mut read = 0;
    let mut sink = vec![0; 3000];
    loop {
        let Ok(got) = buffer.read_bytes(&mut sink) else {
            return false;
        };
        read += got;
        if buffer.offset() != Some(read) {
            return false;
        }
        if got < sink.len() {
            break;
        }
    }

    read == total
}
