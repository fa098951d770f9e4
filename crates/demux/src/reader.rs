//! Reader adapter bridging a byte source to the parser engine.
//!
//! The engine owns its reader for the lifetime of one parse pass, while
//! seek logic must be able to rewind the same source and start a fresh
//! pass. `SharedReader` is a cheaply cloneable handle over one underlying
//! source so both sides can hold it; the pipeline is single-threaded
//! (one facade owns one source), so the interior is `Rc<RefCell<..>>`.
//!
//! The cursor is strictly forward-only from the engine's point of view:
//! the only out-of-band jump is [`SharedReader::rewind`], back to byte 0.

use std::cell::RefCell;
use std::io::{self, Read, Seek, SeekFrom};
use std::rc::Rc;

/// Position-accounting reader handle over a seekable byte source.
pub struct SharedReader<R> {
    inner: Rc<RefCell<ReaderState<R>>>,
}

struct ReaderState<R> {
    source: R,
    position: u64,
}

impl<R> Clone for SharedReader<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<R: Read + Seek> SharedReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ReaderState {
                source,
                position: 0,
            })),
        }
    }

    /// Current byte cursor. Monotonic between rewinds.
    pub fn position(&self) -> u64 {
        self.inner.borrow().position
    }

    /// Jump back to byte 0. The only supported out-of-band reposition,
    /// used exclusively by seek logic between engine passes.
    pub fn rewind(&self) -> io::Result<()> {
        let mut state = self.inner.borrow_mut();
        state.source.seek(SeekFrom::Start(0))?;
        state.position = 0;
        Ok(())
    }
}

impl<R: Read + Seek> Read for SharedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.inner.borrow_mut();
        let n = state.source.read(buf)?;
        state.position += n as u64;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn position_tracks_reads() {
        let mut reader = SharedReader::new(Cursor::new(vec![0u8; 64]));
        let mut buf = [0u8; 10];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.position(), 10);
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(reader.position(), 20);
    }

    #[test]
    fn clones_share_the_cursor() {
        let reader = SharedReader::new(Cursor::new(vec![1u8; 32]));
        let mut engine_side = reader.clone();
        let mut buf = [0u8; 8];
        engine_side.read_exact(&mut buf).unwrap();
        assert_eq!(reader.position(), 8);
    }

    #[test]
    fn rewind_resets_to_zero() {
        let mut reader = SharedReader::new(Cursor::new((0u8..32).collect::<Vec<_>>()));
        let mut buf = [0u8; 16];
        reader.read_exact(&mut buf).unwrap();
        reader.rewind().unwrap();
        assert_eq!(reader.position(), 0);
        reader.read_exact(&mut buf[..1]).unwrap();
        assert_eq!(buf[0], 0);
    }

    #[test]
    fn short_source_reports_eof() {
        let mut reader = SharedReader::new(Cursor::new(vec![0u8; 4]));
        let mut buf = [0u8; 8];
        assert!(reader.read_exact(&mut buf).is_err());
    }
}
