//! The write path: object serialization, the incremental body, per-page
//! content amendment, and the stamping session that ties them together.
//!
//! Nothing here ever rewrites input bytes; the output is always a
//! byte-identical copy of the original followed by appended objects, a new
//! cross-reference table, and a trailer chained to the prior revision.

pub mod body;
pub mod serializer;
pub mod stamp;
pub mod stamper;

pub use stamper::Stamper;

use std::io::Write;

/// A writer that tracks how many bytes have passed through it; the byte
/// count is the write cursor used for cross-reference offsets.
pub struct CountingWriter<W: Write> {
    inner: W,
    count: u64,
}

impl<W: Write> CountingWriter<W> {
    /// Wrap an output sink.
    pub fn new(inner: W) -> Self {
        Self { inner, count: 0 }
    }

    /// Bytes written so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counting_writer_tracks_bytes() {
        let mut w = CountingWriter::new(Vec::new());
        w.write_all(b"hello").unwrap();
        assert_eq!(w.count(), 5);
        w.write_all(b" world").unwrap();
        assert_eq!(w.count(), 11);
        assert_eq!(w.into_inner(), b"hello world");
    }
}
