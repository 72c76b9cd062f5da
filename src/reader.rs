//! Positional reads over an in-memory buffer.
//!
//! Every descriptor decoder in [`crate::udf`] and [`crate::iso9660`] composes
//! on this type rather than slicing `bytes[a..b]` by hand the way a single
//! ad-hoc struct would. No I/O happens here beyond indexing into the buffer
//! that [`crate::ird`] already decompressed.

use std::io;

/// A random-access, seekable reader over a byte buffer, with little- and
/// big-endian integer reads and fixed-length padded string reads.
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn seek(&mut self, abs_offset: usize) -> io::Result<()> {
        if abs_offset > self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("seek to {abs_offset} past end of buffer ({})", self.buf.len()),
            ));
        }
        self.pos = abs_offset;
        Ok(())
    }

    /// Runs `f` at `abs_offset`, then restores the prior position.
    pub fn with_offset<T>(
        &mut self,
        abs_offset: usize,
        f: impl FnOnce(&mut Self) -> io::Result<T>,
    ) -> io::Result<T> {
        let saved = self.pos;
        self.seek(abs_offset)?;
        let result = f(self);
        self.pos = saved;
        result
    }

    fn take(&mut self, n: usize) -> io::Result<&'a [u8]> {
        if self.pos + n > self.buf.len() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "read of {n} bytes at offset {} past end of buffer ({})",
                    self.pos,
                    self.buf.len()
                ),
            ));
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> io::Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16_le(&mut self) -> io::Result<u16> {
        Ok(u16::from_le_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u16_be(&mut self) -> io::Result<u16> {
        Ok(u16::from_be_bytes(self.take(2)?.try_into().unwrap()))
    }

    pub fn read_u32_le(&mut self) -> io::Result<u32> {
        Ok(u32::from_le_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u32_be(&mut self) -> io::Result<u32> {
        Ok(u32::from_be_bytes(self.take(4)?.try_into().unwrap()))
    }

    pub fn read_u64_le(&mut self) -> io::Result<u64> {
        Ok(u64::from_le_bytes(self.take(8)?.try_into().unwrap()))
    }

    pub fn read_bytes(&mut self, n: usize) -> io::Result<&'a [u8]> {
        self.take(n)
    }

    /// Fixed-length ASCII string; trailing `0x20` (space) and `0x00` bytes
    /// are stripped.
    pub fn read_fixed_string(&mut self, len: usize) -> io::Result<String> {
        let bytes = self.take(len)?;
        let trimmed = bytes
            .iter()
            .rposition(|&b| b != 0x20 && b != 0x00)
            .map(|end| &bytes[..=end])
            .unwrap_or(&[]);
        Ok(String::from_utf8_lossy(trimmed).into_owned())
    }
}
