//! Big-endian byte cursor with offset tracking.
//!
//! `ByteCursor` reads from any `AsRef<[u8]>` buffer (typically [`bytes::Bytes`],
//! so that cloning a decoded file is cheap). When backed by a `Vec<u8>` it can
//! also write, growing the buffer on demand.
//!
//! All multi-byte values are big-endian, as required by NetCDF-3.

use crate::error::{NetCdfError, NetCdfResult};

/// Offset-tracked reader/writer over a byte buffer.
#[derive(Debug, Clone)]
pub struct ByteCursor<B = Vec<u8>> {
    buf: B,
    offset: usize,
    mark: usize,
    marks: Vec<usize>,
    last_written: usize,
}

impl<B: AsRef<[u8]>> ByteCursor<B> {
    /// Create a cursor positioned at the start of `buf`.
    pub fn new(buf: B) -> Self {
        let len = buf.as_ref().len();
        Self {
            buf,
            offset: 0,
            mark: 0,
            marks: Vec::new(),
            last_written: len,
        }
    }

    /// Current position in bytes.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buf.as_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `n` more bytes can be read from the current position.
    pub fn available(&self, n: usize) -> bool {
        self.offset.checked_add(n).is_some_and(|end| end <= self.len())
    }

    /// Bytes left after the current position.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.offset)
    }

    /// Move forward by `n` bytes.
    pub fn skip(&mut self, n: usize) -> NetCdfResult<&mut Self> {
        let target = self
            .offset
            .checked_add(n)
            .ok_or_else(|| NetCdfError::range(format!("skip of {} bytes overflows", n)))?;
        self.seek(target)
    }

    /// Move to an absolute position. Seeking to the end of the buffer is allowed.
    pub fn seek(&mut self, offset: usize) -> NetCdfResult<&mut Self> {
        if offset > self.len() {
            return Err(NetCdfError::format(format!(
                "truncated buffer: seek to {} past end of {}-byte buffer",
                offset,
                self.len()
            )));
        }
        self.offset = offset;
        Ok(self)
    }

    /// Remember the current position for a later [`reset`](Self::reset).
    pub fn mark(&mut self) -> &mut Self {
        self.mark = self.offset;
        self
    }

    /// Return to the last [`mark`](Self::mark).
    pub fn reset(&mut self) -> &mut Self {
        self.offset = self.mark;
        self
    }

    /// Push the current position onto the mark stack.
    pub fn push_mark(&mut self) -> &mut Self {
        self.marks.push(self.offset);
        self
    }

    /// Pop the mark stack and move there.
    pub fn pop_mark(&mut self) -> NetCdfResult<&mut Self> {
        let offset = self
            .marks
            .pop()
            .ok_or_else(|| NetCdfError::range("mark stack empty"))?;
        self.offset = offset;
        Ok(self)
    }

    /// Move back to the start of the buffer.
    pub fn rewind(&mut self) -> &mut Self {
        self.offset = 0;
        self
    }

    /// Skip forward to the next 4-byte boundary.
    pub fn align4(&mut self) -> NetCdfResult<&mut Self> {
        let rem = self.offset % 4;
        if rem != 0 {
            self.skip(4 - rem)?;
        }
        Ok(self)
    }

    /// Consume the cursor and return the underlying buffer.
    pub fn into_inner(self) -> B {
        self.buf
    }

    fn take<const N: usize>(&mut self) -> NetCdfResult<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Borrow the next `n` bytes and advance past them.
    pub fn read_bytes(&mut self, n: usize) -> NetCdfResult<&[u8]> {
        if !self.available(n) {
            return Err(NetCdfError::format(format!(
                "truncated buffer: need {} bytes at offset {}, {} available",
                n,
                self.offset,
                self.remaining()
            )));
        }
        let start = self.offset;
        self.offset += n;
        Ok(&self.buf.as_ref()[start..start + n])
    }

    pub fn read_u8(&mut self) -> NetCdfResult<u8> {
        Ok(self.take::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> NetCdfResult<i8> {
        Ok(i8::from_be_bytes(self.take()?))
    }

    pub fn read_u16(&mut self) -> NetCdfResult<u16> {
        Ok(u16::from_be_bytes(self.take()?))
    }

    pub fn read_i16(&mut self) -> NetCdfResult<i16> {
        Ok(i16::from_be_bytes(self.take()?))
    }

    pub fn read_u32(&mut self) -> NetCdfResult<u32> {
        Ok(u32::from_be_bytes(self.take()?))
    }

    pub fn read_i32(&mut self) -> NetCdfResult<i32> {
        Ok(i32::from_be_bytes(self.take()?))
    }

    pub fn read_f32(&mut self) -> NetCdfResult<f32> {
        Ok(f32::from_be_bytes(self.take()?))
    }

    pub fn read_f64(&mut self) -> NetCdfResult<f64> {
        Ok(f64::from_be_bytes(self.take()?))
    }

    /// Read `n` bytes as ASCII/UTF-8 text. Invalid sequences are replaced.
    pub fn read_chars(&mut self, n: usize) -> NetCdfResult<String> {
        let bytes = self.read_bytes(n)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

// ============================================================================
// Write side (owned buffers only)
// ============================================================================

impl ByteCursor<Vec<u8>> {
    /// Create an empty, writable cursor with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut cursor = Self::new(vec![0u8; capacity]);
        cursor.last_written = 0;
        cursor
    }

    /// Grow the buffer so that `n` bytes can be written at the current offset.
    ///
    /// The buffer at least doubles on each growth.
    pub fn ensure_available(&mut self, n: usize) -> &mut Self {
        let needed = self.offset + n;
        if needed > self.buf.len() {
            let new_len = needed.max(self.buf.len() * 2);
            self.buf.resize(new_len, 0);
        }
        self
    }

    fn put(&mut self, bytes: &[u8]) -> &mut Self {
        self.ensure_available(bytes.len());
        self.buf[self.offset..self.offset + bytes.len()].copy_from_slice(bytes);
        self.offset += bytes.len();
        if self.offset > self.last_written {
            self.last_written = self.offset;
        }
        self
    }

    pub fn write_u8(&mut self, value: u8) -> &mut Self {
        self.put(&[value])
    }

    pub fn write_i8(&mut self, value: i8) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_u16(&mut self, value: u16) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_i16(&mut self, value: i16) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_u32(&mut self, value: u32) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> &mut Self {
        self.put(&value.to_be_bytes())
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.put(bytes)
    }

    pub fn write_chars(&mut self, text: &str) -> &mut Self {
        self.put(text.as_bytes())
    }

    /// Write zero bytes up to the next 4-byte boundary.
    pub fn pad4(&mut self) -> &mut Self {
        let rem = self.offset % 4;
        if rem != 0 {
            self.put(&[0u8; 4][..4 - rem]);
        }
        self
    }

    /// Copy of everything written so far.
    pub fn to_vec(&self) -> Vec<u8> {
        self.buf[..self.last_written].to_vec()
    }
}
