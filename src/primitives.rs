//! Primitive wire codec
//!
//! This module handles the primitive layer of the Kafka binary protocol:
//! big-endian fixed-width integers, length-prefixed strings and bytes,
//! array-length prefixes, and unsigned LEB128 varints, in both the classic
//! and the compact (flexible-version) encodings.
//!
//! # Read side
//!
//! [`Reader`] is a byte cursor with a sticky failure flag. Reading past the
//! end of the input never panics: it flips the cursor into a failed state
//! and returns a zero value without advancing. Decoders chain dozens of
//! reads per message, so failure is checked exactly once, at the end, via
//! [`Reader::complete`]. A corrupted read cannot un-corrupt itself, which
//! makes the single deferred check sufficient.
//!
//! # Write side
//!
//! Free `put_*` functions append to a [`BytesMut`]. Fixed-width integers go
//! through [`BufMut`] directly (`put_i16`, `put_i32`, ...); only the
//! protocol-specific encodings get helpers here.

use bytes::{BufMut, BytesMut};

use crate::error::{KwireError, Result};

// ===== Read side =====

/// Byte cursor over a borrowed input span with deferred failure.
///
/// All `read_*` methods return a best-effort zero value once the cursor has
/// failed; [`Reader::complete`] reports the terminal state.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    src: &'a [u8],
    failed: bool,
}

impl<'a> Reader<'a> {
    /// Create a reader over the full input span.
    pub fn new(src: &'a [u8]) -> Self {
        Reader { src, failed: false }
    }

    /// Number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.src.len()
    }

    /// Whether any read has overrun the input (or hit invalid data).
    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Force the cursor into the failed state.
    ///
    /// Used by decoders that detect invalid data a primitive read cannot
    /// see, e.g. a negative length where the schema forbids one.
    pub fn set_failed(&mut self) {
        self.failed = true;
    }

    // Consumes n bytes, or fails. Never advances after failure, so a failed
    // decode cannot mistake later garbage for valid data.
    fn take(&mut self, n: usize) -> Option<&'a [u8]> {
        if self.failed || self.src.len() < n {
            self.failed = true;
            return None;
        }
        let (head, rest) = self.src.split_at(n);
        self.src = rest;
        Some(head)
    }

    /// Read `n` raw bytes. Returns an empty span on failure.
    pub fn span(&mut self, n: usize) -> &'a [u8] {
        self.take(n).unwrap_or_default()
    }

    pub fn read_i8(&mut self) -> i8 {
        match self.take(1) {
            Some(b) => b[0] as i8,
            None => 0,
        }
    }

    pub fn read_bool(&mut self) -> bool {
        self.read_i8() != 0
    }

    pub fn read_i16(&mut self) -> i16 {
        match self.take(2) {
            Some(b) => i16::from_be_bytes([b[0], b[1]]),
            None => 0,
        }
    }

    pub fn read_i32(&mut self) -> i32 {
        match self.take(4) {
            Some(b) => i32::from_be_bytes([b[0], b[1], b[2], b[3]]),
            None => 0,
        }
    }

    pub fn read_i64(&mut self) -> i64 {
        match self.take(8) {
            Some(b) => i64::from_be_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            None => 0,
        }
    }

    /// Read an unsigned LEB128 varint (at most 5 bytes for a u32).
    pub fn read_uvarint(&mut self) -> u32 {
        let mut value: u32 = 0;
        for i in 0..5 {
            let byte = match self.take(1) {
                Some(b) => b[0],
                None => return 0,
            };
            // The fifth byte may only carry the top 4 bits of a u32.
            if i == 4 && byte > 0x0f {
                self.failed = true;
                return 0;
            }
            value |= u32::from(byte & 0x7f) << (i * 7);
            if byte & 0x80 == 0 {
                return value;
            }
        }
        self.failed = true;
        0
    }

    /// Read an i32 array-length prefix.
    ///
    /// Negative lengths are returned as-is; callers normalize them to zero
    /// elements rather than treating them as an error.
    pub fn read_array_len(&mut self) -> i32 {
        self.read_i32()
    }

    /// Read a compact (uvarint) array-length prefix. Returns −1 for the
    /// null marker, which callers normalize like a negative classic length.
    pub fn read_compact_array_len(&mut self) -> i32 {
        // Computed through i64: a peer can send any 5-byte LEB128, and a
        // value past i32::MAX must not wrap into a bogus length.
        let len = self.read_uvarint() as i64 - 1;
        len.min(i32::MAX as i64) as i32
    }

    fn utf8(&mut self, raw: &'a [u8]) -> &'a str {
        match std::str::from_utf8(raw) {
            Ok(s) => s,
            Err(_) => {
                self.failed = true;
                ""
            }
        }
    }

    /// Read an i16-length-prefixed string, borrowing from the input.
    ///
    /// The returned reference aliases the input buffer; it is only usable
    /// from the zero-copy decode path where the caller keeps the buffer
    /// alive. A negative length fails the cursor.
    pub fn read_borrowed_str(&mut self) -> &'a str {
        let len = self.read_i16();
        if len < 0 {
            self.failed = true;
            return "";
        }
        let raw = self.span(len as usize);
        self.utf8(raw)
    }

    /// Read an i16-length-prefixed string into an owned value.
    pub fn read_string(&mut self) -> String {
        self.read_borrowed_str().to_string()
    }

    /// Read a nullable string: length −1 denotes null, 0 an empty string.
    pub fn read_nullable_string(&mut self) -> Option<String> {
        self.read_nullable_borrowed_str().map(str::to_string)
    }

    /// Borrowed form of [`Reader::read_nullable_string`].
    pub fn read_nullable_borrowed_str(&mut self) -> Option<&'a str> {
        let len = self.read_i16();
        if len < 0 {
            return None;
        }
        let raw = self.span(len as usize);
        Some(self.utf8(raw))
    }

    /// Read a compact string (uvarint length + 1). The null marker fails
    /// the cursor, since the caller asked for a non-nullable string.
    pub fn read_compact_borrowed_str(&mut self) -> &'a str {
        let len = self.read_uvarint() as i64 - 1;
        if len < 0 {
            self.failed = true;
            return "";
        }
        let raw = self.span(len as usize);
        self.utf8(raw)
    }

    /// Owned form of [`Reader::read_compact_borrowed_str`].
    pub fn read_compact_string(&mut self) -> String {
        self.read_compact_borrowed_str().to_string()
    }

    /// Read a compact nullable string (uvarint 0 denotes null).
    pub fn read_compact_nullable_borrowed_str(&mut self) -> Option<&'a str> {
        let len = self.read_uvarint() as i64 - 1;
        if len < 0 {
            return None;
        }
        let raw = self.span(len as usize);
        Some(self.utf8(raw))
    }

    /// Owned form of [`Reader::read_compact_nullable_borrowed_str`].
    pub fn read_compact_nullable_string(&mut self) -> Option<String> {
        self.read_compact_nullable_borrowed_str().map(str::to_string)
    }

    /// Read i32-length-prefixed bytes. A negative length fails the cursor.
    pub fn read_bytes(&mut self) -> Vec<u8> {
        let len = self.read_i32();
        if len < 0 {
            self.failed = true;
            return Vec::new();
        }
        self.span(len as usize).to_vec()
    }

    /// Read nullable i32-length-prefixed bytes (−1 denotes null).
    pub fn read_nullable_bytes(&mut self) -> Option<Vec<u8>> {
        let len = self.read_i32();
        if len < 0 {
            return None;
        }
        Some(self.span(len as usize).to_vec())
    }

    /// Read compact bytes (uvarint length + 1; null marker fails).
    pub fn read_compact_bytes(&mut self) -> Vec<u8> {
        let len = self.read_uvarint() as i64 - 1;
        if len < 0 {
            self.failed = true;
            return Vec::new();
        }
        self.span(len as usize).to_vec()
    }

    /// The single end-of-decode check.
    ///
    /// Errors with [`KwireError::TruncatedInput`] if any read overran the
    /// input and [`KwireError::TrailingBytes`] if unconsumed bytes remain.
    pub fn complete(self) -> Result<()> {
        if self.failed {
            return Err(KwireError::TruncatedInput);
        }
        if !self.src.is_empty() {
            return Err(KwireError::TrailingBytes(self.src.len()));
        }
        Ok(())
    }
}

// ===== Write side =====

/// Append an unsigned LEB128 varint.
pub fn put_uvarint(dst: &mut BytesMut, mut v: u32) {
    while v >= 0x80 {
        dst.put_u8((v as u8 & 0x7f) | 0x80);
        v >>= 7;
    }
    dst.put_u8(v as u8);
}

/// Append a bool as a single byte.
pub fn put_bool(dst: &mut BytesMut, v: bool) {
    dst.put_i8(v as i8);
}

/// Append an i16-length-prefixed string.
pub fn put_string(dst: &mut BytesMut, s: &str) {
    dst.put_i16(s.len() as i16);
    dst.put_slice(s.as_bytes());
}

/// Append a nullable string: −1 length for null, else the classic form.
/// Null and empty are distinct states on the wire.
pub fn put_nullable_string(dst: &mut BytesMut, s: Option<&str>) {
    match s {
        Some(s) => put_string(dst, s),
        None => dst.put_i16(-1),
    }
}

/// Append a compact string (uvarint length + 1).
pub fn put_compact_string(dst: &mut BytesMut, s: &str) {
    put_uvarint(dst, s.len() as u32 + 1);
    dst.put_slice(s.as_bytes());
}

/// Append a compact nullable string (uvarint 0 for null).
pub fn put_compact_nullable_string(dst: &mut BytesMut, s: Option<&str>) {
    match s {
        Some(s) => put_compact_string(dst, s),
        None => put_uvarint(dst, 0),
    }
}

/// Append i32-length-prefixed bytes.
pub fn put_bytes(dst: &mut BytesMut, b: &[u8]) {
    dst.put_i32(b.len() as i32);
    dst.put_slice(b);
}

/// Append nullable i32-length-prefixed bytes (−1 for null).
pub fn put_nullable_bytes(dst: &mut BytesMut, b: Option<&[u8]>) {
    match b {
        Some(b) => put_bytes(dst, b),
        None => dst.put_i32(-1),
    }
}

/// Append compact bytes (uvarint length + 1).
pub fn put_compact_bytes(dst: &mut BytesMut, b: &[u8]) {
    put_uvarint(dst, b.len() as u32 + 1);
    dst.put_slice(b);
}

/// Append an i32 array-length prefix.
pub fn put_array_len(dst: &mut BytesMut, len: usize) {
    dst.put_i32(len as i32);
}

/// Append a compact array-length prefix (uvarint length + 1).
pub fn put_compact_array_len(dst: &mut BytesMut, len: usize) {
    put_uvarint(dst, len as u32 + 1);
}
