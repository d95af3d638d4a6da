//! Tagged-field store
//!
//! Flexible protocol versions end each structure with a tagged-field
//! section: repeated (uvarint key, uvarint length, bytes) triples preceded
//! by a uvarint entry count. Tags a codec version does not understand must
//! survive a decode/encode round-trip untouched, so this module keeps them
//! as opaque key/value pairs.
//!
//! Framing responsibility: the embedding schema writes the leading
//! `uvarint(count)`; [`Tags::append_each`] emits only the entries.

use std::collections::HashMap;

use bytes::{BufMut, BytesMut};

use crate::primitives::{put_uvarint, Reader};

/// An opaque collection of unparsed tags.
///
/// Keys are unique (last write wins). Insertion order is irrelevant:
/// serialization is always in ascending key order so two semantically
/// identical messages produce identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags {
    // HashMap does not allocate until the first insert, so an empty Tags is
    // free to hold in every message.
    keyvals: HashMap<u32, Vec<u8>>,
}

impl Tags {
    /// Number of tags held.
    pub fn len(&self) -> usize {
        self.keyvals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyvals.is_empty()
    }

    /// Set a tag, replacing any existing value for the key.
    ///
    /// The store does not (and cannot) check whether the key collides with
    /// a key the protocol schema itself uses for this message and version.
    /// Setting such a key corrupts the message for any peer that does
    /// understand the tag; avoiding that is the caller's obligation.
    pub fn set(&mut self, key: u32, val: Vec<u8>) {
        self.keyvals.insert(key, val);
    }

    /// Look up a tag's value.
    pub fn get(&self, key: u32) -> Option<&[u8]> {
        self.keyvals.get(&key).map(Vec::as_slice)
    }

    /// Visit every tag in ascending key order.
    pub fn each<F: FnMut(u32, &[u8])>(&self, mut visit: F) {
        if self.keyvals.is_empty() {
            return;
        }
        // Tag sets are expected to be tiny, so sorting at serialize time
        // beats maintaining an ordered structure on every insert.
        let mut ordered: Vec<u32> = self.keyvals.keys().copied().collect();
        ordered.sort_unstable();
        for key in ordered {
            visit(key, &self.keyvals[&key]);
        }
    }

    /// Append every entry as (uvarint key, uvarint length, bytes), in
    /// ascending key order, with no leading count.
    pub fn append_each(&self, dst: &mut BytesMut) {
        self.each(|key, val| {
            put_uvarint(dst, key);
            put_uvarint(dst, val.len() as u32);
            dst.put_slice(val);
        });
    }
}

/// The minimal cursor capability a tag section traversal needs.
///
/// Both operations follow the deferred-failure convention of
/// [`Reader`]: on overrun they fail the cursor internally and return a
/// zero value / empty span.
pub trait TagRead {
    /// Read an unsigned LEB128 varint.
    fn uvarint(&mut self) -> u32;

    /// Read `n` raw bytes.
    fn span(&mut self, n: usize) -> &[u8];
}

impl TagRead for Reader<'_> {
    fn uvarint(&mut self) -> u32 {
        self.read_uvarint()
    }

    fn span(&mut self, n: usize) -> &[u8] {
        Reader::span(self, n)
    }
}

/// Consume and discard a full tag section (count plus entries).
///
/// The performance path for callers that do not need unknown tags
/// preserved; consumes exactly the bytes [`read_tags`] would.
pub fn skip_tags<R: TagRead + ?Sized>(b: &mut R) {
    for _ in 0..b.uvarint() {
        let _key = b.uvarint();
        let size = b.uvarint();
        b.span(size as usize);
    }
}

/// Read a full tag section (count plus entries) into a [`Tags`].
pub fn read_tags<R: TagRead + ?Sized>(b: &mut R) -> Tags {
    let mut tags = Tags::default();
    for _ in 0..b.uvarint() {
        let key = b.uvarint();
        let size = b.uvarint();
        tags.set(key, b.span(size as usize).to_vec());
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(tags: &Tags) -> BytesMut {
        let mut buf = BytesMut::new();
        put_uvarint(&mut buf, tags.len() as u32);
        tags.append_each(&mut buf);
        buf
    }

    #[test]
    fn test_set_last_write_wins() {
        let mut tags = Tags::default();
        tags.set(3, vec![1]);
        tags.set(3, vec![2, 3]);
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.get(3), Some(&[2u8, 3][..]));
    }

    #[test]
    fn test_each_ascending_key_order() {
        let mut tags = Tags::default();
        tags.set(200, vec![0]);
        tags.set(1, vec![1]);
        tags.set(50, vec![2]);

        let mut keys = Vec::new();
        tags.each(|key, _| keys.push(key));
        assert_eq!(keys, vec![1, 50, 200]);
    }

    #[test]
    fn test_append_each_independent_of_insertion_order() {
        let mut a = Tags::default();
        a.set(9, vec![9, 9]);
        a.set(2, vec![2]);
        a.set(400, vec![4]);

        let mut b = Tags::default();
        b.set(400, vec![4]);
        b.set(9, vec![9, 9]);
        b.set(2, vec![2]);

        let mut out_a = BytesMut::new();
        let mut out_b = BytesMut::new();
        a.append_each(&mut out_a);
        b.append_each(&mut out_b);
        assert_eq!(out_a, out_b);
    }

    #[test]
    fn test_append_each_writes_no_count() {
        let mut tags = Tags::default();
        tags.set(1, vec![0xab]);

        let mut out = BytesMut::new();
        tags.append_each(&mut out);
        // key=1, len=1, value
        assert_eq!(&out[..], &[0x01, 0x01, 0xab]);
    }

    #[test]
    fn test_read_tags_roundtrip() {
        let mut tags = Tags::default();
        tags.set(7, vec![1, 2, 3]);
        tags.set(1000, Vec::new());

        let buf = section(&tags);
        let mut r = Reader::new(&buf);
        let back = read_tags(&mut r);
        assert!(r.complete().is_ok());
        assert_eq!(back, tags);
    }

    #[test]
    fn test_skip_and_read_consume_same_bytes() {
        let mut tags = Tags::default();
        tags.set(0, vec![1]);
        tags.set(5, vec![2, 3, 4]);
        tags.set(128, vec![]);

        let buf = section(&tags);
        let trailer = [0xdeu8, 0xad];
        let mut full = BytesMut::from(&buf[..]);
        full.extend_from_slice(&trailer);

        let mut skip = Reader::new(&full);
        skip_tags(&mut skip);
        let skipped = full.len() - skip.remaining();

        let mut read = Reader::new(&full);
        read_tags(&mut read);
        let consumed = full.len() - read.remaining();

        assert_eq!(skipped, consumed);
        assert_eq!(skip.remaining(), trailer.len());
    }

    #[test]
    fn test_skip_zero_tags() {
        let mut buf = BytesMut::new();
        put_uvarint(&mut buf, 0);
        let mut r = Reader::new(&buf);
        skip_tags(&mut r);
        assert!(r.complete().is_ok());
    }

    #[test]
    fn test_read_tags_truncated_section_fails() {
        let mut tags = Tags::default();
        tags.set(1, vec![1, 2, 3, 4]);
        let buf = section(&tags);

        let mut r = Reader::new(&buf[..buf.len() - 2]);
        read_tags(&mut r);
        assert!(r.is_failed());
    }
}
