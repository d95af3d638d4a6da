//! Sticky member metadata codec
//!
//! The sticky partition-assignment strategy serializes each member's prior
//! assignment into an opaque blob exchanged during rebalancing. The blob is
//! versioned but carries no version tag on the wire:
//!
//! ```text
//! current_assignment: [Assignment]
//!   - array_length: i32
//!   - for each assignment:
//!     - topic: string (i16 length prefix)
//!     - partitions: [i32] (i32 length prefix)
//! generation: i32   (version 1 only; absent entirely in version 0)
//! ```
//!
//! Version is inferred from shape: bytes remaining after the assignment
//! array are the generation field, no bytes remaining means the legacy
//! layout and generation −1. The asymmetry is a compatibility shim for the
//! ecosystem's assignment strategy format and must not be "fixed" into an
//! explicit version byte; peers still emit the legacy layout.

use bytes::{BufMut, BytesMut};

use crate::error::Result;
use crate::message::ReadFromBorrowed;
use crate::primitives::{put_array_len, put_string, Reader};

/// One topic's partition assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickyAssignment {
    pub topic: String,
    pub partitions: Vec<i32>,
}

/// A member's prior assignment plus the generation it was computed in.
///
/// Generation −1 is the sentinel for "absent" (the version 0 layout). Any
/// other value, including 0, selects the version 1 layout on encode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyMemberMetadata {
    pub current_assignment: Vec<StickyAssignment>,
    pub generation: i32,
}

impl Default for StickyMemberMetadata {
    fn default() -> Self {
        StickyMemberMetadata {
            current_assignment: Vec::new(),
            generation: -1,
        }
    }
}

impl StickyMemberMetadata {
    /// Decode a blob, inferring the layout version from trailing-byte
    /// presence. Fully consumes `src`.
    pub fn read_from(&mut self, src: &[u8]) -> Result<()> {
        let mut r = Reader::new(src);

        let mut num_assignments = r.read_array_len();
        if num_assignments < 0 {
            num_assignments = 0;
        }
        self.current_assignment.clear();
        // Wire-claimed counts are untrusted; the input bounds how much is
        // worth reserving, and a failed cursor ends the walk early.
        self.current_assignment
            .reserve((num_assignments as usize).min(r.remaining()));
        for _ in 0..num_assignments {
            if r.is_failed() {
                break;
            }
            let topic = r.read_string();
            let mut num_partitions = r.read_array_len();
            if num_partitions < 0 {
                num_partitions = 0;
            }
            let mut partitions =
                Vec::with_capacity((num_partitions as usize).min(r.remaining()));
            for _ in 0..num_partitions {
                if r.is_failed() {
                    break;
                }
                partitions.push(r.read_i32());
            }
            self.current_assignment.push(StickyAssignment { topic, partitions });
        }

        self.generation = if r.remaining() > 0 { r.read_i32() } else { -1 };
        r.complete()
    }

    /// Append the blob in wire form. The generation field is emitted only
    /// when it is not the −1 sentinel.
    pub fn append_to(&self, dst: &mut BytesMut) {
        put_array_len(dst, self.current_assignment.len());
        for assignment in &self.current_assignment {
            put_string(dst, &assignment.topic);
            put_array_len(dst, assignment.partitions.len());
            for &partition in &assignment.partitions {
                dst.put_i32(partition);
            }
        }
        if self.generation != -1 {
            dst.put_i32(self.generation);
        }
    }
}

/// Borrowed view of one topic's assignment; `topic` aliases the source
/// buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StickyAssignmentRef<'a> {
    pub topic: &'a str,
    pub partitions: Vec<i32>,
}

/// Zero-copy counterpart of [`StickyMemberMetadata`]: topic names alias the
/// input buffer instead of being copied. The `'a` lifetime keeps the buffer
/// alive for as long as the view exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StickyMemberMetadataRef<'a> {
    pub current_assignment: Vec<StickyAssignmentRef<'a>>,
    pub generation: i32,
}

impl<'a> ReadFromBorrowed<'a> for StickyMemberMetadataRef<'a> {
    fn read_from_borrowed(src: &'a [u8]) -> Result<Self> {
        let mut r = Reader::new(src);

        let mut num_assignments = r.read_array_len();
        if num_assignments < 0 {
            num_assignments = 0;
        }
        let mut current_assignment =
            Vec::with_capacity((num_assignments as usize).min(r.remaining()));
        for _ in 0..num_assignments {
            if r.is_failed() {
                break;
            }
            let topic = r.read_borrowed_str();
            let mut num_partitions = r.read_array_len();
            if num_partitions < 0 {
                num_partitions = 0;
            }
            let mut partitions =
                Vec::with_capacity((num_partitions as usize).min(r.remaining()));
            for _ in 0..num_partitions {
                if r.is_failed() {
                    break;
                }
                partitions.push(r.read_i32());
            }
            current_assignment.push(StickyAssignmentRef { topic, partitions });
        }

        let generation = if r.remaining() > 0 { r.read_i32() } else { -1 };
        r.complete()?;
        Ok(StickyMemberMetadataRef {
            current_assignment,
            generation,
        })
    }
}
