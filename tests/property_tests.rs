// Property-based tests using proptest
//
// These tests generate random inputs to verify the codec is robust against
// edge cases: arbitrary tag sets, truncation at arbitrary offsets, and
// randomly shaped assignment metadata.

use bytes::BytesMut;
use kwire::messages::HeartbeatRequest;
use kwire::sticky::{StickyAssignment, StickyMemberMetadata};
use kwire::{read_tags, skip_tags, Reader, Request, Tags};
use proptest::prelude::*;

fn tag_entries() -> impl Strategy<Value = Vec<(u32, Vec<u8>)>> {
    prop::collection::vec((0u32..100_000, prop::collection::vec(any::<u8>(), 0..32)), 0..8)
}

proptest! {
    #[test]
    fn prop_tag_serialization_independent_of_insertion_order(entries in tag_entries()) {
        let mut forward = Tags::default();
        for (key, val) in &entries {
            forward.set(*key, val.clone());
        }
        let mut reverse = Tags::default();
        for (key, val) in entries.iter().rev() {
            reverse.set(*key, val.clone());
        }

        let mut out_forward = BytesMut::new();
        let mut out_reverse = BytesMut::new();
        forward.append_each(&mut out_forward);
        reverse.append_each(&mut out_reverse);
        prop_assert_eq!(out_forward, out_reverse);
    }

    #[test]
    fn prop_skip_and_read_consume_identical_byte_counts(entries in tag_entries()) {
        let mut tags = Tags::default();
        for (key, val) in entries {
            tags.set(key, val);
        }
        let mut buf = BytesMut::new();
        kwire::primitives::put_uvarint(&mut buf, tags.len() as u32);
        tags.append_each(&mut buf);

        let mut skipper = Reader::new(&buf);
        skip_tags(&mut skipper);
        let mut reader = Reader::new(&buf);
        let back = read_tags(&mut reader);

        prop_assert_eq!(skipper.remaining(), reader.remaining());
        prop_assert_eq!(skipper.remaining(), 0);
        prop_assert_eq!(back, tags);
    }

    #[test]
    fn prop_heartbeat_roundtrip(
        version in 0i16..=4,
        group_id in "[a-z0-9-]{0,20}",
        generation_id in any::<i32>(),
        member_id in "[a-z0-9-]{0,20}",
    ) {
        let mut req = HeartbeatRequest::default();
        req.set_version(version);
        req.group_id = group_id;
        req.generation_id = generation_id;
        req.member_id = member_id;

        let mut buf = BytesMut::new();
        req.append_to(&mut buf);

        let mut back = HeartbeatRequest::default();
        back.set_version(version);
        back.read_from(&buf).unwrap();
        prop_assert_eq!(back, req);
    }

    #[test]
    fn prop_heartbeat_truncation_never_succeeds(
        group_id in "[a-z0-9-]{1,16}",
        member_id in "[a-z0-9-]{1,16}",
        cut_seed in any::<prop::sample::Index>(),
    ) {
        let mut req = HeartbeatRequest::default();
        req.set_version(4);
        req.group_id = group_id;
        req.member_id = member_id;
        req.unknown_tags.set(3, vec![1, 2, 3]);

        let mut buf = BytesMut::new();
        req.append_to(&mut buf);
        prop_assume!(buf.len() > 1);
        let cut = 1 + cut_seed.index(buf.len() - 1);

        let mut back = HeartbeatRequest::default();
        back.set_version(4);
        prop_assert!(back.read_from(&buf[..cut]).is_err());
    }

    #[test]
    fn prop_sticky_roundtrip(
        assignments in prop::collection::vec(
            ("[a-z][a-z0-9.-]{0,24}", prop::collection::vec(any::<i32>(), 0..12)),
            0..6,
        ),
        generation in any::<i32>(),
    ) {
        let meta = StickyMemberMetadata {
            current_assignment: assignments
                .into_iter()
                .map(|(topic, partitions)| StickyAssignment { topic, partitions })
                .collect(),
            generation,
        };

        let mut buf = BytesMut::new();
        meta.append_to(&mut buf);

        let mut back = StickyMemberMetadata::default();
        back.read_from(&buf).unwrap();
        prop_assert_eq!(back, meta);
    }

    #[test]
    fn prop_sticky_generation_presence_tracks_sentinel(generation in any::<i32>()) {
        let meta = StickyMemberMetadata {
            current_assignment: Vec::new(),
            generation,
        };
        let mut buf = BytesMut::new();
        meta.append_to(&mut buf);
        // Empty array is 4 bytes; the generation adds 4 more unless it is
        // the -1 sentinel.
        if generation == -1 {
            prop_assert_eq!(buf.len(), 4);
        } else {
            prop_assert_eq!(buf.len(), 8);
        }
    }
}
