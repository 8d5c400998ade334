//! End-to-end inference tests on synthetic baseline/probe buffers.

use std::collections::BTreeMap;

use savediff_core::buffer::{Buffer, ByteWidth, Signedness};
use savediff_core::infer::{
    Encoding, ProbeInput, SchemaInference, build_expected_transitions, detect_shift, map, scan,
};
use savediff_core::locator::{PREFIX_WIDTHS, find_anchors};
use savediff_core::synthetic::SyntheticBufferBuilder;
use savediff_core::{
    CancelToken, CategoryExpectations, Confidence, ConflictKind, InferenceOptions, Schema,
};

const KEY: &str = "Marta Velez";
const NAME_AT: usize = 600;
/// Payload offset of the anchor written at `NAME_AT` with a 2-byte prefix.
const ANCHOR: usize = NAME_AT + 2;

/// A record: attribute bytes at `ANCHOR - 100 + i`, name at `NAME_AT`.
fn record(attributes: &[u8]) -> Buffer {
    SyntheticBufferBuilder::new()
        .with_size(2048, 0)
        .write_bytes(ANCHOR - 100, attributes)
        .write_prefixed_str(NAME_AT, KEY, ByteWidth::Two)
        .build()
}

fn options() -> InferenceOptions {
    InferenceOptions {
        window_start: -256,
        window_end: 256,
        shift_start: -32,
        shift_end: 32,
        ..InferenceOptions::default()
    }
}

fn fields(list: &[(&str, i64, i64)]) -> BTreeMap<String, (i64, i64)> {
    list.iter()
        .map(|&(name, old, new)| (name.to_string(), (old, new)))
        .collect()
}

#[test]
fn test_anchor_symmetry_each_prefix_width() {
    for width in PREFIX_WIDTHS {
        let buffer = SyntheticBufferBuilder::new()
            .with_size(1024, 0x41)
            .write_prefixed_str(333, KEY, width)
            .build();

        let anchors = find_anchors(&buffer, KEY);
        assert_eq!(anchors.len(), 1, "prefix width {}", width);
        assert_eq!(anchors[0].absolute_offset, 333 + width.bytes());
        assert_eq!(anchors[0].prefix_width, width);
    }
}

#[test]
fn test_mapper_uniqueness() {
    let baseline = record(&[7, 50, 7]);
    let probe = record(&[7, 10, 7]);
    let transitions = scan(
        &baseline,
        &probe,
        ANCHOR,
        ANCHOR,
        -256..=256,
        ByteWidth::One,
        Signedness::Unsigned,
    );
    let expected = build_expected_transitions(&fields(&[("composure", 50, 10)]), &[Encoding::Raw]);

    let mapping = map(&transitions, &expected);
    let entry = &mapping.entries["composure"];
    assert_eq!(entry.confidence, Confidence::Confirmed);
    assert_eq!(entry.relative_offset, -99);
}

#[test]
fn test_mapper_elimination() {
    // teamwork 10 -> 2 is visible raw at -100; the scaled reading of
    // teamwork (50 -> 10) collides with decisions' raw 50 -> 10 at -98.
    let baseline = record(&[10, 0, 50]);
    let probe = record(&[2, 0, 10]);
    let transitions = scan(
        &baseline,
        &probe,
        ANCHOR,
        ANCHOR,
        -256..=256,
        ByteWidth::One,
        Signedness::Unsigned,
    );
    let expected = build_expected_transitions(
        &fields(&[("decisions", 50, 10), ("teamwork", 10, 2)]),
        &[Encoding::Raw, Encoding::ScaledBy(5)],
    );
    let shared = &expected[&(transitions[1].old_raw, transitions[1].new_raw)];
    assert_eq!(shared.len(), 2);

    let mapping = map(&transitions, &expected);
    assert_eq!(mapping.entries["teamwork"].relative_offset, -100);
    assert_eq!(mapping.entries["decisions"].relative_offset, -98);
    assert_eq!(mapping.entries["decisions"].confidence, Confidence::Confirmed);
}

#[test]
fn test_shift_detection() {
    let baseline = record(&[31, 32, 33, 34]);
    let expected = build_expected_transitions(
        &fields(&[("a", 31, 41), ("b", 32, 42), ("c", 33, 43), ("d", 34, 44)]),
        &[Encoding::Raw],
    );

    for delta in [-20i64, 3, 17] {
        let at = (ANCHOR as i64 - 100 + delta) as usize;
        let probe = SyntheticBufferBuilder::new()
            .with_size(2048, 0)
            .write_bytes(at, &[41, 42, 43, 44])
            .write_prefixed_str(NAME_AT, KEY, ByteWidth::Two)
            .build();

        let report = detect_shift(
            &baseline,
            &probe,
            ANCHOR,
            ANCHOR,
            -256..=256,
            -32..=32,
            &expected,
            &CancelToken::new(),
        )
        .unwrap();
        assert_eq!(report.shift, delta);
        assert_eq!(report.matches, 4);
    }
}

#[test]
fn test_conflicting_probes_are_flagged() {
    let baseline = record(&[20, 20, 20]);
    let probes = vec![
        ProbeInput {
            name: "personality".to_string(),
            buffer: record(&[20, 5, 20]),
            expectations: CategoryExpectations::new("personality").field("ambition", 20, 5),
        },
        ProbeInput {
            name: "positions".to_string(),
            buffer: record(&[20, 18, 20]),
            expectations: CategoryExpectations::new("positions").field("striker", 20, 18),
        },
    ];

    let schema = SchemaInference::new(&baseline, KEY, options())
        .run(&probes)
        .unwrap();

    assert_eq!(schema.entries["ambition"].confidence, Confidence::Conflicted);
    assert_eq!(schema.entries["striker"].confidence, Confidence::Conflicted);
    assert_eq!(schema.conflicts.len(), 1);
    assert_eq!(schema.conflicts[0].kind, ConflictKind::SharedOffset);
    assert_eq!(schema.conflicts[0].fields, vec!["ambition", "striker"]);
}

#[test]
fn test_wide_field_stays_consistent_across_saves() {
    // A little-endian u16 at -100 between two 0xAA markers. Changing it to 3
    // also reads as a 1-byte change; changing it to 300 does not.
    let stamina = |value: u16| {
        SyntheticBufferBuilder::new()
            .with_size(2048, 0)
            .write_bytes(ANCHOR - 101, &[0xAA, 0, 0, 0xAA])
            .write_u16(ANCHOR - 100, value)
            .write_prefixed_str(NAME_AT, KEY, ByteWidth::Two)
            .build()
    };
    let baseline = stamina(10);
    let probes = vec![
        ProbeInput {
            name: "lowered".to_string(),
            buffer: stamina(3),
            expectations: CategoryExpectations::new("fitness").field("stamina", 10, 3),
        },
        ProbeInput {
            name: "raised".to_string(),
            buffer: stamina(300),
            expectations: CategoryExpectations::new("fitness").field("stamina", 10, 300),
        },
    ];

    let schema = SchemaInference::new(&baseline, KEY, options())
        .run(&probes)
        .unwrap();

    let lowered = &schema.probes[0].mapping;
    assert_eq!(
        lowered.entries["stamina"].encodings(),
        vec![Encoding::Raw, Encoding::Signed16, Encoding::Unsigned16]
    );
    assert_eq!(lowered.exhausted_count(), 0);

    let entry = &schema.entries["stamina"];
    assert_eq!(entry.confidence, Confidence::Confirmed);
    assert_eq!(entry.relative_offset, -100);
    assert_eq!(entry.width, ByteWidth::Two);
    assert_eq!(
        entry.encodings(),
        vec![Encoding::Signed16, Encoding::Unsigned16]
    );
    assert!(schema.conflicts.is_empty());
}

#[test]
fn test_pipeline_is_idempotent() {
    let baseline = record(&[10, 12, 14, 16, 60, 0]);
    let probes = vec![
        ProbeInput {
            name: "technical".to_string(),
            buffer: record(&[3, 12, 14, 16, 60, 0]),
            expectations: CategoryExpectations::new("technical")
                .field("passing", 10, 3)
                .field("vision", 12, 12),
        },
        ProbeInput {
            name: "physical".to_string(),
            buffer: record(&[10, 12, 14, 16, 25, 0]),
            expectations: CategoryExpectations::new("physical").field("pace", 12, 5),
        },
        ProbeInput {
            name: "stale".to_string(),
            buffer: Buffer::new(vec![0; 128]),
            expectations: CategoryExpectations::new("mental").field("flair", 1, 2),
        },
    ];

    let engine = SchemaInference::new(&baseline, KEY, options());
    let first = engine.run(&probes).unwrap().to_json().unwrap();
    let second = engine.run(&probes).unwrap().to_json().unwrap();
    assert_eq!(first, second);

    let schema: Schema = serde_json::from_str(&first).unwrap();
    assert_eq!(schema.entries["passing"].relative_offset, -100);
    assert_eq!(schema.entries["pace"].relative_offset, -96);
    assert_eq!(schema.entries["pace"].encoding, Encoding::ScaledBy(5));
    assert_eq!(schema.failed_probes.len(), 1);
    assert_eq!(schema.failed_probes[0].name, "stale");
}
