//! Per-probe inference and the batch driver.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::buffer::Buffer;
use crate::cancel::CancelToken;
use crate::config::InferenceOptions;
use crate::error::{Error, Result};
use crate::locator::{self, Anchor};
use crate::schema::{self, FailedProbe, Schema};

use super::alignment::{ShiftReport, detect_shift};
use super::expectations::CategoryExpectations;
use super::mapper::{ProbeMapping, map};
use super::resolver::{build_expected_transitions, scan_layouts_for};
use super::scanner::scan_layouts;
use super::types::ExpectedTransitions;

/// One controlled experiment: a modified buffer plus what was changed.
#[derive(Debug, Clone)]
pub struct ProbeInput {
    pub name: String,
    pub buffer: Buffer,
    pub expectations: CategoryExpectations,
}

/// Everything learned from one probe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub probe: String,
    pub category: String,
    pub anchor_key: String,
    pub base_anchor: usize,
    /// Probe anchor before any shift.
    pub probe_anchor: usize,
    /// Shift applied to `probe_anchor` for the final mapping.
    pub shift: i64,
    /// Present when alignment correction ran.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shift_search: Option<ShiftReport>,
    pub transitions_scanned: usize,
    pub mapping: ProbeMapping,
}

/// Schema inference over one baseline buffer.
pub struct SchemaInference<'a> {
    baseline: &'a Buffer,
    anchor_key: String,
    options: InferenceOptions,
    cancel: CancelToken,
}

impl<'a> SchemaInference<'a> {
    pub fn new(baseline: &'a Buffer, anchor_key: impl Into<String>, options: InferenceOptions) -> Self {
        Self {
            baseline,
            anchor_key: anchor_key.into(),
            options,
            cancel: CancelToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn options(&self) -> &InferenceOptions {
        &self.options
    }

    /// Infer every probe and aggregate the results.
    ///
    /// The run-wide anchor must exist in the baseline. Recoverable per-probe
    /// failures (anchor missing in a probe, unreadable region) are recorded
    /// in `failed_probes` and the run continues; cancellation aborts it.
    pub fn run(&self, probes: &[ProbeInput]) -> Result<Schema> {
        self.options.validate()?;
        locator::locate(self.baseline, &self.anchor_key, self.options.anchor)?;

        let mut reports = Vec::with_capacity(probes.len());
        let mut failed = Vec::new();

        for probe in probes {
            self.cancel.check()?;
            match self.infer_probe(probe) {
                Ok(report) => reports.push(report),
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping probe {}: {}", probe.name, e);
                    failed.push(FailedProbe::new(&probe.name, &e));
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            "{} probe(s) mapped, {} failed",
            reports.len(),
            failed.len()
        );
        let mut schema = schema::aggregate(&self.anchor_key, reports);
        for failure in failed {
            schema.record_failure(failure);
        }
        Ok(schema)
    }

    /// Scan, map and, if the direct mapping looks misaligned, shift-correct
    /// one probe.
    pub fn infer_probe(&self, probe: &ProbeInput) -> Result<ProbeReport> {
        let expectations = &probe.expectations;
        let key = expectations.anchor.as_deref().unwrap_or(&self.anchor_key);

        let base_anchor = locator::locate(self.baseline, key, self.options.anchor)?;
        let probe_anchor = nearest_anchor(&probe.buffer, key, base_anchor.absolute_offset)?;
        debug!(
            "Probe {}: anchor {:?} at {:#x} (baseline {:#x})",
            probe.name, key, probe_anchor.absolute_offset, base_anchor.absolute_offset
        );

        let encodings = expectations.encodings_or(&self.options.encodings);
        let expected = build_expected_transitions(&expectations.fields, encodings);
        let layouts = scan_layouts_for(encodings);

        let scan_at = |anchor: usize| {
            scan_layouts(
                self.baseline,
                &probe.buffer,
                base_anchor.absolute_offset,
                anchor,
                self.options.window(),
                &layouts,
            )
        };

        let transitions = scan_at(probe_anchor.absolute_offset);
        let mut report = ProbeReport {
            probe: probe.name.clone(),
            category: expectations.category.clone(),
            anchor_key: key.to_string(),
            base_anchor: base_anchor.absolute_offset,
            probe_anchor: probe_anchor.absolute_offset,
            shift: 0,
            shift_search: None,
            transitions_scanned: transitions.len(),
            mapping: map(&transitions, &expected),
        };

        if self.needs_alignment(&report.mapping, &expected) {
            let search = detect_shift(
                self.baseline,
                &probe.buffer,
                base_anchor.absolute_offset,
                probe_anchor.absolute_offset,
                self.options.window(),
                self.options.shift_range(),
                &expected,
                &self.cancel,
            )?;
            report.shift_search = Some(search);

            if let Some(shifted) = locate_shifted(&probe_anchor, search.shift) {
                let transitions = scan_at(shifted);
                let mapping = map(&transitions, &expected);
                if mapping.confirmed_count() > report.mapping.confirmed_count() {
                    info!(
                        "Probe {}: shift {:+} confirms {} field(s) (was {})",
                        probe.name,
                        search.shift,
                        mapping.confirmed_count(),
                        report.mapping.confirmed_count()
                    );
                    report.shift = search.shift;
                    report.transitions_scanned = transitions.len();
                    report.mapping = mapping;
                }
            }
        }

        info!(
            "Probe {} ({}): {} confirmed, {} ambiguous, {} unmapped, {} unobserved",
            report.probe,
            report.category,
            report.mapping.confirmed_count(),
            report.mapping.ambiguous.len(),
            report.mapping.unmapped.len(),
            report.mapping.unobserved.len()
        );
        Ok(report)
    }

    fn needs_alignment(&self, mapping: &ProbeMapping, expected: &ExpectedTransitions) -> bool {
        !expected.is_empty()
            && (mapping.match_ratio() < self.options.min_match_ratio
                || mapping.exhausted_count() > 0)
    }
}

/// The probe occurrence of `key` closest to where the baseline has it.
fn nearest_anchor(buffer: &Buffer, key: &str, near: usize) -> Result<Anchor> {
    let anchors = locator::find_anchors(buffer, key);
    locator::rank_by_distance(&anchors, near)
        .first()
        .map(|a| (*a).clone())
        .ok_or_else(|| Error::anchor_not_found(key))
}

fn locate_shifted(anchor: &Anchor, shift: i64) -> Option<usize> {
    if shift == 0 {
        return None;
    }
    crate::buffer::offset_from(anchor.absolute_offset, shift)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::ByteWidth;
    use crate::infer::types::Confidence;
    use crate::synthetic::SyntheticBufferBuilder;

    const KEY: &str = "Ada Quill";

    fn options() -> InferenceOptions {
        InferenceOptions {
            window_start: -64,
            window_end: 64,
            shift_start: -16,
            shift_end: 16,
            ..InferenceOptions::default()
        }
    }

    fn record(at: usize, bytes: &[u8]) -> Buffer {
        SyntheticBufferBuilder::new()
            .with_size(512, 0)
            .write_bytes(at, bytes)
            .write_prefixed_str(at + 20, KEY, ByteWidth::One)
            .build()
    }

    #[test]
    fn test_infer_probe_direct() {
        // anchor payload at 221; attribute bytes at relative -21..-19
        let baseline = record(200, &[10, 12, 14]);
        let probe = ProbeInput {
            name: "technical".to_string(),
            buffer: record(200, &[10, 3, 14]),
            expectations: CategoryExpectations::new("technical")
                .field("passing", 12, 3)
                .field("crossing", 14, 14),
        };

        let engine = SchemaInference::new(&baseline, KEY, options());
        let report = engine.infer_probe(&probe).unwrap();
        assert_eq!(report.shift, 0);
        assert!(report.shift_search.is_none());
        let entry = &report.mapping.entries["passing"];
        assert_eq!(entry.relative_offset, -20);
        assert_eq!(entry.confidence, Confidence::Confirmed);
    }

    #[test]
    fn test_infer_probe_applies_shift() {
        let baseline = record(200, &[11, 12, 13]);
        // Record drifted: attribute block moved 4 bytes further from the name
        let buffer = SyntheticBufferBuilder::new()
            .with_size(512, 0)
            .write_bytes(200 - 4, &[21, 22, 23])
            .write_prefixed_str(220, KEY, ByteWidth::One)
            .build();
        let probe = ProbeInput {
            name: "drifted".to_string(),
            buffer,
            expectations: CategoryExpectations::new("attributes")
                .field("a", 11, 21)
                .field("b", 12, 22)
                .field("c", 13, 23),
        };

        let engine = SchemaInference::new(&baseline, KEY, options());
        let report = engine.infer_probe(&probe).unwrap();
        assert_eq!(report.shift, -4);
        assert_eq!(report.mapping.confirmed_count(), 3);
        assert_eq!(report.mapping.entries["a"].relative_offset, -21);
    }

    #[test]
    fn test_missing_probe_anchor_is_recorded() {
        let baseline = record(200, &[10]);
        let probe = ProbeInput {
            name: "renamed".to_string(),
            buffer: Buffer::new(vec![0; 256]),
            expectations: CategoryExpectations::new("attributes").field("a", 10, 3),
        };

        let schema = SchemaInference::new(&baseline, KEY, options())
            .run(&[probe])
            .unwrap();
        assert!(schema.probes.is_empty());
        assert_eq!(schema.failed_probes.len(), 1);
        assert_eq!(schema.failed_probes[0].name, "renamed");
    }

    #[test]
    fn test_missing_baseline_anchor_is_fatal() {
        let baseline = Buffer::new(vec![0; 256]);
        let err = SchemaInference::new(&baseline, KEY, options())
            .run(&[])
            .unwrap_err();
        assert!(matches!(err, Error::AnchorNotFound { .. }));
    }

    #[test]
    fn test_cancelled_run() {
        let baseline = record(200, &[10]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let probe = ProbeInput {
            name: "p".to_string(),
            buffer: record(200, &[3]),
            expectations: CategoryExpectations::new("attributes").field("a", 10, 3),
        };

        let err = SchemaInference::new(&baseline, KEY, options())
            .with_cancel(cancel)
            .run(&[probe])
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
    }
}
