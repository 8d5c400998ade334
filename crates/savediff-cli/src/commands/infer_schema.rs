//! Infer-schema command implementation.
//!
//! Loads the baseline and every probe, runs inference, and writes the schema
//! even when it contains ambiguous or conflicted fields. Malformed
//! expectation files and a baseline without the anchor are fatal; a probe
//! that cannot be loaded or anchored is recorded and skipped.

use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use savediff_core::{
    CategoryExpectations, Confidence, Config, FailedProbe, ProbeInput, Schema, SchemaInference,
};
use tracing::warn;

use crate::cli::ProbeSpec;
use crate::cli_utils::open_buffer;

pub fn run(
    mut config: Config,
    baseline_path: &Path,
    specs: &[ProbeSpec],
    anchor: &str,
    output: &Path,
    window: Option<RangeInclusive<i64>>,
) -> Result<()> {
    if let Some(window) = window {
        config.inference.window_start = *window.start();
        config.inference.window_end = *window.end();
    }

    let baseline = open_buffer(&config, baseline_path)
        .with_context(|| format!("baseline {}", baseline_path.display()))?;

    let mut probes = Vec::with_capacity(specs.len());
    let mut load_failures = Vec::new();
    for spec in specs {
        let name = spec.buffer.display().to_string();
        let expectations = CategoryExpectations::load(&spec.expectations)?;
        match open_buffer(&config, &spec.buffer) {
            Ok(buffer) => probes.push(ProbeInput {
                name,
                buffer,
                expectations,
            }),
            Err(e) if e.is_recoverable() => {
                warn!("Skipping probe {}: {}", name, e);
                load_failures.push(FailedProbe::new(name, &e));
            }
            Err(e) => return Err(e).with_context(|| format!("probe {}", name)),
        }
    }

    let mut schema = SchemaInference::new(&baseline, anchor, config.inference).run(&probes)?;
    for failure in load_failures {
        schema.record_failure(failure);
    }
    schema.save(output)?;

    print_summary(&schema, output);

    if schema.probes.is_empty() {
        bail!("no probe could be processed ({} failed)", schema.failed_probes.len());
    }
    Ok(())
}

fn print_summary(schema: &Schema, output: &Path) {
    println!("=== Schema ({}) ===", schema.anchor_key);
    for entry in schema.entries.values() {
        let confidence = match entry.confidence {
            Confidence::Confirmed => entry.confidence.green().to_string(),
            Confidence::Ambiguous => entry.confidence.yellow().to_string(),
            Confidence::Conflicted => entry.confidence.red().to_string(),
        };
        let encodings = entry
            .encodings()
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("|");
        let alternatives = if entry.alternatives.is_empty() {
            String::new()
        } else {
            format!(" alt={:?}", entry.alternatives)
        };
        println!(
            "  {:<24} {:+7} {}-byte {:<12} {}{}",
            entry.field_name,
            entry.relative_offset,
            entry.width,
            encodings,
            confidence,
            alternatives
        );
    }

    for conflict in &schema.conflicts {
        println!(
            "  {} {}: {}",
            "conflict".red(),
            conflict.kind.as_str(),
            conflict.fields.join(", ")
        );
    }

    for report in &schema.probes {
        let unmapped = report.mapping.unmapped.len();
        if unmapped > 0 {
            println!(
                "  {} {}: {} unmapped transition(s)",
                "note".yellow(),
                report.probe,
                unmapped
            );
        }
    }
    for failed in &schema.failed_probes {
        println!("  {} {}: {}", "failed".red(), failed.name, failed.error);
    }

    println!();
    println!(
        "{} confirmed, {} ambiguous, {} conflicted -> {}",
        schema.count(Confidence::Confirmed),
        schema.count(Confidence::Ambiguous),
        schema.count(Confidence::Conflicted),
        output.display()
    );
}

#[cfg(test)]
mod tests {
    use std::fs;

    use savediff_core::ByteWidth;
    use savediff_core::synthetic::SyntheticBufferBuilder;

    use super::*;
    use crate::cli_utils::exit_code;

    const KEY: &str = "Ann Lee";

    fn save_record(path: &Path, pace: u8) {
        SyntheticBufferBuilder::new()
            .with_size(512, 0)
            .write_u8(100, pace)
            .write_prefixed_str(120, KEY, ByteWidth::One)
            .build()
            .save(path)
            .unwrap();
    }

    #[test]
    fn test_unreadable_save_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let baseline = dir.path().join("base.bin");
        let expectations = dir.path().join("physical.toml");
        let output = dir.path().join("schema.json");
        save_record(&baseline, 40);
        save_record(&dir.path().join("pace.bin"), 15);
        fs::write(
            &expectations,
            "category = \"physical\"\n\n[fields]\npace = [40, 15]\n",
        )
        .unwrap();

        let specs = [
            ProbeSpec {
                buffer: dir.path().join("pace.bin"),
                expectations: expectations.clone(),
            },
            ProbeSpec {
                buffer: dir.path().join("missing.bin"),
                expectations,
            },
        ];
        run(Config::default(), &baseline, &specs, KEY, &output, None).unwrap();

        let schema = Schema::load(&output).unwrap();
        assert_eq!(schema.probes.len(), 1);
        assert_eq!(schema.entries["pace"].relative_offset, -21);
        assert_eq!(schema.failed_probes.len(), 1);
        assert!(schema.failed_probes[0].name.ends_with("missing.bin"));
    }

    #[test]
    fn test_missing_baseline_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let expectations = dir.path().join("physical.toml");
        let output = dir.path().join("schema.json");
        save_record(&dir.path().join("pace.bin"), 15);
        fs::write(
            &expectations,
            "category = \"physical\"\n\n[fields]\npace = [40, 15]\n",
        )
        .unwrap();

        let specs = [ProbeSpec {
            buffer: dir.path().join("pace.bin"),
            expectations,
        }];
        let err = run(
            Config::default(),
            &dir.path().join("base.bin"),
            &specs,
            KEY,
            &output,
            None,
        )
        .unwrap_err();
        assert_eq!(exit_code(&err), 2);
        assert!(!output.exists());
    }
}
