//! CLI argument parsing tests.
//!
//! These parse command lines into the real argument types without running
//! any command.

#[path = "../src/cli.rs"]
#[allow(dead_code)]
mod cli;

use std::path::PathBuf;

use clap::Parser;
use cli::{Args, Command, ProbeSpec, parse_probe_spec, parse_window};
use savediff_core::ByteWidth;

#[test]
fn test_decompress_defaults_to_largest() {
    let args = Args::try_parse_from(["savediff", "decompress", "career.sav", "-o", "db.bin"]).unwrap();
    match args.command {
        Command::Decompress {
            save,
            frame,
            largest,
            output,
        } => {
            assert_eq!(save, PathBuf::from("career.sav"));
            assert_eq!(frame, None);
            assert!(!largest);
            assert_eq!(output, PathBuf::from("db.bin"));
        }
        _ => panic!("Expected Decompress command"),
    }
}

#[test]
fn test_decompress_frame_conflicts_with_largest() {
    let result = Args::try_parse_from([
        "savediff",
        "decompress",
        "career.sav",
        "--frame",
        "2",
        "--largest",
        "-o",
        "db.bin",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_decompress_requires_output() {
    let result = Args::try_parse_from(["savediff", "decompress", "career.sav"]);
    assert!(result.is_err());
}

#[test]
fn test_global_config_after_subcommand() {
    let args =
        Args::try_parse_from(["savediff", "frames", "career.sav", "--config", "run.toml"]).unwrap();
    assert_eq!(args.config, Some(PathBuf::from("run.toml")));
    assert!(matches!(args.command, Command::Frames { .. }));
}

#[test]
fn test_anchors_requires_key_or_strings() {
    assert!(Args::try_parse_from(["savediff", "anchors", "db.bin"]).is_err());
    assert!(Args::try_parse_from(["savediff", "anchors", "db.bin", "--strings"]).is_ok());
    assert!(
        Args::try_parse_from(["savediff", "anchors", "db.bin", "--key", "Ann", "--strings"])
            .is_err()
    );
}

#[test]
fn test_anchors_defaults() {
    let args = Args::try_parse_from(["savediff", "anchors", "db.bin", "--key", "Ann Lee"]).unwrap();
    match args.command {
        Command::Anchors {
            key,
            radius,
            limit,
            min_len,
            max_len,
            ..
        } => {
            assert_eq!(key.as_deref(), Some("Ann Lee"));
            assert_eq!(radius, 64);
            assert_eq!(limit, 50);
            assert_eq!((min_len, max_len), (3, 64));
        }
        _ => panic!("Expected Anchors command"),
    }
}

#[test]
fn test_diff_width_and_negative_window() {
    let args = Args::try_parse_from([
        "savediff",
        "diff",
        "--baseline",
        "a.bin",
        "--probe",
        "b.bin",
        "--anchor",
        "Ann Lee",
        "--width",
        "2",
        "--signed",
        "--window",
        "-128..64",
    ])
    .unwrap();
    match args.command {
        Command::Diff {
            width,
            signed,
            window,
            ..
        } => {
            assert_eq!(width, ByteWidth::Two);
            assert!(signed);
            assert_eq!(window, Some(-128..=64));
        }
        _ => panic!("Expected Diff command"),
    }
}

#[test]
fn test_diff_rejects_width_three() {
    let result = Args::try_parse_from([
        "savediff",
        "diff",
        "--baseline",
        "a.bin",
        "--probe",
        "b.bin",
        "--anchor",
        "Ann",
        "--width",
        "3",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_infer_schema_multiple_probes() {
    let args = Args::try_parse_from([
        "savediff",
        "infer-schema",
        "--baseline",
        "base.bin",
        "--probe",
        "p1.bin:attributes.toml",
        "--probe",
        "saves/p2.sav:exp/mental.toml",
        "--anchor",
        "Ann Lee",
        "-o",
        "schema.json",
    ])
    .unwrap();
    match args.command {
        Command::InferSchema {
            probes, anchor, ..
        } => {
            assert_eq!(anchor, "Ann Lee");
            assert_eq!(
                probes,
                vec![
                    ProbeSpec {
                        buffer: PathBuf::from("p1.bin"),
                        expectations: PathBuf::from("attributes.toml"),
                    },
                    ProbeSpec {
                        buffer: PathBuf::from("saves/p2.sav"),
                        expectations: PathBuf::from("exp/mental.toml"),
                    },
                ]
            );
        }
        _ => panic!("Expected InferSchema command"),
    }
}

#[test]
fn test_infer_schema_requires_probe() {
    let result = Args::try_parse_from([
        "savediff",
        "infer-schema",
        "--baseline",
        "base.bin",
        "--anchor",
        "Ann",
        "-o",
        "schema.json",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_parse_probe_spec_errors() {
    assert!(parse_probe_spec("no-separator").is_err());
    assert!(parse_probe_spec(":exp.toml").is_err());
    assert!(parse_probe_spec("probe.bin:").is_err());
}

#[test]
fn test_parse_window_forms() {
    assert_eq!(parse_window("-10..10"), Ok(-10..=10));
    assert_eq!(parse_window("-10..=10"), Ok(-10..=10));
    assert_eq!(parse_window("0..0"), Ok(0..=0));
    assert!(parse_window("10..-10").is_err());
    assert!(parse_window("ten..20").is_err());
    assert!(parse_window("5").is_err());
}
