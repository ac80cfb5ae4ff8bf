//! chartfix - Repairs sequencer-exported MIDI files for rhythm-game charts.
//!
//! Each input is rescaled, has its event markers, tempo map, beat track and
//! drum defaults put into the shape the chart format expects, and is written
//! next to the original with a `_clean` suffix.
//!
//! # Usage
//!
//! ```bash
//! chartfix song.mid                  # writes song_clean.mid
//! chartfix -o out.mid song.mid       # explicit output path
//! chartfix -d a.mid b.mid            # fix several files, with text dumps
//! RUST_LOG=debug chartfix song.mid   # trace every stage
//! ```

use anyhow::{bail, Context, Result};
use chartfix::dump::write_dump;
use chartfix::midi::{import_from_midi, Document};
use chartfix::{fix_file, practice, Fixer, FixerConfig, Messages};
use rayon::prelude::*;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Command-line options for the application.
struct CliOptions {
    /// MIDI files to fix.
    inputs: Vec<PathBuf>,
    /// Output path; only valid with a single input.
    output: Option<PathBuf>,
    /// JSON file overriding pipeline settings.
    config: Option<PathBuf>,
    /// Practice-section list replacing the built-in one.
    practice_sections: Option<PathBuf>,
    /// Write text dumps of the input and output.
    dump: bool,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--output <path>` or `-o <path>`: Output file (single input only)
    /// - `--config <path>` or `-c <path>`: JSON config file
    /// - `--practice-sections <path>` or `-p <path>`: Practice-section list
    /// - `--dump` or `-d`: Write text dumps next to each file
    /// - `--help` or `-h`: Print help and exit
    fn parse() -> Result<Self> {
        let args: Vec<String> = std::env::args().collect();
        let mut options = Self {
            inputs: Vec::new(),
            output: None,
            config: None,
            practice_sections: None,
            dump: false,
        };
        let mut i = 1;

        let path_argument = |i: usize, flag: &str| -> Result<PathBuf> {
            match args.get(i) {
                Some(value) => Ok(PathBuf::from(value)),
                None => bail!("{flag} requires a path argument"),
            }
        };

        while i < args.len() {
            match args[i].as_str() {
                "--output" | "-o" => {
                    i += 1;
                    options.output = Some(path_argument(i, "--output")?);
                }
                "--config" | "-c" => {
                    i += 1;
                    options.config = Some(path_argument(i, "--config")?);
                }
                "--practice-sections" | "-p" => {
                    i += 1;
                    options.practice_sections = Some(path_argument(i, "--practice-sections")?);
                }
                "--dump" | "-d" => options.dump = true,
                "--help" | "-h" => {
                    print_help(args.first().map_or("chartfix", String::as_str));
                    std::process::exit(0);
                }
                other if other.starts_with('-') => {
                    bail!("Unknown option: {other}\nUse --help for usage information");
                }
                input => options.inputs.push(PathBuf::from(input)),
            }
            i += 1;
        }

        if options.inputs.is_empty() {
            bail!("No input files given\nUse --help for usage information");
        }
        if options.output.is_some() && options.inputs.len() > 1 {
            bail!("--output can only be used with a single input file");
        }

        Ok(options)
    }
}

fn print_help(program: &str) {
    eprintln!("chartfix - Repairs MIDI files for rhythm-game charts");
    eprintln!();
    eprintln!("Usage: {program} [OPTIONS] <INPUT.mid>...");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -o, --output PATH             Output file (default: <input>_clean.mid)");
    eprintln!("  -c, --config PATH             JSON file overriding pipeline settings");
    eprintln!("  -p, --practice-sections PATH  Practice-section list to use");
    eprintln!("  -d, --dump                    Also write text dumps of input and output");
    eprintln!("  -h, --help                    Print this help message");
    eprintln!();
    eprintln!("Set RUST_LOG=debug to trace each stage.");
}

/// `<dir>/<stem><suffix>.<extension>` beside `input`.
fn sibling_path(input: &Path, suffix: &str, extension: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{suffix}.{extension}"))
}

fn dump_to(document: &Document, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    write_dump(document, BufWriter::new(file))
        .with_context(|| format!("Failed to write {}", path.display()))
}

/// Fixes one file, returning its message log whether or not the fix succeeded.
fn process(
    fixer: &Fixer,
    input: &Path,
    output: &Path,
    practice_sections: &[String],
    dump: bool,
) -> (Messages, Result<()>) {
    let mut messages = Messages::new();
    let result = run(fixer, input, output, practice_sections, dump, &mut messages);
    (messages, result)
}

fn run(
    fixer: &Fixer,
    input: &Path,
    output: &Path,
    practice_sections: &[String],
    dump: bool,
    messages: &mut Messages,
) -> Result<()> {
    // The input dump is written first so it exists even when the fix fails
    if dump {
        let original = import_from_midi(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        dump_to(&original, &sibling_path(input, "", "txt"))?;
    }

    let fixed = fix_file(fixer, input, output, practice_sections, messages)
        .with_context(|| format!("Failed to fix {}", input.display()))?;

    if dump {
        dump_to(&fixed, &sibling_path(input, "_clean", "txt"))?;
    }
    Ok(())
}

/// Main entry point.
fn main() -> Result<()> {
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => FixerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => FixerConfig::default(),
    };
    let practice_sections = practice::load(cli.practice_sections.as_deref())
        .context("Failed to load practice sections")?;
    let fixer = Fixer::new(config);

    let jobs: Vec<(PathBuf, PathBuf)> = cli
        .inputs
        .iter()
        .map(|input| {
            let output = cli
                .output
                .clone()
                .unwrap_or_else(|| sibling_path(input, "_clean", "mid"));
            (input.clone(), output)
        })
        .collect();

    let results: Vec<_> = jobs
        .par_iter()
        .map(|(input, output)| {
            let (messages, result) = process(&fixer, input, output, &practice_sections, cli.dump);
            (input, output, messages, result)
        })
        .collect();

    let mut failures = 0;
    for (input, output, messages, result) in results {
        println!("{}", input.display());
        for message in messages.iter() {
            println!("  {message}");
        }
        match result {
            Ok(()) => println!("  Wrote {}", output.display()),
            Err(e) => {
                failures += 1;
                println!("  {e:#}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} file(s) could not be fixed", jobs.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chartfix::midi::{export_to_midi, Event};
    use chartfix::Track;

    #[test]
    fn test_sibling_path() {
        let input = Path::new("songs/track.mid");
        assert_eq!(sibling_path(input, "_clean", "mid"), Path::new("songs/track_clean.mid"));
        assert_eq!(sibling_path(input, "", "txt"), Path::new("songs/track.txt"));
    }

    #[test]
    fn test_input_is_dumped_when_fix_fails() {
        let dir = std::env::temp_dir().join(format!("chartfix-dump-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let input = dir.join("no_beat.mid");
        let output = dir.join("no_beat_clean.mid");

        let document = Document::with_tracks(
            1,
            480,
            vec![Track::named("PART DRUMS", [Event::note_on(0, 0, 96, 100, 120)])],
        );
        export_to_midi(&document, &input).unwrap();

        let (_, result) = process(&Fixer::default(), &input, &output, &[], true);

        assert!(result.is_err());
        let dumped = std::fs::read_to_string(dir.join("no_beat.txt")).unwrap();
        assert!(dumped.starts_with("PART DRUMS\n"));
        assert!(!output.exists());
        assert!(!dir.join("no_beat_clean.txt").exists());

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
