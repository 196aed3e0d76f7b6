//! Reads and writes the line-oriented text dump produced by a collection
//! run: a `command`/`args`/`date` header followed by one `file` section
//! per source file, each holding `<line> <possible> <hit>` rows.
//!
//! This crate knows nothing about tracing or DWARF; it only serializes
//! and parses the already-aggregated per-line counts `collector` hands
//! it.

mod escape;
mod error;

pub use escape::{escape, unescape};
pub use error::DumpError;

use std::io::{BufRead, Read, Write};
use std::path::Path;

/// Per-line hit accounting within one [`FileReport`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct LineReport {
    pub line: u32,
    pub possible: u32,
    pub hit: u32,
}

impl LineReport {
    pub fn is_covered(&self) -> bool {
        self.hit > 0
    }

    pub fn is_fully_covered(&self) -> bool {
        self.hit == self.possible
    }
}

/// Every instrumented line of one source file, in ascending line order.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FileReport {
    pub path: String,
    pub lines: Vec<LineReport>,
}

/// A fully parsed or ready-to-write dump.
///
/// `args` holds one entry per whitespace-delimited token surviving the
/// dump's `args` line. A token drawn from the middle of a multi-word
/// argument whose embedded space was escaped round-trips as its own,
/// separate entry: the tokenizer splits on literal whitespace bytes
/// before any unescaping happens, so an escaped space inside an argument
/// is indistinguishable from the boundary between two arguments. This
/// mirrors the reference dump reader and is not fixed here; see the
/// design notes on the `args` line.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    pub command: String,
    pub args: Vec<String>,
    pub date: String,
    pub files: Vec<FileReport>,
}

/// Write `report` to `path`.
pub fn write(report: &Report, path: &Path) -> Result<(), DumpError> {
    let file = std::fs::File::create(path).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })?;
    write_to(report, file).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Write `report` to any [`Write`] sink.
pub fn write_to(report: &Report, mut out: impl Write) -> std::io::Result<()> {
    writeln!(out, "command {}", escape(&report.command))?;

    write!(out, "args")?;
    for arg in &report.args {
        write!(out, " {}", escape(arg))?;
    }
    writeln!(out)?;

    writeln!(out, "date {}", report.date)?;

    for file in &report.files {
        writeln!(out, "file {}", file.path)?;
        for line in &file.lines {
            writeln!(out, "{} {} {}", line.line, line.possible, line.hit)?;
        }
    }

    Ok(())
}

/// Read a dump from `path`.
pub fn read(path: &Path) -> Result<Report, DumpError> {
    let file = std::fs::File::open(path).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })?;
    read_from(file).map_err(|source| DumpError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Read a dump from any [`Read`] source.
///
/// Unrecognized lines, and data lines that appear before the first
/// `file` section, are skipped rather than rejected: a dump reader
/// should tolerate a header it doesn't understand yet.
pub fn read_from(input: impl Read) -> std::io::Result<Report> {
    let mut report = Report::default();
    let mut current_file: Option<FileReport> = None;

    for line in std::io::BufReader::new(input).lines() {
        let line = line?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = line.strip_prefix("command ") {
            report.command = unescape(rest);
        } else if let Some(rest) = line.strip_prefix("args") {
            report.args = rest
                .split_whitespace()
                .map(unescape)
                .collect();
        } else if let Some(rest) = line.strip_prefix("date ") {
            report.date = rest.to_string();
        } else if let Some(rest) = line.strip_prefix("file ") {
            if let Some(file) = current_file.take() {
                report.files.push(file);
            }
            current_file = Some(FileReport {
                path: rest.to_string(),
                lines: Vec::new(),
            });
        } else if let Some(file) = current_file.as_mut() {
            let mut parts = line.split_whitespace();
            let parsed = (|| {
                let line_no: u32 = parts.next()?.parse().ok()?;
                let possible: u32 = parts.next()?.parse().ok()?;
                let hit: u32 = parts.next()?.parse().ok()?;
                if parts.next().is_some() {
                    return None;
                }
                Some(LineReport {
                    line: line_no,
                    possible,
                    hit,
                })
            })();

            if let Some(line_report) = parsed {
                file.lines.push(line_report);
            }
        }
    }

    if let Some(file) = current_file.take() {
        report.files.push(file);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Report {
        Report {
            command: "/usr/bin/example".to_string(),
            args: vec!["--flag".to_string(), "value".to_string()],
            date: "2026-07-28T00:00:00Z".to_string(),
            files: vec![FileReport {
                path: "src/main.c".to_string(),
                lines: vec![
                    LineReport {
                        line: 1,
                        possible: 1,
                        hit: 1,
                    },
                    LineReport {
                        line: 3,
                        possible: 2,
                        hit: 0,
                    },
                ],
            }],
        }
    }

    #[test]
    fn writes_the_documented_line_shapes() {
        let mut buf = Vec::new();
        write_to(&sample(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(
            text,
            "command /usr/bin/example\nargs --flag value\ndate 2026-07-28T00:00:00Z\nfile src/main.c\n1 1 1\n3 2 0\n"
        );
    }

    #[test]
    fn round_trips_a_simple_report() {
        let mut buf = Vec::new();
        write_to(&sample(), &mut buf).unwrap();
        let parsed = read_from(buf.as_slice()).unwrap();
        assert_eq!(parsed, sample());
    }

    #[test]
    fn parse_is_a_fixed_point_of_write_then_read() {
        let mut buf = Vec::new();
        write_to(&sample(), &mut buf).unwrap();
        let once = read_from(buf.as_slice()).unwrap();

        let mut buf2 = Vec::new();
        write_to(&once, &mut buf2).unwrap();
        let twice = read_from(buf2.as_slice()).unwrap();

        assert_eq!(once, twice);
    }

    #[test]
    fn args_with_an_embedded_space_split_into_separate_entries_on_read() {
        let report = Report {
            command: "cmd".to_string(),
            args: vec!["hello world".to_string(), "foo".to_string()],
            date: "".to_string(),
            files: vec![],
        };

        let mut buf = Vec::new();
        write_to(&report, &mut buf).unwrap();
        let parsed = read_from(buf.as_slice()).unwrap();

        // The embedded, escaped space is still a literal whitespace byte in
        // the dump, so it splits the token: this is the documented loss.
        assert_eq!(parsed.args, vec!["hello\\".to_string(), "world".to_string(), "foo".to_string()]);
    }

    #[test]
    fn command_round_trips_exactly_even_with_spaces() {
        let report = Report {
            command: "/path with space/binary".to_string(),
            args: vec![],
            date: "".to_string(),
            files: vec![],
        };

        let mut buf = Vec::new();
        write_to(&report, &mut buf).unwrap();
        let parsed = read_from(buf.as_slice()).unwrap();
        assert_eq!(parsed.command, report.command);
    }

    #[test]
    fn skips_unrecognized_and_out_of_section_lines() {
        let text = "command c\nsome future header\n1 1 1\nfile a.c\n1 1 1\n";
        let parsed = read_from(text.as_bytes()).unwrap();
        assert_eq!(parsed.files.len(), 1);
        assert_eq!(parsed.files[0].lines.len(), 1);
    }
}
