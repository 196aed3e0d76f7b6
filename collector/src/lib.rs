//! Orchestrates one end-to-end coverage collection run: launch the
//! target under trace, derive breakpoint addresses from its line table,
//! run it to completion recording one-shot hits, and dump the result.

#[macro_use]
extern crate log;

mod error;

pub use error::CollectError;

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use tracer::{Address, TraceEvent, Tracer};

type Result<T> = std::result::Result<T, CollectError>;

/// Run `executable` with `argv` under trace and write a coverage dump to
/// `output_path`.
pub fn collect(executable: &Path, argv: &[String], output_path: &Path) -> Result<()> {
    collect_with_pid_hook(executable, argv, output_path, |_pid| {})
}

/// As [`collect`], but calls `on_launch` with the tracee's PID as soon as
/// it is known. Lets a caller (e.g. `collector-cli`'s Ctrl+C handler) kill
/// the tracee from outside the blocking run loop, without widening the
/// documented `collect` signature.
pub fn collect_with_pid_hook(
    executable: &Path,
    argv: &[String],
    output_path: &Path,
    on_launch: impl FnOnce(i32),
) -> Result<()> {
    let mut tracer = Tracer::load(executable, argv).map_err(CollectError::Launch)?;
    if let Some(pid) = tracer.pid() {
        on_launch(pid);
    }

    let lines = linetable::read_lines(executable)?;
    info!(
        "found active lines in {} source files",
        lines.iter().filter(|(_, entries)| !entries.is_empty()).count()
    );

    let addresses: Vec<Address> = lines
        .values()
        .flat_map(|entries| entries.iter().map(|e| e.address))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let saved = tracer
        .set_breakpoints(&addresses)
        .map_err(CollectError::BreakpointSetup)?;
    info!("set {} breakpoints", saved.len());

    let mut hit: BTreeSet<Address> = BTreeSet::new();

    loop {
        match tracer.run() {
            Ok(TraceEvent::Trap { pc }) => {
                if let Some(&original_byte) = saved.get(&pc) {
                    if let Err(err) = tracer.eliminate_hit_breakpoint(pc, original_byte) {
                        warn!("tracing failed mid-run ({err}); dumping partial results");
                        break;
                    }
                    hit.insert(pc);
                }
            }
            Ok(TraceEvent::Exit { code }) => {
                debug!("tracee exited with code {code}");
                break;
            }
            Ok(TraceEvent::Error) | Err(_) => {
                warn!("tracing failed mid-run; dumping partial results");
                break;
            }
        }
    }

    tracer.close();

    let report = build_report(executable, argv, &lines, &hit);
    dump::write(&report, output_path)?;

    Ok(())
}

fn build_report(
    executable: &Path,
    argv: &[String],
    lines: &BTreeMap<String, Vec<linetable::LineEntry>>,
    hit: &BTreeSet<Address>,
) -> dump::Report {
    let mut files = Vec::new();

    for (path, entries) in lines {
        if entries.is_empty() {
            continue;
        }

        let mut addresses_per_line: BTreeMap<u32, BTreeSet<Address>> = BTreeMap::new();
        for entry in entries {
            addresses_per_line
                .entry(entry.line)
                .or_default()
                .insert(entry.address);
        }

        let mut file_lines = Vec::new();
        for (line, addrs) in addresses_per_line {
            let possible = addrs.len() as u32;
            let hits = addrs.iter().filter(|a| hit.contains(a)).count() as u32;
            file_lines.push(dump::LineReport {
                line,
                possible,
                hit: hits,
            });
        }

        files.push(dump::FileReport {
            path: path.clone(),
            lines: file_lines,
        });
    }

    dump::Report {
        command: executable.display().to_string(),
        args: argv.to_vec(),
        date: chrono::Utc::now().to_rfc3339(),
        files,
    }
}
