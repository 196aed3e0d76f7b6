//! CLI entry point: `collector [-o <dump_path>] <executable> [<arg>...]`.
//!
//! Argument scanning is deliberately a small hand-written left-to-right
//! scan rather than a `clap::Parser` derive: the grammar accepts `-o` as
//! either a standalone flag or fused with its value (`-o<path>`), and
//! anything else starting with `-` is the target executable, not an
//! unrecognized option.

#[macro_use]
extern crate log;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{bail, Context, Result};
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

const DEFAULT_OUTPUT_PATH: &str = ".bcovdump";

enum ParsedArgs {
    Help,
    Run {
        output_path: PathBuf,
        executable: String,
        argv: Vec<String>,
    },
}

fn parse_args(args: &[String]) -> Result<ParsedArgs> {
    let mut output_path = PathBuf::from(DEFAULT_OUTPUT_PATH);
    let mut i = 0;

    while i < args.len() {
        let arg = args[i].as_str();

        if arg == "--help" {
            return Ok(ParsedArgs::Help);
        }

        if arg == "-o" {
            i += 1;
            let path = args.get(i).context("-o requires a path argument")?;
            output_path = PathBuf::from(path);
            i += 1;
            continue;
        }

        if let Some(path) = arg.strip_prefix("-o") {
            output_path = PathBuf::from(path);
            i += 1;
            continue;
        }

        // Anything else, dash-prefixed or not, is the target executable:
        // option scanning stops here.
        let executable = arg.to_string();
        let argv = args[i + 1..].to_vec();
        return Ok(ParsedArgs::Run {
            output_path,
            executable,
            argv,
        });
    }

    bail!("usage: collector [-o dump] <executable> [arg...]")
}

fn print_usage() {
    eprintln!("usage: collector [-o dump] command [arg(s)]");
}

fn main() -> Result<()> {
    env_logger::init();

    let raw_args: Vec<String> = std::env::args().skip(1).collect();

    let (output_path, executable, argv) = match parse_args(&raw_args)? {
        ParsedArgs::Help => {
            print_usage();
            std::process::exit(1);
        }
        ParsedArgs::Run {
            output_path,
            executable,
            argv,
        } => (output_path, executable, argv),
    };

    let tracee_pid: Arc<Mutex<Option<i32>>> = Arc::new(Mutex::new(None));
    {
        let tracee_pid = tracee_pid.clone();
        atexit::register(move || {
            if let Some(pid) = tracee_pid.lock().unwrap().take() {
                warn!("killing in-flight tracee {pid}");
                let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
            }
        });
    }

    info!("probing debug information for {executable}");

    let result = collector::collect_with_pid_hook(
        std::path::Path::new(&executable),
        &argv,
        &output_path,
        |pid| *tracee_pid.lock().unwrap() = Some(pid),
    );

    match result {
        Ok(()) => Ok(()),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}
