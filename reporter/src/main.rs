//! `reporter [<dump_path> [<output_dir>]]`
//!
//! Renders a dump produced by `collector` into a small static HTML
//! report. Launching a browser on the result, and removing it
//! afterward, are left to the caller.

mod html;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Render a coverage dump as HTML")]
struct Args {
    /// Path to a dump written by `collector`.
    #[arg(default_value = ".bcovdump")]
    dump_path: PathBuf,

    /// Directory to write the HTML report into. Defaults to a fresh
    /// directory under the system temp area.
    output_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let report = dump::read(&args.dump_path)
        .with_context(|| format!("reading dump at {}", args.dump_path.display()))?;

    let output_dir = match args.output_dir {
        Some(dir) => {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            dir
        }
        None => tempfile::Builder::new()
            .prefix("coverage-report-")
            .tempdir()
            .context("creating a scratch output directory")?
            .into_path(),
    };

    log::info!("writing report to {}", output_dir.display());

    std::fs::write(output_dir.join("index.html"), html::render_index(&report))
        .context("writing index.html")?;

    for (index, file) in report.files.iter().enumerate() {
        let path = output_dir.join(format!("file{index}.html"));
        std::fs::write(&path, html::render_file(file))
            .with_context(|| format!("writing {}", path.display()))?;
    }

    println!("{}", output_dir.join("index.html").display());

    Ok(())
}
