extern crate env_logger;
#[macro_use]
extern crate log;

use anyhow::{Context, Result};
use clap::Parser;
use itertools::Itertools;

mod cli;
mod coordinates;
mod extract;
mod genbank;
mod io;
mod policy;
mod summary;

use cli::Cli;

fn try_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    println!("gbkcoords v{}", cli::VERSION);

    let targets = io::load_targets(&cli.locus_tags)?;
    if targets.is_empty() {
        warn!("The locus tag list is empty, the report will only have a header");
    }

    let inputs = io::find_input_files(&cli.input_dir, &cli.extension)?;
    info!(
        "GenBank files found ({}): {}",
        inputs.len(),
        inputs.iter().map(|p| p.display()).join(", ")
    );

    let output = cli.output_path();
    if let Some(dir) = output.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Unable to create output directory {}", dir.display()))?;
    }

    let mut writer = io::ReportWriter::new(&output)?;
    let mut summary =
        coordinates::gene_coordinates(&inputs, &targets, cli.on_malformed, &mut writer)?;
    let output = writer.finish()?;
    summary.output_path = output.display().to_string();

    info!(
        "Stats: {} rows from {} files, {} of {} locus tags not found, {:.1}s runtime",
        summary.matched_rows,
        summary.files.len(),
        summary.unmatched_targets.len(),
        summary.target_count,
        summary.elapsed,
    );
    if !summary.unmatched_targets.is_empty() {
        warn!(
            "Locus tags not found in any file: {}",
            summary.unmatched_targets.iter().take(10).join(", ")
        );
    }

    if let Some(path) = &cli.summary {
        summary.write_json(path)?;
        info!("Run summary written to {}", path.display());
    }

    info!("Results written to: {}", output.display());
    Ok(())
}

fn main() {
    if let Err(err) = try_main() {
        error!("{}", err);

        // report any errors that are produced
        err.chain()
            .skip(1)
            .for_each(|cause| error!("  because: {}", cause));

        std::process::exit(1);
    }
}
