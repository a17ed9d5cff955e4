use crate::extract::{OutputRow, Projector, TargetSet};
use crate::genbank::{GenbankReader, ReadError};
use crate::io::{until_err, ReportWriter};
use crate::policy::MalformedPolicy;
use crate::summary::{FileSummary, FileTally, RunSummary};
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Extracts the targeted CDS features of one GenBank stream, passing each row to `emit` as
/// soon as it is produced.
///
/// # Arguments
///
/// * `reader` - The GenBank file contents.
/// * `source_file` - Name written into the `Source_File` column.
/// * `targets` - The locus tags to report.
/// * `policy` - Whether a malformed record block stops the file or is skipped.
/// * `emit` - Receives every row, in record then feature order.
///
/// # Returns
///
/// The file's counts, and the locus tags it matched.
///
/// # Errors
///
/// Fails on an I/O error, on a malformed block under `MalformedPolicy::Abort`, or if `emit`
/// fails. Rows emitted before the failure are not retracted.
pub fn process_file<R: BufRead>(
    reader: R,
    source_file: &str,
    targets: &TargetSet,
    policy: MalformedPolicy,
    mut emit: impl FnMut(&OutputRow) -> Result<()>,
) -> Result<(FileSummary, Vec<String>)> {
    let tally = FileTally::new(source_file);
    let projector = Projector::new(targets, &tally);

    // Start with a placeholder error object. This will be mutated if a record cannot be read.
    let mut err = Ok(());

    let records = GenbankReader::new(reader)
        .filter_map(|record| match record {
            Ok(record) => Some(Ok(record)),
            Err(ReadError::Malformed(e)) if policy == MalformedPolicy::Skip => {
                warn!("Skipping record in {source_file}: {e}");
                tally.block_skipped();
                None
            }
            Err(e) => Some(Err(
                anyhow::Error::new(e).context(format!("Could not parse {source_file}"))
            )),
        })
        // iterate until an error is found, writing into &err
        .scan(&mut err, until_err);

    projector
        .project(records, source_file)
        .try_for_each(|row| emit(&row))?;

    err?;
    Ok(tally.finish())
}

/// Runs every input file through `process_file`, in the order given, writing rows to `writer`.
pub fn gene_coordinates(
    inputs: &[PathBuf],
    targets: &TargetSet,
    policy: MalformedPolicy,
    writer: &mut ReportWriter,
) -> Result<RunSummary> {
    // time everything!
    let now = std::time::Instant::now();

    let mut summary = RunSummary::new(targets);
    let mut matched = HashSet::new();

    for path in inputs {
        info!("Processing file: {}", path.display());

        let source_file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let file = File::open(path)
            .with_context(|| format!("Unable to open file {}", path.display()))?;

        let (file_summary, file_matched) = process_file(
            BufReader::new(file),
            &source_file,
            targets,
            policy,
            |row| {
                writer
                    .write_row(row)
                    .with_context(|| format!("Unable to write the row for {}", row.locus_tag))
            },
        )?;

        info!(
            "{}: {} records, {} CDS features, {} matched",
            file_summary.file, file_summary.records, file_summary.cds_features, file_summary.matched
        );

        matched.extend(file_matched);
        summary.files.push(file_summary);
    }

    summary.elapsed = now.elapsed().as_secs_f64();
    summary.finish(targets, &matched);

    Ok(summary)
}
