use crate::extract::{ExtractObserver, OutputRow, TargetSet};
use crate::genbank::SequenceRecord;
use anyhow::{Context, Result};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Per-file counts gathered while a file is projected.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct FileSummary {
    pub file: String,
    pub records: usize,
    pub cds_features: usize,
    pub cds_with_locus_tag: usize,
    pub matched: usize,
    pub skipped_blocks: usize,
}

#[derive(Serialize, Debug, Default)]
pub struct RunSummary {
    pub gbkcoords_version: String,
    pub run_date: String,
    pub elapsed: f64,
    pub output_path: String,
    pub target_count: usize,
    pub matched_rows: usize,
    pub files: Vec<FileSummary>,
    pub unmatched_targets: Vec<String>,
}

impl RunSummary {
    pub fn new(targets: &TargetSet) -> Self {
        RunSummary {
            gbkcoords_version: crate::cli::VERSION.to_string(),
            run_date: format!("{:?}", chrono::offset::Local::now()),
            target_count: targets.len(),
            ..RunSummary::default()
        }
    }

    /// Fills in the targets that no file produced a row for.
    pub fn finish(&mut self, targets: &TargetSet, matched: &HashSet<String>) {
        self.matched_rows = self.files.iter().map(|f| f.matched).sum();
        self.unmatched_targets = targets
            .sorted()
            .into_iter()
            .filter(|tag| !matched.contains(*tag))
            .map(str::to_string)
            .collect();
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Unable to create summary file {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .context("Could not serialize run summary")?;
        Ok(())
    }
}

/// Observer for one input file: logs per-feature progress and keeps the counts for the run
/// summary.
pub struct FileTally {
    file: String,
    records: Cell<usize>,
    cds_features: Cell<usize>,
    cds_with_locus_tag: Cell<usize>,
    skipped_blocks: Cell<usize>,
    matched: RefCell<Vec<String>>,
}

impl FileTally {
    pub fn new(file: &str) -> Self {
        FileTally {
            file: file.to_string(),
            records: Cell::new(0),
            cds_features: Cell::new(0),
            cds_with_locus_tag: Cell::new(0),
            skipped_blocks: Cell::new(0),
            matched: RefCell::new(Vec::new()),
        }
    }

    pub fn block_skipped(&self) {
        self.skipped_blocks.set(self.skipped_blocks.get() + 1);
    }

    /// Returns the file's counts and the locus tags it matched.
    pub fn finish(self) -> (FileSummary, Vec<String>) {
        let matched = self.matched.into_inner();
        let summary = FileSummary {
            file: self.file,
            records: self.records.get(),
            cds_features: self.cds_features.get(),
            cds_with_locus_tag: self.cds_with_locus_tag.get(),
            matched: matched.len(),
            skipped_blocks: self.skipped_blocks.get(),
        };
        (summary, matched)
    }
}

impl ExtractObserver for FileTally {
    fn record_started(&self, record: &SequenceRecord, _source_file: &str) {
        self.records.set(self.records.get() + 1);
        info!("Processing organism: {} ({})", record.organism, record.id);
    }

    fn cds_seen(&self, locus_tag: Option<&str>) {
        self.cds_features.set(self.cds_features.get() + 1);
        if let Some(tag) = locus_tag {
            self.cds_with_locus_tag.set(self.cds_with_locus_tag.get() + 1);
            trace!("Found locus_tag: {tag}");
        }
    }

    fn qualifier_defaulted(&self, locus_tag: &str, qualifier: &str) {
        info!("{locus_tag} has no /{qualifier}, writing N/A");
    }

    fn strand_collapsed(&self, locus_tag: &str) {
        warn!("{locus_tag} spans both strands, reporting it on the - strand");
    }

    fn row_emitted(&self, row: &OutputRow) {
        debug!(
            "Matching locus_tag found: {}, {}-{}, {}",
            row.locus_tag, row.start, row.end, row.strand
        );
        self.matched.borrow_mut().push(row.locus_tag.clone());
    }
}
