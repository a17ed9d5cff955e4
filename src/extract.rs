use crate::genbank::{Feature, SequenceRecord, Strand};
use serde::Serialize;
use std::collections::HashSet;
use std::io::BufRead;

/// Written in place of any qualifier a feature does not carry.
pub const NOT_AVAILABLE: &str = "N/A";

const CODING_SEQUENCE: &str = "CDS";
const LOCUS_TAG: &str = "locus_tag";

/// Column names of the report, in the same order as the fields of `OutputRow`.
pub const HEADER: [&str; 10] = [
    "Locus_Tag",
    "Protein_ID",
    "Contig",
    "Start",
    "End",
    "Strand",
    "Gene",
    "Product",
    "Organism",
    "Source_File",
];

/// The locus tags a run is looking for.
#[derive(Debug, Default, Clone)]
pub struct TargetSet(HashSet<String>);

impl TargetSet {
    /// Reads one locus tag per line. Trailing whitespace is trimmed and blank lines are ignored.
    pub fn from_reader(reader: impl BufRead) -> std::io::Result<Self> {
        let mut tags = HashSet::new();
        for line in reader.lines() {
            let line = line?;
            let tag = line.trim_end();
            if !tag.is_empty() {
                tags.insert(tag.to_string());
            }
        }
        Ok(Self(tags))
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Tags in sorted order, for stable diagnostics.
    pub fn sorted(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.0.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

impl<S: Into<String>> FromIterator<S> for TargetSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// One line of the report. Coordinates are 1-based and inclusive.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    pub locus_tag: String,
    pub protein_id: String,
    pub contig: String,
    pub start: u64,
    pub end: u64,
    pub strand: &'static str,
    pub gene: String,
    pub product: String,
    pub organism: String,
    pub source_file: String,
}

/// Receives progress events while records are projected. Every method defaults to doing
/// nothing, so implementors only pick the events they care about.
pub trait ExtractObserver {
    fn record_started(&self, _record: &SequenceRecord, _source_file: &str) {}

    /// A CDS feature was seen; `locus_tag` is `None` when it has none.
    fn cds_seen(&self, _locus_tag: Option<&str>) {}

    fn qualifier_defaulted(&self, _locus_tag: &str, _qualifier: &str) {}

    /// The feature's strand was neither forward nor reverse and was written as `-`.
    fn strand_collapsed(&self, _locus_tag: &str) {}

    fn row_emitted(&self, _row: &OutputRow) {}
}

/// Selects the CDS features whose locus tag is targeted and turns them into report rows.
pub struct Projector<'a> {
    targets: &'a TargetSet,
    observer: &'a dyn ExtractObserver,
}

impl<'a> Projector<'a> {
    pub fn new(targets: &'a TargetSet, observer: &'a dyn ExtractObserver) -> Self {
        Self { targets, observer }
    }

    /// Lazily projects the records of one source file, in record then feature order.
    pub fn project<I>(
        &'a self,
        records: I,
        source_file: &'a str,
    ) -> impl Iterator<Item = OutputRow> + 'a
    where
        I: IntoIterator<Item = SequenceRecord>,
        I::IntoIter: 'a,
    {
        records.into_iter().flat_map(move |record| {
            self.observer.record_started(&record, source_file);

            let SequenceRecord {
                id,
                organism,
                features,
            } = record;

            features.into_iter().filter_map(move |feature| {
                self.project_feature(&feature, &id, &organism, source_file)
            })
        })
    }

    fn project_feature(
        &self,
        feature: &Feature,
        contig: &str,
        organism: &str,
        source_file: &str,
    ) -> Option<OutputRow> {
        if feature.kind != CODING_SEQUENCE {
            return None;
        }

        let locus_tag = feature.qualifier(LOCUS_TAG);
        self.observer.cds_seen(locus_tag);

        let locus_tag = locus_tag?;
        if !self.targets.contains(locus_tag) {
            return None;
        }

        // missing qualifiers fall back to N/A here and nowhere else
        let or_default = |qualifier: &str| -> String {
            feature.qualifier(qualifier).map(str::to_string).unwrap_or_else(|| {
                self.observer.qualifier_defaulted(locus_tag, qualifier);
                NOT_AVAILABLE.to_string()
            })
        };

        let location = &feature.location;
        if location.strand == Strand::Unknown {
            self.observer.strand_collapsed(locus_tag);
        }

        let row = OutputRow {
            locus_tag: locus_tag.to_string(),
            protein_id: or_default("protein_id"),
            contig: contig.to_string(),
            start: location.start + 1,
            end: location.end,
            strand: location.strand.symbol(),
            gene: or_default("gene"),
            product: or_default("product"),
            organism: organism.to_string(),
            source_file: source_file.to_string(),
        };

        self.observer.row_emitted(&row);
        Some(row)
    }
}
