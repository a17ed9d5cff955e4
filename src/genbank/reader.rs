use super::location::{Location, LocationError};
use super::{Feature, Qualifiers, SequenceRecord, UNKNOWN_ORGANISM};
use gb_io::reader::SeqReader;
use gb_io::seq::Seq;
use itertools::Itertools;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("malformed record at line {line}: {kind}")]
pub struct MalformedRecordError {
    /// Line of the offending text, or of the `LOCUS` header when the block as a whole is bad.
    pub line: usize,
    pub kind: Malformation,
}

#[derive(Error, Debug, PartialEq)]
pub enum Malformation {
    #[error("expected a LOCUS header, found `{0}`")]
    MissingLocus(String),

    #[error("LOCUS header has no record name")]
    MissingLocusName,

    #[error("LOCUS header found before the `//` terminating the previous record")]
    UnterminatedRecord,

    #[error("record could not be parsed: {0}")]
    Syntax(String),

    #[error("feature `{kind}`: {source}")]
    Location {
        kind: String,
        #[source]
        source: LocationError,
    },
}

#[derive(Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Malformed(#[from] MalformedRecordError),

    #[error("could not read input")]
    Io(#[from] std::io::Error),
}

fn malformed(line: usize, kind: Malformation) -> MalformedRecordError {
    MalformedRecordError { line, kind }
}

fn is_locus(line: &str) -> bool {
    line.strip_prefix("LOCUS")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

/// The organism name out of the raw `ORGANISM` sub-field.
///
/// Wrapped names continue over indented lines until the taxonomic lineage, which is the first
/// line holding a `;`. A lone `.` is a placeholder for "no organism".
pub fn organism_name(raw: &str) -> Option<String> {
    let name = raw
        .lines()
        .map(str::trim)
        .take_while(|line| !line.contains(';'))
        .filter(|line| !line.is_empty() && *line != ".")
        .join(" ");

    (!name.is_empty()).then_some(name)
}

/// Qualifier value with its line breaks folded away.
fn unwrap_value(key: &str, value: &str) -> String {
    // protein translations are wrapped mid-sequence, everything else at word boundaries
    let separator = if key == "translation" { "" } else { " " };
    value
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .join(separator)
}

/// One `LOCUS` ... `//` block, with the line its header sits on.
struct Block {
    line: usize,
    text: String,
}

impl Block {
    fn parse(self) -> Result<SequenceRecord, MalformedRecordError> {
        let seq = match SeqReader::new(self.text.as_bytes()).next() {
            Some(Ok(seq)) => seq,
            Some(Err(e)) => return Err(malformed(self.line, Malformation::Syntax(e.to_string()))),
            None => {
                let kind = Malformation::Syntax("no record found".to_string());
                return Err(malformed(self.line, kind));
            }
        };

        into_record(seq).map_err(|kind| malformed(self.line, kind))
    }
}

fn into_record(seq: Seq) -> Result<SequenceRecord, Malformation> {
    // accession.version, then the first accession, then the LOCUS name
    let id = [&seq.version, &seq.accession, &seq.name]
        .into_iter()
        .filter_map(|field| field.as_deref()?.split_whitespace().next())
        .next()
        .map(str::to_string)
        .ok_or(Malformation::MissingLocusName)?;

    let organism = seq
        .source
        .as_ref()
        .and_then(|source| source.organism.as_deref())
        .and_then(organism_name)
        .unwrap_or_else(|| UNKNOWN_ORGANISM.to_string());

    let features = seq
        .features
        .iter()
        .map(|feature| -> Result<Feature, Malformation> {
            let kind = feature.kind.to_string();
            let location = Location::try_from(&feature.location).map_err(|source| {
                Malformation::Location {
                    kind: kind.clone(),
                    source,
                }
            })?;

            let mut qualifiers = Qualifiers::new();
            for (key, value) in &feature.qualifiers {
                let key = key.to_string();
                let value = value
                    .as_deref()
                    .map(|v| unwrap_value(&key, v))
                    .unwrap_or_default();
                qualifiers.entry(key).or_default().push(value);
            }

            Ok(Feature {
                kind,
                location,
                qualifiers,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SequenceRecord {
        id,
        organism,
        features,
    })
}

/// Streams `SequenceRecord`s out of a GenBank flat file, one per `LOCUS` block.
///
/// The input is cut into blocks at `//` lines, and each block goes through `gb_io`'s
/// `SeqReader` on its own. A malformed block yields a single `ReadError::Malformed` and the
/// reader moves on to the next `LOCUS` line, so the caller decides whether to stop or carry on.
/// An I/O error ends the stream.
pub struct GenbankReader<R> {
    reader: R,
    buf: Vec<u8>,
    line_number: usize,
    pushed_back: Option<(usize, String)>,
    finished: bool,
}

impl<R: BufRead> GenbankReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(128),
            line_number: 0,
            pushed_back: None,
            finished: false,
        }
    }

    /// The next line and its 1-based number, without the line terminator.
    fn next_line(&mut self) -> std::io::Result<Option<(usize, String)>> {
        if let Some(line) = self.pushed_back.take() {
            return Ok(Some(line));
        }

        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;

        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }
        let line = String::from_utf8_lossy(&self.buf).into_owned();
        Ok(Some((self.line_number, line)))
    }

    /// Drops lines up to the next `//` (consumed) or `LOCUS` (kept).
    fn skip_to_next_record(&mut self) -> std::io::Result<()> {
        while let Some((number, line)) = self.next_line()? {
            if line.starts_with("//") {
                break;
            }
            if is_locus(&line) {
                self.pushed_back = Some((number, line));
                break;
            }
        }
        Ok(())
    }

    /// Collects the next block. A missing `//` at the very end of the stream is tolerated.
    fn next_block(&mut self) -> Result<Option<Block>, ReadError> {
        let (line, header) = loop {
            match self.next_line()? {
                None => return Ok(None),
                Some((_, text)) if text.trim().is_empty() => continue,
                Some(header) => break header,
            }
        };

        if !is_locus(&header) {
            self.skip_to_next_record()?;
            let kind = Malformation::MissingLocus(header.trim().to_string());
            return Err(malformed(line, kind).into());
        }

        let mut text = header;
        text.push('\n');

        while let Some((number, next)) = self.next_line()? {
            if is_locus(&next) {
                self.pushed_back = Some((number, next));
                return Err(malformed(number, Malformation::UnterminatedRecord).into());
            }

            text.push_str(&next);
            text.push('\n');
            if next.starts_with("//") {
                return Ok(Some(Block { line, text }));
            }
        }

        text.push_str("//\n");
        Ok(Some(Block { line, text }))
    }
}

impl<R: BufRead> Iterator for GenbankReader<R> {
    type Item = Result<SequenceRecord, ReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let result = match self.next_block() {
            Ok(None) => {
                self.finished = true;
                return None;
            }
            Ok(Some(block)) => block.parse().map_err(ReadError::from),
            Err(e) => Err(e),
        };

        if let Err(ReadError::Io(_)) = &result {
            self.finished = true;
        }

        Some(result)
    }
}
