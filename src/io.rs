use crate::extract::{OutputRow, TargetSet, HEADER};
use anyhow::{Context, Result};
use csv::{QuoteStyle, Writer, WriterBuilder};
use itertools::Itertools;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("no .{extension} files found in {dir}, check your input directory")]
    NotFound { dir: PathBuf, extension: String },

    #[error("unable to list input directory {dir}")]
    Unreadable {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Lists the files directly inside `dir` with the given extension, sorted by file name so that
/// the report does not depend on directory iteration order.
///
/// # Errors
///
/// Returns `InputError::NotFound` if there are no such files, and `InputError::Unreadable` if the
/// directory cannot be listed.
pub fn find_input_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, InputError> {
    let unreadable = |source| InputError::Unreadable {
        dir: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(unreadable)? {
        let path = entry.map_err(unreadable)?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(InputError::NotFound {
            dir: dir.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    files.sort_unstable_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Reads the locus tag list, and logs a preview of it.
pub fn load_targets(path: &Path) -> Result<TargetSet> {
    let file = File::open(path)
        .with_context(|| format!("Unable to open locus tag file {}", path.display()))?;
    let targets = TargetSet::from_reader(BufReader::new(file))
        .with_context(|| format!("Unable to read locus tag file {}", path.display()))?;

    let sorted = targets.sorted();
    let preview = sorted.iter().take(5).join(", ");
    if sorted.len() > 5 {
        info!("Locus tags loaded ({}): {preview}, ...", targets.len());
    } else {
        info!("Locus tags loaded ({}): {preview}", targets.len());
    }

    Ok(targets)
}

/// File mode of the finished report.
#[cfg(unix)]
const REPORT_MODE: u32 = 0o644;

/// Writes report rows into a temporary file next to the final output. The report only appears
/// under its real name once `finish` is called, so a failed run leaves nothing behind.
pub struct ReportWriter {
    wtr: Writer<File>,
    temp_file: NamedTempFile,
    out_file: PathBuf,
}

impl ReportWriter {
    /// Creates the writer and writes the header row. The parent directory of `path` must exist.
    pub fn new(path: &Path) -> Result<Self> {
        // get the directory of the output file
        let mut tempfile_dir = std::path::absolute(path)?;
        tempfile_dir.pop();

        let temp_file = NamedTempFile::new_in(&tempfile_dir).with_context(|| {
            format!("Unable to create a temporary file in {}", tempfile_dir.display())
        })?;

        let mut wtr = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .quote_style(QuoteStyle::Never)
            .from_writer(temp_file.as_file().try_clone()?);
        wtr.write_record(HEADER)?;

        Ok(ReportWriter {
            wtr,
            temp_file,
            out_file: path.to_path_buf(),
        })
    }

    pub fn write_row(&mut self, row: &OutputRow) -> csv::Result<()> {
        self.wtr.serialize(row)
    }

    /// Flushes the rows and moves the temporary file to the output path.
    pub fn finish(self) -> Result<PathBuf> {
        let ReportWriter {
            mut wtr,
            temp_file,
            out_file,
        } = self;
        info!("Writing to {}...", out_file.display());

        wtr.flush()?;
        drop(wtr);

        // temporary files are created owner-only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            temp_file
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(REPORT_MODE))
                .with_context(|| format!("Unable to set permissions on {}", out_file.display()))?;
        }

        temp_file
            .persist(&out_file)
            .with_context(|| format!("Unable to write {}", out_file.display()))?;

        Ok(out_file)
    }
}

/// Utility function to extract the error from an iterator and stop iteration immediately. Useful
/// for iterators which yield a Result<T>.
///
/// # Returns
///
/// This function returns an `Option<T>`. If the item is `Ok`, it returns `Some(T)`.
/// If the item is `Err`, it updates `err` with the error and returns `None`.
pub fn until_err<T>(err: &mut &mut Result<()>, item: Result<T>) -> Option<T> {
    match item {
        Ok(item) => Some(item),
        Err(e) => {
            **err = Err(e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use assert_fs::prelude::*;

    #[test]
    fn input_files_are_filtered_and_sorted() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("b.gbk").touch().unwrap();
        dir.child("a.gbk").touch().unwrap();
        dir.child("notes.txt").touch().unwrap();
        dir.child("c.gbk.bak").touch().unwrap();
        dir.child("nested.gbk").create_dir_all().unwrap();

        let files = find_input_files(dir.path(), "gbk").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.gbk", "b.gbk"]);
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("a.gb").touch().unwrap();

        let err = find_input_files(dir.path(), "gbk").unwrap_err();
        assert!(matches!(err, InputError::NotFound { .. }));
        assert!(err.to_string().contains("no .gbk files found"));
    }

    #[test]
    fn missing_directory_is_unreadable() {
        let err = find_input_files(Path::new("does/not/exist"), "gbk").unwrap_err();
        assert!(matches!(err, InputError::Unreadable { .. }));
    }

    #[test]
    fn report_only_exists_after_finish() {
        let dir = assert_fs::TempDir::new().unwrap();
        let out = dir.child("report.tsv");

        let mut wtr = ReportWriter::new(out.path()).unwrap();
        wtr.write_row(&OutputRow {
            locus_tag: "T_1".into(),
            protein_id: "N/A".into(),
            contig: "c1".into(),
            start: 1,
            end: 9,
            strand: "+",
            gene: "N/A".into(),
            product: "putative \"odd\" protein".into(),
            organism: "Unknown_Organism".into(),
            source_file: "a.gbk".into(),
        })
        .unwrap();
        out.assert(predicates::path::missing());

        let path = wtr.finish().unwrap();
        assert_eq!(path, out.path());
        out.assert(
            "Locus_Tag\tProtein_ID\tContig\tStart\tEnd\tStrand\tGene\tProduct\tOrganism\tSource_File\n\
             T_1\tN/A\tc1\t1\t9\t+\tN/A\tputative \"odd\" protein\tUnknown_Organism\ta.gbk\n",
        );
    }

    #[cfg(unix)]
    #[test]
    fn finished_report_is_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = assert_fs::TempDir::new().unwrap();
        let out = dir.child("report.tsv");

        let path = ReportWriter::new(out.path()).unwrap().finish().unwrap();
        let mode = std::fs::metadata(path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, REPORT_MODE);
    }

    #[test]
    fn until_err_stops_at_first_error() {
        let mut err = Ok(());
        let items = vec![Ok(1), Ok(2), Err(anyhow!("error")), Ok(3)];
        let results: Vec<_> = items.into_iter().scan(&mut err, until_err).collect();
        assert_eq!(results, vec![1, 2]);
        assert!(err.is_err());
    }
}
