use clap::builder::styling::AnsiColor;
use clap::builder::Styles;
use clap::Parser;
use std::path::PathBuf;

const fn extra_build_info() -> &'static str {
    match option_env!("CARGO_BUILD_DESC") {
        Some(e) => e,
        None => env!("CARGO_PKG_VERSION"),
    }
}
pub const VERSION: &str = extra_build_info();
const INFO_STRING: &str = "
🧬 gbkcoords version ";
const AFTER_STRING: &str = "
   ──────────────────────────────────
   gene coordinates for a list of locus tags, from GenBank annotations";

// colouring of the help
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Yellow.on_default().bold())
    .usage(AnsiColor::BrightMagenta.on_default().bold())
    .literal(AnsiColor::BrightMagenta.on_default())
    .placeholder(AnsiColor::White.on_default());

#[derive(Parser)]
#[command(
    version = VERSION,
    about = format!("{}{}{}", INFO_STRING, VERSION, AFTER_STRING),
    arg_required_else_help = true,
    styles = STYLES
)]
pub struct Cli {
    /// file with the locus tags to look for, one per line
    pub locus_tags: PathBuf,

    /// directory containing the GenBank files
    pub input_dir: PathBuf,

    /// directory to write the report to. defaults to the input directory
    pub output_dir: Option<PathBuf>,

    /// extension (without the dot) of the GenBank files in the input directory
    #[arg(long, default_value = "gbk")]
    pub extension: String,

    /// file name of the report inside the output directory
    #[arg(long, default_value = "gene_coordinates.tsv")]
    pub output_name: String,

    /// what to do with a record block that cannot be parsed:
    ///   abort - stop, and write no report
    ///   skip  - log a warning and carry on with the next record
    #[arg(long, value_enum, default_value = "abort", verbatim_doc_comment)]
    pub on_malformed: crate::policy::MalformedPolicy,

    /// also write a JSON summary of the run (per-file counts, unmatched locus tags)
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl Cli {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir
            .as_ref()
            .unwrap_or(&self.input_dir)
            .join(&self.output_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MalformedPolicy;

    #[test]
    fn output_defaults_to_input_dir() {
        let cli = Cli::parse_from(["gbkcoords", "tags.txt", "genomes"]);
        assert_eq!(cli.output_path(), PathBuf::from("genomes/gene_coordinates.tsv"));
        assert_eq!(cli.extension, "gbk");
        assert_eq!(cli.on_malformed, MalformedPolicy::Abort);
        assert!(cli.summary.is_none());
    }

    #[test]
    fn explicit_options() {
        let cli = Cli::parse_from([
            "gbkcoords",
            "tags.txt",
            "genomes",
            "out",
            "--extension",
            "gb",
            "--output-name",
            "hits.tsv",
            "--on-malformed",
            "skip",
        ]);
        assert_eq!(cli.output_path(), PathBuf::from("out/hits.tsv"));
        assert_eq!(cli.extension, "gb");
        assert_eq!(cli.on_malformed, MalformedPolicy::Skip);
    }
}
