/// What to do when a GenBank record block cannot be parsed.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Stop the run at the first malformed block. No report is written.
    Abort,

    /// Log the malformed block, leave it out of the report, and continue with the next block.
    Skip,
}
