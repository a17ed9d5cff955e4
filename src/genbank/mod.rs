pub mod location;
pub mod reader;

use indexmap::IndexMap;

pub use self::location::{Location, Strand};
pub use self::reader::{GenbankReader, ReadError};

/// Organism reported for records whose SOURCE section has no ORGANISM line.
pub const UNKNOWN_ORGANISM: &str = "Unknown_Organism";

/// One LOCUS ... // block of a GenBank file.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceRecord {
    /// The accession.version if the record has one, otherwise the LOCUS name.
    pub id: String,
    pub organism: String,
    pub features: Vec<Feature>,
}

/// Qualifier values keyed by name, in the order they first appear. A qualifier may repeat.
pub type Qualifiers = IndexMap<String, Vec<String>>;

/// An entry of the FEATURES table.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub kind: String,
    pub location: Location,
    pub qualifiers: Qualifiers,
}

impl Feature {
    /// The first value of a qualifier, if the qualifier is present with a non-empty value.
    pub fn qualifier(&self, key: &str) -> Option<&str> {
        self.qualifiers
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}
