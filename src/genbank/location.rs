use gb_io::seq::Location as GbLocation;
use thiserror::Error;

/// The strand a feature sits on.
///
/// Simple spans in a nucleotide record are always `Forward` unless wrapped in `complement(..)`.
/// `Unknown` only arises from compound locations whose parts disagree.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl Strand {
    fn complement(self) -> Self {
        match self {
            Strand::Forward => Strand::Reverse,
            Strand::Reverse => Strand::Forward,
            Strand::Unknown => Strand::Unknown,
        }
    }

    /// Report symbol for this strand. Anything that is not forward is written as `-`.
    pub fn symbol(&self) -> &'static str {
        match self {
            Strand::Forward => "+",
            Strand::Reverse | Strand::Unknown => "-",
        }
    }

    /// Strand of a parsed location, following `complement(..)` nesting.
    fn of(location: &GbLocation) -> Self {
        match location {
            GbLocation::Complement(inner) => Strand::of(inner).complement(),
            GbLocation::Join(parts)
            | GbLocation::Order(parts)
            | GbLocation::Bond(parts)
            | GbLocation::OneOf(parts) => {
                let mut strands = parts.iter().map(Strand::of);
                let first = strands.next().unwrap_or(Strand::Unknown);
                if strands.all(|s| s == first) {
                    first
                } else {
                    Strand::Unknown
                }
            }
            GbLocation::External(_, Some(inner)) => Strand::of(inner),
            _ => Strand::Forward,
        }
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("unusable location {location}: {reason}")]
pub struct LocationError {
    pub location: String,
    pub reason: String,
}

/// A feature location, flattened to the half-open, 0-based interval `[start, end)` that covers
/// every part of it.
///
/// Both ends fit in an `i64`, so converting `start` to 1-based never overflows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub start: u64,
    pub end: u64,
    pub strand: Strand,
}

impl Location {
    pub fn new(start: u64, end: u64, strand: Strand) -> Self {
        Self { start, end, strand }
    }
}

impl TryFrom<&GbLocation> for Location {
    type Error = LocationError;

    fn try_from(location: &GbLocation) -> Result<Self, Self::Error> {
        let error = |reason: String| LocationError {
            location: format!("{location:?}"),
            reason,
        };

        let (start, end) = location
            .find_bounds()
            .map_err(|e| error(format!("{e:?}")))?;

        let start = u64::try_from(start).map_err(|_| error(format!("negative start {start}")))?;
        let end = u64::try_from(end).map_err(|_| error(format!("negative end {end}")))?;
        if end < start {
            return Err(error(format!("end {end} lies before start {start}")));
        }

        Ok(Location::new(start, end, Strand::of(location)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(start: i64, end: i64) -> GbLocation {
        GbLocation::simple_range(start, end)
    }

    fn convert(location: GbLocation) -> Location {
        Location::try_from(&location).unwrap()
    }

    #[test]
    fn simple_and_complemented_spans() {
        assert_eq!(convert(range(10, 50)), Location::new(10, 50, Strand::Forward));
        assert_eq!(
            convert(GbLocation::Complement(Box::new(range(100, 200)))),
            Location::new(100, 200, Strand::Reverse)
        );
    }

    #[test]
    fn compound_locations_cover_all_parts() {
        let joined = GbLocation::Complement(Box::new(GbLocation::Join(vec![
            range(59, 80),
            range(89, 110),
        ])));
        assert_eq!(convert(joined), Location::new(59, 110, Strand::Reverse));

        let parts_complemented = GbLocation::Order(vec![
            GbLocation::Complement(Box::new(range(0, 10))),
            GbLocation::Complement(Box::new(range(20, 30))),
        ]);
        assert_eq!(convert(parts_complemented), Location::new(0, 30, Strand::Reverse));
    }

    #[test]
    fn disagreeing_parts_have_unknown_strand() {
        let mixed = GbLocation::Join(vec![
            GbLocation::Complement(Box::new(range(529, 560))),
            range(569, 590),
        ]);
        assert_eq!(convert(mixed), Location::new(529, 590, Strand::Unknown));
        assert_eq!(Strand::Unknown.symbol(), "-");
    }

    #[test]
    fn largest_positions_convert_without_overflow() {
        let location = convert(range(i64::MAX - 1, i64::MAX));
        assert_eq!(location.start + 1, i64::MAX as u64);
        assert_eq!(location.end, i64::MAX as u64);
    }

    #[test]
    fn negative_positions_are_rejected() {
        let err = Location::try_from(&range(-5, 10)).unwrap_err();
        assert_eq!(err.reason, "negative start -5");
    }
}
