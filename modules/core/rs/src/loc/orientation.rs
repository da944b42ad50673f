use std::fmt::{Display, Formatter};

use eyre::{bail, Report};

use super::strand::Strand;

/// Genomic orientation. Unlike [`Strand`] it has a third `Dual` value for unstranded features
/// and libraries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Orientation {
    Forward,
    Reverse,
    #[default]
    Dual,
}

impl Orientation {
    pub fn symbol(&self) -> char {
        match self {
            Orientation::Forward => '+',
            Orientation::Reverse => '-',
            Orientation::Dual => '=',
        }
    }

    /// BED marks unstranded features with '.'.
    pub fn bed_symbol(&self) -> char {
        match self {
            Orientation::Dual => '.',
            stranded => stranded.symbol(),
        }
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Accepts `+`, `-`, and either `=` or `.` for `Dual`.
impl TryFrom<&str> for Orientation {
    type Error = Report;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Ok(match value {
            "+" => Orientation::Forward,
            "-" => Orientation::Reverse,
            "=" | "." => Orientation::Dual,
            _ => bail!("Orientation must be one of +, -, = or ., got {value:?}"),
        })
    }
}

impl From<Strand> for Orientation {
    fn from(strand: Strand) -> Self {
        match strand {
            Strand::Forward => Orientation::Forward,
            Strand::Reverse => Orientation::Reverse,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbols_round_trip() -> eyre::Result<()> {
        for orientation in [Orientation::Forward, Orientation::Reverse, Orientation::Dual] {
            let printed = orientation.to_string();
            assert_eq!(Orientation::try_from(printed.as_str())?, orientation);

            let bed = orientation.bed_symbol().to_string();
            assert_eq!(Orientation::try_from(bed.as_str())?, orientation);
        }
        assert_eq!(Orientation::Dual.bed_symbol(), '.');
        assert_eq!(Orientation::Reverse.bed_symbol(), '-');

        for bad in ["", "x", "+-", "++"] {
            assert!(Orientation::try_from(bad).is_err(), "{bad:?}");
        }
        Ok(())
    }

    #[test]
    fn test_from_strand() {
        assert_eq!(Orientation::from(Strand::Forward), Orientation::Forward);
        assert_eq!(Orientation::from(Strand::Reverse), Orientation::Reverse);
    }
}
