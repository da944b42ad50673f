use std::fmt::{Display, Formatter};

use eyre::{bail, Report};

use super::orientation::Orientation;

/// One of the two strands of a double-stranded molecule.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
pub enum Strand {
    #[default]
    Forward,
    Reverse,
}

impl Strand {
    pub const BOTH: [Strand; 2] = [Strand::Forward, Strand::Reverse];

    pub fn symbol(&self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

impl Display for Strand {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl TryFrom<Orientation> for Strand {
    type Error = Report;

    fn try_from(orientation: Orientation) -> Result<Self, Self::Error> {
        match orientation {
            Orientation::Forward => Ok(Strand::Forward),
            Orientation::Reverse => Ok(Strand::Reverse),
            Orientation::Dual => bail!("Unstranded orientation has no strand"),
        }
    }
}
