use std::fmt::{Display, Formatter};

use crate::loc::Orientation;

use super::strandedness::Strandedness;

/// Sequencing library layout. Paired-end libraries are assumed to have inward-facing mates.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Layout {
    Single { strandedness: Strandedness },
    Paired { strandedness: Strandedness },
}

impl Layout {
    /// Orientation of the source molecule given the alignment flags of one read.
    /// For paired-end libraries, the strandedness refers to the first mate.
    pub fn deduce(&self, is_first_segment: bool, is_reverse_complemented: bool) -> Orientation {
        let (strandedness, flip) = match self {
            Layout::Single { strandedness } => (strandedness, is_reverse_complemented),
            Layout::Paired { strandedness } => {
                (strandedness, is_reverse_complemented == is_first_segment)
            }
        };
        match strandedness {
            Strandedness::Unstranded => Orientation::Dual,
            Strandedness::Forward if flip => Orientation::Reverse,
            Strandedness::Forward => Orientation::Forward,
            Strandedness::Reverse if flip => Orientation::Forward,
            Strandedness::Reverse => Orientation::Reverse,
        }
    }
}

impl Default for Layout {
    fn default() -> Self {
        Layout::Single {
            strandedness: Strandedness::Unstranded,
        }
    }
}

impl Display for Layout {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Layout::Single { strandedness } => write!(f, "Single({})", strandedness),
            Layout::Paired { strandedness } => write!(f, "Paired({})", strandedness),
        }
    }
}
