// Differential signal: treatment vs control.
// Fold-enrichment and Poisson p-values are computed per contig, while q-values need a table
// built over all contigs at once.

pub use enrichment::{Cell, Enrichment};
pub use pvalue::{PValues, FILTERED};
pub use qtable::{QTable, QTableBuilder};

mod enrichment;
mod pvalue;
mod qtable;
