use std::path::PathBuf;

use clap::{Args, Parser, ValueEnum};

use biobit_core_rs::ngs::{Layout, Strandedness};

#[derive(Parser, Debug)]
#[command(
    author = env!("CARGO_PKG_AUTHORS"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None,)]
pub struct Cli {
    /// Indexed treatment BAM files
    #[arg(short, long, required = true, num_args = 1..)]
    pub treatment: Vec<PathBuf>,

    /// Indexed control BAM files
    #[arg(short, long, required = true, num_args = 1..)]
    pub control: Vec<PathBuf>,

    /// Output directory for coverage tracks and peaks
    #[arg(short, long)]
    pub outdir: PathBuf,

    /// Process only these contigs (default: all contigs from the first treatment BAM)
    #[arg(long, num_args = 1..)]
    pub contigs: Vec<String>,

    /// Transcript models (BED12) used to model the control signal in transcript coordinates
    #[arg(long)]
    pub transcripts: Option<PathBuf>,

    #[clap(flatten)]
    pub reads: ReadsArgs,

    #[clap(flatten)]
    pub pileup: PileupArgs,

    #[clap(flatten)]
    pub callpeaks: CallPeaksArgs,

    /// Worker threads: 0 for all cores, negative values leave cores idle
    #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
    pub threads: isize,

    /// Skip contigs that failed to process instead of aborting the run
    #[arg(long)]
    pub tolerate_failures: bool,
}

#[derive(ValueEnum, Clone, Copy, PartialEq, Eq, Debug)]
pub enum StrandednessArg {
    Forward,
    Reverse,
    Unstranded,
}

impl From<StrandednessArg> for Strandedness {
    fn from(value: StrandednessArg) -> Self {
        match value {
            StrandednessArg::Forward => Strandedness::Forward,
            StrandednessArg::Reverse => Strandedness::Reverse,
            StrandednessArg::Unstranded => Strandedness::Unstranded,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReadsArgs {
    /// Required SAM flags
    #[arg(long, default_value_t = 0)]
    pub inflags: u16,

    /// Excluded SAM flags
    #[arg(long, default_value_t = 2564)]
    pub exflags: u16,

    /// Minimum mapping quality
    #[arg(long, default_value_t = 0)]
    pub minmapq: u8,

    /// Bundle mates of paired-end reads into a single fragment
    #[arg(long)]
    pub paired: bool,

    /// Library strandedness (of the first mate for paired-end libraries)
    #[arg(long, value_enum, default_value_t = StrandednessArg::Unstranded)]
    pub strandedness: StrandednessArg,
}

impl ReadsArgs {
    pub fn layout(&self) -> Layout {
        let strandedness = self.strandedness.into();
        if self.paired {
            Layout::Paired { strandedness }
        } else {
            Layout::Single { strandedness }
        }
    }
}

#[derive(Args, Debug)]
pub struct PileupArgs {
    /// Treatment fragments extension
    #[arg(long, default_value_t = 0)]
    pub trtext: usize,

    /// Control fragments extensions, combined by max
    #[arg(long, num_args = 1.., default_values_t = [0])]
    pub cntext: Vec<usize>,

    /// Control fragments extensions in transcript coordinates
    #[arg(long, num_args = 1.., default_values_t = [0])]
    pub trext: Vec<usize>,

    /// Minimum control signal within transcripts
    #[arg(long, default_value_t = 0.0)]
    pub trbaseline: f32,

    /// Minimum control signal (default: control fragments / effective genome size)
    #[arg(long)]
    pub baseline: Option<f32>,

    /// Treatment signal below this value is ignored
    #[arg(long, default_value_t = 10.0)]
    pub mintrtfrag: f32,

    /// Effective genome size (default: sum of contig lengths)
    #[arg(long)]
    pub geffsize: Option<u64>,

    /// Scale the larger library down to the smaller one
    #[arg(long, conflicts_with_all = ["trtscale", "cntscale"])]
    pub scale_libsize: bool,

    /// Treatment scaling factor
    #[arg(long, default_value_t = 1.0)]
    pub trtscale: f32,

    /// Control scaling factor
    #[arg(long, default_value_t = 1.0)]
    pub cntscale: f32,

    /// Adjacent values closer than this are merged in coverage tracks
    #[arg(long, default_value_t = 1e-5)]
    pub sensitivity: f32,
}

#[derive(Args, Debug)]
pub struct CallPeaksArgs {
    /// Q-value cutoff, a probability
    #[arg(long, default_value_t = 0.01)]
    pub qvcutoff: f32,

    /// Disable the q-value cutoff
    #[arg(long)]
    pub no_qvcutoff: bool,

    /// P-value cutoff, a probability
    #[arg(long)]
    pub pvcutoff: Option<f32>,

    /// Fold-enrichment cutoff
    #[arg(long, default_value_t = 2.0)]
    pub fecutoff: f32,

    /// Minimum peak length
    #[arg(long, default_value_t = 50)]
    pub minsize: usize,

    /// Maximum gap between stitched peak parts
    #[arg(long, default_value_t = 25)]
    pub maxgap: usize,
}
