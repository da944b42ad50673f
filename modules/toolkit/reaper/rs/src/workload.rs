use ahash::HashMap;
use derive_getters::{Dissolve, Getters};
use eyre::{ensure, Result};

use biobit_core_rs::loc::{Contig, IntervalOp, Strand};
use biobit_core_rs::num::{Float, PrimInt};

use crate::coordmap::Transcript;
use crate::pcalling::ByCutoff;

/// How treatment and control signals are scaled before the comparison.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Scaling<Cnts> {
    /// Fixed multipliers for treatment and control.
    Fixed { treatment: Cnts, control: Cnts },
    /// The larger library is scaled down to the smaller one by the number of fragments.
    LibrarySize,
}

impl<Cnts: Float> Default for Scaling<Cnts> {
    fn default() -> Self {
        Scaling::Fixed {
            treatment: Cnts::one(),
            control: Cnts::one(),
        }
    }
}

impl<Cnts: Float> Scaling<Cnts> {
    /// Multipliers for (treatment, control) given the total number of fragments in each library.
    pub fn factors(&self, treatment: u64, control: u64) -> (Cnts, Cnts) {
        match self {
            Scaling::Fixed { treatment, control } => (*treatment, *control),
            Scaling::LibrarySize => {
                let (trt, cnt) = (
                    Cnts::from(treatment).unwrap_or_else(Cnts::zero),
                    Cnts::from(control).unwrap_or_else(Cnts::zero),
                );
                if trt <= Cnts::zero() || cnt <= Cnts::zero() {
                    (Cnts::one(), Cnts::one())
                } else if trt > cnt {
                    (cnt / trt, Cnts::one())
                } else {
                    (Cnts::one(), trt / cnt)
                }
            }
        }
    }
}

/// Peak calling parameters shared by all contigs.
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct Config<Idx: PrimInt, Cnts: Float> {
    // Treatment fragments extension
    trtext: Idx,
    // Control fragments extensions, combined by max
    cntext: Vec<Idx>,
    // Control fragments extensions in transcript coordinates
    trext: Vec<Idx>,
    trbaseline: Cnts,
    // Control baseline, derived from the library size when not set
    baseline: Option<Cnts>,
    mintrtfrag: Cnts,
    sensitivity: Cnts,
    scaling: Scaling<Cnts>,
    geffsize: Option<u64>,
    pcalling: ByCutoff<Idx, Cnts>,
    tolerate_failures: bool,
    threads: isize,
}

impl<Idx: PrimInt, Cnts: Float> Default for Config<Idx, Cnts> {
    fn default() -> Self {
        Self {
            trtext: Idx::zero(),
            cntext: vec![Idx::zero()],
            trext: vec![Idx::zero()],
            trbaseline: Cnts::zero(),
            baseline: None,
            mintrtfrag: Cnts::from(10).unwrap_or_else(Cnts::zero),
            sensitivity: Cnts::from(1e-5).unwrap_or_else(Cnts::epsilon),
            scaling: Scaling::default(),
            geffsize: None,
            pcalling: ByCutoff::default(),
            tolerate_failures: false,
            threads: 0,
        }
    }
}

fn ensure_non_negative<Cnts: Float>(name: &str, value: Cnts) -> Result<()> {
    ensure!(
        value.is_finite() && value >= Cnts::zero(),
        "{name} must be a finite non-negative number, got {value:?}"
    );
    Ok(())
}

impl<Idx: PrimInt, Cnts: Float> Config<Idx, Cnts> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_trtext(&mut self, trtext: Idx) -> &mut Self {
        self.trtext = trtext;
        self
    }

    pub fn set_cntext(&mut self, cntext: Vec<Idx>) -> Result<&mut Self> {
        ensure!(!cntext.is_empty(), "At least one control extension is required");
        self.cntext = cntext;
        Ok(self)
    }

    pub fn set_trext(&mut self, trext: Vec<Idx>) -> Result<&mut Self> {
        ensure!(!trext.is_empty(), "At least one transcript extension is required");
        self.trext = trext;
        Ok(self)
    }

    pub fn set_trbaseline(&mut self, trbaseline: Cnts) -> Result<&mut Self> {
        ensure_non_negative("Transcript baseline", trbaseline)?;
        self.trbaseline = trbaseline;
        Ok(self)
    }

    pub fn set_baseline(&mut self, baseline: Option<Cnts>) -> Result<&mut Self> {
        if let Some(baseline) = baseline {
            ensure!(
                baseline.is_finite() && baseline > Cnts::zero(),
                "Control baseline must be positive, got {baseline:?}"
            );
        }
        self.baseline = baseline;
        Ok(self)
    }

    pub fn set_mintrtfrag(&mut self, mintrtfrag: Cnts) -> Result<&mut Self> {
        ensure_non_negative("Minimum treatment signal", mintrtfrag)?;
        self.mintrtfrag = mintrtfrag;
        Ok(self)
    }

    pub fn set_sensitivity(&mut self, sensitivity: Cnts) -> Result<&mut Self> {
        ensure_non_negative("Sensitivity", sensitivity)?;
        self.sensitivity = sensitivity;
        Ok(self)
    }

    pub fn set_scaling(&mut self, scaling: Scaling<Cnts>) -> Result<&mut Self> {
        if let Scaling::Fixed { treatment, control } = scaling {
            for factor in [treatment, control] {
                ensure!(
                    factor.is_finite() && factor > Cnts::zero(),
                    "Scaling factors must be positive, got {factor:?}"
                );
            }
        }
        self.scaling = scaling;
        Ok(self)
    }

    pub fn set_geffsize(&mut self, geffsize: Option<u64>) -> Result<&mut Self> {
        ensure!(
            geffsize != Some(0),
            "Effective genome size must be positive"
        );
        self.geffsize = geffsize;
        Ok(self)
    }

    pub fn set_pcalling(&mut self, pcalling: ByCutoff<Idx, Cnts>) -> &mut Self {
        self.pcalling = pcalling;
        self
    }

    pub fn set_tolerate_failures(&mut self, tolerate: bool) -> &mut Self {
        self.tolerate_failures = tolerate;
        self
    }

    pub fn set_threads(&mut self, threads: isize) -> &mut Self {
        self.threads = threads;
        self
    }
}

/// Contigs to process and optional transcript models for the control signal.
#[derive(Clone, PartialEq, Debug, Dissolve, Getters)]
pub struct Workload<Ctg: Contig, Idx: PrimInt> {
    contigs: Vec<(Ctg, Idx)>,
    transcripts: HashMap<(Ctg, Strand), Vec<Transcript<Idx>>>,
}

impl<Ctg: Contig, Idx: PrimInt> Default for Workload<Ctg, Idx> {
    fn default() -> Self {
        Self {
            contigs: Vec::new(),
            transcripts: HashMap::default(),
        }
    }
}

impl<Ctg: Contig, Idx: PrimInt> Workload<Ctg, Idx> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_contig(&mut self, contig: Ctg, length: Idx) -> Result<&mut Self> {
        ensure!(
            length > Idx::zero(),
            "Contig {contig} must have a positive length"
        );
        ensure!(
            self.contigs.iter().all(|(x, _)| *x != contig),
            "Contig {contig} is already in the workload"
        );
        self.contigs.push((contig, length));
        Ok(self)
    }

    pub fn add_contigs(
        &mut self,
        contigs: impl IntoIterator<Item = (Ctg, Idx)>,
    ) -> Result<&mut Self> {
        for (contig, length) in contigs {
            self.add_contig(contig, length)?;
        }
        Ok(self)
    }

    /// Add a transcript model. Transcripts are kept sorted by their start.
    pub fn add_transcript(
        &mut self,
        contig: Ctg,
        strand: Strand,
        transcript: Transcript<Idx>,
    ) -> &mut Self {
        let models = self.transcripts.entry((contig, strand)).or_default();
        let start = transcript.envelope().start();
        let position = models.partition_point(|x| x.envelope().start() <= start);
        models.insert(position, transcript);
        self
    }

    pub fn transcripts_for(&self, contig: &Ctg, strand: Strand) -> &[Transcript<Idx>] {
        self.transcripts
            .get(&(contig.clone(), strand))
            .map(|x| x.as_slice())
            .unwrap_or_default()
    }

    /// Sum of all contig lengths.
    pub fn genome_size(&self) -> u64 {
        self.contigs
            .iter()
            .filter_map(|(_, length)| length.to_u64())
            .sum()
    }
}
