use eyre::{ensure, Result};
use rayon::ThreadPoolBuilder;

use biobit_core_rs::num::Float;
use biobit_core_rs::parallelism;
use biobit_core_rs::source::Source;

use super::engine::Engine;
use super::result::Harvest;
use super::workload::{Config, Workload};

/// Peak calling for a single treatment/control pair of libraries.
///
/// Each library can be spread over several sources, e.g. replicates or sequencing runs. Sources
/// are cloned for each worker thread.
pub struct Reaper<Src: Source, Cnts: Float> {
    config: Config<Src::Idx, Cnts>,
    workload: Workload<Src::Ctg, Src::Idx>,
    treatment: Vec<Src>,
    control: Vec<Src>,
    engine: Engine<Src, Cnts>,
}

impl<Src: Source, Cnts: Float> Reaper<Src, Cnts> {
    pub fn new(config: Config<Src::Idx, Cnts>, workload: Workload<Src::Ctg, Src::Idx>) -> Self {
        Self {
            config,
            workload,
            treatment: Vec::new(),
            control: Vec::new(),
            engine: Engine::default(),
        }
    }

    pub fn config(&self) -> &Config<Src::Idx, Cnts> {
        &self.config
    }

    pub fn workload(&self) -> &Workload<Src::Ctg, Src::Idx> {
        &self.workload
    }

    pub fn add_treatment(&mut self, source: Src) -> &mut Self {
        self.treatment.push(source);
        self
    }

    pub fn add_treatments(&mut self, sources: impl IntoIterator<Item = Src>) -> &mut Self {
        self.treatment.extend(sources);
        self
    }

    pub fn add_control(&mut self, source: Src) -> &mut Self {
        self.control.push(source);
        self
    }

    pub fn add_controls(&mut self, sources: impl IntoIterator<Item = Src>) -> &mut Self {
        self.control.extend(sources);
        self
    }

    pub fn reset(&mut self) {
        self.treatment.clear();
        self.control.clear();
        self.engine.reset();
    }

    /// Call peaks on both strands of every contig in the workload. Results are ordered by contig
    /// and then by strand (forward first).
    pub fn run(&mut self) -> Result<Vec<Harvest<Src::Ctg, Src::Idx, Cnts>>> {
        ensure!(!self.treatment.is_empty(), "No treatment sources were added");
        ensure!(!self.control.is_empty(), "No control sources were added");
        ensure!(
            !self.workload.contigs().is_empty(),
            "The workload doesn't contain any contigs"
        );

        let threads = parallelism::available(*self.config.threads())?;
        let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;

        self.engine.run(
            &pool,
            &self.config,
            &self.workload,
            &self.treatment,
            &self.control,
        )
    }
}
