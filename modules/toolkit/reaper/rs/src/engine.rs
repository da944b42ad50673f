use std::cell::RefCell;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use ahash::HashSet;
use eyre::{eyre, Report, Result};
use log::{debug, info, warn};
use rayon::ThreadPool;
use thread_local::ThreadLocal;

use biobit_core_rs::loc::{PerStrand, Strand};
use biobit_core_rs::num::Float;
use biobit_core_rs::source::Source;

use crate::cmp::QTableBuilder;
use crate::pcalling::Peak;

use super::result::Harvest;
use super::worker::{Comparison, Coverage, Library, Normalization, Worker};
use super::workload::{Config, Workload};

struct Task<T, R> {
    contig: usize,
    payload: T,
    result: Option<R>,
}

impl<T, R> Task<T, R> {
    fn new(contig: usize, payload: T) -> Self {
        Self {
            contig,
            payload,
            result: None,
        }
    }
}

// Run all tasks in the pool. Unless failures are tolerated, pending tasks are skipped after the
// first error. Returns errors tagged with the contig index.
fn execute<T, R, F>(
    pool: &ThreadPool,
    tasks: &mut [Task<T, R>],
    tolerate: bool,
    job: F,
) -> Vec<(usize, Report)>
where
    T: Send,
    R: Send,
    F: Fn(usize, &mut T) -> Result<R> + Sync,
{
    let error_occured = AtomicBool::new(false);
    let errors = Mutex::new(Vec::new());

    pool.scope(|s| {
        for task in tasks.iter_mut() {
            let (job, error_occured, errors) = (&job, &error_occured, &errors);
            s.spawn(move |_| {
                if !tolerate && error_occured.load(Ordering::Relaxed) {
                    return;
                }

                match job(task.contig, &mut task.payload) {
                    Ok(result) => task.result = Some(result),
                    Err(err) => {
                        error_occured.store(true, Ordering::Relaxed);
                        errors
                            .lock()
                            .unwrap_or_else(PoisonError::into_inner)
                            .push((task.contig, err));
                    }
                }
            });
        }
    });

    errors.into_inner().unwrap_or_else(PoisonError::into_inner)
}

pub struct Engine<Src: Source, Cnts: Float> {
    workers: ThreadLocal<RefCell<Worker<Src, Cnts>>>,
}

impl<Src: Source, Cnts: Float> Default for Engine<Src, Cnts> {
    fn default() -> Self {
        Self {
            workers: ThreadLocal::new(),
        }
    }
}

impl<Src: Source, Cnts: Float> Engine<Src, Cnts> {
    pub fn reset(&mut self) {
        // Soft-reset all workers
        for w in self.workers.iter_mut() {
            w.get_mut().reset()
        }
    }

    pub fn run(
        &mut self,
        pool: &ThreadPool,
        config: &Config<Src::Idx, Cnts>,
        workload: &Workload<Src::Ctg, Src::Idx>,
        treatment: &[Src],
        control: &[Src],
    ) -> Result<Vec<Harvest<Src::Ctg, Src::Idx, Cnts>>> {
        self.reset();

        let contigs = workload.contigs();
        let tolerate = *config.tolerate_failures();
        let mut failed = HashSet::default();

        // 1. Pileup of each library over each contig
        info!(
            "Calculating pileups for {} contig(s) using {} thread(s)",
            contigs.len(),
            pool.current_num_threads()
        );
        let mut pileups = Vec::with_capacity(contigs.len() * 2);
        for contig in 0..contigs.len() {
            pileups.push(Task::new(contig, Library::Treatment));
            pileups.push(Task::new(contig, Library::Control));
        }
        let errors = execute(pool, &mut pileups, tolerate, |contig, library| {
            let (contig, length) = &contigs[contig];
            let sources = match library {
                Library::Treatment => treatment,
                Library::Control => control,
            };
            let transcripts = PerStrand::new(
                workload.transcripts_for(contig, Strand::Forward),
                workload.transcripts_for(contig, Strand::Reverse),
            );
            self.workers.get_or_default().borrow_mut().coverage(
                *library,
                contig,
                *length,
                sources,
                transcripts,
                config,
            )
        });
        self.triage("pileup", errors, workload, tolerate, &mut failed)?;

        // (treatment, control) per contig
        let mut coverage: Vec<(Option<Coverage<Cnts>>, Option<Coverage<Cnts>>)> =
            (0..contigs.len()).map(|_| (None, None)).collect();
        for task in pileups {
            if failed.contains(&task.contig) {
                continue;
            }
            let slot = &mut coverage[task.contig];
            match task.payload {
                Library::Treatment => slot.0 = task.result,
                Library::Control => slot.1 = task.result,
            }
        }

        // 2. Genome-wide normalization
        let (trtotal, cntotal) = coverage.iter().fold((0u64, 0u64), |(trt, cnt), x| {
            (
                trt + x.0.as_ref().map_or(0, |x| x.total),
                cnt + x.1.as_ref().map_or(0, |x| x.total),
            )
        });
        let normalization = self.normalization(config, workload, trtotal, cntotal)?;
        info!(
            "Fragments: {trtotal} treatment, {cntotal} control. Control baseline: {:?}, \
            scaling factors: {:?} (treatment), {:?} (control)",
            normalization.baseline,
            normalization.treatment,
            normalization.control
        );

        // 3. Differential signal per contig and strand
        let mut comparisons = Vec::with_capacity(contigs.len() * 2);
        for (ind, cov) in coverage.iter_mut().enumerate() {
            let (trt, cnt) = match (cov.0.as_mut(), cov.1.as_mut()) {
                (Some(trt), Some(cnt)) => (trt, cnt),
                _ => continue,
            };

            for strand in Strand::BOTH {
                let contig = &contigs[ind].0;
                let missing = if *trt.fragments.get(strand) == 0 {
                    Some(Library::Treatment)
                } else if *cnt.fragments.get(strand) == 0 {
                    Some(Library::Control)
                } else {
                    None
                };
                if let Some(library) = missing {
                    warn!("No {library} fragments for {contig}{strand}, skipping it");
                    continue;
                }

                let payload = (
                    strand,
                    mem::take(trt.tracks.get_mut(strand)),
                    mem::take(cnt.tracks.get_mut(strand)),
                );
                comparisons.push(Task::new(ind, payload));
            }
        }
        drop(coverage);

        info!("Comparing treatment and control for {} strand(s)", comparisons.len());
        let errors = execute(pool, &mut comparisons, tolerate, |_, (_, trt, cnt)| {
            self.workers.get_or_default().borrow_mut().compare(
                mem::take(trt),
                mem::take(cnt),
                &normalization,
                config,
            )
        });
        self.triage("comparison", errors, workload, tolerate, &mut failed)?;

        let mut comparisons = comparisons
            .into_iter()
            .filter(|x| !failed.contains(&x.contig))
            .filter_map(|x| x.result.map(|result| (x.contig, x.payload.0, result)))
            .collect::<Vec<_>>();

        // 4. Q-values need all p-values at once
        let mut pvalues = QTableBuilder::new();
        for (_, _, cmp) in comparisons.iter_mut() {
            pvalues.extend(mem::take(&mut cmp.pvalues));
        }
        let qtable = pvalues.build()?;
        debug!("Q-value table with {} distinct p-values", qtable.len());

        // 5. Peak calling
        let mut harvest = comparisons
            .into_iter()
            .map(|(contig, strand, cmp)| Task::new(contig, (strand, cmp)))
            .collect::<Vec<_>>();
        let errors = execute(pool, &mut harvest, tolerate, |_, (_, cmp)| {
            cmp.enrichment.apply(&qtable)?;
            config.pcalling().run(&cmp.enrichment)
        });
        self.triage("peak calling", errors, workload, tolerate, &mut failed)?;

        let mut result = harvest
            .into_iter()
            .filter(|x| !failed.contains(&x.contig))
            .filter_map(|task| {
                let (contig, length) = contigs[task.contig].clone();
                let (strand, cmp): (Strand, Comparison<Cnts>) = task.payload;
                let peaks: Vec<Peak<Src::Idx, Cnts>> = task.result?;
                Some(Harvest::new(
                    contig,
                    strand,
                    length,
                    cmp.treatment,
                    cmp.control,
                    cmp.enrichment,
                    peaks,
                ))
            })
            .collect::<Vec<_>>();
        result.sort_by(|a, b| {
            a.contig()
                .cmp(b.contig())
                .then_with(|| a.strand().symbol().cmp(&b.strand().symbol()))
        });

        info!(
            "Called {} peak(s) over {} strand(s)",
            result.iter().map(|x| x.peaks().len()).sum::<usize>(),
            result.len()
        );
        Ok(result)
    }

    fn normalization(
        &self,
        config: &Config<Src::Idx, Cnts>,
        workload: &Workload<Src::Ctg, Src::Idx>,
        trtotal: u64,
        cntotal: u64,
    ) -> Result<Normalization<Cnts>> {
        let baseline = match config.baseline() {
            Some(baseline) => *baseline,
            None => {
                let geffsize = config.geffsize().unwrap_or_else(|| workload.genome_size());
                let (cntotal, geffsize) = (Cnts::from(cntotal), Cnts::from(geffsize));
                match (cntotal, geffsize) {
                    (Some(cnt), Some(size)) if size > Cnts::zero() => cnt / size,
                    _ => return Err(eyre!("Failed to derive the control baseline")),
                }
            }
        };
        let (treatment, control) = config.scaling().factors(trtotal, cntotal);

        Ok(Normalization {
            baseline,
            treatment,
            control,
        })
    }

    fn triage(
        &self,
        stage: &str,
        errors: Vec<(usize, Report)>,
        workload: &Workload<Src::Ctg, Src::Idx>,
        tolerate: bool,
        failed: &mut HashSet<usize>,
    ) -> Result<()> {
        if errors.is_empty() {
            return Ok(());
        }
        if !tolerate {
            let details = errors
                .iter()
                .map(|(ind, err)| format!("{}: {err:?}", workload.contigs()[*ind].0))
                .collect::<Vec<_>>()
                .join("\n");
            return Err(eyre!("Reaper {stage} failed. Errors:\n{details}"));
        }

        for (ind, err) in errors {
            warn!(
                "Reaper {stage} failed for {}, the contig is skipped: {err:?}",
                workload.contigs()[ind].0
            );
            failed.insert(ind);
        }
        Ok(())
    }
}
