use std::path::Path;

use clap::Parser;
use eyre::{ensure, Result, WrapErr};
use log::info;

use biobit_io_rs::bam::{Reader, ReaderBuilder};
use biobit_reaper_rs::pcalling::ByCutoff;
use biobit_reaper_rs::{Config, Reaper, Scaling, Workload};

use args::{Cli, ReadsArgs};

mod args;
mod export;
mod transcripts;

#[cfg(feature = "dhat-heap")]
#[global_allocator]
static ALLOC: dhat::Alloc = dhat::Alloc;

fn open(path: &Path, reads: &ReadsArgs) -> Result<Reader> {
    ReaderBuilder::new(path)
        .with_inflags(reads.inflags)
        .with_exflags(reads.exflags)
        .with_minmapq(reads.minmapq)
        .with_layout(reads.layout())
        .build()
        .wrap_err_with(|| format!("Failed to open {}", path.display()))
}

fn config(cli: &Cli) -> Result<Config<usize, f32>> {
    let (pileup, callpeaks) = (&cli.pileup, &cli.callpeaks);

    let mut pcalling = ByCutoff::new();
    pcalling
        .set_qvcutoff((!callpeaks.no_qvcutoff).then_some(callpeaks.qvcutoff))?
        .set_pvcutoff(callpeaks.pvcutoff)?
        .set_fecutoff(Some(callpeaks.fecutoff))?
        .set_min_length(callpeaks.minsize)
        .set_merge_within(callpeaks.maxgap);

    let scaling = if pileup.scale_libsize {
        Scaling::LibrarySize
    } else {
        Scaling::Fixed {
            treatment: pileup.trtscale,
            control: pileup.cntscale,
        }
    };

    let mut config = Config::new();
    config
        .set_trtext(pileup.trtext)
        .set_cntext(pileup.cntext.clone())?
        .set_trext(pileup.trext.clone())?
        .set_trbaseline(pileup.trbaseline)?
        .set_baseline(pileup.baseline)?
        .set_mintrtfrag(pileup.mintrtfrag)?
        .set_sensitivity(pileup.sensitivity)?
        .set_scaling(scaling)?
        .set_geffsize(pileup.geffsize)?
        .set_pcalling(pcalling)
        .set_tolerate_failures(cli.tolerate_failures)
        .set_threads(cli.threads);
    Ok(config)
}

fn workload(cli: &Cli, reader: &Reader) -> Result<Workload<String, usize>> {
    let mut contigs = reader.contigs();
    if !cli.contigs.is_empty() {
        for contig in &cli.contigs {
            ensure!(
                contigs.iter().any(|(name, _)| name == contig),
                "Contig {contig} is missing in {}",
                reader.filename().display()
            );
        }
        contigs.retain(|(name, _)| cli.contigs.contains(name));
    }

    let mut workload = Workload::new();
    workload.add_contigs(contigs)?;

    if let Some(path) = &cli.transcripts {
        for (contig, strands, transcript) in transcripts::read(path)? {
            for strand in strands {
                workload.add_transcript(contig.clone(), strand, transcript.clone());
            }
        }
    }
    Ok(workload)
}

fn run(cli: Cli) -> Result<()> {
    let treatment = cli
        .treatment
        .iter()
        .map(|x| open(x, &cli.reads))
        .collect::<Result<Vec<_>>>()?;
    let control = cli
        .control
        .iter()
        .map(|x| open(x, &cli.reads))
        .collect::<Result<Vec<_>>>()?;

    let workload = workload(&cli, &treatment[0])?;
    info!(
        "Calling peaks over {} contig(s): {} treatment and {} control file(s)",
        workload.contigs().len(),
        treatment.len(),
        control.len()
    );

    let mut reaper = Reaper::new(config(&cli)?, workload);
    reaper.add_treatments(treatment).add_controls(control);
    let results = reaper.run()?;

    std::fs::create_dir_all(&cli.outdir)
        .wrap_err_with(|| format!("Failed to create {}", cli.outdir.display()))?;
    export::tracks(&cli.outdir, &results)?;
    let path = cli.outdir.join("peaks.narrowPeak");
    let saved = export::peaks(&path, &results)?;
    info!("Saved {saved} peak(s) to {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    #[cfg(feature = "dhat-heap")]
    let _profiler = dhat::Profiler::new_heap();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    run(Cli::parse())
}
