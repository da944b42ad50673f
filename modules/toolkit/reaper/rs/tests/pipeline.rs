use eyre::{bail, Result};

use biobit_core_rs::loc::{Interval, Orientation, Strand};
use biobit_core_rs::ngs::AlignedBlocks;
use biobit_core_rs::source::{InMemory, Source, SourceStats};
use biobit_reaper_rs::{Config, Reaper, Workload};

type BoxedSource = Box<dyn Source<Ctg = String, Idx = u64>>;

#[derive(Clone)]
struct Corrupted;

impl Source for Corrupted {
    type Ctg = String;
    type Idx = u64;

    fn fetch(
        &mut self,
        contig: &String,
        _interval: Interval<u64>,
        _into: &mut AlignedBlocks<u64>,
    ) -> Result<()> {
        if contig == "bad" {
            bail!("Corrupted block")
        }
        Ok(())
    }

    fn stats(&self) -> SourceStats {
        SourceStats::default()
    }
}

fn treatment(orientation: Orientation) -> Result<BoxedSource> {
    let fragments = (0..10)
        .map(|_| Ok(("chr1".to_string(), orientation, vec![Interval::new(200, 250)?])))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(InMemory::new(fragments)?))
}

fn control(orientation: Orientation) -> Result<BoxedSource> {
    let fragments = (0..20)
        .map(|i| Ok(("chr1".to_string(), orientation, vec![Interval::new(i * 50, (i + 1) * 50)?])))
        .collect::<Result<Vec<_>>>()?;
    Ok(Box::new(InMemory::new(fragments)?))
}

fn workload(contigs: &[(&str, u64)]) -> Result<Workload<String, u64>> {
    let mut workload = Workload::new();
    workload.add_contigs(contigs.iter().map(|(c, l)| (c.to_string(), *l)))?;
    Ok(workload)
}

#[test]
fn test_single_peak() -> Result<()> {
    let mut config = Config::<u64, f32>::new();
    config.set_threads(2);

    let mut reaper = Reaper::new(config, workload(&[("chr1", 1000), ("chr2", 500)])?);
    reaper
        .add_treatment(treatment(Orientation::Forward)?)
        .add_control(control(Orientation::Forward)?);
    let harvest = reaper.run()?;

    // Reverse strand and chr2 have no fragments at all
    assert_eq!(harvest.len(), 1);
    let harvest = &harvest[0];
    assert_eq!(harvest.contig(), "chr1");
    assert_eq!(*harvest.strand(), Strand::Forward);
    assert_eq!(*harvest.length(), 1000);
    assert_eq!(harvest.treatment().total_length(), 1000);
    assert_eq!(harvest.control().total_length(), 1000);

    let peaks = harvest.peaks();
    assert_eq!(peaks.len(), 1);
    let peak = &peaks[0];
    assert_eq!(peak.interval(), &(200, 250));
    assert_eq!(peak.summits(), &[225]);
    assert!((peak.fe() - 10.0).abs() < 1e-4);
    assert!((peak.pvalue() - 6.953).abs() < 1e-2);
    assert!((peak.qvalue() - (peak.pvalue() - 50f32.log10())).abs() < 1e-3);
    Ok(())
}

#[test]
fn test_dual_fragments_on_both_strands() -> Result<()> {
    let mut reaper = Reaper::new(Config::<u64, f32>::new(), workload(&[("chr1", 1000)])?);
    reaper
        .add_treatments([treatment(Orientation::Dual)?])
        .add_controls([control(Orientation::Dual)?]);
    let harvest = reaper.run()?;

    let strands = harvest.iter().map(|x| *x.strand()).collect::<Vec<_>>();
    assert_eq!(strands, vec![Strand::Forward, Strand::Reverse]);
    for h in &harvest {
        assert_eq!(h.peaks().len(), 1);
        assert_eq!(h.peaks()[0].interval(), &(200, 250));
    }
    Ok(())
}

#[test]
fn test_tolerate_failures() -> Result<()> {
    let contigs = [("bad", 1000), ("chr1", 1000)];
    let build = |tolerate: bool| -> Result<Reaper<BoxedSource, f32>> {
        let mut config = Config::<u64, f32>::new();
        config.set_tolerate_failures(tolerate);

        let mut reaper = Reaper::new(config, workload(&contigs)?);
        reaper
            .add_treatment(treatment(Orientation::Forward)?)
            .add_treatment(Box::new(Corrupted))
            .add_control(control(Orientation::Forward)?);
        Ok(reaper)
    };

    assert!(build(false)?.run().is_err());

    let harvest = build(true)?.run()?;
    assert_eq!(harvest.len(), 1);
    assert_eq!(harvest[0].contig(), "chr1");
    assert_eq!(harvest[0].peaks().len(), 1);
    Ok(())
}

#[test]
fn test_requires_sources() -> Result<()> {
    let mut reaper: Reaper<BoxedSource, f32> =
        Reaper::new(Config::new(), workload(&[("chr1", 1000)])?);
    assert!(reaper.run().is_err());

    reaper.add_treatment(treatment(Orientation::Forward)?);
    assert!(reaper.run().is_err());
    Ok(())
}
