use std::io::BufRead;
use std::path::Path;

use eyre::{ensure, Result, WrapErr};

use biobit_core_rs::loc::{Interval, Orientation, Strand};
use biobit_io_rs::compression;
use biobit_reaper_rs::coordmap::Transcript;

/// A transcript model on one or both strands of a contig.
pub type Model = (String, Vec<Strand>, Transcript<usize>);

fn parse_list(field: &str) -> Result<Vec<usize>> {
    field
        .split(',')
        .filter(|x| !x.is_empty())
        .map(|x| x.parse::<usize>().wrap_err_with(|| format!("Invalid number: {x}")))
        .collect()
}

/// Parse a single BED12 line. Unstranded models are placed on both strands.
pub fn parse(line: &str) -> Result<Model> {
    let fields = line.split('\t').collect::<Vec<_>>();
    ensure!(
        fields.len() >= 12,
        "BED12 record must have at least 12 fields, got {}",
        fields.len()
    );

    let contig = fields[0].to_string();
    let start = fields[1].parse::<usize>()?;
    let orientation = Orientation::try_from(fields[5])?;
    let strands = match orientation {
        Orientation::Dual => Strand::BOTH.to_vec(),
        _ => vec![Strand::try_from(orientation)?],
    };

    let count = fields[9].parse::<usize>()?;
    let sizes = parse_list(fields[10])?;
    let starts = parse_list(fields[11])?;
    ensure!(
        sizes.len() == count && starts.len() == count,
        "BED12 block count doesn't match block sizes/starts: {count}"
    );

    let exons = sizes
        .into_iter()
        .zip(starts)
        .map(|(size, offset)| Interval::new(start + offset, start + offset + size))
        .collect::<Result<Vec<_>>>()?;
    Ok((contig, strands, Transcript::new(exons)?))
}

/// Read transcript models from a plain or gzip-compressed BED12 file.
pub fn read(path: impl AsRef<Path>) -> Result<Vec<Model>> {
    let path = path.as_ref();
    let reader = compression::read_file(path)?.box_bufread();

    let mut models = Vec::new();
    for (ind, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty()
            || line.starts_with('#')
            || line.starts_with("track")
            || line.starts_with("browser")
        {
            continue;
        }
        let model = parse(&line).wrap_err_with(|| {
            format!("Failed to parse line {} of {}", ind + 1, path.display())
        })?;
        models.push(model);
    }
    log::info!("Loaded {} transcript models from {}", models.len(), path.display());
    Ok(models)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use biobit_core_rs::loc::IntervalOp;

    use super::*;

    #[test]
    fn test_parse() -> Result<()> {
        let (contig, strands, transcript) =
            parse("chr1\t100\t200\ttx1\t0\t-\t100\t200\t0\t2\t10,20,\t0,80,")?;
        assert_eq!(contig, "chr1");
        assert_eq!(strands, vec![Strand::Reverse]);
        assert_eq!(transcript.exons(), &[(100, 110), (180, 200)]);
        assert_eq!(*transcript.length(), 30);

        let (_, strands, _) = parse("chr1\t0\t10\ttx2\t0\t.\t0\t10\t0\t1\t10\t0")?;
        assert_eq!(strands, vec![Strand::Forward, Strand::Reverse]);

        assert!(parse("chr1\t0\t10\ttx3\t0\t+").is_err());
        assert!(parse("chr1\t0\t10\ttx4\t0\t+\t0\t10\t0\t2\t10\t0").is_err());
        Ok(())
    }

    #[test]
    fn test_read() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "# comment")?;
        writeln!(file, "chr1\t10\t30\ttx1\t0\t+\t10\t30\t0\t2\t5,5\t0,15")?;
        writeln!(file, "chr2\t0\t5\ttx2\t0\t-\t0\t5\t0\t1\t5\t0")?;
        file.flush()?;

        let models = read(file.path())?;
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].2.envelope(), (10, 30));
        assert_eq!(models[1].0, "chr2");
        assert!(models[1].2.envelope().len() == 5);
        Ok(())
    }
}
