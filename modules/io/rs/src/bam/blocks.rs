use std::io;

use eyre::{eyre, Result};
use noodles::bam;
use noodles::sam::alignment::record::cigar::op::Kind;
use noodles::sam::alignment::record::cigar::Op;

use biobit_core_rs::loc::Interval;

/// Append aligned blocks described by the CIGAR string, starting at the 0-based `start`.
pub fn parse_cigar(
    mut start: usize,
    cigar: impl Iterator<Item = io::Result<Op>>,
    saveto: &mut Vec<Interval<usize>>,
) -> Result<()> {
    for op in cigar {
        let op = op?;
        let len = op.len();

        match op.kind() {
            Kind::Match | Kind::SequenceMatch | Kind::SequenceMismatch => {
                saveto.push(Interval::new(start, start + len)?);
                start += len;
            }
            // Don't produce aligned blocks, but consume the reference
            Kind::Deletion | Kind::Skip => {
                start += len;
            }
            Kind::Insertion | Kind::SoftClip | Kind::HardClip | Kind::Pad => {}
        }
    }
    Ok(())
}

/// Append aligned blocks of a mapped BAM record.
pub fn parse_record(record: &bam::Record, saveto: &mut Vec<Interval<usize>>) -> Result<()> {
    let start = record
        .alignment_start()
        .transpose()?
        .ok_or_else(|| eyre!("Alignment start must be present for mapped records"))?;
    // Positions are 1-based
    parse_cigar(start.get() - 1, record.cigar().iter(), saveto)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cigar() -> Result<()> {
        let cigar = [
            Op::new(Kind::SoftClip, 5),
            Op::new(Kind::Match, 10),
            Op::new(Kind::Insertion, 3),
            Op::new(Kind::SequenceMatch, 2),
            Op::new(Kind::Skip, 100),
            Op::new(Kind::SequenceMismatch, 5),
            Op::new(Kind::Deletion, 2),
            Op::new(Kind::Match, 1),
            Op::new(Kind::HardClip, 10),
        ];

        let mut blocks = vec![Interval::new(0, 1)?];
        parse_cigar(50, cigar.into_iter().map(Ok), &mut blocks)?;
        assert_eq!(blocks, [0..1, 50..60, 60..62, 162..167, 169..170]);
        Ok(())
    }
}
