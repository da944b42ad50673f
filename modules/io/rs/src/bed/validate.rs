use eyre::{ensure, Result};

const MAX_TEXT_LENGTH: usize = 255;

fn text(field: &str, value: &str, allowed: impl Fn(char) -> bool) -> Result<()> {
    ensure!(
        !value.is_empty() && value.len() <= MAX_TEXT_LENGTH,
        "BED {field} must hold 1 to {MAX_TEXT_LENGTH} characters, got {value:?}"
    );
    ensure!(
        value.chars().all(allowed),
        "BED {field} contains forbidden characters: {value:?}"
    );
    Ok(())
}

/// Printable ASCII without whitespace.
pub fn seqid(value: &str) -> Result<()> {
    text("seqid", value, |c| c.is_ascii_graphic())
}

/// Printable ASCII, spaces included.
pub fn name(value: &str) -> Result<()> {
    text("name", value, |c| c.is_ascii_graphic() || c == ' ')
}

pub fn score(score: &u16) -> Result<()> {
    ensure!(*score <= 1000, "BED score must be within [0, 1000], got {score}");
    Ok(())
}

/// narrowPeak signal and -log10 p/q-values: finite and non-negative, -1 marks a missing value.
pub fn signal(value: &f64) -> Result<()> {
    ensure!(
        *value == -1.0 || (value.is_finite() && *value >= 0.0),
        "narrowPeak values must be finite and non-negative (or -1 if missing), got {value}"
    );
    Ok(())
}

/// Summit offset from the peak start, -1 if missing.
pub fn peak(length: u64, offset: &i64) -> Result<()> {
    let inside = u64::try_from(*offset).is_ok_and(|x| x < length.max(1));
    ensure!(
        *offset == -1 || inside,
        "narrowPeak summit offset must fall inside the peak (or be -1), got {offset}"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_fields() {
        assert!(seqid("chr1").is_ok());
        assert!(seqid("").is_err());
        assert!(seqid("chr 1").is_err());
        assert!(seqid("chr\t1").is_err());
        assert!(seqid(&"c".repeat(256)).is_err());

        assert!(name("peak 1").is_ok());
        assert!(name(&"n".repeat(255)).is_ok());
        assert!(name("peak\t1").is_err());
        assert!(name("пик").is_err());
    }

    #[test]
    fn test_numeric_fields() {
        assert!(score(&1000).is_ok());
        assert!(score(&1001).is_err());

        for value in [0.0, 3.5, -1.0] {
            assert!(signal(&value).is_ok(), "{value}");
        }
        for value in [-0.5, f64::NAN, f64::INFINITY] {
            assert!(signal(&value).is_err(), "{value}");
        }

        assert!(peak(10, &0).is_ok());
        assert!(peak(10, &9).is_ok());
        assert!(peak(10, &-1).is_ok());
        assert!(peak(10, &10).is_err());
        assert!(peak(10, &-2).is_err());
        // Empty peaks still accept a zero offset
        assert!(peak(0, &0).is_ok());
    }
}
