use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use eyre::{Result, WrapErr};
use noodles::{bam, bgzf, csi::BinningIndex, sam};

pub type Handle = bam::io::Reader<bgzf::io::Reader<File>>;

/// Open a BAM file without touching its index. The header is not consumed: queries seek directly
/// to the indexed chunks.
pub fn open(path: &Path) -> Result<Handle> {
    let file = File::open(path)
        .wrap_err_with(|| format!("Failed to open BAM file {}", path.display()))?;
    Ok(bam::io::Reader::new(file))
}

/// Open a BAM file along with its `.bai` index and parse the header.
pub fn open_indexed(
    path: &Path,
) -> Result<(Handle, sam::Header, Arc<dyn BinningIndex + Send + Sync>)> {
    let mut index = OsString::from(path);
    index.push(".bai");
    let index = bam::bai::fs::read(&index).wrap_err_with(|| {
        format!(
            "Failed to read BAM index {}",
            Path::new(&index).display()
        )
    })?;

    let mut handle = open(path)?;
    let header = handle
        .read_header()
        .wrap_err_with(|| format!("Failed to read the header of {}", path.display()))?;

    Ok((handle, header, Arc::new(index)))
}
