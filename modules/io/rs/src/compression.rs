use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use eyre::{ensure, Result, WrapErr};
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

pub enum DecompressedStream {
    PlainText(File),
    Gzip(MultiGzDecoder<File>),
}

impl DecompressedStream {
    pub fn box_read(self) -> Box<dyn Read + Send + Sync + 'static> {
        match self {
            DecompressedStream::PlainText(file) => Box::new(file),
            DecompressedStream::Gzip(decoder) => Box::new(decoder),
        }
    }

    pub fn box_bufread(self) -> Box<dyn BufRead + Send + Sync + 'static> {
        match self {
            DecompressedStream::PlainText(file) => Box::new(BufReader::new(file)),
            DecompressedStream::Gzip(decoder) => Box::new(BufReader::new(decoder)),
        }
    }
}

/// Open a file for reading, transparently decompressing gzip streams. The compression is
/// detected from the file signature, not from the extension.
pub fn read_file(path: impl AsRef<Path>) -> Result<DecompressedStream> {
    let path = path.as_ref();
    ensure!(path.exists(), "File {} does not exist", path.display());

    let open = || File::open(path).wrap_err_with(|| format!("Failed to open {}", path.display()));
    let kind = match infer::get_from_path(path)? {
        Some(kind) => kind,
        None => return Ok(DecompressedStream::PlainText(open()?)),
    };

    let stream = match (kind.extension(), kind.mime_type()) {
        ("gz", "application/gzip") => DecompressedStream::Gzip(MultiGzDecoder::new(open()?)),
        // Always assume plain text if there is no clear match
        _ => DecompressedStream::PlainText(open()?),
    };
    Ok(stream)
}

/// Output compression for written files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    PlainText,
    Gzip,
}

impl Encoding {
    /// Gzip for paths ending with `.gz`, plain text otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        match path.as_ref().extension().and_then(|x| x.to_str()) {
            Some("gz") => Encoding::Gzip,
            _ => Encoding::PlainText,
        }
    }
}

/// Create (or truncate) a file for writing with the requested compression.
pub fn write_file(
    path: impl AsRef<Path>,
    encoding: Encoding,
) -> Result<Box<dyn Write + Send + Sync + 'static>> {
    let path = path.as_ref();
    let file = File::create(path)
        .wrap_err_with(|| format!("Failed to create {}", path.display()))?;

    let stream: Box<dyn Write + Send + Sync> = match encoding {
        Encoding::PlainText => Box::new(BufWriter::new(file)),
        Encoding::Gzip => Box::new(GzEncoder::new(BufWriter::new(file), Compression::default())),
    };
    Ok(stream)
}
