//! File I/O for Maestro structure files.

use std::ffi::OsStr;
use std::path::Path;

pub mod error;
pub mod mae;

/// Compression level for gzip output, cf. gzip(1):
///
/// > Regulate the speed of compression using the specified digit #,
/// > where -1 or --fast indicates the fastest compression method (less
/// > compression) and -9 or --best indicates the slowest compression
/// > method (best compression).  The default compression level is -6
/// > (that is, biased towards high compression at expense of speed).
pub(crate) const GZIP_COMPRESSION_LEVEL: flate2::Compression = flate2::Compression::new(6);

/// Stream compression applied to a structure file, inferred from its
/// extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
}

impl Compression {
    /// Maestro names gzipped files `.maegz`; a plain `.gz` suffix (as in
    /// `structures.mae.gz`) is accepted as well.
    pub fn from_path(path: &Path) -> Compression {
        match path.extension().and_then(OsStr::to_str) {
            Some(ext) if ext.eq_ignore_ascii_case("maegz") || ext.eq_ignore_ascii_case("gz") => {
                Compression::Gzip
            }
            _ => Compression::None,
        }
    }
}
