//! A pure Rust reader and writer for Schrödinger Maestro (MAE) structure
//! files.
//!
//! MAE files store molecular structures as blocks of typed, independently
//! nullable property columns. Every property key carries its scalar kind
//! in a two-character prefix — `i_` integer, `r_` real, `s_` string,
//! `b_` boolean — and per-atom/per-bond values live in fixed-size indexed
//! blocks whose undefined rows are tracked by a null bitmap. This crate
//! marshals those blocks to and from [`Structure`], a generic record of
//! plain maps and nullable lists, with exact round-trip fidelity.
//!
//! # Quick Start
//!
//! ```
//! use mae_forge::{Column, Scalar, Structure};
//!
//! // Build a three-atom structure with one undefined charge.
//! let mut structure = Structure::new();
//! structure.title = Some("water".to_string());
//! structure
//!     .props
//!     .insert("i_m_ct_format".to_string(), Scalar::Int(2));
//!
//! let mut atoms = mae_forge::ColumnMap::new();
//! atoms.insert(
//!     "r_m_x_coord".to_string(),
//!     Column::Real(vec![Some(0.0), Some(0.757), Some(-0.757)]),
//! );
//! atoms.insert(
//!     "r_m_charge1".to_string(),
//!     Column::Real(vec![Some(-0.83), None, None]),
//! );
//! structure.atoms = Some(atoms);
//!
//! // Write and re-read through an in-memory buffer.
//! let mut buffer = Vec::new();
//! mae_forge::io::mae::write(&mut buffer, std::slice::from_ref(&structure))?;
//! let reread = mae_forge::io::mae::read(std::io::Cursor::new(buffer))?;
//!
//! assert_eq!(reread, vec![structure]);
//! # Ok::<(), mae_forge::Error>(())
//! ```
//!
//! # Module Organization
//!
//! - [`io::mae`] — The MAE format engine (tokenizer, writer, columnar
//!   block model) and the marshalling layer between blocks and records.
//! - [`read_file`] / [`write_file`] — Whole-file convenience API with
//!   transparent gzip handling for `.maegz` paths.
//!
//! # Data Types
//!
//! - [`Structure`] — One structure record: optional title, scalar
//!   properties, optional atom and bond tables.
//! - [`Column`] — A named per-row property as a homogeneous list with
//!   `None` marking undefined rows.
//! - [`Scalar`] — A single typed property value.
//! - [`PropertyKind`] — The four scalar kinds selected by key prefix.

mod model;

pub mod io;

pub use model::structure::{ColumnMap, PropertyMap, Structure};
pub use model::value::{Column, PropertyKind, Scalar};

pub use io::error::Error;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::io::{Compression, GZIP_COMPRESSION_LEVEL};

/// Reads every structure record from an MAE file, in file order.
///
/// Gzipped files are recognized by a `.maegz` or `.gz` extension. The
/// whole file is materialized before returning.
pub fn read_file(path: impl AsRef<Path>) -> Result<Vec<Structure>, Error> {
    let path = path.as_ref();
    log::debug!("reading structures from {}", path.display());
    let file = File::open(path)?;
    match Compression::from_path(path) {
        Compression::None => io::mae::read(BufReader::new(file)),
        Compression::Gzip => io::mae::read(BufReader::new(GzDecoder::new(file))),
    }
}

/// Writes the structure records to an MAE file, one block per record, in
/// input order.
///
/// The output is gzip-compressed when the path carries a `.maegz` or
/// `.gz` extension. A failure partway through leaves the file in an
/// undefined state; no cleanup is attempted.
pub fn write_file(structures: &[Structure], path: impl AsRef<Path>) -> Result<(), Error> {
    let path = path.as_ref();
    log::debug!("writing {} structures to {}", structures.len(), path.display());
    let file = File::create(path)?;
    match Compression::from_path(path) {
        Compression::None => io::mae::write(BufWriter::new(file), structures),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(BufWriter::new(file), GZIP_COMPRESSION_LEVEL);
            io::mae::write(&mut encoder, structures)?;
            encoder.try_finish()?;
            Ok(())
        }
    }
}
