//! The MAE format engine and its marshalling layer.
//!
//! [`block`] holds the typed columnar storage model, [`reader`] and
//! [`writer`] move it to and from MAE text, and [`convert`] marshals
//! between blocks and the generic [`Structure`] record. The free
//! [`read`] and [`write`] functions drive the whole pipeline over any
//! buffered stream.

use std::io::{BufRead, Write as IoWrite};

pub mod block;
pub mod convert;
pub mod reader;
pub mod writer;

pub use reader::Reader;
pub use writer::Writer;

use crate::io::error::Error;
use crate::model::structure::Structure;

/// Name of a structure (connection table) block.
pub const CT_BLOCK: &str = "f_m_ct";
/// Reserved key holding a structure's title.
pub const CT_TITLE: &str = "s_m_title";
/// Name of the atom table inside a structure block.
pub const ATOM_BLOCK: &str = "m_atom";
/// Name of the bond table inside a structure block.
pub const BOND_BLOCK: &str = "m_bond";

/// Token marking an undefined value.
pub(crate) const UNDEFINED: &str = "<>";

/// Reads every structure record from MAE-formatted input, in file order.
pub fn read<R: BufRead>(reader: R) -> Result<Vec<Structure>, Error> {
    let mut blocks = Reader::new(reader);
    let mut structures = Vec::new();
    while let Some(block) = blocks.next_block()? {
        structures.push(convert::structure_from_block(&block)?);
    }
    log::debug!("read {} structure records", structures.len());
    Ok(structures)
}

/// Writes the structure records as an MAE document, one block per record,
/// preserving input order.
pub fn write<W: IoWrite>(writer: W, structures: &[Structure]) -> Result<(), Error> {
    let mut blocks = Writer::new(writer)?;
    for structure in structures {
        blocks.write_block(&convert::block_from_structure(structure)?)?;
    }
    blocks.flush()?;
    log::debug!("wrote {} structure records", structures.len());
    Ok(())
}
