//! Conversion between the columnar block model and the generic record
//! representation.
//!
//! Storage-side columns pair a value array with a null bitmap and a
//! placeholder at undefined rows; record-side columns are plain lists
//! with `None` at the same rows. The two representations meet only here,
//! so placeholders never leak past this module.

use std::collections::BTreeMap;

use bitvec::vec::BitVec;

use super::block::{Block, IndexedBlock, IndexedProperty};
use super::{ATOM_BLOCK, BOND_BLOCK, CT_BLOCK, CT_TITLE};
use crate::io::error::Error;
use crate::model::structure::{ColumnMap, Structure};
use crate::model::value::{Column, PropertyKind, Scalar};

/// Converts a decoded structure block into a generic record.
///
/// The reserved title property is surfaced only as the `title` field,
/// never under `props`. `atoms`/`bonds` stay `None` when the block has no
/// corresponding table.
pub fn structure_from_block(block: &Block) -> Result<Structure, Error> {
    let title = block.string_property(CT_TITLE).map(str::to_string);

    let mut props = BTreeMap::new();
    for (key, value) in block.bool_properties() {
        checked_key(key)?;
        props.insert(key.clone(), Scalar::Bool(*value));
    }
    for (key, value) in block.int_properties() {
        checked_key(key)?;
        props.insert(key.clone(), Scalar::Int(*value));
    }
    for (key, value) in block.real_properties() {
        checked_key(key)?;
        props.insert(key.clone(), Scalar::Real(*value));
    }
    for (key, value) in block.string_properties() {
        if key == CT_TITLE {
            continue;
        }
        checked_key(key)?;
        props.insert(key.clone(), Scalar::String(value.clone()));
    }

    let atoms = block
        .indexed_block(ATOM_BLOCK)
        .map(columns_from_indexed)
        .transpose()?;
    let bonds = block
        .indexed_block(BOND_BLOCK)
        .map(columns_from_indexed)
        .transpose()?;

    Ok(Structure {
        title,
        props,
        atoms,
        bonds,
    })
}

/// Converts a generic record into a structure block ready for writing.
pub fn block_from_structure(structure: &Structure) -> Result<Block, Error> {
    let mut block = Block::new(CT_BLOCK);

    if let Some(title) = &structure.title {
        block.set_string_property(CT_TITLE, title.clone());
    }

    for (key, value) in &structure.props {
        let expected = checked_key(key)?;
        match (expected, value) {
            (PropertyKind::Bool, Scalar::Bool(v)) => block.set_bool_property(key, *v),
            (PropertyKind::Int, Scalar::Int(v)) => block.set_int_property(key, *v),
            (PropertyKind::Real, Scalar::Real(v)) => block.set_real_property(key, *v),
            (PropertyKind::String, Scalar::String(v)) => block.set_string_property(key, v.clone()),
            (expected, value) => {
                return Err(Error::PropertyTypeMismatch {
                    key: key.clone(),
                    expected,
                    found: value.kind(),
                });
            }
        }
    }

    if let Some(atoms) = &structure.atoms {
        block.set_indexed_block(indexed_from_columns(ATOM_BLOCK, atoms)?);
    }
    if let Some(bonds) = &structure.bonds {
        block.set_indexed_block(indexed_from_columns(BOND_BLOCK, bonds)?);
    }

    Ok(block)
}

fn columns_from_indexed(table: &IndexedBlock) -> Result<ColumnMap, Error> {
    let rows = table.size();
    let mut columns = BTreeMap::new();
    for (key, property) in table.bool_columns() {
        checked_key(key)?;
        columns.insert(key.clone(), Column::Bool(decode_column(property, rows, key)?));
    }
    for (key, property) in table.int_columns() {
        checked_key(key)?;
        columns.insert(key.clone(), Column::Int(decode_column(property, rows, key)?));
    }
    for (key, property) in table.real_columns() {
        checked_key(key)?;
        columns.insert(key.clone(), Column::Real(decode_column(property, rows, key)?));
    }
    for (key, property) in table.string_columns() {
        checked_key(key)?;
        columns.insert(key.clone(), Column::String(decode_column(property, rows, key)?));
    }
    Ok(columns)
}

/// Builds an indexed block from record-side columns. The row count comes
/// from the first column of the map; every other column must agree with
/// it.
fn indexed_from_columns(name: &'static str, columns: &ColumnMap) -> Result<IndexedBlock, Error> {
    let Some(first) = columns.values().next() else {
        return Err(Error::EmptyIndexedBlock(name));
    };
    let rows = first.len();
    for (key, column) in columns {
        if column.len() != rows {
            return Err(Error::InconsistentColumnLength {
                key: key.clone(),
                expected: rows,
                found: column.len(),
            });
        }
    }

    let mut table = IndexedBlock::new(name, rows);
    for (key, column) in columns {
        let expected = checked_key(key)?;
        match (expected, column) {
            (PropertyKind::Bool, Column::Bool(values)) => {
                table.set_bool_column(key, encode_column(values));
            }
            (PropertyKind::Int, Column::Int(values)) => {
                table.set_int_column(key, encode_column(values));
            }
            (PropertyKind::Real, Column::Real(values)) => {
                table.set_real_column(key, encode_column(values));
            }
            (PropertyKind::String, Column::String(values)) => {
                table.set_string_column(key, encode_column(values));
            }
            (expected, column) => {
                return Err(Error::PropertyTypeMismatch {
                    key: key.clone(),
                    expected,
                    found: column.kind(),
                });
            }
        }
    }
    Ok(table)
}

/// Column decode: storage bitmap plus placeholder to list with `None`,
/// in row order.
fn decode_column<T: Clone>(
    property: &IndexedProperty<T>,
    rows: usize,
    key: &str,
) -> Result<Vec<Option<T>>, Error> {
    if property.len() != rows {
        return Err(Error::InconsistentColumnLength {
            key: key.to_string(),
            expected: rows,
            found: property.len(),
        });
    }
    Ok(property.iter().map(|value| value.cloned()).collect())
}

/// Column encode: list with `None` to storage column, with the null bit
/// set exactly at `None` positions and a placeholder stored there.
fn encode_column<T: Clone + Default>(values: &[Option<T>]) -> IndexedProperty<T> {
    let mut stored = Vec::with_capacity(values.len());
    let mut missing = BitVec::repeat(false, values.len());
    for (row, value) in values.iter().enumerate() {
        match value {
            Some(value) => stored.push(value.clone()),
            None => {
                stored.push(T::default());
                missing.set(row, true);
            }
        }
    }
    IndexedProperty::new(stored, missing)
}

fn checked_key(key: &str) -> Result<PropertyKind, Error> {
    PropertyKind::from_key(key).ok_or_else(|| Error::UnsupportedPropertyType(key.to_string()))
}
