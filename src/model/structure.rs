use std::collections::BTreeMap;

use super::value::{Column, Scalar};

/// Top-level scalar properties of a structure, keyed by tagged property
/// name.
pub type PropertyMap = BTreeMap<String, Scalar>;

/// Named per-row properties of the atom or bond table.
pub type ColumnMap = BTreeMap<String, Column>;

/// One molecular structure record: the externally visible form of a
/// `f_m_ct` block.
///
/// `atoms` and `bonds` are `None` when the corresponding table is absent
/// from the file; an absent table is distinct from a present-but-empty
/// one and is preserved across a read/write round trip.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Structure {
    pub title: Option<String>,
    pub props: PropertyMap,
    pub atoms: Option<ColumnMap>,
    pub bonds: Option<ColumnMap>,
}

impl Structure {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows in the atom table, if one is present with at least
    /// one column.
    pub fn atom_count(&self) -> Option<usize> {
        table_rows(self.atoms.as_ref())
    }

    /// Number of rows in the bond table, if one is present with at least
    /// one column.
    pub fn bond_count(&self) -> Option<usize> {
        table_rows(self.bonds.as_ref())
    }

    #[inline]
    pub fn has_atoms(&self) -> bool {
        self.atoms.is_some()
    }

    #[inline]
    pub fn has_bonds(&self) -> bool {
        self.bonds.is_some()
    }
}

fn table_rows(table: Option<&ColumnMap>) -> Option<usize> {
    table.and_then(|columns| columns.values().next()).map(Column::len)
}
