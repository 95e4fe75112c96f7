use std::collections::BTreeMap;

use bitvec::vec::BitVec;

/// One fixed-length, nullable column of an indexed block.
///
/// Rows flagged in the null bitmap keep a type-appropriate placeholder in
/// the value array; the placeholder is an artifact of the storage layout
/// and is never surfaced by [`get`](IndexedProperty::get).
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedProperty<T> {
    values: Vec<T>,
    missing: BitVec,
}

impl<T> IndexedProperty<T> {
    /// Builds a column from its value array and null bitmap. Both sides
    /// must have the same length.
    pub fn new(values: Vec<T>, missing: BitVec) -> IndexedProperty<T> {
        assert_eq!(values.len(), missing.len(), "null bitmap length mismatch");
        IndexedProperty { values, missing }
    }

    /// Builds a column with every row defined.
    pub fn from_values(values: Vec<T>) -> IndexedProperty<T> {
        let missing = BitVec::repeat(false, values.len());
        IndexedProperty { values, missing }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the value at `row` is defined. Out-of-range rows are
    /// undefined.
    pub fn is_defined(&self, row: usize) -> bool {
        row < self.len() && !self.missing[row]
    }

    /// The value at `row`, or `None` when the row is undefined or out of
    /// range.
    pub fn get(&self, row: usize) -> Option<&T> {
        if self.is_defined(row) {
            self.values.get(row)
        } else {
            None
        }
    }

    /// Row values in order, undefined rows as `None`.
    pub fn iter(&self) -> impl Iterator<Item = Option<&T>> {
        (0..self.len()).map(|row| self.get(row))
    }
}

/// An ordered collection of named columns sharing one row count: the
/// `m_atom` or `m_bond` table of a structure block.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedBlock {
    name: String,
    rows: usize,
    bool_columns: BTreeMap<String, IndexedProperty<bool>>,
    int_columns: BTreeMap<String, IndexedProperty<i64>>,
    real_columns: BTreeMap<String, IndexedProperty<f64>>,
    string_columns: BTreeMap<String, IndexedProperty<String>>,
}

impl IndexedBlock {
    pub fn new(name: impl Into<String>, rows: usize) -> IndexedBlock {
        IndexedBlock {
            name: name.into(),
            rows,
            bool_columns: BTreeMap::new(),
            int_columns: BTreeMap::new(),
            real_columns: BTreeMap::new(),
            string_columns: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Row count shared by every column of this block.
    pub fn size(&self) -> usize {
        self.rows
    }

    pub fn bool_columns(&self) -> &BTreeMap<String, IndexedProperty<bool>> {
        &self.bool_columns
    }

    pub fn int_columns(&self) -> &BTreeMap<String, IndexedProperty<i64>> {
        &self.int_columns
    }

    pub fn real_columns(&self) -> &BTreeMap<String, IndexedProperty<f64>> {
        &self.real_columns
    }

    pub fn string_columns(&self) -> &BTreeMap<String, IndexedProperty<String>> {
        &self.string_columns
    }

    pub fn set_bool_column(&mut self, key: impl Into<String>, column: IndexedProperty<bool>) {
        assert_eq!(column.len(), self.rows, "column length mismatch");
        self.bool_columns.insert(key.into(), column);
    }

    pub fn set_int_column(&mut self, key: impl Into<String>, column: IndexedProperty<i64>) {
        assert_eq!(column.len(), self.rows, "column length mismatch");
        self.int_columns.insert(key.into(), column);
    }

    pub fn set_real_column(&mut self, key: impl Into<String>, column: IndexedProperty<f64>) {
        assert_eq!(column.len(), self.rows, "column length mismatch");
        self.real_columns.insert(key.into(), column);
    }

    pub fn set_string_column(&mut self, key: impl Into<String>, column: IndexedProperty<String>) {
        assert_eq!(column.len(), self.rows, "column length mismatch");
        self.string_columns.insert(key.into(), column);
    }

    /// Number of columns across all four kinds.
    pub fn column_count(&self) -> usize {
        self.bool_columns.len()
            + self.int_columns.len()
            + self.real_columns.len()
            + self.string_columns.len()
    }
}

/// A top-level MAE block: per-kind scalar properties, named indexed
/// blocks, and any nested plain blocks carried through verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    name: String,
    bool_props: BTreeMap<String, bool>,
    int_props: BTreeMap<String, i64>,
    real_props: BTreeMap<String, f64>,
    string_props: BTreeMap<String, String>,
    indexed_blocks: BTreeMap<String, IndexedBlock>,
    sub_blocks: Vec<Block>,
}

impl Block {
    pub fn new(name: impl Into<String>) -> Block {
        Block {
            name: name.into(),
            bool_props: BTreeMap::new(),
            int_props: BTreeMap::new(),
            real_props: BTreeMap::new(),
            string_props: BTreeMap::new(),
            indexed_blocks: BTreeMap::new(),
            sub_blocks: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn bool_property(&self, key: &str) -> Option<bool> {
        self.bool_props.get(key).copied()
    }

    pub fn int_property(&self, key: &str) -> Option<i64> {
        self.int_props.get(key).copied()
    }

    pub fn real_property(&self, key: &str) -> Option<f64> {
        self.real_props.get(key).copied()
    }

    pub fn string_property(&self, key: &str) -> Option<&str> {
        self.string_props.get(key).map(String::as_str)
    }

    pub fn set_bool_property(&mut self, key: impl Into<String>, value: bool) {
        self.bool_props.insert(key.into(), value);
    }

    pub fn set_int_property(&mut self, key: impl Into<String>, value: i64) {
        self.int_props.insert(key.into(), value);
    }

    pub fn set_real_property(&mut self, key: impl Into<String>, value: f64) {
        self.real_props.insert(key.into(), value);
    }

    pub fn set_string_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.string_props.insert(key.into(), value.into());
    }

    pub fn bool_properties(&self) -> &BTreeMap<String, bool> {
        &self.bool_props
    }

    pub fn int_properties(&self) -> &BTreeMap<String, i64> {
        &self.int_props
    }

    pub fn real_properties(&self) -> &BTreeMap<String, f64> {
        &self.real_props
    }

    pub fn string_properties(&self) -> &BTreeMap<String, String> {
        &self.string_props
    }

    pub fn indexed_block(&self, name: &str) -> Option<&IndexedBlock> {
        self.indexed_blocks.get(name)
    }

    /// Stores an indexed block under its own name, replacing any previous
    /// block with that name.
    pub fn set_indexed_block(&mut self, block: IndexedBlock) {
        self.indexed_blocks.insert(block.name.clone(), block);
    }

    pub fn indexed_blocks(&self) -> &BTreeMap<String, IndexedBlock> {
        &self.indexed_blocks
    }

    pub fn sub_blocks(&self) -> &[Block] {
        &self.sub_blocks
    }

    pub fn push_sub_block(&mut self, block: Block) {
        self.sub_blocks.push(block);
    }
}
