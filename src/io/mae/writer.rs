use std::fmt;
use std::io::Write;

use super::block::{Block, IndexedBlock};
use super::UNDEFINED;
use crate::io::error::Error;

/// Streaming MAE writer. The format header is emitted on construction;
/// each [`write_block`](Writer::write_block) call appends one top-level
/// block, in call order.
pub struct Writer<W: Write> {
    inner: W,
}

impl<W: Write> Writer<W> {
    pub fn new(mut inner: W) -> Result<Writer<W>, Error> {
        writeln!(inner, "{{")?;
        writeln!(inner, "  s_m_m2io_version")?;
        writeln!(inner, "  :::")?;
        writeln!(inner, "  2.0.0")?;
        writeln!(inner, "}}")?;
        writeln!(inner)?;
        Ok(Writer { inner })
    }

    pub fn write_block(&mut self, block: &Block) -> Result<(), Error> {
        self.write_block_at(block, 0)?;
        writeln!(self.inner)?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), Error> {
        self.inner.flush()?;
        Ok(())
    }

    fn write_block_at(&mut self, block: &Block, depth: usize) -> Result<(), Error> {
        let indent = Indent(depth);
        let inner = Indent(depth + 1);

        writeln!(self.inner, "{indent}{} {{", block.name())?;

        for key in block.bool_properties().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        for key in block.int_properties().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        for key in block.real_properties().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        for key in block.string_properties().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        writeln!(self.inner, "{inner}:::")?;
        for value in block.bool_properties().values() {
            writeln!(self.inner, "{inner}{}", *value as u8)?;
        }
        for value in block.int_properties().values() {
            writeln!(self.inner, "{inner}{value}")?;
        }
        for value in block.real_properties().values() {
            writeln!(self.inner, "{inner}{value}")?;
        }
        for value in block.string_properties().values() {
            writeln!(self.inner, "{inner}{}", quote(value))?;
        }

        for sub in block.sub_blocks() {
            self.write_block_at(sub, depth + 1)?;
        }
        for indexed in block.indexed_blocks().values() {
            self.write_indexed_block(indexed, depth + 1)?;
        }

        writeln!(self.inner, "{indent}}}")?;
        Ok(())
    }

    fn write_indexed_block(&mut self, block: &IndexedBlock, depth: usize) -> Result<(), Error> {
        let indent = Indent(depth);
        let inner = Indent(depth + 1);

        writeln!(self.inner, "{indent}{}[{}] {{", block.name(), block.size())?;
        let label = block.name().strip_prefix("m_").unwrap_or(block.name());
        writeln!(self.inner, "{inner}# First column is {label} index #")?;

        for key in block.bool_columns().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        for key in block.int_columns().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        for key in block.real_columns().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        for key in block.string_columns().keys() {
            writeln!(self.inner, "{inner}{key}")?;
        }
        writeln!(self.inner, "{inner}:::")?;

        for row in 0..block.size() {
            write!(self.inner, "{inner}{}", row + 1)?;
            for column in block.bool_columns().values() {
                self.write_cell(column.get(row).map(|v| (*v as u8).to_string()))?;
            }
            for column in block.int_columns().values() {
                self.write_cell(column.get(row).map(i64::to_string))?;
            }
            for column in block.real_columns().values() {
                self.write_cell(column.get(row).map(f64::to_string))?;
            }
            for column in block.string_columns().values() {
                self.write_cell(column.get(row).map(|v| quote(v)))?;
            }
            writeln!(self.inner)?;
        }

        writeln!(self.inner, "{inner}:::")?;
        writeln!(self.inner, "{indent}}}")?;
        Ok(())
    }

    fn write_cell(&mut self, value: Option<String>) -> Result<(), Error> {
        match value {
            Some(text) => write!(self.inner, " {text}")?,
            None => write!(self.inner, " {UNDEFINED}")?,
        }
        Ok(())
    }
}

/// Quotes a string token when the bare form would not survive
/// tokenization.
fn quote(value: &str) -> String {
    if !needs_quoting(value) {
        return value.to_string();
    }
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if matches!(c, '"' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value == UNDEFINED
        || value == ":::"
        || value
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '"' | '\\' | '#' | '{' | '}'))
}

struct Indent(usize);

impl fmt::Display for Indent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.0 {
            f.write_str("  ")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::mae::block::IndexedProperty;
    use crate::io::mae::Reader;
    use bitvec::{bitvec, prelude::Lsb0};
    use std::io::Cursor;

    fn written(blocks: &[Block]) -> String {
        let mut out = Vec::new();
        let mut writer = Writer::new(&mut out).expect("header");
        for block in blocks {
            writer.write_block(block).expect("write block");
        }
        String::from_utf8(out).expect("utf-8 output")
    }

    fn sample_block() -> Block {
        let mut block = Block::new("f_m_ct");
        block.set_string_property("s_m_title", "alanine dipeptide");
        block.set_string_property("s_m_entry_name", "");
        block.set_int_property("i_m_ct_format", 2);
        block.set_real_property("r_m_energy", -10.25);
        block.set_bool_property("b_m_valid", true);

        let mut atoms = IndexedBlock::new("m_atom", 3);
        atoms.set_int_column(
            "i_m_mmod_type",
            IndexedProperty::new(vec![3, 0, 5], bitvec![0, 1, 0]),
        );
        atoms.set_real_column(
            "r_m_x_coord",
            IndexedProperty::from_values(vec![0.5, 1.25, -2.0]),
        );
        atoms.set_string_column(
            "s_m_label",
            IndexedProperty::new(
                vec!["CA".to_string(), "alpha beta".to_string(), String::new()],
                bitvec![0, 0, 1],
            ),
        );
        atoms.set_bool_column(
            "b_m_flag",
            IndexedProperty::new(vec![true, false, false], bitvec![0, 0, 1]),
        );
        block.set_indexed_block(atoms);

        let mut bonds = IndexedBlock::new("m_bond", 2);
        bonds.set_int_column("i_m_from", IndexedProperty::from_values(vec![1, 2]));
        bonds.set_int_column("i_m_to", IndexedProperty::from_values(vec![2, 3]));
        block.set_indexed_block(bonds);

        block
    }

    #[test]
    fn header_precedes_the_first_block() {
        let output = written(&[Block::new("f_m_ct")]);
        assert!(
            output.starts_with("{\n  s_m_m2io_version\n  :::\n  2.0.0\n}\n"),
            "output: {output}"
        );
    }

    #[test]
    fn written_blocks_read_back_identically() {
        let block = sample_block();
        let output = written(std::slice::from_ref(&block));

        let mut reader = Reader::new(Cursor::new(output));
        let parsed = reader.next_block().expect("parse").expect("block");
        assert_eq!(parsed, block);
        assert!(reader.next_block().expect("parse").is_none());
    }

    #[test]
    fn strings_are_quoted_only_when_needed() {
        assert_eq!(quote("CA"), "CA");
        assert_eq!(quote("alpha beta"), "\"alpha beta\"");
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("<>"), "\"<>\"");
        assert_eq!(quote(":::"), "\":::\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    }

    #[test]
    fn undefined_rows_are_written_as_the_null_token() {
        let output = written(&[sample_block()]);
        let row = output
            .lines()
            .find(|line| line.trim_start().starts_with("2 "))
            .expect("second atom row");
        assert!(row.contains("<>"), "row: {row}");
    }

    #[test]
    fn nested_plain_blocks_round_trip() {
        let mut block = Block::new("f_m_ct");
        let mut depend = Block::new("m_depend");
        depend.set_int_property("i_m_depend_dependency", 4);
        block.push_sub_block(depend);

        let output = written(std::slice::from_ref(&block));
        let mut reader = Reader::new(Cursor::new(output));
        let parsed = reader.next_block().expect("parse").expect("block");
        assert_eq!(parsed, block);
    }
}
