use std::collections::VecDeque;
use std::io::BufRead;

use bitvec::vec::BitVec;

use super::block::{Block, IndexedBlock, IndexedProperty};
use super::{CT_BLOCK, UNDEFINED};
use crate::io::error::Error;
use crate::model::value::PropertyKind;

/// Streaming MAE reader producing structure blocks in on-disk order.
///
/// The sequence is finite and not restartable; top-level blocks that are
/// not `f_m_ct` (such as the leading format header) are parsed and
/// skipped.
pub struct Reader<R: BufRead> {
    tokens: Tokenizer<R>,
}

impl<R: BufRead> Reader<R> {
    pub fn new(reader: R) -> Reader<R> {
        Reader {
            tokens: Tokenizer::new(reader),
        }
    }

    /// Returns the next structure block, or `None` once the input is
    /// exhausted.
    pub fn next_block(&mut self) -> Result<Option<Block>, Error> {
        loop {
            let Some(token) = self.tokens.next()? else {
                return Ok(None);
            };
            let block = match token {
                Token::Open => self.parse_block(String::new())?,
                Token::Value { text, quoted: false } => {
                    self.expect_open()?;
                    self.parse_block(text)?
                }
                _ => {
                    return Err(Error::parse(
                        self.tokens.line(),
                        "expected a block name or '{' at top level",
                    ));
                }
            };
            if block.name() == CT_BLOCK {
                log::trace!(
                    "parsed structure block (line {}), {} indexed blocks",
                    self.tokens.line(),
                    block.indexed_blocks().len()
                );
                return Ok(Some(block));
            }
            log::trace!("skipping top-level block '{}'", block.name());
        }
    }

    /// Parses a block body after its opening brace has been consumed.
    fn parse_block(&mut self, name: String) -> Result<Block, Error> {
        let mut block = Block::new(name);

        let keys = self.parse_key_list()?;
        for key in &keys {
            self.parse_scalar_value(&mut block, key)?;
        }

        loop {
            match self.next_required("'}' or a nested block")? {
                Token::Close => break,
                Token::Value { text, quoted: false } => {
                    match indexed_name(&text, self.tokens.line())? {
                        Some((sub_name, rows)) => {
                            self.expect_open()?;
                            block.set_indexed_block(self.parse_indexed_block(sub_name, rows)?);
                        }
                        None => {
                            self.expect_open()?;
                            block.push_sub_block(self.parse_block(text)?);
                        }
                    }
                }
                _ => {
                    return Err(Error::parse(
                        self.tokens.line(),
                        "expected a nested block name or '}'",
                    ));
                }
            }
        }

        Ok(block)
    }

    /// Reads property keys up to the `:::` separator.
    fn parse_key_list(&mut self) -> Result<Vec<String>, Error> {
        let mut keys = Vec::new();
        loop {
            match self.next_required("property keys")? {
                Token::Sep => return Ok(keys),
                Token::Value { text, quoted: false } => keys.push(text),
                _ => {
                    return Err(Error::parse(
                        self.tokens.line(),
                        "expected a property key or ':::'",
                    ));
                }
            }
        }
    }

    fn parse_scalar_value(&mut self, block: &mut Block, key: &str) -> Result<(), Error> {
        let token = self.next_required("a property value")?;
        let Token::Value { text, quoted } = token else {
            return Err(Error::parse(self.tokens.line(), "expected a property value"));
        };
        if !quoted && text == UNDEFINED {
            // Undefined scalar: the property stays unset.
            return Ok(());
        }

        let line = self.tokens.line();
        match PropertyKind::from_key(key) {
            Some(PropertyKind::Bool) => block.set_bool_property(key, parse_bool(&text, key, line)?),
            Some(PropertyKind::Int) => block.set_int_property(key, parse_int(&text, key, line)?),
            Some(PropertyKind::Real) => block.set_real_property(key, parse_real(&text, key, line)?),
            Some(PropertyKind::String) => block.set_string_property(key, text),
            None => return Err(Error::UnsupportedPropertyType(key.to_string())),
        }
        Ok(())
    }

    /// Parses an indexed block body after its opening brace. Each data
    /// row carries a leading 1-based row index ahead of the declared
    /// columns.
    fn parse_indexed_block(&mut self, name: String, rows: usize) -> Result<IndexedBlock, Error> {
        let keys = self.parse_key_list()?;
        let mut columns = Vec::with_capacity(keys.len());
        for key in &keys {
            let kind = PropertyKind::from_key(key)
                .ok_or_else(|| Error::UnsupportedPropertyType(key.clone()))?;
            columns.push(RawColumn::new(kind, rows));
        }

        for _ in 0..rows {
            let token = self.next_required("a row index")?;
            let index_ok = matches!(
                &token,
                Token::Value { text, quoted: false } if text.parse::<u64>().is_ok()
            );
            if !index_ok {
                return Err(Error::parse(self.tokens.line(), "expected a numeric row index"));
            }

            for (column, key) in columns.iter_mut().zip(&keys) {
                let token = self.next_required("a row value")?;
                let Token::Value { text, quoted } = token else {
                    return Err(Error::parse(self.tokens.line(), "expected a row value"));
                };
                column.push(&text, quoted, key, self.tokens.line())?;
            }
        }

        match self.next_required("'}' to close the indexed block")? {
            Token::Sep => self.expect_close()?,
            Token::Close => {}
            _ => {
                return Err(Error::parse(
                    self.tokens.line(),
                    "expected ':::' or '}' after the last row",
                ));
            }
        }

        let mut block = IndexedBlock::new(name, rows);
        for (column, key) in columns.into_iter().zip(keys) {
            column.install(key, &mut block);
        }
        Ok(block)
    }

    fn next_required(&mut self, expected: &str) -> Result<Token, Error> {
        self.tokens.next()?.ok_or_else(|| {
            Error::parse(
                self.tokens.line(),
                format!("unexpected end of input, expected {expected}"),
            )
        })
    }

    fn expect_open(&mut self) -> Result<(), Error> {
        match self.next_required("'{'")? {
            Token::Open => Ok(()),
            _ => Err(Error::parse(self.tokens.line(), "expected '{'")),
        }
    }

    fn expect_close(&mut self) -> Result<(), Error> {
        match self.next_required("'}'")? {
            Token::Close => Ok(()),
            _ => Err(Error::parse(self.tokens.line(), "expected '}'")),
        }
    }
}

/// Column accumulator used while streaming the rows of an indexed block.
enum RawColumn {
    Bool(Vec<bool>, BitVec),
    Int(Vec<i64>, BitVec),
    Real(Vec<f64>, BitVec),
    String(Vec<String>, BitVec),
}

impl RawColumn {
    fn new(kind: PropertyKind, rows: usize) -> RawColumn {
        match kind {
            PropertyKind::Bool => RawColumn::Bool(Vec::with_capacity(rows), BitVec::with_capacity(rows)),
            PropertyKind::Int => RawColumn::Int(Vec::with_capacity(rows), BitVec::with_capacity(rows)),
            PropertyKind::Real => RawColumn::Real(Vec::with_capacity(rows), BitVec::with_capacity(rows)),
            PropertyKind::String => {
                RawColumn::String(Vec::with_capacity(rows), BitVec::with_capacity(rows))
            }
        }
    }

    fn push(&mut self, text: &str, quoted: bool, key: &str, line: usize) -> Result<(), Error> {
        let undefined = !quoted && text == UNDEFINED;
        match self {
            RawColumn::Bool(values, missing) => {
                values.push(if undefined { false } else { parse_bool(text, key, line)? });
                missing.push(undefined);
            }
            RawColumn::Int(values, missing) => {
                values.push(if undefined { 0 } else { parse_int(text, key, line)? });
                missing.push(undefined);
            }
            RawColumn::Real(values, missing) => {
                values.push(if undefined { 0.0 } else { parse_real(text, key, line)? });
                missing.push(undefined);
            }
            RawColumn::String(values, missing) => {
                values.push(if undefined { String::new() } else { text.to_string() });
                missing.push(undefined);
            }
        }
        Ok(())
    }

    fn install(self, key: String, block: &mut IndexedBlock) {
        match self {
            RawColumn::Bool(values, missing) => {
                block.set_bool_column(key, IndexedProperty::new(values, missing));
            }
            RawColumn::Int(values, missing) => {
                block.set_int_column(key, IndexedProperty::new(values, missing));
            }
            RawColumn::Real(values, missing) => {
                block.set_real_column(key, IndexedProperty::new(values, missing));
            }
            RawColumn::String(values, missing) => {
                block.set_string_column(key, IndexedProperty::new(values, missing));
            }
        }
    }
}

/// Splits an indexed block name such as `m_atom[12]` into its base name
/// and declared row count. Names without brackets are plain block names.
fn indexed_name(text: &str, line: usize) -> Result<Option<(String, usize)>, Error> {
    let Some(open) = text.find('[') else {
        return Ok(None);
    };
    let name = &text[..open];
    let count = text[open + 1..]
        .strip_suffix(']')
        .ok_or_else(|| Error::parse(line, format!("malformed indexed block name '{text}'")))?;
    if name.is_empty() {
        return Err(Error::parse(line, format!("malformed indexed block name '{text}'")));
    }
    let rows = count
        .parse::<usize>()
        .map_err(|_| Error::parse(line, format!("invalid row count in indexed block name '{text}'")))?;
    Ok(Some((name.to_string(), rows)))
}

fn parse_bool(text: &str, key: &str, line: usize) -> Result<bool, Error> {
    match text {
        "0" => Ok(false),
        "1" => Ok(true),
        _ => Err(Error::parse(
            line,
            format!("invalid boolean value '{text}' for '{key}'"),
        )),
    }
}

fn parse_int(text: &str, key: &str, line: usize) -> Result<i64, Error> {
    text.parse::<i64>()
        .map_err(|_| Error::parse(line, format!("invalid integer value '{text}' for '{key}'")))
}

fn parse_real(text: &str, key: &str, line: usize) -> Result<f64, Error> {
    text.parse::<f64>()
        .map_err(|_| Error::parse(line, format!("invalid real value '{text}' for '{key}'")))
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    /// `{`
    Open,
    /// `}`
    Close,
    /// `:::`
    Sep,
    Value { text: String, quoted: bool },
}

/// Whitespace-separated tokenizer with line tracking. Braces always form
/// their own token, `#` starts a comment running to end of line, and
/// double-quoted strings may escape `"` and `\` with a backslash.
struct Tokenizer<R> {
    reader: R,
    line: usize,
    pending: VecDeque<Token>,
}

impl<R: BufRead> Tokenizer<R> {
    fn new(reader: R) -> Tokenizer<R> {
        Tokenizer {
            reader,
            line: 0,
            pending: VecDeque::new(),
        }
    }

    /// 1-based line number of the most recently scanned line.
    fn line(&self) -> usize {
        self.line
    }

    fn next(&mut self) -> Result<Option<Token>, Error> {
        while self.pending.is_empty() {
            let mut raw = String::new();
            if self.reader.read_line(&mut raw)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            self.scan_line(&raw)?;
        }
        Ok(self.pending.pop_front())
    }

    fn scan_line(&mut self, raw: &str) -> Result<(), Error> {
        let mut chars = raw.chars().peekable();
        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            let Some(&first) = chars.peek() else {
                return Ok(());
            };

            match first {
                '#' => return Ok(()),
                '{' => {
                    chars.next();
                    self.pending.push_back(Token::Open);
                }
                '}' => {
                    chars.next();
                    self.pending.push_back(Token::Close);
                }
                '"' => {
                    chars.next();
                    let mut text = String::new();
                    loop {
                        match chars.next() {
                            Some('"') => break,
                            Some('\\') => match chars.next() {
                                Some(escaped @ ('"' | '\\')) => text.push(escaped),
                                Some(other) => {
                                    text.push('\\');
                                    text.push(other);
                                }
                                None => {
                                    return Err(Error::parse(self.line, "unterminated string escape"));
                                }
                            },
                            Some(c) => text.push(c),
                            None => {
                                return Err(Error::parse(self.line, "unterminated quoted string"));
                            }
                        }
                    }
                    self.pending.push_back(Token::Value { text, quoted: true });
                }
                _ => {
                    let mut text = String::new();
                    while let Some(&c) = chars.peek() {
                        if c.is_whitespace() || matches!(c, '"' | '{' | '}') {
                            break;
                        }
                        text.push(c);
                        chars.next();
                    }
                    self.pending.push_back(match text.as_str() {
                        ":::" => Token::Sep,
                        _ => Token::Value { text, quoted: false },
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = r#"{
  s_m_m2io_version
  :::
  2.0.0
}

f_m_ct {
  s_m_title
  i_m_ct_format
  r_m_energy
  b_m_valid
  :::
  "test molecule"
  2
  -1.5
  1
  m_atom[3] {
    # First column is atom index #
    i_m_mmod_type
    r_m_x_coord
    s_m_label
    b_m_flag
    :::
    1 3 0.5 CA 1
    2 <> 1.25 "alpha beta" 0
    3 5 <> <> <>
    :::
  }
}
"#;

    fn single_block(input: &str) -> Block {
        let mut reader = Reader::new(Cursor::new(input));
        let block = reader.next_block().expect("parse").expect("one block");
        assert!(reader.next_block().expect("parse").is_none());
        block
    }

    #[test]
    fn parses_structure_block_and_skips_header() {
        let block = single_block(SAMPLE);

        assert_eq!(block.name(), "f_m_ct");
        assert_eq!(block.string_property("s_m_title"), Some("test molecule"));
        assert_eq!(block.int_property("i_m_ct_format"), Some(2));
        assert_eq!(block.real_property("r_m_energy"), Some(-1.5));
        assert_eq!(block.bool_property("b_m_valid"), Some(true));

        let atoms = block.indexed_block("m_atom").expect("atom block");
        assert_eq!(atoms.size(), 3);

        let types = &atoms.int_columns()["i_m_mmod_type"];
        assert_eq!(types.get(0), Some(&3));
        assert_eq!(types.get(1), None);
        assert_eq!(types.get(2), Some(&5));

        let coords = &atoms.real_columns()["r_m_x_coord"];
        assert_eq!(coords.get(1), Some(&1.25));
        assert_eq!(coords.get(2), None);

        let labels = &atoms.string_columns()["s_m_label"];
        assert_eq!(labels.get(0).map(String::as_str), Some("CA"));
        assert_eq!(labels.get(1).map(String::as_str), Some("alpha beta"));
        assert_eq!(labels.get(2), None);

        let flags = &atoms.bool_columns()["b_m_flag"];
        assert_eq!(flags.get(0), Some(&true));
        assert_eq!(flags.get(1), Some(&false));
        assert_eq!(flags.get(2), None);
    }

    #[test]
    fn yields_blocks_in_file_order_until_exhausted() {
        let input = "f_m_ct {\n  s_m_title\n  :::\n  first\n}\nf_m_ct {\n  s_m_title\n  :::\n  second\n}\n";
        let mut reader = Reader::new(Cursor::new(input));

        let first = reader.next_block().expect("parse").expect("block");
        assert_eq!(first.string_property("s_m_title"), Some("first"));
        let second = reader.next_block().expect("parse").expect("block");
        assert_eq!(second.string_property("s_m_title"), Some("second"));
        assert!(reader.next_block().expect("parse").is_none());
        assert!(reader.next_block().expect("parse").is_none());
    }

    #[test]
    fn undefined_scalar_leaves_the_property_unset() {
        let block = single_block("f_m_ct {\n  r_m_energy\n  s_m_entry_name\n  :::\n  <>\n  entry\n}\n");
        assert_eq!(block.real_property("r_m_energy"), None);
        assert_eq!(block.string_property("s_m_entry_name"), Some("entry"));
    }

    #[test]
    fn quoted_undefined_token_is_a_literal_string() {
        let block = single_block("f_m_ct {\n  s_m_label\n  :::\n  \"<>\"\n}\n");
        assert_eq!(block.string_property("s_m_label"), Some("<>"));
    }

    #[test]
    fn quoted_strings_unescape_quotes_and_backslashes() {
        let block = single_block("f_m_ct {\n  s_m_title\n  :::\n  \"a \\\"b\\\" c\\\\d\"\n}\n");
        assert_eq!(block.string_property("s_m_title"), Some("a \"b\" c\\d"));
    }

    #[test]
    fn nested_plain_blocks_are_carried_through() {
        let input = "f_m_ct {\n  s_m_title\n  :::\n  outer\n  m_depend {\n    i_m_depend_dependency\n    :::\n    4\n  }\n}\n";
        let block = single_block(input);
        assert_eq!(block.sub_blocks().len(), 1);
        assert_eq!(block.sub_blocks()[0].name(), "m_depend");
        assert_eq!(
            block.sub_blocks()[0].int_property("i_m_depend_dependency"),
            Some(4)
        );
    }

    #[test]
    fn unsupported_key_prefix_is_rejected() {
        let input = "f_m_ct {\n  x_m_bogus\n  :::\n  1\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        let err = reader.next_block().unwrap_err();
        assert!(matches!(err, Error::UnsupportedPropertyType(key) if key == "x_m_bogus"));
    }

    #[test]
    fn unsupported_column_prefix_is_rejected() {
        let input = "f_m_ct {\n  :::\n  m_atom[1] {\n    t_m_bogus\n    :::\n    1 7\n    :::\n  }\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        let err = reader.next_block().unwrap_err();
        assert!(matches!(err, Error::UnsupportedPropertyType(key) if key == "t_m_bogus"));
    }

    #[test]
    fn invalid_integer_reports_the_line() {
        let input = "f_m_ct {\n  i_m_ct_format\n  :::\n  banana\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        match reader.next_block().unwrap_err() {
            Error::Parse { line, details } => {
                assert_eq!(line, 4);
                assert!(details.contains("i_m_ct_format"), "details: {details}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn boolean_values_must_be_zero_or_one() {
        let input = "f_m_ct {\n  b_m_valid\n  :::\n  true\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        assert!(matches!(reader.next_block().unwrap_err(), Error::Parse { .. }));
    }

    #[test]
    fn unterminated_quote_is_rejected() {
        let input = "f_m_ct {\n  s_m_title\n  :::\n  \"open ended\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        match reader.next_block().unwrap_err() {
            Error::Parse { line, details } => {
                assert_eq!(line, 4);
                assert!(details.contains("unterminated"), "details: {details}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn missing_rows_are_rejected() {
        let input = "f_m_ct {\n  :::\n  m_atom[2] {\n    i_m_mmod_type\n    :::\n    1 3\n    :::\n  }\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        assert!(matches!(reader.next_block().unwrap_err(), Error::Parse { .. }));
    }

    #[test]
    fn malformed_indexed_block_name_is_rejected() {
        let input = "f_m_ct {\n  :::\n  m_atom[2 {\n  }\n}\n";
        let mut reader = Reader::new(Cursor::new(input));
        assert!(matches!(reader.next_block().unwrap_err(), Error::Parse { .. }));
    }

    #[test]
    fn truncated_input_is_rejected() {
        let input = "f_m_ct {\n  s_m_title\n  :::\n";
        let mut reader = Reader::new(Cursor::new(input));
        match reader.next_block().unwrap_err() {
            Error::Parse { details, .. } => {
                assert!(details.contains("unexpected end of input"), "details: {details}");
            }
            other => panic!("expected a parse error, got {other:?}"),
        }
    }
}
