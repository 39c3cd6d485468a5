use log::{info, trace, warn};
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use thiserror::Error;

/// Errors produced while decoding a single escaped dictionary line.
///
/// Every variant carries the byte offset of the offending backslash within the line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EscapeError {
    /// The line ends with a lone `\`.
    #[error("trailing backslash at byte {0}")]
    TrailingBackslash(usize),

    /// A backslash followed by a byte that is not part of the escape grammar.
    #[error("unknown escape byte {byte:#04x} at byte {column}")]
    UnknownEscape { column: usize, byte: u8 },

    /// `\x` not followed by two hexadecimal digits.
    #[error("`\\x` without two hex digits at byte {0}")]
    BadHex(usize),
}

/// Errors that can arise while reading a dictionary source.
#[derive(Error, Debug)]
pub enum DictionaryError {
    /// The dictionary file could not be opened.
    #[error("failed to open dictionary {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// Reading from an already opened source failed.
    #[error("dictionary read error: {0}")]
    Io(#[from] io::Error),

    /// A line contained a malformed escape sequence.
    #[error("malformed dictionary line {line}: {source}")]
    MalformedLine { line: usize, source: EscapeError },
}

/// A non-empty byte string that the mutator looks for and injects.
///
/// Literals are created once while the dictionary is loaded and never change afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(Box<[u8]>);

impl Literal {
    /// Wraps `bytes` as a literal. Returns `None` for an empty byte string.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Option<Self> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            None
        } else {
            Some(Self(bytes.into_boxed_slice()))
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for Literal {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&Repr(&self.0), f)
    }
}

/// Displays a byte string using the dictionary escape grammar.
///
/// Printable ASCII is written as-is (a backslash is doubled), the common control
/// characters use their short escapes, and everything else becomes `\xHH`.
/// Feeding the output back through [`parse_line`] yields the original bytes.
#[derive(Debug, Clone, Copy)]
pub struct Repr<'a>(pub &'a [u8]);

impl fmt::Display for Repr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in self.0 {
            match byte {
                b'\\' => f.write_str("\\\\")?,
                b' '..=b'~' => write!(f, "{}", byte as char)?,
                0x0c => f.write_str("\\f")?,
                b'\n' => f.write_str("\\n")?,
                b'\r' => f.write_str("\\r")?,
                b'\t' => f.write_str("\\t")?,
                0x0b => f.write_str("\\v")?,
                _ => write!(f, "\\x{byte:02x}")?,
            }
        }
        Ok(())
    }
}

/// Encodes `bytes` as one dictionary line (without the trailing newline).
pub fn escape_bytes(bytes: &[u8]) -> String {
    Repr(bytes).to_string()
}

fn hex_value(digit: u8) -> Option<u8> {
    (digit as char).to_digit(16).map(|value| value as u8)
}

/// Decodes one dictionary line in a single left-to-right pass.
///
/// Supported escapes: `\\`, `\f`, `\n`, `\r`, `\t`, `\v` and `\xHH`.
/// Any other byte is copied verbatim.
pub fn parse_line(line: &[u8]) -> Result<Vec<u8>, EscapeError> {
    let mut decoded = Vec::with_capacity(line.len());
    let mut cursor = 0;

    while cursor < line.len() {
        let byte = line[cursor];
        if byte != b'\\' {
            decoded.push(byte);
            cursor += 1;
            continue;
        }

        let Some(&escape) = line.get(cursor + 1) else {
            return Err(EscapeError::TrailingBackslash(cursor));
        };
        let value = match escape {
            b'\\' => b'\\',
            b'f' => 0x0c,
            b'n' => b'\n',
            b'r' => b'\r',
            b't' => b'\t',
            b'v' => 0x0b,
            b'x' => {
                let digits = line
                    .get(cursor + 2..cursor + 4)
                    .ok_or(EscapeError::BadHex(cursor))?;
                let high = hex_value(digits[0]).ok_or(EscapeError::BadHex(cursor))?;
                let low = hex_value(digits[1]).ok_or(EscapeError::BadHex(cursor))?;
                decoded.push((high << 4) | low);
                cursor += 4;
                continue;
            }
            other => {
                return Err(EscapeError::UnknownEscape {
                    column: cursor,
                    byte: other,
                });
            }
        };
        decoded.push(value);
        cursor += 2;
    }

    Ok(decoded)
}

/// An ordered list of literals. Order is load order and defines match priority.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dictionary {
    literals: Vec<Literal>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, literal: Literal) {
        self.literals.push(literal);
    }

    /// Parses a dictionary, one escaped literal per `\n`-terminated line.
    ///
    /// Empty lines are ignored. A line with a malformed escape is skipped as a whole
    /// and reported with `warn!`; parsing continues with the next line.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, DictionaryError> {
        Self::parse_lines(reader, false)
    }

    /// Like [`Dictionary::parse`], but the first malformed line is an error.
    pub fn parse_strict<R: BufRead>(reader: R) -> Result<Self, DictionaryError> {
        Self::parse_lines(reader, true)
    }

    fn parse_lines<R: BufRead>(reader: R, strict: bool) -> Result<Self, DictionaryError> {
        let mut dictionary = Self::new();
        for (index, line) in reader.split(b'\n').enumerate() {
            let line = line?;
            let line_number = index + 1;
            match parse_line(&line) {
                Ok(bytes) => match Literal::new(bytes) {
                    Some(literal) => dictionary.push(literal),
                    None => trace!("skipping empty dictionary line {line_number}"),
                },
                Err(source) => {
                    let error = DictionaryError::MalformedLine {
                        line: line_number,
                        source,
                    };
                    if strict {
                        return Err(error);
                    }
                    warn!("skipping entry, {error}");
                }
            }
        }
        Ok(dictionary)
    }

    pub fn load(path: &Path) -> Result<Self, DictionaryError> {
        let file = File::open(path).map_err(|source| DictionaryError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(BufReader::new(file))
    }

    pub fn len(&self) -> usize {
        self.literals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.literals.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Literal> {
        self.literals.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Literal> {
        self.literals.iter()
    }

    /// Returns the literal at `seed mod len`.
    ///
    /// # Panics
    /// Panics if the dictionary is empty. Callers must check first.
    pub fn literal_at(&self, seed: u32) -> &Literal {
        assert!(
            !self.literals.is_empty(),
            "literal_at called on an empty dictionary"
        );
        &self.literals[seed as usize % self.literals.len()]
    }

    /// MD5 over the escaped, newline-joined literals, as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut context = md5::Context::new();
        for literal in &self.literals {
            context.consume(escape_bytes(literal.as_bytes()));
            context.consume(b"\n");
        }
        format!("{:x}", context.compute())
    }
}

impl FromIterator<Literal> for Dictionary {
    fn from_iter<T: IntoIterator<Item = Literal>>(iter: T) -> Self {
        Self {
            literals: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dictionary {
    type Item = &'a Literal;
    type IntoIter = std::slice::Iter<'a, Literal>;

    fn into_iter(self) -> Self::IntoIter {
        self.literals.iter()
    }
}

/// A dictionary that is read from its source on first use and then frozen.
///
/// The load is attempted exactly once per instance. When the source is missing or
/// unreadable the dictionary stays empty for the lifetime of the instance; nothing
/// is ever reloaded or invalidated.
#[derive(Debug, Default)]
pub struct LazyDictionary {
    source: Option<PathBuf>,
    cell: OnceLock<Dictionary>,
}

impl LazyDictionary {
    pub fn new(source: Option<PathBuf>) -> Self {
        Self {
            source,
            cell: OnceLock::new(),
        }
    }

    /// An already initialized dictionary that never touches the filesystem.
    pub fn preloaded(dictionary: Dictionary) -> Self {
        Self {
            source: None,
            cell: OnceLock::from(dictionary),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    pub fn get(&self) -> &Dictionary {
        self.cell.get_or_init(|| load_or_empty(self.source.as_deref()))
    }

    /// Forces initialization and returns the number of literals available.
    pub fn load(&self) -> usize {
        self.get().len()
    }
}

fn load_or_empty(source: Option<&Path>) -> Dictionary {
    let Some(path) = source else {
        warn!("no dictionary configured, every mutation will be delegated");
        return Dictionary::default();
    };

    match Dictionary::load(path) {
        Ok(dictionary) => {
            if dictionary.is_empty() {
                warn!("dictionary {path:?} holds no literals");
            } else {
                info!(
                    "loaded {} literals from {path:?} (fingerprint {})",
                    dictionary.len(),
                    dictionary.fingerprint()
                );
            }
            dictionary
        }
        Err(e) => {
            warn!("{e}, every mutation will be delegated");
            Dictionary::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn dictionary_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp dictionary");
        file.write_all(contents).expect("write dictionary");
        file.flush().expect("flush dictionary");
        file
    }

    #[test]
    fn parse_line_decodes_every_escape() {
        assert_eq!(
            parse_line(br"a\\b\f\n\r\t\v\x00\xFf\x41z").unwrap(),
            b"a\\b\x0c\n\r\t\x0b\x00\xffAz".to_vec()
        );
    }

    #[test]
    fn parse_line_copies_plain_bytes_verbatim() {
        let raw: Vec<u8> = vec![0x00, 0x80, 0xff, b'x', b' ', b'\r'];
        assert_eq!(parse_line(&raw).unwrap(), raw);
    }

    #[test]
    fn parse_line_rejects_malformed_escapes() {
        assert_eq!(parse_line(b"abc\\"), Err(EscapeError::TrailingBackslash(3)));
        assert_eq!(
            parse_line(b"a\\qb"),
            Err(EscapeError::UnknownEscape {
                column: 1,
                byte: b'q'
            })
        );
        assert_eq!(parse_line(b"\\xZZ"), Err(EscapeError::BadHex(0)));
        assert_eq!(parse_line(b"ok\\x4"), Err(EscapeError::BadHex(2)));
        assert_eq!(parse_line(b"\\x"), Err(EscapeError::BadHex(0)));
    }

    #[test]
    fn every_byte_survives_escape_round_trip() {
        for byte in 0u8..=255 {
            let encoded = escape_bytes(&[byte]);
            assert_eq!(
                parse_line(encoded.as_bytes()).unwrap(),
                vec![byte],
                "byte {byte:#04x} encoded as {encoded:?}"
            );
        }

        let all: Vec<u8> = (0u8..=255).collect();
        let encoded = escape_bytes(&all);
        assert!(!encoded.contains('\n'));
        assert_eq!(parse_line(encoded.as_bytes()).unwrap(), all);
    }

    #[test]
    fn repr_matches_dictionary_notation() {
        assert_eq!(
            escape_bytes(b"GET /\\ \x00\x7f\n\t\x0b\x0c\r"),
            r"GET /\\ \x00\x7f\n\t\v\f\r"
        );
    }

    #[test]
    fn parse_keeps_load_order_and_skips_empty_lines() {
        let source = b"cat\n\nelephant\n\\x00\\xff\nlast";
        let dictionary = Dictionary::parse(Cursor::new(&source[..])).unwrap();
        let literals: Vec<&[u8]> = dictionary.iter().map(Literal::as_bytes).collect();
        assert_eq!(
            literals,
            vec![&b"cat"[..], &b"elephant"[..], &b"\x00\xff"[..], &b"last"[..]]
        );
    }

    #[test]
    fn parse_keeps_carriage_returns() {
        let dictionary = Dictionary::parse(Cursor::new(&b"crlf\r\n"[..])).unwrap();
        assert_eq!(dictionary.len(), 1);
        assert_eq!(dictionary.literal_at(0).as_bytes(), b"crlf\r");
    }

    #[test]
    fn parse_skips_malformed_lines_and_continues() {
        let source = b"good\nbad\\\n\\xG1\nalso\\qbad\nfine\\x21\n";
        let dictionary = Dictionary::parse(Cursor::new(&source[..])).unwrap();
        let literals: Vec<&[u8]> = dictionary.iter().map(Literal::as_bytes).collect();
        assert_eq!(literals, vec![&b"good"[..], &b"fine!"[..]]);
    }

    #[test]
    fn parse_strict_reports_first_malformed_line() {
        let source = b"good\n\nbad\\\n\\xG1\n";
        match Dictionary::parse_strict(Cursor::new(&source[..])) {
            Err(DictionaryError::MalformedLine { line, source }) => {
                assert_eq!(line, 3);
                assert_eq!(source, EscapeError::TrailingBackslash(3));
            }
            other => panic!("expected a malformed line error, got {other:?}"),
        }
    }

    #[test]
    fn load_missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.dict");
        match Dictionary::load(&missing) {
            Err(DictionaryError::Open { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected an open error, got {other:?}"),
        }
    }

    #[test]
    fn literal_at_uses_seed_modulo_length() {
        let dictionary: Dictionary = ["a", "b", "c"]
            .iter()
            .filter_map(|word| Literal::new(word.as_bytes()))
            .collect();
        assert_eq!(dictionary.literal_at(0).as_bytes(), b"a");
        assert_eq!(dictionary.literal_at(4).as_bytes(), b"b");
        assert_eq!(dictionary.literal_at(u32::MAX).as_bytes(), b"a");
    }

    #[test]
    #[should_panic(expected = "empty dictionary")]
    fn literal_at_on_empty_dictionary_panics() {
        Dictionary::new().literal_at(7);
    }

    #[test]
    fn literal_rejects_empty_bytes() {
        assert!(Literal::new(Vec::new()).is_none());
        assert_eq!(Literal::new(b"x".to_vec()).unwrap().len(), 1);
    }

    #[test]
    fn fingerprint_depends_on_content_and_order() {
        let forward = Dictionary::parse(Cursor::new(&b"ab\ncd\n"[..])).unwrap();
        let again = Dictionary::parse(Cursor::new(&b"ab\n\ncd"[..])).unwrap();
        let reversed = Dictionary::parse(Cursor::new(&b"cd\nab\n"[..])).unwrap();
        assert_eq!(forward.fingerprint(), again.fingerprint());
        assert_ne!(forward.fingerprint(), reversed.fingerprint());
        assert_eq!(forward.fingerprint().len(), 32);
    }

    #[test]
    fn lazy_dictionary_loads_once_and_never_reloads() {
        let file = dictionary_file(b"one\ntwo\n");
        let lazy = LazyDictionary::new(Some(file.path().to_path_buf()));
        assert!(!lazy.is_initialized());
        assert_eq!(lazy.load(), 2);
        assert!(lazy.is_initialized());

        std::fs::write(file.path(), b"one\ntwo\nthree\n").unwrap();
        assert_eq!(lazy.load(), 2);
        assert_eq!(lazy.get().literal_at(1).as_bytes(), b"two");
    }

    #[test]
    fn lazy_dictionary_stays_empty_after_failed_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("later.dict");
        let lazy = LazyDictionary::new(Some(path.clone()));
        assert_eq!(lazy.load(), 0);

        std::fs::write(&path, b"appeared\n").unwrap();
        assert_eq!(lazy.load(), 0);
        assert!(lazy.get().is_empty());
    }

    #[test]
    fn lazy_dictionary_without_source_is_empty() {
        let lazy = LazyDictionary::new(None);
        assert_eq!(lazy.load(), 0);
        assert!(lazy.source().is_none());
    }
}
