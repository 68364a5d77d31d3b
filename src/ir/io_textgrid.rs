//! Praat TextGrid reader.
//!
//! Both text flavours Praat writes are supported: the verbose "long" format
//! (`xmin = 0`, `intervals [1]:` ...) and the "short" format that lists only
//! the values. The reader works like Praat's own: it walks the file picking
//! out numbers, quoted strings and `<exists>` flags, and ignores labels,
//! bracketed indices and `!` comments.
//!
//! # Encodings
//!
//! Files are decoded as UTF-8 first (a BOM is tolerated). If that fails they
//! are decoded as UTF-16, using the BOM when present and little-endian
//! otherwise. If neither works the file is rejected.
//!
//! # Filtering
//!
//! Intervals with empty text or the silence marker `<sil>` are dropped.
//! Point tiers (`TextTier`) carry no intervals and are skipped.

use std::fs;
use std::path::{Path, PathBuf};

use super::interval::{Interval, Tier};
use super::recording::Recording;
use crate::error::PentorefError;

/// Text of intervals that mark silence.
pub const SILENCE_MARKER: &str = "<sil>";

/// Reads a TextGrid file into a recording named after the file stem.
pub fn read_textgrid(path: &Path) -> Result<Recording, PentorefError> {
    let bytes = fs::read(path).map_err(PentorefError::Io)?;
    let text = decode_text(&bytes, path)?;
    let tiers = parse_textgrid_str(&text, path)?;
    Ok(Recording::new(file_stem(path), tiers))
}

/// Parses TextGrid text into tiers.
pub fn from_textgrid_str(text: &str) -> Result<Vec<Tier>, PentorefError> {
    parse_textgrid_str(text, Path::new("<string>"))
}

/// Parses TextGrid bytes, applying the encoding fallback.
pub fn from_textgrid_slice(bytes: &[u8]) -> Result<Vec<Tier>, PentorefError> {
    let path = Path::new("<bytes>");
    let text = decode_text(bytes, path)?;
    parse_textgrid_str(&text, path)
}

/// Decodes file bytes as UTF-8, falling back to UTF-16.
pub fn decode_text(bytes: &[u8], path: &Path) -> Result<String, PentorefError> {
    let utf8_body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    // NUL bytes are valid UTF-8 but mean BOM-less UTF-16 in practice.
    if let Ok(text) = std::str::from_utf8(utf8_body) {
        if !text.contains('\0') {
            return Ok(text.to_string());
        }
    }

    decode_utf16(bytes).ok_or_else(|| PentorefError::Encoding {
        path: path.to_path_buf(),
        message: "input is neither valid UTF-8 nor valid UTF-16".to_string(),
    })
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    if bytes.len() % 2 != 0 {
        return None;
    }

    let (body, big_endian) = match bytes {
        [0xFE, 0xFF, rest @ ..] => (rest, true),
        [0xFF, 0xFE, rest @ ..] => (rest, false),
        _ => (bytes, false),
    };

    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    String::from_utf16(&units).ok()
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Number(f64),
    Text(String),
    Flag(String),
}

struct Tokens<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Tokens<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn read_string(&mut self) -> Result<String, String> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some('"') => {
                    // A doubled quote is an escaped quote.
                    if self.chars.peek() == Some(&'"') {
                        self.chars.next();
                        out.push('"');
                    } else {
                        return Ok(out);
                    }
                }
                Some(c) => out.push(c),
                None => return Err("unterminated string".to_string()),
            }
        }
    }

    fn read_while(&mut self, first: char, keep: impl Fn(char) -> bool) -> String {
        let mut out = String::from(first);
        while let Some(&c) = self.chars.peek() {
            if !keep(c) {
                break;
            }
            out.push(c);
            self.chars.next();
        }
        out
    }

    fn skip_until(&mut self, stop: char) {
        for c in self.chars.by_ref() {
            if c == stop {
                break;
            }
        }
    }
}

impl Iterator for Tokens<'_> {
    type Item = Result<Token, String>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let c = self.chars.next()?;
            match c {
                '"' => return Some(self.read_string().map(Token::Text)),
                '!' => self.skip_until('\n'),
                '[' => self.skip_until(']'),
                '<' => {
                    let flag = self.read_while(c, |c| c != '>');
                    self.chars.next();
                    return Some(Ok(Token::Flag(format!("{flag}>"))));
                }
                c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
                    let raw =
                        self.read_while(c, |c| c.is_ascii_digit() || "eE+-.".contains(c));
                    return Some(
                        raw.parse::<f64>()
                            .map(Token::Number)
                            .map_err(|_| format!("invalid number '{raw}'")),
                    );
                }
                c if c.is_alphabetic() || c == '_' => {
                    // Labels such as `xmin` or `intervals` carry no data.
                    self.read_while(c, |c| c.is_alphanumeric() || c == '_');
                }
                _ => {}
            }
        }
    }
}

struct TokenStream<'a> {
    tokens: Tokens<'a>,
    path: PathBuf,
    /// Input length in bytes; no count can exceed it.
    input_len: usize,
}

impl TokenStream<'_> {
    fn error(&self, message: impl Into<String>) -> PentorefError {
        PentorefError::TextGridParse {
            path: self.path.clone(),
            message: message.into(),
        }
    }

    fn next(&mut self, what: &str) -> Result<Token, PentorefError> {
        match self.tokens.next() {
            Some(Ok(token)) => Ok(token),
            Some(Err(message)) => Err(self.error(message)),
            None => Err(self.error(format!("unexpected end of file, expected {what}"))),
        }
    }

    fn number(&mut self, what: &str) -> Result<f64, PentorefError> {
        match self.next(what)? {
            Token::Number(n) => Ok(n),
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize, PentorefError> {
        let n = self.number(what)?;
        if n < 0.0 || n.fract() != 0.0 {
            return Err(self.error(format!("invalid {what} {n}")));
        }
        if n > self.input_len as f64 {
            return Err(self.error(format!(
                "{what} {n} exceeds what a {}-byte file can hold",
                self.input_len
            )));
        }
        Ok(n as usize)
    }

    fn text(&mut self, what: &str) -> Result<String, PentorefError> {
        match self.next(what)? {
            Token::Text(s) => Ok(s),
            other => Err(self.error(format!("expected {what}, found {other:?}"))),
        }
    }
}

fn parse_textgrid_str(text: &str, path: &Path) -> Result<Vec<Tier>, PentorefError> {
    let mut stream = TokenStream {
        tokens: Tokens::new(text),
        path: path.to_path_buf(),
        input_len: text.len(),
    };

    let file_type = stream.text("file type")?;
    if file_type != "ooTextFile" {
        return Err(stream.error(format!(
            "unsupported file type '{file_type}'; expected 'ooTextFile'"
        )));
    }
    let object_class = stream.text("object class")?;
    if object_class != "TextGrid" {
        return Err(stream.error(format!(
            "unsupported object class '{object_class}'; expected 'TextGrid'"
        )));
    }

    stream.number("grid xmin")?;
    stream.number("grid xmax")?;

    match stream.tokens.next() {
        None => return Ok(Vec::new()),
        Some(Ok(Token::Flag(flag))) if flag == "<exists>" => {}
        Some(Ok(Token::Flag(_))) => return Ok(Vec::new()),
        Some(Ok(other)) => {
            return Err(stream.error(format!("expected tiers flag, found {other:?}")))
        }
        Some(Err(message)) => return Err(stream.error(message)),
    }

    let tier_count = stream.count("tier count")?;
    let mut tiers = Vec::new();

    for _ in 0..tier_count {
        let class = stream.text("tier class")?;
        let name = stream.text("tier name")?;
        stream.number("tier xmin")?;
        stream.number("tier xmax")?;
        let size = stream.count("interval count")?;

        match class.as_str() {
            "IntervalTier" => {
                let mut intervals = Vec::new();
                for _ in 0..size {
                    let start = stream.number("interval xmin")?;
                    let end = stream.number("interval xmax")?;
                    let label = stream.text("interval text")?;
                    if label.trim().is_empty() || label == SILENCE_MARKER {
                        continue;
                    }
                    intervals.push(Interval::new(start, end, label));
                }
                tiers.push(Tier::new(name, intervals));
            }
            "TextTier" => {
                for _ in 0..size {
                    stream.number("point time")?;
                    stream.text("point mark")?;
                }
            }
            other => {
                return Err(stream.error(format!("unsupported tier class '{other}'")));
            }
        }
    }

    Ok(tiers)
}

pub(crate) fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}
