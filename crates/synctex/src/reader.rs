use std::io::{ErrorKind, Read};

use crate::types::{ParseError, Scan};

/// Default size of the read window.
pub(crate) const DEFAULT_BUFFER_SIZE: usize = 32768;

/// Bytes buffered before decoding a number, enough for any int or float
/// the engine writes.
pub(crate) const MIN_LOOKAHEAD: usize = 16;

/// Scaled points per unit, for every unit allowed in a post scriptum.
const UNITS: [(&str, f64); 11] = [
    ("in", 72.27 * 65536.0),
    ("cm", 72.27 * 65536.0 / 2.54),
    ("mm", 72.27 * 65536.0 / 25.4),
    ("pt", 65536.0),
    ("bp", 72.27 / 72.0 * 65536.0),
    ("pc", 12.0 * 65536.0),
    ("sp", 1.0),
    ("dd", 1238.0 / 1157.0 * 65536.0),
    ("cc", 14856.0 / 1157.0 * 65536.0),
    ("nd", 685.0 / 642.0 * 65536.0),
    ("nc", 1370.0 / 107.0 * 65536.0),
];

/// Outcome of a refill request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Fill {
    /// At least the requested number of bytes is buffered.
    Ready(usize),
    /// The stream is exhausted; this many bytes remain buffered.
    Eof(usize),
}

impl Fill {
    pub fn count(self) -> usize {
        match self {
            Fill::Ready(n) | Fill::Eof(n) => n,
        }
    }

    fn line_status(self) -> Scan<()> {
        if self.count() > 0 {
            Scan::Ok(())
        } else {
            Scan::Eof
        }
    }
}

/// A buffered reader over a synctex stream with token level decoders.
///
/// Unread bytes are never discarded: when a request exceeds what is
/// buffered, the unread tail moves to the start of the window and more is
/// read behind it. The window grows if a single request is larger than it,
/// so a speculative read can always be undone by simply not moving the cursor.
pub(crate) struct SyncReader {
    /// Dropped once the stream reports end of file.
    source: Option<Box<dyn Read>>,
    buf: Vec<u8>,
    cur: usize,
    end: usize,
    window: usize,
}

impl SyncReader {
    #[cfg(test)]
    pub fn new(source: Box<dyn Read>) -> Self {
        Self::with_capacity(source, DEFAULT_BUFFER_SIZE)
    }

    pub fn with_capacity(source: Box<dyn Read>, window: usize) -> Self {
        let window = window.max(1);
        Self {
            source: Some(source),
            buf: vec![0; window],
            cur: 0,
            end: 0,
            window,
        }
    }

    /// Number of buffered bytes not yet consumed.
    pub fn available(&self) -> usize {
        self.end - self.cur
    }

    /// Make sure `requested` unread bytes are buffered, reading from the
    /// stream if needed. A request of zero never touches the stream.
    pub fn ensure_available(&mut self, requested: usize) -> Result<Fill, ParseError> {
        let available = self.available();
        if requested <= available {
            return Ok(Fill::Ready(available));
        }
        if self.source.is_none() {
            return Ok(Fill::Eof(available));
        }

        self.buf.copy_within(self.cur..self.end, 0);
        self.cur = 0;
        self.end = available;
        let size = self.window.max(requested);
        if self.buf.len() < size {
            self.buf.resize(size, 0);
        }

        while self.end < requested {
            let Some(source) = self.source.as_mut() else {
                break;
            };
            match source.read(&mut self.buf[self.end..]) {
                Ok(0) => {
                    log::trace!("synctex stream exhausted");
                    self.source = None;
                    return Ok(Fill::Eof(self.end));
                }
                Ok(n) => self.end += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ParseError::Io(e)),
            }
        }
        Ok(Fill::Ready(self.end))
    }

    /// The next unread byte, if any.
    pub fn peek(&mut self) -> Result<Option<u8>, ParseError> {
        if self.ensure_available(1)?.count() == 0 {
            return Ok(None);
        }
        Ok(Some(self.buf[self.cur]))
    }

    /// Consume one byte that was just peeked.
    pub fn bump(&mut self) {
        if self.cur < self.end {
            self.cur += 1;
        }
    }

    /// Move past the next newline. Reports `Eof` when nothing follows it.
    pub fn next_line(&mut self) -> Result<Scan<()>, ParseError> {
        loop {
            let unread = &self.buf[self.cur..self.end];
            if let Some(pos) = unread.iter().position(|&b| b == b'\n') {
                self.cur += pos + 1;
                return Ok(self.ensure_available(1)?.line_status());
            }
            self.cur = self.end;
            if self.ensure_available(1)?.count() == 0 {
                return Ok(Scan::Eof);
            }
        }
    }

    /// Consume `literal` if the stream continues with it.
    ///
    /// On `NotOk` and `Eof` the cursor is left where it was, even when the
    /// comparison needed bytes beyond the buffered ones.
    pub fn match_literal(&mut self, literal: &str) -> Result<Scan<()>, ParseError> {
        let expected = literal.as_bytes();
        if expected.is_empty() {
            return Err(ParseError::BadArgument("empty literal"));
        }

        let buffered = self.available().min(expected.len());
        if self.buf[self.cur..self.cur + buffered] != expected[..buffered] {
            return Ok(Scan::NotOk);
        }
        if buffered < expected.len() {
            if self.ensure_available(expected.len())?.count() < expected.len() {
                return Ok(Scan::Eof);
            }
            if self.buf[self.cur..self.cur + expected.len()] != *expected {
                return Ok(Scan::NotOk);
            }
        }
        self.cur += expected.len();
        Ok(Scan::Ok(()))
    }

    /// Decode a decimal integer, skipping one leading `:` or `,`.
    pub fn decode_int(&mut self) -> Result<Scan<i32>, ParseError> {
        if self.ensure_available(MIN_LOOKAHEAD)?.count() == 0 {
            return Ok(Scan::Eof);
        }
        let unread = &self.buf[self.cur..self.end];
        let skip = usize::from(matches!(unread.first(), Some(b':' | b',')));
        match parse_int(&unread[skip..]) {
            Some((value, len)) => {
                self.cur += skip + len;
                Ok(Scan::Ok(value))
            }
            None => Ok(Scan::NotOk),
        }
    }

    /// Decode the rest of the line. The cursor stops on the newline.
    pub fn decode_string(&mut self) -> Result<Scan<String>, ParseError> {
        if self.ensure_available(1)?.count() == 0 {
            return Ok(Scan::Eof);
        }
        let mut bytes = Vec::new();
        loop {
            let unread = &self.buf[self.cur..self.end];
            if let Some(pos) = unread.iter().position(|&b| b == b'\n') {
                bytes.extend_from_slice(&unread[..pos]);
                self.cur += pos;
                break;
            }
            bytes.extend_from_slice(unread);
            self.cur = self.end;
            if self.ensure_available(1)?.count() == 0 {
                break;
            }
        }
        Ok(Scan::Ok(String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Decode a decimal float. The decimal separator is always `.`.
    pub fn decode_float(&mut self) -> Result<Scan<f64>, ParseError> {
        if self.ensure_available(MIN_LOOKAHEAD)?.count() == 0 {
            return Ok(Scan::Eof);
        }
        match parse_float(&self.buf[self.cur..self.end]) {
            Some((value, len)) => {
                self.cur += len;
                Ok(Scan::Ok(value))
            }
            None => Ok(Scan::NotOk),
        }
    }

    /// Decode a float followed by a TeX unit, converted to scaled points.
    pub fn decode_dimension(&mut self) -> Result<f64, ParseError> {
        let value = match self.decode_float()? {
            Scan::Ok(value) => value,
            _ => return Err(ParseError::Malformed("a float was expected".into())),
        };
        for (unit, factor) in UNITS {
            if self.match_literal(unit)?.is_ok() {
                return Ok(value * factor);
            }
        }
        Err(ParseError::Malformed(format!("missing unit after {value}")))
    }
}

// === Internal helpers ===

fn skip_blanks(bytes: &[u8]) -> usize {
    bytes
        .iter()
        .take_while(|&&b| b == b' ' || b == b'\t')
        .count()
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// Parse `[blanks][sign]digits`, saturating to the `i32` range.
fn parse_int(bytes: &[u8]) -> Option<(i32, usize)> {
    let mut pos = skip_blanks(bytes);
    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };
    let digits = count_digits(&bytes[pos..]);
    if digits == 0 {
        return None;
    }
    let magnitude = bytes[pos..pos + digits].iter().fold(0i64, |acc, b| {
        acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
    });
    let value = if negative { -magnitude } else { magnitude };
    let value = value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    Some((value, pos + digits))
}

/// Parse `[blanks][sign]digits[.digits][(e|E)[sign]digits]`.
fn parse_float(bytes: &[u8]) -> Option<(f64, usize)> {
    let start = skip_blanks(bytes);
    let mut pos = start;
    if matches!(bytes.get(pos), Some(b'-' | b'+')) {
        pos += 1;
    }
    let mut mantissa = count_digits(&bytes[pos..]);
    pos += mantissa;
    if bytes.get(pos) == Some(&b'.') {
        let fraction = count_digits(&bytes[pos + 1..]);
        if mantissa + fraction > 0 {
            pos += 1 + fraction;
            mantissa += fraction;
        }
    }
    if mantissa == 0 {
        return None;
    }
    if matches!(bytes.get(pos), Some(b'e' | b'E')) {
        let mut exp = pos + 1;
        if matches!(bytes.get(exp), Some(b'-' | b'+')) {
            exp += 1;
        }
        let digits = count_digits(&bytes[exp..]);
        if digits > 0 {
            pos = exp + digits;
        }
    }
    let text = std::str::from_utf8(&bytes[start..pos]).ok()?;
    let value = text.parse::<f64>().ok()?;
    Some((value, pos))
}
