use std::path::PathBuf;

// === Status taxonomy ===

/// Outcome classes shared by every scanning operation.
///
/// Tokens that were found or not found are reported through [`Scan`],
/// failures through [`ParseError`]; `status()` on either maps back onto this
/// taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    BadArgument,
    Error,
    Eof,
    NotOk,
    Ok,
}

/// Result of a token level scan that did not fail.
#[derive(Debug, Clone, PartialEq)]
pub enum Scan<T> {
    /// The token was recognized and the cursor moved past it.
    Ok(T),
    /// The token is not here. The cursor did not move.
    NotOk,
    /// The stream ended before the token could be recognized.
    Eof,
}

impl<T> Scan<T> {
    pub fn status(&self) -> Status {
        match self {
            Scan::Ok(_) => Status::Ok,
            Scan::NotOk => Status::NotOk,
            Scan::Eof => Status::Eof,
        }
    }

    pub fn ok(self) -> Option<T> {
        match self {
            Scan::Ok(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Scan::Ok(_))
    }
}

// === Error types ===

/// Errors that abort parsing of a synctex file.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("bad argument: {0}")]
    BadArgument(&'static str),

    /// The stream ended in the middle of a construct that must be complete.
    #[error("unexpected end of file: {0}")]
    UnexpectedEof(&'static str),

    #[error("malformed synctex file: {0}")]
    Malformed(String),
}

impl ParseError {
    pub fn status(&self) -> Status {
        match self {
            ParseError::BadArgument(_) => Status::BadArgument,
            _ => Status::Error,
        }
    }
}

/// Errors reported by forward and backward queries.
///
/// A failed query always leaves the result cursor empty.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QueryError {
    #[error("the synctex file could not be parsed")]
    NotParsed,

    #[error("no tag for {0}")]
    UnknownInput(String),

    #[error("no sheet for page {0}")]
    UnknownPage(i32),

    #[error("invalid unit {0}")]
    InvalidUnit(f32),
}

/// Errors raised while locating or opening a synctex file.
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    #[error("no synctex file found for {0}")]
    NotFound(PathBuf),

    #[error("output file name has no usable stem: {0}")]
    BadOutputName(PathBuf),

    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

// === Geometry ===

/// Conversion from engine units to device units, resolved after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    /// Device units per engine unit.
    pub unit: f32,
    pub x_offset: f32,
    pub y_offset: f32,
}

/// A point in engine units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub h: i32,
    pub v: i32,
}
