//! Line-tagged diagnostics and fatal parse errors shared by the OBJ and MTL parsers.

use std::fmt;

use thiserror::Error;

/// Why a single directive was rejected. The rest of the document still parses.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum LineError {
    #[error("malformed number '{token}'")]
    MalformedNumber { token: String },

    #[error("not enough values (found {found}, expected {expected})")]
    NotEnoughData { found: usize, expected: usize },

    #[error("too many values (found {found}, expected {expected})")]
    TooManyValues { found: usize, expected: usize },

    #[error("unknown keyword")]
    UnknownKeyword,

    #[error("face needs at least 3 vertices, found {found}")]
    DegenerateFace { found: usize },

    #[error("malformed face vertex '{token}'")]
    InvalidFaceVertex { token: String },

    #[error("indices are 1-based; found 0")]
    InvalidIndex,

    #[error("index {index} out of bounds (len={len})")]
    IndexOutOfRange { index: i64, len: usize },

    #[error("property set before any newmtl")]
    PropertyBeforeMaterial,

    #[error("missing name")]
    MissingName,
}

/// A rejected directive together with where it was found.
#[derive(Clone, Debug, PartialEq)]
pub struct Diagnostic {
    /// 1-based line number in the parsed text.
    pub line: usize,
    pub keyword: String,
    pub error: LineError,
}

impl Diagnostic {
    pub fn new(line: usize, keyword: &str, error: LineError) -> Self {
        Self {
            line,
            keyword: keyword.to_owned(),
            error,
        }
    }

    /// Unknown keywords are informational; everything else dropped data.
    pub fn is_unknown_keyword(&self) -> bool {
        matches!(self.error, LineError::UnknownKeyword)
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} ({}): {}", self.line, self.keyword, self.error)
    }
}

/// Attribute pool a face index points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pool {
    Position,
    TexCoord,
    Normal,
}

impl fmt::Display for Pool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Pool::Position => "position",
            Pool::TexCoord => "texcoord",
            Pool::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// Errors that abort the whole parse.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("line {line}: face references the {pool} pool, which is empty")]
    EmptyPool { line: usize, pool: Pool },

    #[error("strict mode: {0}")]
    Strict(Diagnostic),
}

pub type ParseResult<T> = Result<T, ParseError>;

/// Per-call diagnostic sink; logs as it collects.
#[derive(Debug, Default)]
pub(crate) struct Diagnostics {
    strict: bool,
    collected: Vec<Diagnostic>,
}

impl Diagnostics {
    pub(crate) fn new(strict: bool) -> Self {
        Self {
            strict,
            collected: Vec::new(),
        }
    }

    /// Records a diagnostic. In strict mode anything but an unknown keyword is fatal.
    pub(crate) fn report(&mut self, diagnostic: Diagnostic) -> ParseResult<()> {
        if diagnostic.is_unknown_keyword() {
            log::debug!("Skipping {}", diagnostic);
        } else {
            log::warn!("Rejected {}", diagnostic);
            if self.strict {
                return Err(ParseError::Strict(diagnostic));
            }
        }
        self.collected.push(diagnostic);
        Ok(())
    }

    pub(crate) fn into_vec(self) -> Vec<Diagnostic> {
        self.collected
    }
}
