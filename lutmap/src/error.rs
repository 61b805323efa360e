use std::io;

use thiserror::Error;

/// Errors from building a subject graph out of a file.
#[derive(Debug, Error)]
pub enum SbjError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    /// The AIGER reader rejected the input.
    #[error("malformed AIGER: {0}")]
    Aiger(String),
    /// A literal refers to a variable no record defines.
    #[error("variable {0} is used but never defined")]
    UndefinedVariable(usize),
    /// A record defines constant variable 0. Holds the kind of record.
    #[error("{0} defines constant variable 0")]
    ConstantDefinition(&'static str),
    /// Two records define the same variable.
    #[error("variable {0} is defined more than once")]
    Redefined(usize),
    /// A symbol names an input, output or latch past the end of its list.
    #[error("symbol table refers to {kind} {position}, which does not exist")]
    SymbolOutOfRange {
        /// `input`, `output` or `latch`.
        kind: &'static str,
        /// Position in the corresponding list.
        position: usize,
    },
    /// A symbol is not of the form `name` or `name[bit]`.
    #[error("malformed symbol `{0}`")]
    MalformedSymbol(String),
    /// Two symbols name the same bit of a port.
    #[error("port {0} has bit {1} more than once")]
    DuplicateBit(String, u32),
}

impl From<aiger::AigerError> for SbjError {
    fn from(err: aiger::AigerError) -> Self {
        Self::Aiger(format!("{:?}", err))
    }
}
