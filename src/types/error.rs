use thiserror::Error;

use super::document::TermKind;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CompileError {
    #[error("invalid term definition '{tag}': {reason}")]
    InvalidTermDefinition { tag: String, reason: String },

    #[error("term '{tag}' uses unsupported kind '{kind}'")]
    UnsupportedTermKind { tag: String, kind: TermKind },

    #[error("logic tree references undefined term '{tag}'")]
    UnresolvedReference { tag: String },

    #[error("negation has nothing to negate: its subtree rendered no directive with an id")]
    EmptyNegation,
}

impl CompileError {
    pub(crate) fn invalid(tag: &str, reason: impl Into<String>) -> Self {
        CompileError::InvalidTermDefinition {
            tag: tag.to_owned(),
            reason: reason.into(),
        }
    }
}
