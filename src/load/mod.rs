mod document;
mod error;
mod grammar;
mod tree;

pub use error::{Diagnostic, MalformedDocument, Position};

use error::LineIndex;

use crate::RuleDocument;

/// Load raw rule markup into a [`RuleDocument`].
///
/// # Errors
///
/// Returns [`MalformedDocument`] carrying every diagnostic found if the
/// text is not well-formed or its terms and logic tree have the wrong
/// shape. No partial document is returned.
pub fn load(input: &str) -> Result<RuleDocument, MalformedDocument> {
    let lines = LineIndex::new(input);
    let root = tree::build(&lines)?;
    let mut diagnostics = Vec::new();
    let document = document::interpret(&root, &lines, &mut diagnostics);
    if diagnostics.is_empty() {
        tracing::debug!(
            terms = document.terms.len(),
            has_logic = document.logic.is_some(),
            "loaded rule document"
        );
        Ok(document)
    } else {
        Err(MalformedDocument::new(diagnostics))
    }
}
