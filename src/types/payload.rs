use std::fmt;

use super::directive::Directive;
use super::envelope::Envelope;
use super::error::CompileError;

/// The finished update document handed to a delivery sink.
///
/// `directives` starts with the three envelope directives (`id`, `name`,
/// `segment_validation`) followed by the expanded rule directives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub(crate) site_id: u64,
    pub(crate) list_id: u64,
    pub(crate) directives: Vec<Directive>,
}

impl Payload {
    /// Load, compile, expand and assemble one raw rule document.
    ///
    /// # Errors
    ///
    /// Returns [`SegfixError`](crate::SegfixError) if the document is
    /// malformed or any term or reference fails to compile.
    pub fn compile(raw: &str, envelope: &Envelope) -> Result<Self, crate::SegfixError> {
        let document = crate::load::load(raw)?;
        Ok(Self::from_document(&document, envelope)?)
    }

    /// Compile an already loaded document.
    ///
    /// # Errors
    ///
    /// Returns [`CompileError`] on the first term or reference that fails.
    pub fn from_document(
        document: &super::RuleDocument,
        envelope: &Envelope,
    ) -> Result<Self, CompileError> {
        let lookup = crate::compile::compile_terms(&document.terms)?;
        let body = match &document.logic {
            Some(root) => crate::expand::expand(root, &lookup)?,
            None => {
                tracing::warn!(rule_id = envelope.rule_id, "rule document has no logic tree");
                Vec::new()
            }
        };
        Ok(crate::assemble::assemble(envelope, body))
    }

    /// Read a rule document from a file and compile it.
    ///
    /// # Errors
    ///
    /// Returns [`SegfixError`](crate::SegfixError) on I/O, load or compile failure.
    pub fn from_file(
        path: impl AsRef<std::path::Path>,
        envelope: &Envelope,
    ) -> Result<Self, crate::SegfixError> {
        let raw = std::fs::read_to_string(path)?;
        Self::compile(&raw, envelope)
    }

    #[must_use]
    pub fn site_id(&self) -> u64 {
        self.site_id
    }

    #[must_use]
    pub fn list_id(&self) -> u64 {
        self.list_id
    }

    /// All directives, envelope first.
    #[must_use]
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// The expanded rule directives without the envelope.
    #[must_use]
    pub fn rule_directives(&self) -> &[Directive] {
        self.directives
            .get(crate::assemble::ENVELOPE_LEN..)
            .unwrap_or_default()
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "<DATASET>")?;
        writeln!(f, "<SITE_ID>{}</SITE_ID>", self.site_id)?;
        writeln!(f, "<MLID>{}</MLID>", self.list_id)?;
        for directive in &self.directives {
            writeln!(f, "{directive}")?;
        }
        write!(f, "</DATASET>")
    }
}
