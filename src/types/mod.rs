mod directive;
mod document;
mod envelope;
mod error;
mod payload;

pub use directive::{Conjunction, Directive, DirectiveSequence, DirectiveType};
pub use document::{LogicNode, RuleDocument, TermBody, TermDefinition, TermKind, operand};
pub use envelope::Envelope;
pub use error::CompileError;
pub use payload::Payload;
