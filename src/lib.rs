mod assemble;
mod compile;
pub mod config;
pub mod deliver;
mod error;
mod expand;
mod fix;
pub mod load;
mod types;

pub use assemble::assemble;
pub use compile::{TermLookup, compile_term, compile_terms};
pub use config::Config;
pub use error::SegfixError;
pub use expand::expand;
pub use fix::{ALREADY_FIXED_MARKER, Outcome, fix, is_already_fixed};
pub use types::{
    CompileError, Conjunction, Directive, DirectiveSequence, DirectiveType, Envelope, LogicNode,
    Payload, RuleDocument, TermBody, TermDefinition, TermKind, operand,
};
