use std::fmt;

use super::directive::Conjunction;

/// The kind of a term, named after the element that defines it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermKind {
    Comparison,
    JoinDate,
    Activity,
    Message,
    MessageOpens,
    ClickActivity,
    MessageClicks,
}

impl TermKind {
    /// Kinds in the order a term's children are probed when it has several.
    pub const PROBE_ORDER: [TermKind; 7] = [
        TermKind::Comparison,
        TermKind::JoinDate,
        TermKind::Activity,
        TermKind::Message,
        TermKind::MessageOpens,
        TermKind::ClickActivity,
        TermKind::MessageClicks,
    ];

    #[must_use]
    pub fn element_name(self) -> &'static str {
        match self {
            TermKind::Comparison => "comparison",
            TermKind::JoinDate => "joindate",
            TermKind::Activity => "activity",
            TermKind::Message => "message",
            TermKind::MessageOpens => "messageopens",
            TermKind::ClickActivity => "clickactivity",
            TermKind::MessageClicks => "messageclicks",
        }
    }
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_name())
    }
}

/// Kind-specific parameters of a term, exactly as found in the document.
///
/// Sub-types and required fields are kept optional here; the term compiler
/// decides whether a definition is usable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TermBody {
    Comparison {
        op: Option<String>,
        field_id: Option<String>,
        constants: Vec<String>,
    },
    JoinDate {
        when: Option<String>,
        date: Option<String>,
    },
    Activity {
        what: Option<String>,
        days_back: Option<String>,
    },
    Message {
        what: Option<String>,
        message_id: Option<String>,
    },
    MessageOpens {
        what: Option<String>,
        message_id: Option<String>,
        frequency: Option<String>,
    },
    ClickActivity,
    MessageClicks,
    /// The term has no child element of any known kind.
    Unrecognized,
}

impl TermBody {
    #[must_use]
    pub fn kind(&self) -> Option<TermKind> {
        match self {
            TermBody::Comparison { .. } => Some(TermKind::Comparison),
            TermBody::JoinDate { .. } => Some(TermKind::JoinDate),
            TermBody::Activity { .. } => Some(TermKind::Activity),
            TermBody::Message { .. } => Some(TermKind::Message),
            TermBody::MessageOpens { .. } => Some(TermKind::MessageOpens),
            TermBody::ClickActivity => Some(TermKind::ClickActivity),
            TermBody::MessageClicks => Some(TermKind::MessageClicks),
            TermBody::Unrecognized => None,
        }
    }
}

/// A named, atomic audience condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermDefinition {
    pub tag: String,
    pub body: TermBody,
}

/// Boolean structure combining term references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicNode {
    Operand(String),
    Operator {
        conjunction: Conjunction,
        children: Vec<LogicNode>,
    },
    Group(Vec<LogicNode>),
    Not(Box<LogicNode>),
}

impl LogicNode {
    #[must_use]
    pub fn and(children: Vec<LogicNode>) -> Self {
        LogicNode::Operator {
            conjunction: Conjunction::And,
            children,
        }
    }

    #[must_use]
    pub fn or(children: Vec<LogicNode>) -> Self {
        LogicNode::Operator {
            conjunction: Conjunction::Or,
            children,
        }
    }

    #[must_use]
    pub fn group(children: Vec<LogicNode>) -> Self {
        LogicNode::Group(children)
    }

    #[must_use]
    pub fn negate(self) -> Self {
        LogicNode::Not(Box::new(self))
    }
}

#[must_use]
pub fn operand(tag: &str) -> LogicNode {
    LogicNode::Operand(tag.to_owned())
}

impl fmt::Display for LogicNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicNode::Operand(tag) => write!(f, "{tag}"),
            LogicNode::Operator {
                conjunction,
                children,
            } => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " {conjunction} ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str(")")
            }
            LogicNode::Group(children) => {
                f.write_str("[")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{child}")?;
                }
                f.write_str("]")
            }
            LogicNode::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}

/// A parsed rule document: term definitions in document order plus the
/// optional logic tree root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuleDocument {
    pub terms: Vec<TermDefinition>,
    pub logic: Option<LogicNode>,
}
