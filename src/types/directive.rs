use std::fmt;

/// The `type` attribute of a directive as understood by the filter service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveType {
    Demographic,
    Activity,
    Extra,
    Inverse,
    Id,
    Name,
    SegmentValidation,
}

impl DirectiveType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DirectiveType::Demographic => "demographic",
            DirectiveType::Activity => "activity",
            DirectiveType::Extra => "extra",
            DirectiveType::Inverse => "inverse",
            DirectiveType::Id => "id",
            DirectiveType::Name => "name",
            DirectiveType::SegmentValidation => "segment_validation",
        }
    }
}

impl fmt::Display for DirectiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Boolean conjunction joining a subtree to its previous sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Conjunction {
    And,
    Or,
}

impl Conjunction {
    /// Parse the lower- or mixed-case `type` attribute of an operator element.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s.eq_ignore_ascii_case("and") {
            Some(Conjunction::And)
        } else if s.eq_ignore_ascii_case("or") {
            Some(Conjunction::Or)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<DATA>` tag of the output stream.
///
/// `content` is the element text, `value` the optional `value="..."`
/// attribute (only the activity `days` directive uses it). `logic` and
/// `group` are positional annotations written onto the first directive of a
/// rendered subtree by the expander.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    kind: DirectiveType,
    id: Option<String>,
    value: Option<String>,
    content: Option<String>,
    logic: Option<Conjunction>,
    group: Option<u32>,
}

impl Directive {
    #[must_use]
    pub fn new(kind: DirectiveType, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: Some(id.into()),
            value: None,
            content: None,
            logic: None,
            group: None,
        }
    }

    /// An envelope directive: typed, with text content but no `id` attribute.
    #[must_use]
    pub fn envelope(kind: DirectiveType, content: impl Into<String>) -> Self {
        Self {
            kind,
            id: None,
            value: None,
            content: Some(content.into()),
            logic: None,
            group: None,
        }
    }

    #[must_use]
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn kind(&self) -> DirectiveType {
        self.kind
    }

    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    #[must_use]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    #[must_use]
    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }

    #[must_use]
    pub fn logic(&self) -> Option<Conjunction> {
        self.logic
    }

    #[must_use]
    pub fn group(&self) -> Option<u32> {
        self.group
    }

    pub(crate) fn set_logic(&mut self, logic: Conjunction) {
        self.logic = Some(logic);
    }

    pub(crate) fn set_group(&mut self, group: u32) {
        self.group = Some(group);
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<DATA type=\"{}\"", self.kind)?;
        if let Some(id) = &self.id {
            write!(f, " id=\"{}\"", Escaped(id))?;
        }
        if let Some(value) = &self.value {
            write!(f, " value=\"{}\"", Escaped(value))?;
        }
        // attribute order is fixed: type, id, value, group, logic
        if let Some(group) = self.group {
            write!(f, " group=\"{group}\"")?;
        }
        if let Some(logic) = self.logic {
            write!(f, " logic=\"{logic}\"")?;
        }
        match &self.content {
            Some(content) => write!(f, ">{}</DATA>", Escaped(content)),
            None => f.write_str("/>"),
        }
    }
}

/// Ordered directives rendered for one term or one logic-tree node.
pub type DirectiveSequence = Vec<Directive>;

/// Writes text with the five XML special characters replaced by entities.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.0;
        while let Some(pos) = rest.find(['&', '<', '>', '"', '\'']) {
            f.write_str(&rest[..pos])?;
            let entity = match rest.as_bytes()[pos] {
                b'&' => "&amp;",
                b'<' => "&lt;",
                b'>' => "&gt;",
                b'"' => "&quot;",
                _ => "&apos;",
            };
            f.write_str(entity)?;
            rest = &rest[pos + 1..];
        }
        f.write_str(rest)
    }
}
