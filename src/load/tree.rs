use super::error::{Diagnostic, LineIndex, MalformedDocument};
use super::grammar::{self, Attribute, Spanned, Token};

/// A parsed markup element. Text from all direct text children is
/// concatenated into `text`. `offset` is the byte offset of its start tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Element {
    pub(crate) name: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) children: Vec<Element>,
    pub(crate) text: String,
    pub(crate) offset: usize,
}

impl Element {
    pub(crate) fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub(crate) fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub(crate) fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Build the element tree of the indexed source, reporting every well-formedness
/// problem found.
pub(crate) fn build(lines: &LineIndex<'_>) -> Result<Element, MalformedDocument> {
    let mut diagnostics = Vec::new();
    let tokens = grammar::tokenize(lines, &mut diagnostics);
    let mut builder = TreeBuilder {
        lines,
        diagnostics,
        stack: Vec::new(),
        root: None,
    };
    for spanned in tokens {
        builder.push(spanned);
    }
    builder.finish()
}

struct TreeBuilder<'a, 's> {
    lines: &'a LineIndex<'s>,
    diagnostics: Vec<Diagnostic>,
    stack: Vec<Element>,
    root: Option<Element>,
}

impl TreeBuilder<'_, '_> {
    fn report(&mut self, offset: usize, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::new(self.lines.position(offset), message));
    }

    fn push(&mut self, Spanned { offset, token }: Spanned<'_>) {
        match token {
            Token::Open {
                name,
                attributes,
                self_closing,
            } => {
                let element = Element {
                    name: name.to_owned(),
                    attributes: self.attributes(offset, name, &attributes),
                    children: Vec::new(),
                    text: String::new(),
                    offset,
                };
                if self_closing {
                    self.attach(offset, element);
                } else {
                    self.stack.push(element);
                }
            }
            Token::Close(name) => self.close(offset, name),
            Token::Text(raw) => {
                let text = self.decode(offset, raw);
                self.append_text(offset, &text);
            }
            Token::CData(raw) => self.append_text(offset, raw),
            Token::Ignored => {}
        }
    }

    fn attributes(
        &mut self,
        offset: usize,
        element: &str,
        raw: &[Attribute<'_>],
    ) -> Vec<(String, String)> {
        let mut decoded: Vec<(String, String)> = Vec::with_capacity(raw.len());
        for attr in raw {
            if decoded.iter().any(|(n, _)| n == attr.name) {
                self.report(
                    offset,
                    format!("duplicate attribute '{}' on <{element}>", attr.name),
                );
                continue;
            }
            let value = self.decode(offset, attr.raw_value);
            decoded.push((attr.name.to_owned(), value));
        }
        decoded
    }

    fn append_text(&mut self, offset: usize, text: &str) {
        match self.stack.last_mut() {
            Some(open) => open.text.push_str(text),
            None if text.trim().is_empty() => {}
            None => self.report(offset, "text outside the root element"),
        }
    }

    fn close(&mut self, offset: usize, name: &str) {
        let Some(depth) = self.stack.iter().rposition(|e| e.name == name) else {
            self.report(offset, format!("unexpected closing tag </{name}>"));
            return;
        };
        while self.stack.len() > depth + 1 {
            if let Some(unclosed) = self.stack.pop() {
                self.report(
                    offset,
                    format!("element <{}> is closed by </{name}>", unclosed.name),
                );
                self.attach(offset, unclosed);
            }
        }
        if let Some(element) = self.stack.pop() {
            self.attach(offset, element);
        }
    }

    fn attach(&mut self, offset: usize, element: Element) {
        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(element);
        } else if self.root.is_some() {
            self.report(offset, format!("second root element <{}>", element.name));
        } else {
            self.root = Some(element);
        }
    }

    /// Replace predefined and numeric character references.
    fn decode(&mut self, offset: usize, raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;
        while let Some(amp) = rest.find('&') {
            out.push_str(&rest[..amp]);
            let after = &rest[amp + 1..];
            let Some(semi) = after.find(';') else {
                self.report(offset, "unterminated entity reference");
                rest = after;
                continue;
            };
            let entity = &after[..semi];
            match resolve_entity(entity) {
                Some(c) => out.push(c),
                None => self.report(offset, format!("undefined entity '&{entity};'")),
            }
            rest = &after[semi + 1..];
        }
        out.push_str(rest);
        out
    }

    fn finish(mut self) -> Result<Element, MalformedDocument> {
        let end = self.lines.source().len();
        while let Some(unclosed) = self.stack.pop() {
            self.report(end, format!("element <{}> is never closed", unclosed.name));
            self.attach(end, unclosed);
        }
        if self.root.is_none() {
            self.report(end, "document has no root element");
        }
        match self.root {
            Some(root) if self.diagnostics.is_empty() => Ok(root),
            _ => Err(MalformedDocument::new(self.diagnostics)),
        }
    }
}

fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = entity
                .strip_prefix("#x")
                .or_else(|| entity.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                entity.strip_prefix('#')?.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}
