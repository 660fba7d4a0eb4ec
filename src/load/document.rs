use crate::{Conjunction, LogicNode, RuleDocument, TermBody, TermDefinition, TermKind};

use super::error::{Diagnostic, LineIndex};
use super::tree::Element;

/// Interpret an element tree as a rule document.
///
/// Direct `term` children of the root become term definitions, the first
/// `logic` child holds the logic tree. Problems are pushed onto
/// `diagnostics`; the returned document is only meaningful when none were.
pub(super) fn interpret(
    root: &Element,
    lines: &LineIndex<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> RuleDocument {
    let mut interpreter = Interpreter { lines, diagnostics };

    let terms = root
        .children_named("term")
        .filter_map(|term| interpreter.term_definition(term))
        .collect();

    let logic = root.child("logic").and_then(|logic| match logic.children.first() {
        Some(first) => interpreter.logic_node(first),
        None => {
            interpreter.report(logic, "<logic> has no child element");
            None
        }
    });

    RuleDocument { terms, logic }
}

struct Interpreter<'a, 's> {
    lines: &'a LineIndex<'s>,
    diagnostics: &'a mut Vec<Diagnostic>,
}

impl Interpreter<'_, '_> {
    fn report(&mut self, el: &Element, message: impl Into<String>) {
        self.diagnostics
            .push(Diagnostic::new(self.lines.position(el.offset), message));
    }

    fn term_definition(&mut self, term: &Element) -> Option<TermDefinition> {
        let Some(tag) = term.attribute("tag") else {
            self.report(term, "<term> without a 'tag' attribute");
            return None;
        };

        let body = TermKind::PROBE_ORDER
            .iter()
            .find_map(|&kind| term.child(kind.element_name()).map(|el| term_body(kind, el)))
            .unwrap_or(TermBody::Unrecognized);

        Some(TermDefinition {
            tag: tag.to_owned(),
            body,
        })
    }

    fn logic_node(&mut self, el: &Element) -> Option<LogicNode> {
        match el.name.as_str() {
            "operand" => match el.attribute("tagref") {
                Some(tag) => Some(LogicNode::Operand(tag.to_owned())),
                None => {
                    self.report(el, "<operand> without a 'tagref' attribute");
                    None
                }
            },
            "operator" => {
                let conjunction = match el.attribute("type") {
                    Some(t) => {
                        let parsed = Conjunction::parse(t);
                        if parsed.is_none() {
                            self.report(
                                el,
                                format!("<operator> type must be 'and' or 'or', found '{t}'"),
                            );
                        }
                        parsed
                    }
                    None => {
                        self.report(el, "<operator> without a 'type' attribute");
                        None
                    }
                };
                let children = self.logic_children(el);
                Some(LogicNode::Operator {
                    conjunction: conjunction?,
                    children: children?,
                })
            }
            "group" => self.logic_children(el).map(LogicNode::Group),
            "not" => match el.children.first() {
                Some(inner) => self.logic_node(inner).map(LogicNode::negate),
                None => {
                    self.report(el, "<not> has no child element");
                    None
                }
            },
            other => {
                self.report(el, format!("unknown logic element <{other}>"));
                None
            }
        }
    }

    /// Convert every child, reporting problems in all of them before giving up.
    fn logic_children(&mut self, el: &Element) -> Option<Vec<LogicNode>> {
        let converted: Vec<Option<LogicNode>> = el
            .children
            .iter()
            .map(|child| self.logic_node(child))
            .collect();
        converted.into_iter().collect()
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_owned)
}

fn term_body(kind: TermKind, el: &Element) -> TermBody {
    let subtype = owned(el.attribute("type"));
    let field = el.child("field");
    let field_attr = |name: &str| owned(field.and_then(|f| f.attribute(name)));

    match kind {
        TermKind::Comparison => TermBody::Comparison {
            op: subtype,
            field_id: field_attr("id"),
            constants: el.children_named("constant").map(|c| c.text.clone()).collect(),
        },
        TermKind::JoinDate => TermBody::JoinDate {
            when: subtype,
            date: owned(el.attribute("date")),
        },
        TermKind::Activity => TermBody::Activity {
            what: subtype,
            days_back: owned(el.attribute("daysback")),
        },
        TermKind::Message => TermBody::Message {
            what: subtype,
            message_id: field_attr("id"),
        },
        TermKind::MessageOpens => TermBody::MessageOpens {
            what: subtype,
            message_id: field_attr("id"),
            frequency: field_attr("frequency"),
        },
        TermKind::ClickActivity => TermBody::ClickActivity,
        TermKind::MessageClicks => TermBody::MessageClicks,
    }
}
