use crate::compile::TermLookup;
use crate::{CompileError, Directive, DirectiveSequence, DirectiveType, LogicNode};

/// Group numbering for one expansion.
///
/// Starts below zero so the first group entered (normally the implicit
/// outermost parenthesis of the rule) gets depth 0 and stays unannotated.
/// Every later group takes the next number, whatever its nesting level.
#[derive(Debug)]
struct GroupCounter {
    depth: i64,
}

impl GroupCounter {
    fn new() -> Self {
        Self { depth: -1 }
    }

    fn enter(&mut self) {
        self.depth += 1;
    }

    fn annotation(&self) -> Option<u32> {
        u32::try_from(self.depth).ok().filter(|&d| d > 0)
    }
}

/// Expand a logic tree into one flat directive sequence, substituting each
/// operand with the compiled sequence of the term it references.
///
/// # Errors
///
/// [`CompileError::UnresolvedReference`] if an operand names a tag missing
/// from `lookup`, [`CompileError::EmptyNegation`] if a negated subtree
/// renders nothing to negate.
pub fn expand(root: &LogicNode, lookup: &TermLookup) -> Result<DirectiveSequence, CompileError> {
    let mut groups = GroupCounter::new();
    expand_node(root, lookup, &mut groups)
}

fn expand_node(
    node: &LogicNode,
    lookup: &TermLookup,
    groups: &mut GroupCounter,
) -> Result<DirectiveSequence, CompileError> {
    match node {
        LogicNode::Operand(tag) => {
            tracing::debug!(%tag, "operand");
            // Cloned: annotations below must not leak into other references
            // to the same term.
            lookup
                .get(tag)
                .cloned()
                .ok_or_else(|| CompileError::UnresolvedReference { tag: tag.clone() })
        }
        LogicNode::Operator {
            conjunction,
            children,
        } => {
            tracing::debug!(%conjunction, children = children.len(), "operator");
            let mut rule = Vec::new();
            for (i, child) in children.iter().enumerate() {
                let mut part = expand_node(child, lookup, groups)?;
                if i > 0 {
                    if let Some(first) = part.first_mut() {
                        first.set_logic(*conjunction);
                    }
                }
                rule.append(&mut part);
            }
            Ok(rule)
        }
        LogicNode::Group(children) => {
            groups.enter();
            tracing::debug!(depth = groups.depth, "group");
            let mut rule = Vec::new();
            for child in children {
                rule.append(&mut expand_node(child, lookup, groups)?);
            }
            // Depth is read after the children have been expanded, so an outer
            // group reports the latest number handed out inside it. A number
            // already written by an inner group is kept.
            if let (Some(depth), Some(first)) = (groups.annotation(), rule.first_mut()) {
                if first.group().is_none() {
                    first.set_group(depth);
                }
            }
            Ok(rule)
        }
        LogicNode::Not(inner) => {
            let mut rule = expand_node(inner, lookup, groups)?;
            let id = rule
                .first()
                .and_then(Directive::id)
                .ok_or(CompileError::EmptyNegation)?
                .to_owned();
            tracing::debug!(%id, "not");
            rule.push(
                Directive::new(DirectiveType::Extra, "inverse").with_content(format!("d-{id}")),
            );
            Ok(rule)
        }
    }
}
