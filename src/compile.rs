use std::collections::HashMap;

use crate::{
    CompileError, Directive, DirectiveSequence, DirectiveType, TermBody, TermDefinition, TermKind,
};

/// Compiled directive sequences keyed by term tag.
pub type TermLookup = HashMap<String, DirectiveSequence>;

/// Compile every term definition into its directive sequence.
///
/// A later definition with an already seen tag replaces the earlier one.
///
/// # Errors
///
/// Returns the first [`CompileError`] produced by a term; nothing is
/// returned for the terms that did compile.
pub fn compile_terms(terms: &[TermDefinition]) -> Result<TermLookup, CompileError> {
    let mut lookup = TermLookup::with_capacity(terms.len());
    for term in terms {
        let sequence = compile_term(term)?;
        tracing::trace!(tag = %term.tag, directives = sequence.len(), "compiled term");
        if lookup.insert(term.tag.clone(), sequence).is_some() {
            tracing::warn!(tag = %term.tag, "duplicate term tag, later definition wins");
        }
    }
    Ok(lookup)
}

/// Compile a single term definition.
///
/// # Errors
///
/// [`CompileError::UnsupportedTermKind`] for click-activity and
/// message-clicks terms, [`CompileError::InvalidTermDefinition`] for an
/// unknown kind, an unknown sub-type or a missing required field.
pub fn compile_term(term: &TermDefinition) -> Result<DirectiveSequence, CompileError> {
    let tag = term.tag.as_str();
    match &term.body {
        TermBody::Comparison {
            op,
            field_id,
            constants,
        } => comparison(tag, op.as_deref(), field_id.as_deref(), constants),
        TermBody::JoinDate { when, date } => join_date(tag, when.as_deref(), date.as_deref()),
        TermBody::Activity { what, days_back } => {
            activity(tag, what.as_deref(), days_back.as_deref())
        }
        TermBody::Message { what, message_id } => {
            message(tag, what.as_deref(), message_id.as_deref())
        }
        TermBody::MessageOpens {
            what,
            message_id,
            frequency,
        } => message_opens(
            tag,
            what.as_deref(),
            message_id.as_deref(),
            frequency.as_deref(),
        ),
        TermBody::ClickActivity => Err(unsupported(tag, TermKind::ClickActivity)),
        TermBody::MessageClicks => Err(unsupported(tag, TermKind::MessageClicks)),
        TermBody::Unrecognized => Err(CompileError::invalid(tag, "term has no known kind")),
    }
}

fn unsupported(tag: &str, kind: TermKind) -> CompileError {
    CompileError::UnsupportedTermKind {
        tag: tag.to_owned(),
        kind,
    }
}

/// A required field, emitted exactly as written. Blank counts as missing.
fn require<'a>(tag: &str, value: Option<&'a str>, what: &str) -> Result<&'a str, CompileError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CompileError::invalid(tag, format!("missing {what}"))),
    }
}

fn unknown_subtype(tag: &str, kind: TermKind, subtype: &str) -> CompileError {
    CompileError::invalid(tag, format!("unknown {kind} type '{subtype}'"))
}

fn extra(id: &str, content: impl Into<String>) -> Directive {
    Directive::new(DirectiveType::Extra, id).with_content(content)
}

fn comparison(
    tag: &str,
    op: Option<&str>,
    field_id: Option<&str>,
    constants: &[String],
) -> Result<DirectiveSequence, CompileError> {
    let op = require(tag, op, "comparison type")?;
    let id = require(tag, field_id, "field id")?;
    let d_id = format!("d-{id}");
    let constant = |n: usize| {
        constants
            .get(n)
            .map(String::as_str)
            .ok_or_else(|| CompileError::invalid(tag, format!("missing constant #{}", n + 1)))
    };
    let demographic =
        |value: &str| Directive::new(DirectiveType::Demographic, id).with_content(value);

    let rule = match op {
        "null" => vec![
            Directive::new(DirectiveType::Demographic, id),
            extra("blank", d_id),
        ],
        "any" => vec![
            Directive::new(DirectiveType::Demographic, id),
            extra("inverse", d_id),
        ],
        "equals" => vec![demographic(constant(0)?)],
        "between" => vec![
            demographic(constant(0)?),
            demographic(constant(1)?),
            extra("between", d_id),
        ],
        "lt" => vec![demographic(constant(0)?), extra("lessthan", d_id)],
        "gt" => vec![demographic(constant(0)?), extra("greaterthan", d_id)],
        "le" => vec![
            demographic(constant(0)?),
            extra("greaterthan", d_id.as_str()),
            extra("inverse", d_id),
        ],
        "ge" => vec![
            demographic(constant(0)?),
            extra("lessthan", d_id.as_str()),
            extra("inverse", d_id),
        ],
        other => return Err(unknown_subtype(tag, TermKind::Comparison, other)),
    };
    Ok(rule)
}

fn join_date(
    tag: &str,
    when: Option<&str>,
    date: Option<&str>,
) -> Result<DirectiveSequence, CompileError> {
    let when = require(tag, when, "join date type")?;
    let suffix = match when {
        "before" => "b",
        "after" => "a",
        other => return Err(unknown_subtype(tag, TermKind::JoinDate, other)),
    };
    let date = require(tag, date, "join date")?;
    Ok(vec![
        Directive::new(DirectiveType::Activity, "join").with_content(format!("{date}:{suffix}")),
    ])
}

fn activity(
    tag: &str,
    what: Option<&str>,
    days_back: Option<&str>,
) -> Result<DirectiveSequence, CompileError> {
    let what = require(tag, what, "activity type")?;
    let (action, inverted) = match what {
        "sent" => ("sent", false),
        "not sent" => ("sent", true),
        "clicked" => ("sentclicked", false),
        "not clicked" => ("sentclicked", true),
        other => return Err(unknown_subtype(tag, TermKind::Activity, other)),
    };
    let days = require(tag, days_back, "days back")?;

    let mut rule = vec![Directive::new(DirectiveType::Activity, "message").with_content(action)];
    if inverted {
        rule.push(extra("inverse", "message"));
    }
    rule.push(extra("days", "message").with_value(days));
    Ok(rule)
}

fn message(
    tag: &str,
    what: Option<&str>,
    message_id: Option<&str>,
) -> Result<DirectiveSequence, CompileError> {
    let what = require(tag, what, "message type")?;
    let (action, inverted) = match what {
        "sent" => ("sent", false),
        "not sent" => ("sent", true),
        "openedclicked" => ("openedclicked", false),
        "openednotclicked" => ("openedclicked", true),
        other => return Err(unknown_subtype(tag, TermKind::Message, other)),
    };
    let id = require(tag, message_id, "message id")?;

    let mut rule = vec![Directive::new(DirectiveType::Activity, id).with_content(action)];
    if inverted {
        rule.push(extra("inverse", format!("a-{id}")));
    }
    Ok(rule)
}

fn message_opens(
    tag: &str,
    what: Option<&str>,
    message_id: Option<&str>,
    frequency: Option<&str>,
) -> Result<DirectiveSequence, CompileError> {
    let what = require(tag, what, "message opens type")?;
    let inverted = match what {
        "at least" => false,
        "less than" => true,
        other => return Err(unknown_subtype(tag, TermKind::MessageOpens, other)),
    };
    let id = require(tag, message_id, "message id")?;
    let freq = require(tag, frequency, "open frequency")?;

    let mut rule = vec![Directive::new(DirectiveType::Activity, id).with_content("opened")];
    if inverted {
        rule.push(Directive::new(DirectiveType::Inverse, "opened").with_content(format!("a-{id}")));
    }
    rule.push(extra("opened", format!("a-{id}:{freq}")));
    Ok(rule)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comparison_term(op: &str, id: &str, constants: &[&str]) -> TermDefinition {
        TermDefinition {
            tag: "Operand0".into(),
            body: TermBody::Comparison {
                op: Some(op.into()),
                field_id: Some(id.into()),
                constants: constants.iter().map(|c| (*c).to_owned()).collect(),
            },
        }
    }

    fn render(seq: &[Directive]) -> Vec<String> {
        seq.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn comparison_null() {
        let seq = compile_term(&comparison_term("null", "12", &[])).unwrap();
        assert_eq!(
            render(&seq),
            [
                r#"<DATA type="demographic" id="12"/>"#,
                r#"<DATA type="extra" id="blank">d-12</DATA>"#,
            ]
        );
    }

    #[test]
    fn comparison_any() {
        let seq = compile_term(&comparison_term("any", "42", &[])).unwrap();
        assert_eq!(
            render(&seq),
            [
                r#"<DATA type="demographic" id="42"/>"#,
                r#"<DATA type="extra" id="inverse">d-42</DATA>"#,
            ]
        );
    }

    #[test]
    fn comparison_equals() {
        let seq = compile_term(&comparison_term("equals", "7", &["5"])).unwrap();
        assert_eq!(render(&seq), [r#"<DATA type="demographic" id="7">5</DATA>"#]);
    }

    #[test]
    fn comparison_between() {
        let seq = compile_term(&comparison_term("between", "3", &["10", "20"])).unwrap();
        assert_eq!(
            render(&seq),
            [
                r#"<DATA type="demographic" id="3">10</DATA>"#,
                r#"<DATA type="demographic" id="3">20</DATA>"#,
                r#"<DATA type="extra" id="between">d-3</DATA>"#,
            ]
        );
    }

    #[test]
    fn comparison_ordering_variants() {
        let cases = [
            ("lt", vec!["lessthan"]),
            ("gt", vec!["greaterthan"]),
            ("le", vec!["greaterthan", "inverse"]),
            ("ge", vec!["lessthan", "inverse"]),
        ];
        for (op, extras) in cases {
            let seq = compile_term(&comparison_term(op, "9", &["100"])).unwrap();
            assert_eq!(seq.len(), 1 + extras.len(), "failed for {op}");
            assert_eq!(seq[0].content(), Some("100"), "failed for {op}");
            for (directive, expected) in seq[1..].iter().zip(&extras) {
                assert_eq!(directive.kind(), DirectiveType::Extra);
                assert_eq!(directive.id(), Some(*expected), "failed for {op}");
                assert_eq!(directive.content(), Some("d-9"));
            }
        }
    }

    #[test]
    fn between_needs_two_constants() {
        let err = compile_term(&comparison_term("between", "3", &["10"])).unwrap_err();
        assert_eq!(err, CompileError::invalid("Operand0", "missing constant #2"));
    }

    #[test]
    fn comparison_missing_field_id() {
        let term = TermDefinition {
            tag: "Operand1".into(),
            body: TermBody::Comparison {
                op: Some("equals".into()),
                field_id: None,
                constants: vec!["1".into()],
            },
        };
        assert!(matches!(
            compile_term(&term),
            Err(CompileError::InvalidTermDefinition { tag, .. }) if tag == "Operand1"
        ));
    }

    #[test]
    fn comparison_unknown_type() {
        let err = compile_term(&comparison_term("like", "3", &["x"])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid term definition 'Operand0': unknown comparison type 'like'"
        );
    }

    #[test]
    fn join_date_before_and_after() {
        for (when, expected) in [("before", "2016-08-23:b"), ("after", "2016-08-23:a")] {
            let term = TermDefinition {
                tag: "t".into(),
                body: TermBody::JoinDate {
                    when: Some(when.into()),
                    date: Some("2016-08-23".into()),
                },
            };
            let seq = compile_term(&term).unwrap();
            assert_eq!(
                render(&seq),
                [format!(r#"<DATA type="activity" id="join">{expected}</DATA>"#)]
            );
        }
    }

    #[test]
    fn activity_not_clicked() {
        let term = TermDefinition {
            tag: "t".into(),
            body: TermBody::Activity {
                what: Some("not clicked".into()),
                days_back: Some("30".into()),
            },
        };
        assert_eq!(
            render(&compile_term(&term).unwrap()),
            [
                r#"<DATA type="activity" id="message">sentclicked</DATA>"#,
                r#"<DATA type="extra" id="inverse">message</DATA>"#,
                r#"<DATA type="extra" id="days" value="30">message</DATA>"#,
            ]
        );
    }

    fn activity_term(what: &str, days: &str) -> TermDefinition {
        TermDefinition {
            tag: "t".into(),
            body: TermBody::Activity {
                what: Some(what.into()),
                days_back: Some(days.into()),
            },
        }
    }

    fn message_term(what: &str, id: Option<&str>) -> TermDefinition {
        TermDefinition {
            tag: "t".into(),
            body: TermBody::Message {
                what: Some(what.into()),
                message_id: id.map(str::to_owned),
            },
        }
    }

    fn opens_term(what: &str, id: &str, frequency: Option<&str>) -> TermDefinition {
        TermDefinition {
            tag: "t".into(),
            body: TermBody::MessageOpens {
                what: Some(what.into()),
                message_id: Some(id.into()),
                frequency: frequency.map(str::to_owned),
            },
        }
    }

    #[test]
    fn activity_sent() {
        assert_eq!(
            render(&compile_term(&activity_term("sent", "14")).unwrap()),
            [
                r#"<DATA type="activity" id="message">sent</DATA>"#,
                r#"<DATA type="extra" id="days" value="14">message</DATA>"#,
            ]
        );
    }

    #[test]
    fn activity_clicked() {
        assert_eq!(
            render(&compile_term(&activity_term("clicked", "7")).unwrap()),
            [
                r#"<DATA type="activity" id="message">sentclicked</DATA>"#,
                r#"<DATA type="extra" id="days" value="7">message</DATA>"#,
            ]
        );
    }

    #[test]
    fn activity_not_sent() {
        assert_eq!(
            render(&compile_term(&activity_term("not sent", "30")).unwrap()),
            [
                r#"<DATA type="activity" id="message">sent</DATA>"#,
                r#"<DATA type="extra" id="inverse">message</DATA>"#,
                r#"<DATA type="extra" id="days" value="30">message</DATA>"#,
            ]
        );
    }

    #[test]
    fn activity_sent_without_days_is_invalid() {
        let term = TermDefinition {
            tag: "t".into(),
            body: TermBody::Activity {
                what: Some("sent".into()),
                days_back: None,
            },
        };
        assert_eq!(
            compile_term(&term),
            Err(CompileError::invalid("t", "missing days back"))
        );
    }

    #[test]
    fn message_sent() {
        assert_eq!(
            render(&compile_term(&message_term("sent", Some("527877"))).unwrap()),
            [r#"<DATA type="activity" id="527877">sent</DATA>"#]
        );
    }

    #[test]
    fn message_not_sent() {
        assert_eq!(
            render(&compile_term(&message_term("not sent", Some("527877"))).unwrap()),
            [
                r#"<DATA type="activity" id="527877">sent</DATA>"#,
                r#"<DATA type="extra" id="inverse">a-527877</DATA>"#,
            ]
        );
    }

    #[test]
    fn message_openedclicked() {
        assert_eq!(
            render(&compile_term(&message_term("openedclicked", Some("9"))).unwrap()),
            [r#"<DATA type="activity" id="9">openedclicked</DATA>"#]
        );
    }

    #[test]
    fn message_without_id_is_invalid() {
        assert_eq!(
            compile_term(&message_term("sent", None)),
            Err(CompileError::invalid("t", "missing message id"))
        );
    }

    #[test]
    fn message_opens_at_least() {
        assert_eq!(
            render(&compile_term(&opens_term("at least", "5", Some("3"))).unwrap()),
            [
                r#"<DATA type="activity" id="5">opened</DATA>"#,
                r#"<DATA type="extra" id="opened">a-5:3</DATA>"#,
            ]
        );
    }

    #[test]
    fn message_opens_without_frequency_is_invalid() {
        assert_eq!(
            compile_term(&opens_term("at least", "5", None)),
            Err(CompileError::invalid("t", "missing open frequency"))
        );
        assert_eq!(
            compile_term(&opens_term("less than", "5", Some(" "))),
            Err(CompileError::invalid("t", "missing open frequency"))
        );
    }

    #[test]
    fn field_values_are_emitted_as_written() {
        let seq = compile_term(&comparison_term("equals", " 7 ", &[" 5 "])).unwrap();
        assert_eq!(render(&seq), [r#"<DATA type="demographic" id=" 7 "> 5 </DATA>"#]);

        let seq = compile_term(&opens_term("at least", "5 ", Some(" 2"))).unwrap();
        assert_eq!(seq[1].content(), Some("a-5 : 2"));
    }

    #[test]
    fn message_openednotclicked() {
        let term = TermDefinition {
            tag: "t".into(),
            body: TermBody::Message {
                what: Some("openednotclicked".into()),
                message_id: Some("527877".into()),
            },
        };
        assert_eq!(
            render(&compile_term(&term).unwrap()),
            [
                r#"<DATA type="activity" id="527877">openedclicked</DATA>"#,
                r#"<DATA type="extra" id="inverse">a-527877</DATA>"#,
            ]
        );
    }

    #[test]
    fn message_opens_less_than() {
        let term = TermDefinition {
            tag: "t".into(),
            body: TermBody::MessageOpens {
                what: Some("less than".into()),
                message_id: Some("5".into()),
                frequency: Some("2".into()),
            },
        };
        assert_eq!(
            render(&compile_term(&term).unwrap()),
            [
                r#"<DATA type="activity" id="5">opened</DATA>"#,
                r#"<DATA type="inverse" id="opened">a-5</DATA>"#,
                r#"<DATA type="extra" id="opened">a-5:2</DATA>"#,
            ]
        );
    }

    #[test]
    fn unsupported_kinds_name_the_tag() {
        for (body, kind) in [
            (TermBody::ClickActivity, TermKind::ClickActivity),
            (TermBody::MessageClicks, TermKind::MessageClicks),
        ] {
            let term = TermDefinition {
                tag: "Operand4".into(),
                body,
            };
            assert_eq!(
                compile_term(&term),
                Err(CompileError::UnsupportedTermKind {
                    tag: "Operand4".into(),
                    kind,
                })
            );
        }
    }

    #[test]
    fn one_bad_term_aborts_all() {
        let terms = vec![
            comparison_term("equals", "1", &["a"]),
            TermDefinition {
                tag: "bad".into(),
                body: TermBody::Unrecognized,
            },
        ];
        assert!(matches!(
            compile_terms(&terms),
            Err(CompileError::InvalidTermDefinition { tag, .. }) if tag == "bad"
        ));
    }

    #[test]
    fn duplicate_tag_last_wins() {
        let terms = vec![
            comparison_term("equals", "1", &["first"]),
            comparison_term("equals", "1", &["second"]),
        ];
        let lookup = compile_terms(&terms).unwrap();
        assert_eq!(lookup.len(), 1);
        assert_eq!(lookup["Operand0"][0].content(), Some("second"));
    }
}
