use winnow::ascii::{multispace0, multispace1};
use winnow::combinator::{alt, cut_err, delimited, preceded, repeat, terminated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{one_of, take_till, take_until, take_while};

use super::error::{Diagnostic, LineIndex};

/// An attribute exactly as written, entities still encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Attribute<'i> {
    pub(super) name: &'i str,
    pub(super) raw_value: &'i str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Token<'i> {
    Open {
        name: &'i str,
        attributes: Vec<Attribute<'i>>,
        self_closing: bool,
    },
    Close(&'i str),
    Text(&'i str),
    CData(&'i str),
    /// Comments, processing instructions and the doctype line.
    Ignored,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Spanned<'i> {
    pub(super) offset: usize,
    pub(super) token: Token<'i>,
}

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

// -- Names & attributes -----------------------------------------------------

fn name<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        one_of(|c: char| c.is_alphabetic() || c == '_' || c == ':'),
        take_while(0.., |c: char| {
            c.is_alphanumeric() || matches!(c, '_' | ':' | '-' | '.')
        }),
    )
        .take()
        .parse_next(input)
}

fn quoted<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    alt((
        delimited('"', take_till(0.., ['"', '<']), '"'),
        delimited('\'', take_till(0.., ['\'', '<']), '\''),
    ))
    .parse_next(input)
}

fn attribute<'i>(input: &mut &'i str) -> ModalResult<Attribute<'i>> {
    let name = name.parse_next(input)?;
    cut_err((multispace0, '=', multispace0))
        .context(expected("'=' after attribute name"))
        .parse_next(input)?;
    let raw_value = cut_err(quoted)
        .context(expected("quoted attribute value"))
        .parse_next(input)?;
    Ok(Attribute { name, raw_value })
}

// -- Tags -------------------------------------------------------------------

fn start_tag<'i>(input: &mut &'i str) -> ModalResult<Token<'i>> {
    let name = preceded('<', name).parse_next(input)?;
    let attributes: Vec<Attribute<'i>> =
        repeat(0.., preceded(multispace1, attribute)).parse_next(input)?;
    multispace0.parse_next(input)?;
    let self_closing = cut_err(alt(("/>".value(true), ">".value(false))))
        .context(expected("'>' or '/>' closing the start tag"))
        .parse_next(input)?;
    Ok(Token::Open {
        name,
        attributes,
        self_closing,
    })
}

fn end_tag<'i>(input: &mut &'i str) -> ModalResult<Token<'i>> {
    "</".parse_next(input)?;
    let name = cut_err(terminated(name, (multispace0, '>')))
        .context(expected("element name and '>' in end tag"))
        .parse_next(input)?;
    Ok(Token::Close(name))
}

fn comment(input: &mut &str) -> ModalResult<()> {
    "<!--".parse_next(input)?;
    cut_err(terminated(take_until(0.., "-->"), "-->"))
        .context(expected("'-->' closing the comment"))
        .void()
        .parse_next(input)
}

fn cdata<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    "<![CDATA[".parse_next(input)?;
    cut_err(terminated(take_until(0.., "]]>"), "]]>"))
        .context(expected("']]>' closing the CDATA section"))
        .parse_next(input)
}

fn processing_instruction(input: &mut &str) -> ModalResult<()> {
    "<?".parse_next(input)?;
    cut_err(terminated(take_until(0.., "?>"), "?>"))
        .context(expected("'?>' closing the processing instruction"))
        .void()
        .parse_next(input)
}

fn doctype(input: &mut &str) -> ModalResult<()> {
    "<!DOCTYPE".parse_next(input)?;
    cut_err(terminated(take_till(0.., '>'), '>'))
        .context(expected("'>' closing the doctype"))
        .void()
        .parse_next(input)
}

fn text<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    take_till(1.., '<').parse_next(input)
}

fn token<'i>(input: &mut &'i str) -> ModalResult<Token<'i>> {
    alt((
        comment.value(Token::Ignored),
        cdata.map(Token::CData),
        doctype.value(Token::Ignored),
        processing_instruction.value(Token::Ignored),
        end_tag,
        start_tag,
        text.map(Token::Text),
    ))
    .context(expected("markup"))
    .parse_next(input)
}

// -- Top-level tokenizer ----------------------------------------------------

/// Split `source` into tokens. A token that fails to parse is reported and
/// skipped up to the next `<`, so one bad tag does not hide later problems.
pub(super) fn tokenize<'i>(
    lines: &LineIndex<'i>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Spanned<'i>> {
    let source = lines.source();
    let mut tokens = Vec::new();
    let mut input = source;

    while !input.is_empty() {
        let start = input;
        let offset = source.len() - start.len();
        match token.parse_next(&mut input) {
            Ok(token) => tokens.push(Spanned { offset, token }),
            Err(err) => {
                let failed_at = source.len() - input.len();
                diagnostics.push(Diagnostic::new(
                    lines.position(failed_at.max(offset)),
                    describe(&err),
                ));
                // Every token that can fail starts with '<'.
                let rest = start.get(1..).unwrap_or_default();
                input = rest.find('<').map_or("", |pos| &rest[pos..]);
            }
        }
    }

    tokens
}

fn describe(err: &ErrMode<winnow::error::ContextError>) -> String {
    let message = match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => e.to_string(),
        ErrMode::Incomplete(_) => String::new(),
    };
    let message = message.replace('\n', "; ");
    if message.is_empty() {
        "invalid markup".to_owned()
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> (Vec<Token<'_>>, Vec<Diagnostic>) {
        let mut diagnostics = Vec::new();
        let tokens = tokenize(&LineIndex::new(src), &mut diagnostics)
            .into_iter()
            .map(|s| s.token)
            .collect();
        (tokens, diagnostics)
    }

    #[test]
    fn start_tag_with_attributes() {
        let (toks, diags) = tokens(r#"<term tag="Operand0" x='1'>"#);
        assert!(diags.is_empty());
        assert_eq!(
            toks,
            [Token::Open {
                name: "term",
                attributes: vec![
                    Attribute {
                        name: "tag",
                        raw_value: "Operand0"
                    },
                    Attribute {
                        name: "x",
                        raw_value: "1"
                    },
                ],
                self_closing: false,
            }]
        );
    }

    #[test]
    fn self_closing_tag_with_trailing_space() {
        let (toks, diags) = tokens(r#"<field id="7" />"#);
        assert!(diags.is_empty());
        assert!(matches!(
            &toks[0],
            Token::Open { name: "field", self_closing: true, attributes } if attributes.len() == 1
        ));
    }

    #[test]
    fn text_end_tag_and_ignored() {
        let (toks, diags) =
            tokens("<?xml version=\"1.0\"?><!-- note --><constant>5</constant><![CDATA[a<b]]>");
        assert!(diags.is_empty());
        assert_eq!(
            toks,
            [
                Token::Ignored,
                Token::Ignored,
                Token::Open {
                    name: "constant",
                    attributes: vec![],
                    self_closing: false
                },
                Token::Text("5"),
                Token::Close("constant"),
                Token::CData("a<b"),
            ]
        );
    }

    #[test]
    fn unquoted_attribute_is_reported_and_skipped() {
        let (toks, diags) = tokens("<a x=1><b/></a>");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].position.line, 1);
        assert!(diags[0].message.contains("quoted attribute value"));
        assert_eq!(
            toks,
            [
                Token::Open {
                    name: "b",
                    attributes: vec![],
                    self_closing: true
                },
                Token::Close("a"),
            ]
        );
    }

    #[test]
    fn several_errors_are_all_collected() {
        let (_, diags) = tokens("<a x=1>\n<b y=2>\n<!-- open");
        assert_eq!(diags.len(), 3);
        assert_eq!(diags[1].position.line, 2);
        assert_eq!(diags[2].position.line, 3);
    }
}
