use crate::{Directive, DirectiveSequence, DirectiveType, Envelope, Payload};

/// Number of envelope directives placed before the rule body.
pub(crate) const ENVELOPE_LEN: usize = 3;

/// Prefix the expanded rule body with the envelope directives.
#[must_use]
pub fn assemble(envelope: &Envelope, body: DirectiveSequence) -> Payload {
    let mut directives = Vec::with_capacity(ENVELOPE_LEN + body.len());
    directives.push(Directive::envelope(
        DirectiveType::Id,
        envelope.rule_id.to_string(),
    ));
    directives.push(Directive::envelope(
        DirectiveType::Name,
        envelope.rule_name.as_str(),
    ));
    directives.push(Directive::envelope(DirectiveType::SegmentValidation, "true"));
    directives.extend(body);

    tracing::info!(
        site_id = envelope.site_id,
        list_id = envelope.list_id,
        rule_id = envelope.rule_id,
        directives = directives.len() - ENVELOPE_LEN,
        "assembled update payload"
    );

    Payload {
        site_id: envelope.site_id,
        list_id: envelope.list_id,
        directives,
    }
}
