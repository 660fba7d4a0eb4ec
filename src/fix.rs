use crate::deliver::{Sink, UpdateRequest};
use crate::{Envelope, Payload, SegfixError};

/// Stored rule text marking a rule whose logic no longer needs fixing.
pub const ALREADY_FIXED_MARKER: &str = "NULL";

/// Result of [`fix()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The stored rule text was the already-fixed marker; nothing was sent.
    AlreadyFixed,
    /// The payload was delivered; `response` is the endpoint's raw answer.
    Delivered { payload: Payload, response: String },
}

/// Returns `true` if `raw` is the already-fixed marker.
#[must_use]
pub fn is_already_fixed(raw: &str) -> bool {
    raw.trim() == ALREADY_FIXED_MARKER
}

/// Compile one stored rule and deliver it through `sink`.
///
/// # Errors
///
/// Returns [`SegfixError`] if the rule fails to load or compile, in which
/// case nothing is delivered, or if delivery fails.
pub fn fix<S: Sink + ?Sized>(
    raw: &str,
    envelope: &Envelope,
    api_key: &str,
    sink: &S,
) -> Result<Outcome, SegfixError> {
    if is_already_fixed(raw) {
        tracing::info!(
            rule_id = envelope.rule_id,
            rule_name = %envelope.rule_name,
            "rule already fixed, nothing to do"
        );
        return Ok(Outcome::AlreadyFixed);
    }

    let payload = Payload::compile(raw, envelope)?;
    let response = sink.deliver(&UpdateRequest::new(&payload, api_key))?;
    Ok(Outcome::Delivered { payload, response })
}
