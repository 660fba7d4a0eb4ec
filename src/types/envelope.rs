/// Identifying metadata of the rule being fixed, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub site_id: u64,
    pub list_id: u64,
    pub rule_id: u64,
    pub rule_name: String,
}

impl Envelope {
    #[must_use]
    pub fn new(site_id: u64, list_id: u64, rule_id: u64, rule_name: impl Into<String>) -> Self {
        Self {
            site_id,
            list_id,
            rule_id,
            rule_name: rule_name.into(),
        }
    }
}
