use thiserror::Error;

use crate::Payload;

/// Errors raised while handing a payload to the filter-update endpoint.
/// Delivery is one-shot: nothing here is retried.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16, body: String },
}

impl DeliveryError {
    /// The endpoint's raw answer, when it sent one with a failure status.
    #[must_use]
    pub fn response_body(&self) -> Option<&str> {
        match self {
            DeliveryError::Status { body, .. } if !body.is_empty() => Some(body.as_str()),
            _ => None,
        }
    }
}

/// Form fields of one filter-update call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateRequest {
    input: String,
    key: String,
}

impl UpdateRequest {
    pub const TYPE: &'static str = "filter";
    pub const ACTIVITY: &'static str = "update";

    #[must_use]
    pub fn new(payload: &Payload, api_key: impl Into<String>) -> Self {
        Self {
            input: payload.to_string(),
            key: api_key.into(),
        }
    }

    /// The rendered `<DATASET>` document.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Name/value pairs in the order the endpoint expects them.
    #[must_use]
    pub fn form_fields(&self) -> [(&'static str, &str); 4] {
        [
            ("type", Self::TYPE),
            ("activity", Self::ACTIVITY),
            ("input", self.input.as_str()),
            ("key", self.key.as_str()),
        ]
    }
}

/// Receives finished update requests and returns the endpoint's raw answer.
pub trait Sink {
    /// # Errors
    ///
    /// Returns [`DeliveryError`] if the request could not be delivered.
    fn deliver(&self, request: &UpdateRequest) -> Result<String, DeliveryError>;
}

/// Posts update requests as an urlencoded form over HTTP(S).
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpSink {
    client: reqwest::blocking::Client,
    url: String,
}

#[cfg(feature = "http")]
impl HttpSink {
    /// Build a sink for the update URL and timeout of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &crate::Config) -> Result<Self, DeliveryError> {
        let url = config.update_url();
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| DeliveryError::Transport {
                url: url.clone(),
                source: Box::new(e),
            })?;
        Ok(Self { client, url })
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(feature = "http")]
impl Sink for HttpSink {
    fn deliver(&self, request: &UpdateRequest) -> Result<String, DeliveryError> {
        let transport = |e: reqwest::Error| DeliveryError::Transport {
            url: self.url.clone(),
            source: Box::new(e),
        };

        tracing::debug!(url = %self.url, bytes = request.input().len(), "posting filter update");
        let response = self
            .client
            .post(&self.url)
            .form(&request.form_fields())
            .send()
            .map_err(transport)?;

        let status = response.status();
        let body = response.text().map_err(transport)?;
        if !status.is_success() {
            return Err(DeliveryError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
                body,
            });
        }
        tracing::info!(url = %self.url, status = status.as_u16(), "filter update delivered");
        Ok(body)
    }
}
