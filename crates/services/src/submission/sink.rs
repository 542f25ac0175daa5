use async_trait::async_trait;
use reqwest::{Client, Url, header};

use crate::error::SubmissionError;

use super::assembler::SubmissionPayload;

/// Destination of finished submissions.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    /// Deliver one payload. Success means the sink accepted it.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionError` when the payload was not accepted.
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmissionError>;
}

/// Posts JSON to a form-collection endpoint; any 2xx status is success.
#[derive(Clone)]
pub struct HttpSubmissionSink {
    client: Client,
    endpoint: Url,
}

impl HttpSubmissionSink {
    #[must_use]
    pub fn new(endpoint: Url) -> Self {
        Self {
            client: Client::new(),
            endpoint,
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SubmissionSink for HttpSubmissionSink {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmissionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(header::ACCEPT, "application/json")
            .json(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SubmissionError::HttpStatus(response.status()));
        }
        Ok(())
    }
}
