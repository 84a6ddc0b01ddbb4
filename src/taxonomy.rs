use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::{LookupError, SubmissionError};

const SERVICE: &str = "Ensembl taxonomy";

/// Resolves a taxonomy id to its authoritative scientific name.
pub trait TaxonomyClient: Send + Sync {
    fn scientific_name(&self, taxid: u32) -> Result<String, LookupError>;
}

#[derive(Clone)]
pub struct EnsemblTaxonomyClient {
    client: Client,
    base_url: String,
}

impl EnsemblTaxonomyClient {
    pub fn new() -> Result<Self, SubmissionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("submeta/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SubmissionError::TaxonomyHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| SubmissionError::TaxonomyHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: "https://rest.ensembl.org".to_string(),
        })
    }

    fn send_with_retries<F>(&self, mut make_req: F) -> Result<reqwest::blocking::Response, String>
    where
        F: FnMut() -> reqwest::blocking::RequestBuilder,
    {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 200;
        let mut attempt = 0usize;
        loop {
            let response = make_req().send();
            match response {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        std::thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                        std::thread::sleep(Duration::from_millis(delay));
                        attempt += 1;
                        continue;
                    }
                    return Err(err.to_string());
                }
            }
        }
    }
}

impl TaxonomyClient for EnsemblTaxonomyClient {
    fn scientific_name(&self, taxid: u32) -> Result<String, LookupError> {
        if taxid == 0 {
            return Err(LookupError::MalformedInput {
                input: taxid.to_string(),
                reason: "taxonomy id must be a positive integer".to_string(),
            });
        }
        let url = format!("{}/taxonomy/id/{taxid}", self.base_url);
        let response = self
            .send_with_retries(|| {
                self.client
                    .get(&url)
                    .query(&[("content-type", "application/json")])
            })
            .map_err(|reason| LookupError::ServiceUnavailable {
                service: SERVICE.to_string(),
                query: taxid.to_string(),
                reason,
            })?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Err(LookupError::NotFound(format!("taxonomy id {taxid}")));
        }
        if status.as_u16() == 400 {
            return Err(LookupError::MalformedInput {
                input: taxid.to_string(),
                reason: "rejected by the taxonomy service".to_string(),
            });
        }
        if !status.is_success() {
            return Err(LookupError::ServiceUnavailable {
                service: SERVICE.to_string(),
                query: taxid.to_string(),
                reason: format!("status {}", status.as_u16()),
            });
        }

        let body: Value = response
            .json()
            .map_err(|err| LookupError::ServiceUnavailable {
                service: SERVICE.to_string(),
                query: taxid.to_string(),
                reason: err.to_string(),
            })?;
        body.get("scientific_name")
            .and_then(|value| value.as_str())
            .map(|name| name.to_string())
            .ok_or_else(|| LookupError::NotFound(format!("taxonomy id {taxid}")))
    }
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
