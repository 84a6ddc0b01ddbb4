use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::{LookupError, SubmissionError};

const SERVICE: &str = "NCBI assembly";

/// Resolves a free-text assembly or reference genome name to the set of
/// GenBank accessions it matches. The set may be empty, a singleton, or
/// larger; interpreting that is the caller's concern.
pub trait AssemblyClient: Send + Sync {
    fn resolve_accessions(&self, reference: &str) -> Result<BTreeSet<String>, LookupError>;
}

/// Collapse a resolved accession set into the single accession a reference
/// is expected to name.
pub fn unique_accession(
    reference: &str,
    accessions: BTreeSet<String>,
) -> Result<String, LookupError> {
    let mut iter = accessions.into_iter();
    match (iter.next(), iter.next()) {
        (None, _) => Err(LookupError::NotFound(reference.to_string())),
        (Some(only), None) => Ok(only),
        (Some(first), Some(second)) => Err(LookupError::Ambiguous {
            query: reference.to_string(),
            candidates: [first, second].into_iter().chain(iter).collect(),
        }),
    }
}

#[derive(Clone)]
pub struct NcbiAssemblyClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    genbank_accession: Regex,
}

impl NcbiAssemblyClient {
    pub fn new() -> Result<Self, SubmissionError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("submeta/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SubmissionError::AssemblyHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|err| SubmissionError::AssemblyHttp(err.to_string()))?;

        let api_key = std::env::var("NCBI_API_KEY")
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let genbank_accession = Regex::new(r"^GCA_[0-9]+\.[0-9]+$")
            .map_err(|err| SubmissionError::AssemblyHttp(err.to_string()))?;

        Ok(Self {
            client,
            base_url: "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string(),
            api_key,
            genbank_accession,
        })
    }

    fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, String> {
        let url = format!("{}/{endpoint}", self.base_url);
        let response = self.send_with_retries(|| {
            let mut request = self.client.get(&url).query(params).query(&[("retmode", "json")]);
            if let Some(api_key) = &self.api_key {
                request = request.query(&[("api_key", api_key.as_str())]);
            }
            request
        })?;
        if !response.status().is_success() {
            return Err(format!("status {}", response.status().as_u16()));
        }
        response.json().map_err(|err| err.to_string())
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

    fn service_unavailable(&self, reference: &str, reason: String) -> LookupError {
        LookupError::ServiceUnavailable {
            service: SERVICE.to_string(),
            query: reference.to_string(),
            reason,
        }
    }
}

impl AssemblyClient for NcbiAssemblyClient {
    fn resolve_accessions(&self, reference: &str) -> Result<BTreeSet<String>, LookupError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(LookupError::MalformedInput {
                input: reference.to_string(),
                reason: "reference name is empty".to_string(),
            });
        }

        let search = self
            .get_json("esearch.fcgi", &[("db", "assembly"), ("term", reference)])
            .map_err(|reason| self.service_unavailable(reference, reason))?;
        let ids = search_ids(&search);
        if ids.is_empty() {
            return Ok(BTreeSet::new());
        }

        let id_list = ids.join(",");
        let summary = self
            .get_json("esummary.fcgi", &[("db", "assembly"), ("id", &id_list)])
            .map_err(|reason| self.service_unavailable(reference, reason))?;
        Ok(genbank_accessions(&summary, &ids, &self.genbank_accession))
    }
}

fn search_ids(body: &Value) -> Vec<String> {
    body.get("esearchresult")
        .and_then(|result| result.get("idlist"))
        .and_then(|list| list.as_array())
        .map(|list| {
            list.iter()
                .filter_map(|id| id.as_str())
                .map(|id| id.to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Pull GenBank accessions out of an esummary document, one record per
/// search hit. Records without a well-formed GCA accession are skipped.
fn genbank_accessions(body: &Value, ids: &[String], pattern: &Regex) -> BTreeSet<String> {
    let mut accessions = BTreeSet::new();
    let Some(result) = body.get("result") else {
        return accessions;
    };
    for id in ids {
        let Some(record) = result.get(id.as_str()) else {
            continue;
        };
        let candidates = [
            record
                .get("synonym")
                .and_then(|synonym| synonym.get("genbank"))
                .and_then(|value| value.as_str()),
            record.get("assemblyaccession").and_then(|value| value.as_str()),
        ];
        for candidate in candidates.into_iter().flatten() {
            if pattern.is_match(candidate) {
                accessions.insert(candidate.to_string());
            }
        }
    }
    accessions
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
