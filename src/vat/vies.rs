//! EU VIES REST API client for VAT number validation.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::ExtractionConfig;
use crate::vat::registry::{RegistryAnswer, RegistryError, VatRegistry};

const VIES_URL: &str = "https://ec.europa.eu/taxation_customs/vies/rest-api/check-vat-number";

/// `userError` values that signal rate limiting rather than a verdict.
const RATE_LIMIT_SIGNALS: &[&str] = &["MS_MAX_CONCURRENT_REQ", "GLOBAL_MAX_CONCURRENT_REQ"];

/// VIES API request body.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViesRequest {
    country_code: String,
    vat_number: String,
}

/// VIES API response structure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ViesResponse {
    is_valid: Option<bool>,
    request_date: Option<String>,
    name: Option<String>,
    address: Option<String>,
    user_error: Option<String>,
}

/// Client for the public VIES service. No authentication is required.
pub struct ViesClient {
    http: reqwest::Client,
    url: String,
}

impl ViesClient {
    /// Build a client with the configured per-lookup timeout.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Transport` when the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: &ExtractionConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.registry_timeout_secs))
            .build()
            .map_err(|e| RegistryError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            url: VIES_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }
}

#[async_trait]
impl VatRegistry for ViesClient {
    async fn check(&self, country: &str, digits: &str) -> Result<RegistryAnswer, RegistryError> {
        let req = ViesRequest {
            country_code: country.to_uppercase(),
            vat_number: digits.to_string(),
        };

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RegistryError::Timeout
                } else {
                    RegistryError::Transport(e.to_string())
                }
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RegistryError::Status(status.as_u16()));
        }

        let body: ViesResponse = resp
            .json()
            .await
            .map_err(|e| RegistryError::Malformed(e.to_string()))?;

        if let Some(user_error) = body.user_error {
            if RATE_LIMIT_SIGNALS.contains(&user_error.as_str()) {
                return Err(RegistryError::RateLimited(user_error));
            }
            if user_error != "VALID" && user_error != "INVALID" {
                return Err(RegistryError::Malformed(user_error));
            }
        }

        let valid = body
            .is_valid
            .ok_or_else(|| RegistryError::Malformed("missing isValid field".into()))?;

        Ok(RegistryAnswer {
            valid,
            company_name: body.name.filter(|n| n != "---" && !n.is_empty()),
            company_address: body.address.filter(|a| a != "---" && !a.is_empty()),
            request_date: body.request_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Validity;
    use crate::vat::registry::validate_candidates;
    use crate::core::{VatExtractionMethod, VatNumberCandidate};
    use httpmock::prelude::*;

    fn client_for(server: &MockServer) -> ViesClient {
        ViesClient::new(&ExtractionConfig::default())
            .unwrap()
            .with_url(server.url("/check-vat-number"))
    }

    #[test]
    fn vies_url_is_https() {
        assert!(VIES_URL.starts_with("https://"));
    }

    #[test]
    fn request_serializes_camel_case() {
        let req = ViesRequest {
            country_code: "DE".into(),
            vat_number: "123456789".into(),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"countryCode\":\"DE\""));
        assert!(json.contains("\"vatNumber\":\"123456789\""));
    }

    #[tokio::test]
    async fn valid_answer_parsed() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/check-vat-number");
                then.status(200).json_body(serde_json::json!({
                    "isValid": true,
                    "requestDate": "2024-01-15",
                    "name": "ACME GMBH",
                    "address": "MUSTERSTR 1, 10115 BERLIN"
                }));
            })
            .await;

        let answer = client_for(&server).check("DE", "123456789").await.unwrap();
        mock.assert_async().await;
        assert!(answer.valid);
        assert_eq!(answer.company_name.as_deref(), Some("ACME GMBH"));
    }

    #[tokio::test]
    async fn placeholder_identity_fields_filtered() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(serde_json::json!({
                    "isValid": false,
                    "name": "---",
                    "address": ""
                }));
            })
            .await;

        let answer = client_for(&server).check("DE", "123456789").await.unwrap();
        assert!(!answer.valid);
        assert_eq!(answer.company_name, None);
        assert_eq!(answer.company_address, None);
    }

    #[tokio::test]
    async fn rate_limit_signal_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(200).json_body(serde_json::json!({
                    "isValid": null,
                    "userError": "MS_MAX_CONCURRENT_REQ"
                }));
            })
            .await;

        let err = client_for(&server).check("DE", "123456789").await.unwrap_err();
        assert!(matches!(err, RegistryError::RateLimited(_)));
    }

    #[tokio::test]
    async fn http_error_status_is_unknown_downstream() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST);
                then.status(503);
            })
            .await;

        let client = client_for(&server);
        let candidate = VatNumberCandidate {
            country_code: Some("DE".into()),
            digits: "123456789".into(),
            line_context: String::new(),
            line_number: 0,
            extraction_method: VatExtractionMethod::CountryPattern,
            relevance_score: 50,
        };
        let results = validate_candidates(&[candidate], &client).await;
        assert_eq!(results[0].valid, Validity::Unknown);
    }
}
