//! LinkedIn profile lookup via the RapidAPI-hosted profile endpoint.
//!
//! The response format belongs to the third party; it is deserialized
//! leniently (every field defaults) and flattened into [`LinkedInProfile`]
//! by a pure function so the mapping is testable without a network call.

use std::time::Duration;

use serde::Deserialize;

/// Default RapidAPI host for the profile endpoint.
const DEFAULT_API_HOST: &str = "linkedin-api8.p.rapidapi.com";

/// HTTP request timeout for a single profile lookup.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for profile lookup failures.
#[derive(Debug, thiserror::Error)]
pub enum LinkedInError {
    /// The underlying HTTP request failed (network, DNS, timeout, decode).
    #[error("Profile request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The profile API returned a non-2xx status code.
    #[error("Profile API returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Configuration for the LinkedIn profile client.
#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    /// RapidAPI key sent as `x-rapidapi-key`.
    pub api_key: String,
    /// RapidAPI host, also sent as `x-rapidapi-host`.
    pub api_host: String,
}

impl LinkedInConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `RAPIDAPI_KEY` is not set.
    ///
    /// | Variable        | Required | Default                       |
    /// |-----------------|----------|-------------------------------|
    /// | `RAPIDAPI_KEY`  | yes      | —                             |
    /// | `RAPIDAPI_HOST` | no       | `linkedin-api8.p.rapidapi.com`|
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("RAPIDAPI_KEY").ok()?;
        Some(Self {
            api_key,
            api_host: std::env::var("RAPIDAPI_HOST")
                .unwrap_or_else(|_| DEFAULT_API_HOST.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// The contact fields this service keeps from a profile lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkedInProfile {
    pub first_name: String,
    pub last_name: String,
    pub position: String,
    pub company_name: String,
    pub company_url: String,
    pub profile_picture: String,
}

/// Raw response envelope; every field is optional upstream.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileEnvelope {
    data: ProfileData,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProfileData {
    profile_picture: String,
    first_name: String,
    last_name: String,
    position: Vec<RawPosition>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPosition {
    title: String,
    #[serde(rename = "companyName")]
    company_name: String,
    #[serde(rename = "companyURL")]
    company_url: String,
}

/// Flatten the raw envelope: names and picture straight through, the
/// primary position is the first entry of the `position` array.
fn parse_profile(envelope: ProfileEnvelope) -> LinkedInProfile {
    let data = envelope.data;
    let primary = data.position.into_iter().next().unwrap_or_default();
    LinkedInProfile {
        first_name: data.first_name,
        last_name: data.last_name,
        position: primary.title,
        company_name: primary.company_name,
        company_url: primary.company_url,
        profile_picture: data.profile_picture,
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the profile lookup endpoint.
pub struct LinkedInClient {
    client: reqwest::Client,
    config: LinkedInConfig,
}

impl LinkedInClient {
    /// Create a client with a pre-configured request timeout.
    pub fn new(config: LinkedInConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, config }
    }

    /// Fetch and flatten the profile behind a (normalized) profile URL.
    pub async fn fetch_profile(
        &self,
        profile_url: &str,
    ) -> Result<LinkedInProfile, LinkedInError> {
        let endpoint = format!(
            "https://{}/get-profile-data-by-url",
            self.config.api_host
        );
        let response = self
            .client
            .get(endpoint)
            .query(&[("url", profile_url)])
            .header("x-rapidapi-key", &self.config.api_key)
            .header("x-rapidapi-host", &self.config.api_host)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LinkedInError::HttpStatus(response.status().as_u16()));
        }

        let envelope: ProfileEnvelope = response.json().await?;
        Ok(parse_profile(envelope))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: serde_json::Value) -> ProfileEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn full_profile_is_flattened() {
        let profile = parse_profile(envelope(serde_json::json!({
            "data": {
                "id": 12345,
                "firstName": "Ada",
                "lastName": "Lovelace",
                "profilePicture": "https://img.example.com/ada.jpg",
                "position": [
                    {
                        "title": "Engineer",
                        "companyName": "Analytical Engines",
                        "companyURL": "https://example.com"
                    },
                    { "title": "Advisor", "companyName": "Other Corp" }
                ]
            }
        })));
        assert_eq!(
            profile,
            LinkedInProfile {
                first_name: "Ada".into(),
                last_name: "Lovelace".into(),
                position: "Engineer".into(),
                company_name: "Analytical Engines".into(),
                company_url: "https://example.com".into(),
                profile_picture: "https://img.example.com/ada.jpg".into(),
            }
        );
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let profile = parse_profile(envelope(serde_json::json!({
            "data": { "firstName": "Ada" }
        })));
        assert_eq!(profile.first_name, "Ada");
        assert_eq!(profile.last_name, "");
        assert_eq!(profile.position, "");
        assert_eq!(profile.company_name, "");
    }

    #[test]
    fn empty_body_parses_to_default_profile() {
        let profile = parse_profile(envelope(serde_json::json!({})));
        assert_eq!(profile, LinkedInProfile::default());
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let profile = parse_profile(envelope(serde_json::json!({
            "data": {
                "firstName": "Ada",
                "headline": "ignored",
                "geo": { "city": "London" }
            }
        })));
        assert_eq!(profile.first_name, "Ada");
    }
}
