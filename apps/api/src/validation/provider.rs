//! Third-party verification providers. When a provider is keyed, its answer
//! replaces the self-computed confidence entirely.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

const ZEROBOUNCE_BASE_URL: &str = "https://api.zerobounce.net/v2";
const HUNTER_BASE_URL: &str = "https://api.hunter.io/v2";

/// A provider's answer, mapped onto the shared verdict vocabulary
/// (`valid | invalid | risky | unknown`).
#[derive(Debug, Clone)]
pub struct ProviderVerdict {
    pub provider: &'static str,
    pub verdict: &'static str,
    pub confidence: f64,
    pub raw_status: String,
}

#[derive(Debug, Deserialize)]
struct ZeroBounceResponse {
    status: String,
}

/// ZeroBounce `GET /v2/validate`. A "valid" status is high confidence;
/// anything else is treated as invalid.
pub async fn zerobounce_check(
    http: &reqwest::Client,
    api_key: &str,
    email: &str,
) -> Result<ProviderVerdict> {
    let response = http
        .get(format!("{ZEROBOUNCE_BASE_URL}/validate"))
        .query(&[("api_key", api_key), ("email", email)])
        .send()
        .await
        .context("ZeroBounce request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!("ZeroBounce returned {}", response.status()));
    }

    let body: ZeroBounceResponse = response
        .json()
        .await
        .context("ZeroBounce response was not valid JSON")?;

    let (verdict, confidence) = if body.status == "valid" {
        ("valid", 0.9)
    } else {
        ("invalid", 0.1)
    };

    Ok(ProviderVerdict {
        provider: "zerobounce",
        verdict,
        confidence,
        raw_status: body.status,
    })
}

#[derive(Debug, Deserialize)]
struct HunterResponse {
    data: HunterData,
}

#[derive(Debug, Deserialize)]
struct HunterData {
    result: String,
    score: f64,
}

/// Hunter `GET /v2/email-verifier`. Hunter's result vocabulary maps
/// directly: deliverable → valid, undeliverable → invalid, risky and
/// unknown pass through. Confidence is Hunter's 0–100 score scaled down.
pub async fn hunter_check(
    http: &reqwest::Client,
    api_key: &str,
    email: &str,
) -> Result<ProviderVerdict> {
    let response = http
        .get(format!("{HUNTER_BASE_URL}/email-verifier"))
        .query(&[("email", email), ("api_key", api_key)])
        .send()
        .await
        .context("Hunter request failed")?;

    if !response.status().is_success() {
        return Err(anyhow!("Hunter returned {}", response.status()));
    }

    let body: HunterResponse = response
        .json()
        .await
        .context("Hunter response was not valid JSON")?;

    let verdict = map_hunter_result(&body.data.result);

    Ok(ProviderVerdict {
        provider: "hunter",
        verdict,
        confidence: (body.data.score / 100.0).clamp(0.0, 1.0),
        raw_status: body.data.result,
    })
}

fn map_hunter_result(result: &str) -> &'static str {
    match result {
        "deliverable" => "valid",
        "undeliverable" => "invalid",
        "risky" => "risky",
        _ => "unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hunter_vocabulary_mapping() {
        assert_eq!(map_hunter_result("deliverable"), "valid");
        assert_eq!(map_hunter_result("undeliverable"), "invalid");
        assert_eq!(map_hunter_result("risky"), "risky");
        assert_eq!(map_hunter_result("unknown"), "unknown");
        assert_eq!(map_hunter_result("webmail"), "unknown");
    }

    #[test]
    fn test_zerobounce_response_shape() {
        let body: ZeroBounceResponse =
            serde_json::from_str(r#"{"status": "valid", "sub_status": ""}"#)
                .expect("parses zerobounce body");
        assert_eq!(body.status, "valid");
    }

    #[test]
    fn test_hunter_response_shape() {
        let body: HunterResponse = serde_json::from_str(
            r#"{"data": {"result": "deliverable", "score": 92, "email": "a@b.co"}}"#,
        )
        .expect("parses hunter body");
        assert_eq!(body.data.result, "deliverable");
        assert!((body.data.score - 92.0).abs() < f64::EPSILON);
    }
}
