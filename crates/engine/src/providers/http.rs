//! HTTP-backed account client: one JSON POST to the target's signup endpoint.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info};

use signupforge_core::{Credentials, ProvisionError, TargetConfig};

use super::{AccountClient, SubmissionOutcome};

pub struct HttpAccountClient {
    client: reqwest::Client,
    signup_url: url::Url,
    invite_code: Option<String>,
    timeout_secs: u64,
}

#[derive(Serialize)]
struct SignupPayload<'a> {
    full_name: &'a str,
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    invite_code: Option<&'a str>,
}

impl HttpAccountClient {
    pub fn new(target: &TargetConfig) -> Result<Self, ProvisionError> {
        let signup_url = url::Url::parse(&target.signup_url)
            .map_err(|e| ProvisionError::Configuration(format!("bad signup_url: {}", e)))?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(target.request_timeout_secs))
            .user_agent(target.user_agent.clone())
            .build()
            .map_err(|e| ProvisionError::Configuration(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            signup_url,
            invite_code: target.invite_code.clone(),
            timeout_secs: target.request_timeout_secs,
        })
    }

    /// Map an HTTP status and body to a submission outcome. Accepts on 2xx
    /// with either no JSON body or a body whose `success` field is not false;
    /// anything else is a rejection carrying whatever message the target gave.
    fn interpret_response(status: reqwest::StatusCode, body: &str) -> SubmissionOutcome {
        let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();

        let body_success = parsed
            .as_ref()
            .and_then(|v| v.get("success"))
            .and_then(|v| v.as_bool());

        if status.is_success() && body_success != Some(false) {
            return SubmissionOutcome {
                accepted: true,
                account_data: parsed
                    .as_ref()
                    .and_then(|v| v.get("account"))
                    .cloned()
                    .or(parsed),
                error_message: None,
                response_body: Some(body.to_string()),
            };
        }

        let error_message = parsed
            .as_ref()
            .and_then(|v| {
                v.get("error")
                    .or_else(|| v.get("message"))
                    .or_else(|| v.get("details"))
            })
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("signup returned HTTP {}", status.as_u16()));

        SubmissionOutcome {
            accepted: false,
            account_data: None,
            error_message: Some(error_message),
            response_body: Some(body.to_string()),
        }
    }
}

#[async_trait]
impl AccountClient for HttpAccountClient {
    async fn create_account(
        &self,
        credentials: &Credentials,
    ) -> Result<SubmissionOutcome, ProvisionError> {
        let payload = SignupPayload {
            full_name: &credentials.full_name,
            email: &credentials.email,
            password: &credentials.password,
            phone: credentials.phone_number.as_deref(),
            invite_code: self.invite_code.as_deref(),
        };

        debug!(url = %self.signup_url, email = %credentials.email, "submitting signup");

        let response = self
            .client
            .post(self.signup_url.clone())
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProvisionError::Timeout(self.timeout_secs)
                } else {
                    ProvisionError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProvisionError::Transport(e.to_string()))?;

        let outcome = Self::interpret_response(status, &body);
        info!(
            accepted = outcome.accepted,
            status = status.as_u16(),
            "signup response interpreted"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_accepts_2xx_with_success_body() {
        let body = r#"{"success": true, "account": {"id": "u-17"}}"#;
        let outcome = HttpAccountClient::interpret_response(StatusCode::OK, body);
        assert!(outcome.accepted);
        assert_eq!(outcome.account_data.unwrap()["id"], "u-17");
    }

    #[test]
    fn test_accepts_2xx_without_json() {
        let outcome = HttpAccountClient::interpret_response(StatusCode::CREATED, "welcome");
        assert!(outcome.accepted);
    }

    #[test]
    fn test_2xx_with_success_false_is_rejection() {
        let body = r#"{"success": false, "error": "email already exists"}"#;
        let outcome = HttpAccountClient::interpret_response(StatusCode::OK, body);
        assert!(!outcome.accepted);
        assert_eq!(outcome.error_message.as_deref(), Some("email already exists"));
    }

    #[test]
    fn test_non_2xx_extracts_message_field() {
        let body = r#"{"message": "invalid phone number"}"#;
        let outcome = HttpAccountClient::interpret_response(StatusCode::BAD_REQUEST, body);
        assert!(!outcome.accepted);
        assert_eq!(outcome.error_message.as_deref(), Some("invalid phone number"));
    }

    #[test]
    fn test_non_2xx_without_body_reports_status() {
        let outcome =
            HttpAccountClient::interpret_response(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(!outcome.accepted);
        assert!(outcome.error_message.unwrap().contains("429"));
        assert_eq!(outcome.response_body.as_deref(), Some("slow down"));
    }

    #[test]
    fn test_bad_signup_url_is_configuration_error() {
        let target = TargetConfig {
            signup_url: "not a url".to_string(),
            request_timeout_secs: 30,
            user_agent: "test".to_string(),
            invite_code: None,
        };
        assert!(matches!(
            HttpAccountClient::new(&target),
            Err(ProvisionError::Configuration(_))
        ));
    }
}
