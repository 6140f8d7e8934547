/// Twilio Programmable Messaging client.
///
/// Sends one SMS per call through the Messages resource:
///   POST https://api.twilio.com/2010-04-01/Accounts/{AccountSid}/Messages.json
///
/// Authentication is HTTP basic with the account SID and auth token. The
/// request body is form-encoded (`To`, `From`, `Body`). Successful responses
/// carry the message `sid`; failures carry `{ "code", "message" }`.

use std::time::Duration;

use serde::Deserialize;

use crate::config::NotifierConfig;
use crate::error::NotificationError;
use crate::notify::MessageSender;

const REQUEST_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct MessageResponse {
    sid: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<i64>,
    message: Option<String>,
}

/// Builds the Messages resource URL for an account.
pub fn build_messages_url(api_base_url: &str, account_sid: &str) -> String {
    format!(
        "{}/2010-04-01/Accounts/{}/Messages.json",
        api_base_url.trim_end_matches('/'),
        urlencoding::encode(account_sid)
    )
}

pub struct TwilioSender {
    client: reqwest::blocking::Client,
    messages_url: String,
    account_sid: String,
    auth_token: String,
    from: String,
}

impl TwilioSender {
    pub fn new(api_base_url: &str, config: &NotifierConfig) -> Result<Self, NotificationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| NotificationError::Transport(format!("unable to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            messages_url: build_messages_url(api_base_url, &config.account_sid),
            account_sid: config.account_sid.clone(),
            auth_token: config.auth_token.clone(),
            from: config.from.clone(),
        })
    }
}

impl MessageSender for TwilioSender {
    fn send(&self, to: &str, body: &str) -> Result<String, NotificationError> {
        let response = self
            .client
            .post(&self.messages_url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&[("To", to), ("From", self.from.as_str()), ("Body", body)])
            .send()
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| NotificationError::Transport(format!("unable to read response: {}", e)))?;

        if !status.is_success() {
            return Err(parse_error_response(status.as_u16(), &text));
        }

        parse_message_response(&text)
    }
}

/// Extracts the message SID from a successful create response.
pub fn parse_message_response(json: &str) -> Result<String, NotificationError> {
    serde_json::from_str::<MessageResponse>(json)
        .map(|r| r.sid)
        .map_err(|e| NotificationError::Decode(e.to_string()))
}

/// Maps an error response to `Rejected`, keeping Twilio's code and message
/// when the body has them and falling back to the raw body otherwise.
pub fn parse_error_response(status: u16, body: &str) -> NotificationError {
    match serde_json::from_str::<ErrorResponse>(body) {
        Ok(err) => NotificationError::Rejected {
            status,
            code: err.code,
            message: err.message.unwrap_or_else(|| body.trim().to_string()),
        },
        Err(_) => NotificationError::Rejected {
            status,
            code: None,
            message: body.trim().to_string(),
        },
    }
}
