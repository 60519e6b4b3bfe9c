//! WhatsApp alert delivery via the Twilio Messages REST API.

use std::time::Duration;

use async_trait::async_trait;

/// Default Twilio REST base URL.
const DEFAULT_TWILIO_BASE_URL: &str = "https://api.twilio.com";

/// HTTP timeout for one message request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Twilio returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// WhatsAppConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: String,
    /// Sender number, without the `whatsapp:` prefix.
    pub from_number: String,
    /// Destination number; the sender number when not configured.
    pub to_number: String,
    pub base_url: String,
}

impl WhatsAppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                  | Required | Default                  |
    /// |---------------------------|----------|--------------------------|
    /// | `TWILIO_SID`              | yes      | -                        |
    /// | `TWILIO_AUTH_TOKEN`       | yes      | -                        |
    /// | `TWILIO_PHONE_NUMBER`     | yes      | -                        |
    /// | `ALERT_DESTINATION_PHONE` | no       | `TWILIO_PHONE_NUMBER`    |
    /// | `TWILIO_BASE_URL`         | no       | `https://api.twilio.com` |
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let account_sid = non_empty("TWILIO_SID")?;
        let auth_token = non_empty("TWILIO_AUTH_TOKEN")?;
        let from_number = non_empty("TWILIO_PHONE_NUMBER")?;
        let to_number = non_empty("ALERT_DESTINATION_PHONE").unwrap_or_else(|| from_number.clone());
        let base_url = non_empty("TWILIO_BASE_URL")
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_TWILIO_BASE_URL.to_string());

        Some(Self {
            account_sid,
            auth_token,
            from_number,
            to_number,
            base_url,
        })
    }
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// A rendered instant message with channel-qualified addresses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingMessage {
    pub body: String,
    pub from: String,
    pub to: String,
}

/// "Send one text message."
#[async_trait]
pub trait MessageTransport: Send + Sync {
    /// Channel-qualified sender, e.g. `whatsapp:+14155238886`.
    fn sender(&self) -> String;

    /// Channel-qualified destination.
    fn destination(&self) -> String;

    async fn send(&self, message: &OutgoingMessage) -> Result<(), MessageError>;
}

// ---------------------------------------------------------------------------
// TwilioWhatsApp
// ---------------------------------------------------------------------------

pub struct TwilioWhatsApp {
    client: reqwest::Client,
    config: WhatsAppConfig,
}

impl TwilioWhatsApp {
    pub fn new(config: WhatsAppConfig) -> Result<Self, MessageError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.config.base_url, self.config.account_sid
        )
    }
}

#[async_trait]
impl MessageTransport for TwilioWhatsApp {
    fn sender(&self) -> String {
        format!("whatsapp:{}", self.config.from_number)
    }

    fn destination(&self) -> String {
        format!("whatsapp:{}", self.config.to_number)
    }

    async fn send(&self, message: &OutgoingMessage) -> Result<(), MessageError> {
        let form = [
            ("Body", message.body.as_str()),
            ("From", message.from.as_str()),
            ("To", message.to.as_str()),
        ];

        let response = self
            .client
            .post(self.endpoint())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&form)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(MessageError::Api { status, body });
        }

        tracing::info!(to = %message.to, "WhatsApp alert sent");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dest: Option<&str>) -> Option<WhatsAppConfig> {
        WhatsAppConfig::from_lookup(|key| match key {
            "TWILIO_SID" => Some("AC123".to_string()),
            "TWILIO_AUTH_TOKEN" => Some("secret".to_string()),
            "TWILIO_PHONE_NUMBER" => Some("+14155238886".to_string()),
            "ALERT_DESTINATION_PHONE" => dest.map(str::to_string),
            _ => None,
        })
    }

    #[test]
    fn destination_falls_back_to_sender_number() {
        let config = config(None).unwrap();
        assert_eq!(config.to_number, "+14155238886");
        assert_eq!(config.base_url, DEFAULT_TWILIO_BASE_URL);
    }

    #[test]
    fn missing_credentials_disable_channel() {
        let config = WhatsAppConfig::from_lookup(|key| {
            (key == "TWILIO_SID").then(|| "AC123".to_string())
        });
        assert!(config.is_none());
    }

    #[test]
    fn addresses_are_whatsapp_qualified() {
        let channel = TwilioWhatsApp::new(config(Some("+919800000000")).unwrap()).unwrap();
        assert_eq!(channel.sender(), "whatsapp:+14155238886");
        assert_eq!(channel.destination(), "whatsapp:+919800000000");
        assert_eq!(
            channel.endpoint(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
    }

    #[test]
    fn api_error_display() {
        let err = MessageError::Api {
            status: 401,
            body: "Authenticate".to_string(),
        };
        assert_eq!(err.to_string(), "Twilio returned HTTP 401: Authenticate");
    }
}
