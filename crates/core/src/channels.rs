//! Well-known notification channel name constants.
//!
//! These appear in per-channel delivery reports returned by the analysis
//! endpoint and in log fields emitted by the dispatcher.

/// Email alert delivered via SMTP with an inline snapshot.
pub const CHANNEL_EMAIL: &str = "email";

/// WhatsApp alert delivered through the Twilio messaging API.
pub const CHANNEL_WHATSAPP: &str = "whatsapp";
