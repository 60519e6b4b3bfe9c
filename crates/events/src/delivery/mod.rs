//! External delivery channels for incident alerts.
//!
//! Each channel is a small async trait so the dispatcher can be driven by
//! recording fakes in tests and by the real SMTP / Twilio clients in the
//! server.

pub mod email;
pub mod whatsapp;
