//! SmartWay alert notification infrastructure.
//!
//! - [`AlertDispatcher`]: fans one incident out to every configured channel
//!   and reports the outcome of each.
//! - [`delivery`]: the channels themselves (SMTP email, Twilio WhatsApp).
//! - [`location`] / [`template`]: the text every channel renders.

pub mod delivery;
pub mod dispatch;
pub mod location;
pub mod template;

pub use delivery::email::{EmailConfig, EmailError, EmailTransport, SmtpMailer};
pub use delivery::whatsapp::{MessageError, MessageTransport, TwilioWhatsApp, WhatsAppConfig};
pub use dispatch::{
    AlertDispatcher, ChannelDelivery, DeliveryOutcome, DeliveryStatus, DispatchReport,
    IncidentAlert,
};
pub use location::IncidentLocation;
