//! Best-effort outbound notifications for the admin WhatsApp channel.
//!
//! Callers enqueue through [`NotificationDispatcher::dispatch`], which never
//! blocks and never fails. A worker task delivers each message through a
//! [`NotificationSink`]; delivery failures travel over a separate channel that
//! a logging task drains.

mod dispatcher;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::directory::TeacherId;

pub use dispatcher::{DeliveryFailure, NotificationDispatcher};

/// Message addressed to a WhatsApp number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub to: String,
    pub body: String,
}

/// Outbound transport (WhatsApp Business API, SMS gateway, test recorder).
pub trait NotificationSink: Send + Sync {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), NotificationError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NotificationError {
    #[error("notification transport unavailable: {0}")]
    Transport(String),
    #[error("recipient rejected: {0}")]
    Rejected(String),
}

/// Sink that records the message in the service log instead of calling a provider.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingWhatsAppSink;

impl NotificationSink for LoggingWhatsAppSink {
    fn deliver(&self, message: &OutboundMessage) -> Result<(), NotificationError> {
        info!(to = %message.to, body = %message.body, "whatsapp notification");
        Ok(())
    }
}

/// Admin alert text for a new shortlist entry.
pub fn format_selection_message(
    school_name: &str,
    teacher_name: &str,
    teacher_id: &TeacherId,
) -> String {
    format!(
        "🎓 New Teacher Selection!\n\n\
         School: {school_name}\n\
         Teacher: {teacher_name}\n\
         Teacher ID: {teacher_id}\n\n\
         A school has accepted a teacher. Please review in the admin panel."
    )
}
