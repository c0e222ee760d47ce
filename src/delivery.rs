//! # Delivery Module
//!
//! Turns a completed session into the payload forwarded to the official:
//! the destination chat, a header describing where the request comes from,
//! and the attachments in the order the user sent them.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::errors::FlowError;
use crate::event::UserRef;
use crate::hierarchy::{ChannelId, LocationHierarchy};
use crate::session::{Attachment, Session, Step};

/// How the submitting user is named in the header
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Sender {
    Username(String),
    Anonymous,
}

impl Sender {
    pub fn from_user(user: &UserRef) -> Self {
        match user.username.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                Sender::Username(name.trim_start_matches('@').to_string())
            }
            _ => Sender::Anonymous,
        }
    }
}

/// Origin metadata sent ahead of the attachments
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeliveryHeader {
    pub region: String,
    pub district: String,
    pub neighborhood: String,
    pub sender: Sender,
    pub submitted_at: DateTime<Utc>,
}

/// Everything the transport needs to forward one submission
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeliveryPayload {
    pub channel: ChannelId,
    pub header: DeliveryHeader,
    pub attachments: Vec<Attachment>,
}

/// One outbound send, in delivery order
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Outbound<'a> {
    Header(&'a DeliveryHeader),
    Attachment(&'a Attachment),
}

impl DeliveryPayload {
    /// Header first, then attachments in submission order
    pub fn sequence(&self) -> impl Iterator<Item = Outbound<'_>> {
        std::iter::once(Outbound::Header(&self.header))
            .chain(self.attachments.iter().map(Outbound::Attachment))
    }
}

/// Resolve the destination of a session and assemble its payload
pub fn resolve_delivery(
    session: &Session,
    hierarchy: &LocationHierarchy,
    sender: Sender,
    submitted_at: DateTime<Utc>,
) -> Result<DeliveryPayload, FlowError> {
    if !matches!(session.step, Step::CollectingContent | Step::Completed) {
        return Err(FlowError::IncompleteSession);
    }

    let (region, district, neighborhood) = match (
        session.region.as_deref(),
        session.district.as_deref(),
        session.neighborhood.as_deref(),
    ) {
        (Some(r), Some(d), Some(n)) => (r, d, n),
        _ => return Err(FlowError::IncompleteSession),
    };

    if session.attachments.is_empty() {
        return Err(FlowError::EmptySubmission);
    }

    let channel = hierarchy
        .resolve(region, district, neighborhood)
        .cloned()
        .ok_or_else(|| FlowError::UnknownDestination {
            region: region.to_string(),
            district: district.to_string(),
            neighborhood: neighborhood.to_string(),
        })?;

    Ok(DeliveryPayload {
        channel,
        header: DeliveryHeader {
            region: region.to_string(),
            district: district.to_string(),
            neighborhood: neighborhood.to_string(),
            sender,
            submitted_at,
        },
        attachments: session.attachments.clone(),
    })
}
