//! Session module holding the per-user conversation state of the intake flow.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Step of the intake flow a session is at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    #[default]
    AwaitingRegion,
    AwaitingDistrict,
    AwaitingNeighborhood,
    CollectingContent,
    Completed,
}

/// Opaque media reference (Telegram file id)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MediaRef(pub String);

impl MediaRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MediaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One unit of submitted content
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Attachment {
    Text(String),
    Photo(MediaRef),
    Video(MediaRef),
    Voice(MediaRef),
    Location { latitude: f64, longitude: f64 },
}

/// Kind of an attachment, without its payload
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttachmentKind {
    Text,
    Photo,
    Video,
    Voice,
    Location,
}

impl Attachment {
    pub fn kind(&self) -> AttachmentKind {
        match self {
            Attachment::Text(_) => AttachmentKind::Text,
            Attachment::Photo(_) => AttachmentKind::Photo,
            Attachment::Video(_) => AttachmentKind::Video,
            Attachment::Voice(_) => AttachmentKind::Voice,
            Attachment::Location { .. } => AttachmentKind::Location,
        }
    }
}

/// Per-user state of the intake flow
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub step: Step,
    pub region: Option<String>,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub attachments: Vec<Attachment>,
    /// Language captured when the session started
    pub language_code: Option<String>,
}

impl Session {
    /// Fresh session waiting for a region
    pub fn new(language_code: Option<String>) -> Self {
        Self {
            language_code,
            ..Self::default()
        }
    }

    /// Record the region; only valid while awaiting it
    pub fn select_region(&mut self, region: &str) -> bool {
        if self.step != Step::AwaitingRegion || region.is_empty() {
            return false;
        }
        self.region = Some(region.to_string());
        self.step = Step::AwaitingDistrict;
        true
    }

    /// Record the district; requires a region
    pub fn select_district(&mut self, district: &str) -> bool {
        if self.step != Step::AwaitingDistrict || self.region.is_none() {
            return false;
        }
        self.district = Some(district.to_string());
        self.step = Step::AwaitingNeighborhood;
        true
    }

    /// Record the neighborhood and open content collection
    pub fn select_neighborhood(&mut self, neighborhood: &str) -> bool {
        if self.step != Step::AwaitingNeighborhood || self.district.is_none() {
            return false;
        }
        self.neighborhood = Some(neighborhood.to_string());
        self.attachments.clear();
        self.step = Step::CollectingContent;
        true
    }

    /// Append an attachment; only while collecting content
    pub fn push_attachment(&mut self, attachment: Attachment) -> bool {
        if self.step != Step::CollectingContent {
            return false;
        }
        self.attachments.push(attachment);
        true
    }
}
