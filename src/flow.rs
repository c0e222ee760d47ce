//! # Flow Controller Module
//!
//! The intake state machine. Each inbound event is applied to the sender's
//! session and produces a [`Reply`] for the user and, when a submission is
//! accepted, a [`DeliveryPayload`] for the official.
//!
//! # State Machine
//!
//! - **AwaitingRegion** → region chosen → **AwaitingDistrict**
//! - **AwaitingDistrict** → district chosen → **AwaitingNeighborhood**
//! - **AwaitingNeighborhood** → neighborhood chosen → **CollectingContent**
//! - **CollectingContent** → attachments appended until submit → session removed
//!
//! `/start` restarts from any state. Rejected input never changes the session.
//! Events of one user are applied one at a time under the store's user lock.

use std::fmt::Debug;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use teloxide::dispatching::dialogue::Storage;
use tracing::{debug, info};

use crate::delivery::{resolve_delivery, DeliveryPayload, Sender};
use crate::errors::{FlowError, SessionStoreError};
use crate::event::{EventKind, InboundEvent, UserRef};
use crate::hierarchy::LocationHierarchy;
use crate::localization::t_lang;
use crate::session::{Attachment, AttachmentKind, Session, Step};
use crate::session_store::SessionStore;

/// What the user is told after an event
#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// Greeting with the region menu
    Welcome { regions: Vec<String> },
    RegionSelected {
        region: String,
        districts: Vec<String>,
    },
    DistrictSelected {
        district: String,
        neighborhoods: Vec<String>,
    },
    /// Content collection is open, show the submit button
    NeighborhoodSelected { neighborhood: String },
    AttachmentAdded(AttachmentKind),
    Submitted { attachment_count: usize },
    Cancelled,
    Help,
    Rejected(FlowError),
}

/// Result of handling one event
#[derive(Clone, Debug, PartialEq)]
pub struct FlowOutcome {
    pub reply: Reply,
    /// Present only when a submission was accepted
    pub delivery: Option<DeliveryPayload>,
    /// Language to render the reply in
    pub language_code: Option<String>,
}

type StepResult = Result<(Reply, Option<DeliveryPayload>), FlowError>;

/// Drives sessions through the intake flow
pub struct FlowController<St> {
    hierarchy: Arc<LocationHierarchy>,
    store: SessionStore<St>,
}

impl<St> FlowController<St>
where
    St: Storage<Session> + Send + Sync + 'static,
    St::Error: Debug,
{
    pub fn new(hierarchy: Arc<LocationHierarchy>, store: SessionStore<St>) -> Self {
        Self { hierarchy, store }
    }

    pub fn hierarchy(&self) -> &LocationHierarchy {
        &self.hierarchy
    }

    pub fn store(&self) -> &SessionStore<St> {
        &self.store
    }

    /// Apply an event to the sender's session
    pub async fn handle(&self, event: &InboundEvent) -> Result<FlowOutcome, SessionStoreError> {
        self.handle_at(event, Utc::now()).await
    }

    /// Apply an event, stamping any submission with `now`
    pub async fn handle_at(
        &self,
        event: &InboundEvent,
        now: DateTime<Utc>,
    ) -> Result<FlowOutcome, SessionStoreError> {
        let user = &event.user;
        let _guard = self.store.lock(user.id).await;

        match &event.kind {
            EventKind::Start => self.start(user).await,
            EventKind::Help => self.help(user).await,
            EventKind::Cancel => self.cancel(user).await,
            kind => self.advance(user, kind, now).await,
        }
    }

    async fn start(&self, user: &UserRef) -> Result<FlowOutcome, SessionStoreError> {
        let restarted = self.store.get(user.id).await?.is_some();
        self.store
            .set(user.id, Session::new(user.language_code.clone()))
            .await?;

        info!(user_id = user.id, restarted, "Intake session started");

        Ok(FlowOutcome {
            reply: Reply::Welcome {
                regions: self.hierarchy.region_names(),
            },
            delivery: None,
            language_code: user.language_code.clone(),
        })
    }

    async fn help(&self, user: &UserRef) -> Result<FlowOutcome, SessionStoreError> {
        Ok(FlowOutcome {
            reply: Reply::Help,
            delivery: None,
            language_code: self.language_for(user).await?,
        })
    }

    async fn cancel(&self, user: &UserRef) -> Result<FlowOutcome, SessionStoreError> {
        let language_code = self.language_for(user).await?;
        let reply = match self.store.delete(user.id).await? {
            Some(session) => {
                info!(user_id = user.id, step = ?session.step, "Intake session cancelled");
                Reply::Cancelled
            }
            None => Reply::Rejected(FlowError::NoActiveSession),
        };

        Ok(FlowOutcome {
            reply,
            delivery: None,
            language_code,
        })
    }

    async fn advance(
        &self,
        user: &UserRef,
        kind: &EventKind,
        now: DateTime<Utc>,
    ) -> Result<FlowOutcome, SessionStoreError> {
        let Some(mut session) = self.store.get(user.id).await? else {
            debug!(user_id = user.id, "Event without an active session");
            return Ok(FlowOutcome {
                reply: Reply::Rejected(FlowError::NoActiveSession),
                delivery: None,
                language_code: user.language_code.clone(),
            });
        };

        let language_code = session
            .language_code
            .clone()
            .or_else(|| user.language_code.clone());

        let result = match session.step {
            Step::AwaitingRegion => self.choose_region(&mut session, kind),
            Step::AwaitingDistrict => self.choose_district(&mut session, kind),
            Step::AwaitingNeighborhood => self.choose_neighborhood(&mut session, kind),
            Step::CollectingContent => self.collect(user, &mut session, kind, now),
            // Completed sessions are never stored
            Step::Completed => {
                self.store.delete(user.id).await?;
                Err(FlowError::NoActiveSession)
            }
        };

        let (reply, delivery) = match result {
            Ok((reply, Some(payload))) => {
                // Gone before the transport sees the payload
                self.store.delete(user.id).await?;
                (reply, Some(payload))
            }
            Ok((reply, None)) => {
                self.store.set(user.id, session).await?;
                (reply, None)
            }
            Err(err) => {
                debug!(user_id = user.id, error = %err, "Event rejected");
                (Reply::Rejected(err), None)
            }
        };

        Ok(FlowOutcome {
            reply,
            delivery,
            language_code,
        })
    }

    fn choose_region(&self, session: &mut Session, kind: &EventKind) -> StepResult {
        let regions = self.hierarchy.region_names();
        let choice = menu_choice(kind, Step::AwaitingRegion, &regions)?;
        let districts = self
            .hierarchy
            .district_names(choice)
            .ok_or(FlowError::IncompleteSession)?;

        if !session.select_region(choice) {
            return Err(FlowError::IncompleteSession);
        }

        Ok((
            Reply::RegionSelected {
                region: choice.to_string(),
                districts,
            },
            None,
        ))
    }

    fn choose_district(&self, session: &mut Session, kind: &EventKind) -> StepResult {
        let region = session.region.clone().ok_or(FlowError::IncompleteSession)?;
        let districts = self
            .hierarchy
            .district_names(&region)
            .ok_or(FlowError::IncompleteSession)?;
        let choice = menu_choice(kind, Step::AwaitingDistrict, &districts)?;
        let neighborhoods = self
            .hierarchy
            .neighborhood_names(&region, choice)
            .ok_or(FlowError::IncompleteSession)?;

        if !session.select_district(choice) {
            return Err(FlowError::IncompleteSession);
        }

        Ok((
            Reply::DistrictSelected {
                district: choice.to_string(),
                neighborhoods,
            },
            None,
        ))
    }

    fn choose_neighborhood(&self, session: &mut Session, kind: &EventKind) -> StepResult {
        let (region, district) = match (session.region.as_deref(), session.district.as_deref()) {
            (Some(r), Some(d)) => (r, d),
            _ => return Err(FlowError::IncompleteSession),
        };
        let neighborhoods = self
            .hierarchy
            .neighborhood_names(region, district)
            .ok_or(FlowError::IncompleteSession)?;
        let choice = menu_choice(kind, Step::AwaitingNeighborhood, &neighborhoods)?;

        if !session.select_neighborhood(choice) {
            return Err(FlowError::IncompleteSession);
        }

        Ok((
            Reply::NeighborhoodSelected {
                neighborhood: choice.to_string(),
            },
            None,
        ))
    }

    fn collect(
        &self,
        user: &UserRef,
        session: &mut Session,
        kind: &EventKind,
        now: DateTime<Utc>,
    ) -> StepResult {
        if is_submit(kind, session.language_code.as_deref()) {
            return self.submit(user, session, now);
        }

        let attachment = attachment_from(kind).ok_or(FlowError::UnsupportedInputKind)?;
        let added = attachment.kind();
        if !session.push_attachment(attachment) {
            return Err(FlowError::IncompleteSession);
        }

        debug!(
            user_id = user.id,
            kind = ?added,
            attachments = session.attachments.len(),
            "Attachment added"
        );

        Ok((Reply::AttachmentAdded(added), None))
    }

    fn submit(&self, user: &UserRef, session: &mut Session, now: DateTime<Utc>) -> StepResult {
        if session.attachments.is_empty() {
            return Err(FlowError::EmptySubmission);
        }

        session.step = Step::Completed;
        let payload = match resolve_delivery(session, &self.hierarchy, Sender::from_user(user), now)
        {
            Ok(payload) => payload,
            Err(err) => {
                session.step = Step::CollectingContent;
                return Err(err);
            }
        };

        info!(
            user_id = user.id,
            channel = %payload.channel,
            attachments = payload.attachments.len(),
            "Submission accepted"
        );

        Ok((
            Reply::Submitted {
                attachment_count: payload.attachments.len(),
            },
            Some(payload),
        ))
    }

    async fn language_for(&self, user: &UserRef) -> Result<Option<String>, SessionStoreError> {
        Ok(self
            .store
            .get(user.id)
            .await?
            .and_then(|s| s.language_code)
            .or_else(|| user.language_code.clone()))
    }
}

/// Match a menu event against the options of its step
fn menu_choice<'k>(
    kind: &'k EventKind,
    step: Step,
    options: &[String],
) -> Result<&'k str, FlowError> {
    let invalid = || FlowError::InvalidSelection {
        step,
        options: options.to_vec(),
    };

    match kind {
        EventKind::Text(text) if options.iter().any(|o| o == text) => Ok(text.as_str()),
        EventKind::Unsupported => Err(FlowError::UnsupportedInputKind),
        _ => Err(invalid()),
    }
}

/// Whether an event asks to submit the collected content
fn is_submit(kind: &EventKind, language_code: Option<&str>) -> bool {
    match kind {
        EventKind::Submit => true,
        EventKind::Text(text) => text.trim() == t_lang("submit-button", language_code),
        _ => false,
    }
}

fn attachment_from(kind: &EventKind) -> Option<Attachment> {
    match kind {
        EventKind::Text(text) => Some(Attachment::Text(text.clone())),
        EventKind::Photo(media) => Some(Attachment::Photo(media.clone())),
        EventKind::Video(media) => Some(Attachment::Video(media.clone())),
        EventKind::Voice(media) => Some(Attachment::Voice(media.clone())),
        EventKind::Location {
            latitude,
            longitude,
        } => Some(Attachment::Location {
            latitude: *latitude,
            longitude: *longitude,
        }),
        EventKind::Start
        | EventKind::Help
        | EventKind::Cancel
        | EventKind::Submit
        | EventKind::Unsupported => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MediaRef;

    #[test]
    fn test_menu_choice_is_exact() {
        let options = vec!["North".to_string()];

        assert_eq!(
            menu_choice(&EventKind::Text("North".to_string()), Step::AwaitingRegion, &options),
            Ok("North")
        );
        assert!(matches!(
            menu_choice(&EventKind::Text("north".to_string()), Step::AwaitingRegion, &options),
            Err(FlowError::InvalidSelection { .. })
        ));
        assert!(matches!(
            menu_choice(&EventKind::Text(" North".to_string()), Step::AwaitingRegion, &options),
            Err(FlowError::InvalidSelection { .. })
        ));
        assert_eq!(
            menu_choice(&EventKind::Unsupported, Step::AwaitingRegion, &options),
            Err(FlowError::UnsupportedInputKind)
        );
    }

    #[test]
    fn test_is_submit_uses_session_language() {
        assert!(is_submit(&EventKind::Submit, None));
        assert!(is_submit(&EventKind::Text("Отправить".to_string()), Some("ru")));
        assert!(is_submit(&EventKind::Text("Send".to_string()), Some("en-GB")));
        assert!(!is_submit(&EventKind::Text("Send".to_string()), Some("ru")));
        assert!(!is_submit(&EventKind::Photo(MediaRef::new("p")), None));
    }
}
