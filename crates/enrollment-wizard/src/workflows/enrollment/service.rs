use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::controller::{WizardController, WizardError};
use super::countries::CountrySource;
use super::domain::{FieldErrors, FormRecord, PartialFormRecord, WizardStep};
use super::gateway::SubmissionGateway;

/// Identifier wrapper for in-memory wizard sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

/// How long an untouched session is kept before [`EnrollmentService::evict_idle`] drops it.
pub const DEFAULT_SESSION_IDLE_TIMEOUT: Duration = Duration::from_secs(30 * 60);

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    SessionId(format!("enr-{id:06}"))
}

/// What a client needs to render the current screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub session_id: SessionId,
    pub current_step: WizardStep,
    pub step_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_number: Option<u8>,
    pub errors: FieldErrors,
    pub record: FormRecord,
    pub step_valid: bool,
    pub captcha_verified: bool,
    pub submitting: bool,
    pub sub_options: &'static [&'static str],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_date: Option<String>,
}

impl SessionView {
    fn capture(session_id: &SessionId, controller: &WizardController) -> Self {
        let step = controller.current_step();
        Self {
            session_id: session_id.clone(),
            current_step: step,
            step_label: step.label(),
            step_number: step.number(),
            errors: controller.errors().clone(),
            record: controller.record().clone(),
            step_valid: controller.can_advance(),
            captcha_verified: controller.captcha_verified(),
            submitting: controller.is_submitting(),
            sub_options: controller.sub_options(),
            submission_error: controller.submission_error().map(str::to_string),
            selected_date: controller
                .selected_date()
                .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EnrollmentServiceError {
    #[error("enrollment session {0} not found")]
    SessionNotFound(String),
    #[error("{source}")]
    Rejected {
        source: WizardError,
        view: Box<SessionView>,
    },
    #[error("enrollment session store is unavailable")]
    StoreUnavailable,
}

#[derive(Debug)]
struct SessionEntry {
    controller: WizardController,
    touched: Instant,
}

impl SessionEntry {
    fn new(controller: WizardController) -> Self {
        Self {
            controller,
            touched: Instant::now(),
        }
    }

    fn touch(&mut self) -> &mut WizardController {
        self.touched = Instant::now();
        &mut self.controller
    }
}

type SessionMap = HashMap<SessionId, SessionEntry>;

/// Hosts one [`WizardController`] per applicant and wires it to the outbound collaborators.
///
/// Sessions leave the registry when they reach Success, when they are abandoned, or once
/// they sit idle longer than the configured timeout.
pub struct EnrollmentService<G, C> {
    gateway: Arc<G>,
    countries: Arc<C>,
    sessions: Mutex<SessionMap>,
    idle_timeout: Duration,
}

impl<G, C> EnrollmentService<G, C>
where
    G: SubmissionGateway + 'static,
    C: CountrySource + 'static,
{
    pub fn new(gateway: Arc<G>, countries: Arc<C>) -> Self {
        Self {
            gateway,
            countries,
            sessions: Mutex::new(HashMap::new()),
            idle_timeout: DEFAULT_SESSION_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Open a fresh wizard at step one with the country list loaded.
    pub async fn start(&self) -> Result<SessionView, EnrollmentServiceError> {
        let mut controller = WizardController::new();
        controller.load_countries(self.countries.as_ref()).await;

        let session_id = next_session_id();
        let view = SessionView::capture(&session_id, &controller);
        let mut sessions = self.sessions()?;
        self.evict_idle_locked(&mut sessions);
        sessions.insert(session_id.clone(), SessionEntry::new(controller));
        drop(sessions);
        info!(session = %session_id.0, "enrollment session started");
        Ok(view)
    }

    pub fn view(&self, session_id: &SessionId) -> Result<SessionView, EnrollmentServiceError> {
        self.with_session(session_id, |_| Ok(()))
    }

    pub fn countries(&self, session_id: &SessionId) -> Result<Vec<String>, EnrollmentServiceError> {
        let sessions = self.sessions()?;
        sessions
            .get(session_id)
            .map(|entry| entry.controller.countries().to_vec())
            .ok_or_else(|| EnrollmentServiceError::SessionNotFound(session_id.0.clone()))
    }

    pub fn update(
        &self,
        session_id: &SessionId,
        partial: PartialFormRecord,
    ) -> Result<SessionView, EnrollmentServiceError> {
        self.with_session(session_id, |controller| controller.update(partial).map(|_| ()))
    }

    pub fn next(&self, session_id: &SessionId) -> Result<SessionView, EnrollmentServiceError> {
        self.with_session(session_id, |controller| controller.next().map(|_| ()))
    }

    pub fn back(&self, session_id: &SessionId) -> Result<SessionView, EnrollmentServiceError> {
        self.with_session(session_id, |controller| {
            controller.back();
            Ok(())
        })
    }

    pub fn verify_captcha(
        &self,
        session_id: &SessionId,
        verified: bool,
    ) -> Result<SessionView, EnrollmentServiceError> {
        self.with_session(session_id, |controller| {
            controller.on_captcha_verify(verified)
        })
    }

    pub fn submit(&self, session_id: &SessionId) -> Result<SessionView, EnrollmentServiceError> {
        self.with_session(session_id, |controller| controller.submit().map(|_| ()))
    }

    /// Deliver the finalized record. The session lock is released while the gateway runs;
    /// a session abandoned in the meantime swallows the result, and a request dropped before
    /// the gateway answers leaves the confirmation retryable.
    ///
    /// A successful delivery removes the session and returns its final view.
    pub async fn confirm(
        &self,
        session_id: &SessionId,
        selected_date: DateTime<Utc>,
    ) -> Result<SessionView, EnrollmentServiceError> {
        let pending = {
            let mut sessions = self.sessions()?;
            let controller = sessions
                .get_mut(session_id)
                .ok_or_else(|| EnrollmentServiceError::SessionNotFound(session_id.0.clone()))?
                .touch();
            match controller.begin_confirmation(selected_date) {
                Ok(pending) => pending,
                Err(source) => {
                    return Err(EnrollmentServiceError::Rejected {
                        source,
                        view: Box::new(SessionView::capture(session_id, controller)),
                    })
                }
            }
        };

        let mut release = TicketRelease {
            sessions: Some(&self.sessions),
            session_id,
            ticket: pending.ticket(),
        };
        let outcome = self.gateway.deliver(&pending.payload).await;
        release.disarm();

        let mut sessions = self.sessions()?;
        let Some(entry) = sessions.get_mut(session_id) else {
            info!(session = %session_id.0, "session abandoned during submission; result ignored");
            return Err(EnrollmentServiceError::SessionNotFound(session_id.0.clone()));
        };
        let controller = entry.touch();

        match controller.complete_confirmation(pending, outcome) {
            Ok(_) => {
                let view = SessionView::capture(session_id, controller);
                sessions.remove(session_id);
                info!(session = %session_id.0, "enrollment session completed and released");
                Ok(view)
            }
            Err(source) => Err(EnrollmentServiceError::Rejected {
                source,
                view: Box::new(SessionView::capture(session_id, controller)),
            }),
        }
    }

    /// Drop the session and everything entered in it.
    pub fn abandon(&self, session_id: &SessionId) -> Result<(), EnrollmentServiceError> {
        let mut entry = self
            .sessions()?
            .remove(session_id)
            .ok_or_else(|| EnrollmentServiceError::SessionNotFound(session_id.0.clone()))?;
        entry.controller.abandon();
        info!(session = %session_id.0, "enrollment session abandoned");
        Ok(())
    }

    pub fn active_sessions(&self) -> Result<usize, EnrollmentServiceError> {
        Ok(self.sessions()?.len())
    }

    /// Drop sessions untouched for longer than the idle timeout. Sessions with a submission
    /// in flight are kept. Returns how many were dropped.
    pub fn evict_idle(&self) -> Result<usize, EnrollmentServiceError> {
        let mut sessions = self.sessions()?;
        Ok(self.evict_idle_locked(&mut sessions))
    }

    fn evict_idle_locked(&self, sessions: &mut SessionMap) -> usize {
        let before = sessions.len();
        sessions.retain(|session_id, entry| {
            let keep = entry.controller.is_submitting()
                || entry.touched.elapsed() < self.idle_timeout;
            if !keep {
                debug!(session = %session_id.0, "evicting idle enrollment session");
            }
            keep
        });
        let evicted = before - sessions.len();
        if evicted > 0 {
            info!(evicted, remaining = sessions.len(), "idle enrollment sessions evicted");
        }
        evicted
    }

    fn sessions(&self) -> Result<MutexGuard<'_, SessionMap>, EnrollmentServiceError> {
        self.sessions
            .lock()
            .map_err(|_| EnrollmentServiceError::StoreUnavailable)
    }

    fn with_session<F>(
        &self,
        session_id: &SessionId,
        action: F,
    ) -> Result<SessionView, EnrollmentServiceError>
    where
        F: FnOnce(&mut WizardController) -> Result<(), WizardError>,
    {
        let mut sessions = self.sessions()?;
        let controller = sessions
            .get_mut(session_id)
            .ok_or_else(|| EnrollmentServiceError::SessionNotFound(session_id.0.clone()))?
            .touch();

        match action(controller) {
            Ok(()) => Ok(SessionView::capture(session_id, controller)),
            Err(source) => Err(EnrollmentServiceError::Rejected {
                source,
                view: Box::new(SessionView::capture(session_id, controller)),
            }),
        }
    }
}

// Releases the outstanding ticket if `confirm` is dropped while the gateway runs.
struct TicketRelease<'a> {
    sessions: Option<&'a Mutex<SessionMap>>,
    session_id: &'a SessionId,
    ticket: u64,
}

impl TicketRelease<'_> {
    fn disarm(&mut self) {
        self.sessions = None;
    }
}

impl Drop for TicketRelease<'_> {
    fn drop(&mut self) {
        let Some(sessions) = self.sessions.take() else {
            return;
        };
        if let Ok(mut sessions) = sessions.lock() {
            if let Some(entry) = sessions.get_mut(self.session_id) {
                entry.controller.cancel_confirmation(self.ticket);
            }
        }
    }
}
