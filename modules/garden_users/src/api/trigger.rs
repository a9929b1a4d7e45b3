//! Registration trigger for interactive front ends.
//!
//! A front end collects a name and an optional role and hands them to
//! [`RegistrationTrigger::submit`]. The registration runs on the tokio
//! runtime, never on the caller's thread, and its outcome is delivered to a
//! completion callback. Only one registration may be in flight per trigger.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::contract::{client::GardenUsersApi, error::GardenUsersError, model::Member};

/// Where the trigger is in its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerState {
    #[default]
    Idle,
    Invoking,
    Committed(Member),
    Failed(GardenUsersError),
}

impl TriggerState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TriggerState::Committed(_) | TriggerState::Failed(_))
    }
}

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("a registration is already in progress")]
    Busy,
    #[error("no tokio runtime available to run the registration")]
    NoRuntime,
    #[error("registration task ended without a result")]
    Aborted,
    #[error(transparent)]
    Users(#[from] GardenUsersError),
}

/// Moves a still-invoking trigger to `Failed` when the task unwinds or is
/// cancelled before it records an outcome.
struct InvokingGuard(Arc<Mutex<TriggerState>>);

impl Drop for InvokingGuard {
    fn drop(&mut self) {
        let mut state = self.0.lock();
        if *state == TriggerState::Invoking {
            error!("Registration task ended without an outcome");
            *state = TriggerState::Failed(GardenUsersError::Internal {
                message: "registration task ended without an outcome".to_string(),
            });
        }
    }
}

#[derive(Clone)]
pub struct RegistrationTrigger {
    client: Arc<dyn GardenUsersApi>,
    state: Arc<Mutex<TriggerState>>,
}

impl RegistrationTrigger {
    pub fn new(client: Arc<dyn GardenUsersApi>) -> Self {
        Self {
            client,
            state: Arc::new(Mutex::new(TriggerState::Idle)),
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state.lock().clone()
    }

    /// Start a registration in the background.
    ///
    /// `on_complete` runs on a runtime worker after the state has moved to
    /// `Committed` or `Failed`. Rejected with [`TriggerError::Busy`] while a
    /// previous submission is still invoking.
    pub fn submit<F>(
        &self,
        name: impl Into<String>,
        role: Option<String>,
        on_complete: F,
    ) -> Result<JoinHandle<()>, TriggerError>
    where
        F: FnOnce(Result<Member, GardenUsersError>) + Send + 'static,
    {
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TriggerError::NoRuntime)?;

        {
            let mut state = self.state.lock();
            if *state == TriggerState::Invoking {
                warn!("Registration submitted while another is in progress");
                return Err(TriggerError::Busy);
            }
            *state = TriggerState::Invoking;
        }

        let name = name.into();
        let client = Arc::clone(&self.client);
        let state = Arc::clone(&self.state);
        debug!(name = %name, "Registration submitted");

        Ok(runtime.spawn(async move {
            let guard = InvokingGuard(Arc::clone(&state));
            let result = client.register_user(name, role).await;
            *state.lock() = match &result {
                Ok(member) => TriggerState::Committed(member.clone()),
                Err(e) => TriggerState::Failed(e.clone()),
            };
            drop(guard);
            on_complete(result);
        }))
    }

    /// Submit and wait for the committed member.
    pub async fn register_user(
        &self,
        name: impl Into<String>,
        role: Option<String>,
    ) -> Result<Member, TriggerError> {
        let (tx, rx) = oneshot::channel();
        self.submit(name, role, move |result| {
            let _ = tx.send(result);
        })?;
        rx.await.map_err(|_| TriggerError::Aborted)?.map_err(Into::into)
    }
}
