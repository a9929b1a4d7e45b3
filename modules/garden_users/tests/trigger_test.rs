//! Registration trigger: off-thread execution, completion callback and the
//! single-flight state machine.

mod common;

use std::sync::Arc;
use std::thread::ThreadId;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{oneshot, Semaphore};
use uuid::Uuid;

use garden_users::api::trigger::{RegistrationTrigger, TriggerError, TriggerState};
use garden_users::contract::{
    GardenUsersApi, GardenUsersError, Member, NewProfile, Profile, ProfilePatch,
};

/// Client whose registrations block until the test releases a permit.
struct GatedClient {
    gate: Semaphore,
}

impl GatedClient {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Semaphore::new(0),
        })
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }
}

fn unsupported<T>() -> Result<T, GardenUsersError> {
    Err(GardenUsersError::validation("unsupported in this test"))
}

#[async_trait]
impl GardenUsersApi for GatedClient {
    async fn register_user(
        &self,
        name: String,
        role: Option<String>,
    ) -> Result<Member, GardenUsersError> {
        let permit = self.gate.acquire().await.expect("gate open");
        permit.forget();
        if name.is_empty() {
            return Err(GardenUsersError::validation("name: must not be empty"));
        }
        if name == "crash" {
            panic!("storage driver crashed");
        }
        let now = Utc::now();
        Ok(Member {
            id: 1,
            name,
            role,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_member(&self, _id: i64) -> Result<Member, GardenUsersError> {
        unsupported()
    }

    async fn list_members(
        &self,
        _limit: Option<u64>,
        _offset: u64,
    ) -> Result<Vec<Member>, GardenUsersError> {
        unsupported()
    }

    async fn create_profile(&self, _new: NewProfile) -> Result<Profile, GardenUsersError> {
        unsupported()
    }

    async fn get_profile(&self, _id: Uuid) -> Result<Profile, GardenUsersError> {
        unsupported()
    }

    async fn update_profile(
        &self,
        _id: Uuid,
        _patch: ProfilePatch,
    ) -> Result<Profile, GardenUsersError> {
        unsupported()
    }

    async fn sync_profile(&self, _new: NewProfile) -> Result<Profile, GardenUsersError> {
        unsupported()
    }
}

#[tokio::test]
async fn second_submit_while_invoking_is_busy() {
    let client = GatedClient::new();
    let trigger = RegistrationTrigger::new(client.clone());

    let (tx, rx) = oneshot::channel();
    let handle = trigger
        .submit("Goodness", None, move |r| {
            let _ = tx.send(r);
        })
        .unwrap();
    assert_eq!(trigger.state(), TriggerState::Invoking);

    let second = trigger.submit("Other", None, |_| {});
    assert!(matches!(second, Err(TriggerError::Busy)));

    client.release();
    let member = rx.await.unwrap().unwrap();
    handle.await.unwrap();

    assert_eq!(member.name, "Goodness");
    assert_eq!(trigger.state(), TriggerState::Committed(member));
}

#[tokio::test]
async fn new_submit_accepted_after_terminal_state() {
    let client = GatedClient::new();
    let trigger = RegistrationTrigger::new(client.clone());

    client.release();
    let err = trigger.register_user("", None).await.unwrap_err();
    assert!(matches!(
        err,
        TriggerError::Users(GardenUsersError::Validation { .. })
    ));
    assert!(matches!(trigger.state(), TriggerState::Failed(_)));
    assert!(trigger.state().is_terminal());

    client.release();
    let member = trigger
        .register_user("Ada", Some("Seed keeper".into()))
        .await
        .unwrap();
    assert_eq!(member.role.as_deref(), Some("Seed keeper"));
}

#[tokio::test]
async fn panicking_registration_fails_instead_of_wedging() {
    let client = GatedClient::new();
    let trigger = RegistrationTrigger::new(client.clone());

    client.release();
    let joined = trigger.submit("crash", None, |_| {}).unwrap().await;
    assert!(joined.unwrap_err().is_panic());
    assert!(matches!(
        trigger.state(),
        TriggerState::Failed(GardenUsersError::Internal { .. })
    ));

    client.release();
    let member = trigger.register_user("Goodness", None).await.unwrap();
    assert_eq!(trigger.state(), TriggerState::Committed(member));
}

#[tokio::test]
async fn awaiting_a_panicking_registration_reports_aborted() {
    let client = GatedClient::new();
    let trigger = RegistrationTrigger::new(client.clone());

    client.release();
    let err = trigger.register_user("crash", None).await.unwrap_err();
    assert!(matches!(err, TriggerError::Aborted));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn callback_runs_off_the_submitting_thread() {
    let client = GatedClient::new();
    let trigger = RegistrationTrigger::new(client.clone());
    let caller = std::thread::current().id();

    let (tx, rx) = oneshot::channel::<ThreadId>();
    client.release();
    trigger
        .submit("Goodness", None, move |_| {
            let _ = tx.send(std::thread::current().id());
        })
        .unwrap()
        .await
        .unwrap();

    assert_ne!(rx.await.unwrap(), caller);
}

#[test]
fn submit_without_runtime_is_rejected() {
    let trigger = RegistrationTrigger::new(GatedClient::new());
    let res = trigger.submit("Goodness", None, |_| {});
    assert!(matches!(res, Err(TriggerError::NoRuntime)));
    assert_eq!(trigger.state(), TriggerState::Idle);
}

#[tokio::test]
async fn trigger_commits_through_real_storage() {
    let garden = common::migrated_garden().await;
    let trigger = garden.module.registration_trigger();

    let member = trigger.register_user("Goodness", None).await.unwrap();

    assert_eq!(trigger.state(), TriggerState::Committed(member.clone()));
    let stored = garden.module.client().get_member(member.id).await.unwrap();
    assert_eq!(stored, member);
    assert_eq!(garden.sessions.open_sessions(), 0);
}
