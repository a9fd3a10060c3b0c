use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::attempt::IdentityFields;

/// Steps of the setup wizard.
///
/// The wizard only moves forward: Idle → AwaitingFirstName →
/// AwaitingLastName → AwaitingOrganization → Idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WizardState {
    #[default]
    Idle,
    AwaitingFirstName,
    AwaitingLastName,
    AwaitingOrganization,
}

impl fmt::Display for WizardState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardState::Idle => write!(f, "idle"),
            WizardState::AwaitingFirstName => write!(f, "awaiting_first_name"),
            WizardState::AwaitingLastName => write!(f, "awaiting_last_name"),
            WizardState::AwaitingOrganization => write!(f, "awaiting_organization"),
        }
    }
}

/// The result of feeding one line of input to the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardTransition {
    /// Value stored, waiting for the next field.
    Next(WizardState),
    /// Organization stored, session back to idle.
    Complete,
    /// Blank input; state unchanged.
    Rejected(WizardState),
    /// Wizard was not running.
    Inactive,
}

/// Per-chat configuration, one per remote user for the process lifetime.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub fields: IdentityFields,
    pub identities_path: PathBuf,
    pub targets_path: PathBuf,
    pub proxies_path: PathBuf,
    pub concurrency: usize,
    pub wizard: WizardState,
}

impl UserSession {
    pub fn new(chat_id: i64, data_dir: &Path, concurrency: usize) -> Self {
        Self {
            fields: IdentityFields::default(),
            identities_path: data_dir.join(format!("emails_{chat_id}.txt")),
            targets_path: data_dir.join(format!("events_{chat_id}.txt")),
            proxies_path: data_dir.join(format!("proxies_{chat_id}.txt")),
            concurrency,
            wizard: WizardState::Idle,
        }
    }

    pub fn begin_wizard(&mut self) {
        self.wizard = WizardState::AwaitingFirstName;
    }

    /// Store `input` for the current wizard step and advance.
    pub fn advance_wizard(&mut self, input: &str) -> WizardTransition {
        let value = input.trim();
        if self.wizard == WizardState::Idle {
            return WizardTransition::Inactive;
        }
        if value.is_empty() {
            return WizardTransition::Rejected(self.wizard);
        }

        match self.wizard {
            WizardState::Idle => WizardTransition::Inactive,
            WizardState::AwaitingFirstName => {
                self.fields.first_name = value.to_string();
                self.wizard = WizardState::AwaitingLastName;
                WizardTransition::Next(self.wizard)
            }
            WizardState::AwaitingLastName => {
                self.fields.last_name = value.to_string();
                self.wizard = WizardState::AwaitingOrganization;
                WizardTransition::Next(self.wizard)
            }
            WizardState::AwaitingOrganization => {
                self.fields.organization = value.to_string();
                self.wizard = WizardState::Idle;
                WizardTransition::Complete
            }
        }
    }
}

/// Lazily created sessions keyed by chat id, each behind its own lock.
pub struct SessionStore {
    sessions: Mutex<HashMap<i64, Arc<Mutex<UserSession>>>>,
    data_dir: PathBuf,
    default_concurrency: usize,
}

impl SessionStore {
    pub fn new(data_dir: PathBuf, default_concurrency: usize) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            data_dir,
            default_concurrency,
        }
    }

    pub async fn get_or_create(&self, chat_id: i64) -> Arc<Mutex<UserSession>> {
        let mut sessions = self.sessions.lock().await;
        Arc::clone(sessions.entry(chat_id).or_insert_with(|| {
            Arc::new(Mutex::new(UserSession::new(
                chat_id,
                &self.data_dir,
                self.default_concurrency,
            )))
        }))
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> UserSession {
        UserSession::new(42, Path::new("data"), 20)
    }

    #[test]
    fn new_session_defaults() {
        let s = session();
        assert_eq!(s.wizard, WizardState::Idle);
        assert_eq!(s.concurrency, 20);
        assert_eq!(s.identities_path, Path::new("data/emails_42.txt"));
        assert_eq!(s.targets_path, Path::new("data/events_42.txt"));
        assert_eq!(s.proxies_path, Path::new("data/proxies_42.txt"));
        assert!(!s.fields.is_complete());
    }

    #[test]
    fn wizard_walks_all_steps() {
        let mut s = session();
        s.begin_wizard();
        assert_eq!(s.wizard, WizardState::AwaitingFirstName);

        assert_eq!(
            s.advance_wizard(" Ada "),
            WizardTransition::Next(WizardState::AwaitingLastName)
        );
        assert_eq!(
            s.advance_wizard("Lovelace"),
            WizardTransition::Next(WizardState::AwaitingOrganization)
        );
        assert_eq!(s.advance_wizard("Analytical Engines"), WizardTransition::Complete);

        assert_eq!(s.wizard, WizardState::Idle);
        assert_eq!(s.fields.first_name, "Ada");
        assert_eq!(s.fields.last_name, "Lovelace");
        assert_eq!(s.fields.organization, "Analytical Engines");
        assert!(s.fields.is_complete());
    }

    #[test]
    fn blank_input_does_not_advance() {
        let mut s = session();
        s.begin_wizard();
        assert_eq!(
            s.advance_wizard("   "),
            WizardTransition::Rejected(WizardState::AwaitingFirstName)
        );
        assert_eq!(s.wizard, WizardState::AwaitingFirstName);
    }

    #[test]
    fn idle_session_ignores_input() {
        let mut s = session();
        assert_eq!(s.advance_wizard("Ada"), WizardTransition::Inactive);
        assert!(s.fields.first_name.is_empty());
    }

    #[test]
    fn restarting_wizard_overwrites_fields() {
        let mut s = session();
        s.begin_wizard();
        s.advance_wizard("A");
        s.advance_wizard("B");
        s.advance_wizard("C");
        s.begin_wizard();
        s.advance_wizard("D");
        assert_eq!(s.fields.first_name, "D");
        assert_eq!(s.fields.last_name, "B");
    }

    #[test]
    fn wizard_state_display() {
        assert_eq!(WizardState::Idle.to_string(), "idle");
        assert_eq!(WizardState::AwaitingFirstName.to_string(), "awaiting_first_name");
        assert_eq!(WizardState::AwaitingLastName.to_string(), "awaiting_last_name");
        assert_eq!(WizardState::AwaitingOrganization.to_string(), "awaiting_organization");
    }

    #[tokio::test]
    async fn store_creates_sessions_lazily_and_reuses_them() {
        let store = SessionStore::new(PathBuf::from("data"), 20);
        assert_eq!(store.len().await, 0);

        let a = store.get_or_create(1).await;
        a.lock().await.concurrency = 5;
        let again = store.get_or_create(1).await;
        assert_eq!(again.lock().await.concurrency, 5);

        let b = store.get_or_create(2).await;
        assert_eq!(b.lock().await.concurrency, 20);
        assert_eq!(store.len().await, 2);
    }
}
