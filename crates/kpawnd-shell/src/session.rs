//! Login and sudo state.
//!
//! Login is linear: `Username -> Password -> Done` and never regresses. A
//! reboot keeps the session as it is.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Where the login prompt is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStage {
    Username,
    Password,
    Done,
}

/// The persisted user record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub password: String,
}

/// What a submitted login line led to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoginStep {
    /// Ask for the username again
    Username,
    /// Username taken, ask for the password
    Password,
    /// Logged in
    Complete(Identity),
}

/// Per-tab identity and authentication state.
#[derive(Clone, Debug)]
pub struct Session {
    stage: LoginStage,
    pending_username: Option<String>,
    identity: Option<Identity>,
    sudo_pending: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: LoginStage::Username,
            pending_username: None,
            identity: None,
            sudo_pending: None,
        }
    }

    /// A session that is already logged in.
    pub fn with_identity(identity: Identity) -> Self {
        Self {
            stage: LoginStage::Done,
            pending_username: None,
            identity: Some(identity),
            sudo_pending: None,
        }
    }

    pub fn stage(&self) -> LoginStage {
        self.stage
    }

    pub fn is_logged_in(&self) -> bool {
        self.stage == LoginStage::Done
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.identity.as_ref().map(|id| id.username.as_str())
    }

    /// Feed one line to the login prompt. Ignored once logged in.
    pub fn submit_login(&mut self, line: &str) -> LoginStep {
        match self.stage {
            LoginStage::Username => {
                let name = line.trim();
                if name.is_empty() || name.contains(char::is_whitespace) || name.contains('/') {
                    return LoginStep::Username;
                }
                self.pending_username = Some(name.to_string());
                self.stage = LoginStage::Password;
                LoginStep::Password
            }
            LoginStage::Password => {
                let username = self.pending_username.take().unwrap_or_default();
                let identity = Identity {
                    username,
                    password: line.to_string(),
                };
                info!(user = %identity.username, "login complete");
                self.identity = Some(identity.clone());
                self.stage = LoginStage::Done;
                LoginStep::Complete(identity)
            }
            LoginStage::Done => match &self.identity {
                Some(identity) => LoginStep::Complete(identity.clone()),
                None => LoginStep::Username,
            },
        }
    }

    /// Log in directly, skipping the prompt. Keeps a known password for the
    /// same user.
    pub fn set_user(&mut self, username: &str) {
        let password = match &self.identity {
            Some(id) if id.username == username => id.password.clone(),
            _ => String::new(),
        };
        self.identity = Some(Identity {
            username: username.to_string(),
            password,
        });
        self.pending_username = None;
        self.stage = LoginStage::Done;
    }

    pub fn set_password(&mut self, password: &str) {
        if let Some(identity) = &mut self.identity {
            identity.password = password.to_string();
        }
    }

    // ========== Sudo ==========

    pub fn is_waiting_for_sudo(&self) -> bool {
        self.sudo_pending.is_some()
    }

    /// Park `command` until the password arrives.
    pub fn begin_sudo(&mut self, command: &str) {
        warn!(command, "sudo password requested");
        self.sudo_pending = Some(command.to_string());
    }

    /// Check a password attempt. The pending command is cleared either way;
    /// it is returned only on a match.
    pub fn authenticate(&mut self, attempt: &str) -> Option<String> {
        let command = self.sudo_pending.take()?;
        let matches = self
            .identity
            .as_ref()
            .is_some_and(|id| id.password == attempt);
        if matches {
            Some(command)
        } else {
            warn!(command, "sudo authentication failed");
            None
        }
    }

    pub fn cancel_sudo(&mut self) {
        self.sudo_pending = None;
    }
}
