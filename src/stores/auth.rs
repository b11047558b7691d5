// Authentication state and the persisted session

use std::fs;
use std::io;
use std::path::PathBuf;

use parking_lot::RwLock;
use tracing::{debug, error, info, warn};

use super::LoadStatus;
use crate::api::BookingApi;
use crate::error::{Error, Result};
use crate::models::{RegisterResponse, Session, User};
use crate::validation::{validate_form, RegisterForm};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub initialized: bool,
    pub status: LoadStatus,
}

/// Holds the signed-in user and token.
///
/// When a session file is configured the session survives restarts: it is
/// written on login, read back by [`AuthStore::initialize`] and removed on
/// logout. The token is pushed into the API transport whenever it changes.
pub struct AuthStore {
    api: BookingApi,
    session_file: Option<PathBuf>,
    state: RwLock<AuthState>,
}

impl AuthStore {
    pub fn new(api: BookingApi, session_file: Option<PathBuf>) -> Self {
        Self {
            api,
            session_file,
            state: RwLock::new(AuthState::default()),
        }
    }

    pub fn snapshot(&self) -> AuthState {
        self.state.read().clone()
    }

    // Restore a previously saved session, if any
    pub fn initialize(&self) -> Result<()> {
        let restored = match &self.session_file {
            Some(path) => match fs::read_to_string(path) {
                Ok(raw) => match serde_json::from_str::<Session>(&raw) {
                    Ok(session) => Some(session),
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "ignoring unreadable session file");
                        None
                    }
                },
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => return Err(e.into()),
            },
            None => None,
        };

        if let Some(session) = &restored {
            debug!(user_id = session.user.id, "session restored");
            self.api.set_token(Some(session.token.clone()));
        }
        let mut state = self.state.write();
        state.session = restored;
        state.initialized = true;
        Ok(())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        self.state.write().status.start();

        // a session that cannot be persisted fails the login like a rejected one
        let result = match self.api.login(email, password).await {
            Ok(session) => {
                let user = session.user.clone();
                self.set_auth(session).map(|()| user)
            }
            Err(e) => Err(Error::from(e)),
        };

        match result {
            Ok(user) => {
                info!(user_id = user.id, role = %user.role, "logged in");
                self.state.write().status.succeed();
                Ok(user)
            }
            Err(e) => {
                error!(error = %e, "login failed");
                self.state.write().status.fail(e.user_message("Login failed"));
                Err(e)
            }
        }
    }

    pub async fn register(&self, form: &RegisterForm) -> Result<RegisterResponse> {
        validate_form(form)?;
        self.state.write().status.start();

        match self.api.register(form).await {
            Ok(response) => {
                self.state.write().status.succeed();
                Ok(response)
            }
            Err(e) => {
                let e = Error::from(e);
                error!(error = %e, "registration failed");
                self.state
                    .write()
                    .status
                    .fail(e.user_message("Registration failed"));
                Err(e)
            }
        }
    }

    pub fn set_auth(&self, session: Session) -> Result<()> {
        if let Some(path) = &self.session_file {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string(&session)?)?;
        }
        self.api.set_token(Some(session.token.clone()));
        self.state.write().session = Some(session);
        Ok(())
    }

    pub fn logout(&self) -> Result<()> {
        if let Some(path) = &self.session_file {
            match fs::remove_file(path) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        self.api.set_token(None);
        let mut state = self.state.write();
        state.session = None;
        state.status = LoadStatus::default();
        info!("logged out");
        Ok(())
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().session.is_some()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.read().session.as_ref().map(|s| s.user.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.state.read().session.as_ref().map(|s| s.token.clone())
    }

    pub fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(Error::NotAuthenticated)
    }

    pub fn require_admin(&self) -> Result<User> {
        let user = self.require_user()?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(Error::Forbidden)
        }
    }
}
