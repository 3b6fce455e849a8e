use std::collections::HashMap;
use std::sync::Arc;

use asc_core::{paths, Config, Team};
use log::warn;
use tokio::sync::RwLock;

use crate::cookies::CredentialStore;
use crate::error::AscError;
use crate::session::{SessionContext, SessionMap};

pub(crate) const LOGIN_SESSION_LABEL: &str = "login";

/// Who we are, as far as the remote service is concerned.
/// Logged in iff the bootstrap key is non-empty and a person id is set.
#[derive(Debug, Default, Clone)]
pub(crate) struct Identity {
    pub auth_service_key: String,
    pub person_id: Option<String>,
    /// Ephemeral two-factor tokens; live only between challenge
    /// issuance and resolution, then erased.
    pub challenge: Option<ChallengeTokens>,
}

#[derive(Debug, Clone)]
pub(crate) struct ChallengeTokens {
    pub session_id: String,
    pub scnt: String,
}

impl Identity {
    pub(crate) fn is_logged_in(&self) -> bool {
        !self.auth_service_key.is_empty() && self.person_id.is_some()
    }
}

/// All state shared between the handlers. One instance per client; no
/// process-global singletons, so several identities can coexist
/// in-process.
#[derive(Debug)]
pub(crate) struct SharedState {
    pub config: Config,
    pub store: CredentialStore,
    pub identity: RwLock<Identity>,
    pub username: RwLock<Option<String>>,
    pub login: RwLock<Option<Arc<SessionContext>>>,
    /// Team cache keyed by team id; per-slot replacement keeps the
    /// cross-team fan-out race-free.
    pub teams: RwLock<HashMap<i64, Team>>,
    pub sessions: SessionMap,
}

impl SharedState {
    pub(crate) fn new(config: Config) -> Self {
        let store = CredentialStore::new(paths::cookie_store_root(&config));
        SharedState {
            config,
            store,
            identity: RwLock::new(Identity::default()),
            username: RwLock::new(None),
            login: RwLock::new(None),
            teams: RwLock::new(HashMap::new()),
            sessions: SessionMap::default(),
        }
    }

    pub(crate) async fn widget_key(&self) -> String {
        self.identity.read().await.auth_service_key.clone()
    }

    pub(crate) async fn is_logged_in(&self) -> bool {
        self.identity.read().await.is_logged_in()
    }

    pub(crate) async fn require_logged_in(&self) -> Result<(), AscError> {
        if self.is_logged_in().await {
            Ok(())
        } else {
            Err(AscError::NotLoggedIn)
        }
    }

    pub(crate) async fn login_context(&self) -> Result<Arc<SessionContext>, AscError> {
        self.login.read().await.clone().ok_or(AscError::NotLoggedIn)
    }

    pub(crate) async fn session_for_team(
        &self,
        team_id: i64,
    ) -> Result<Arc<SessionContext>, AscError> {
        let login = self.login_context().await?;
        self.sessions
            .session_for(team_id, &login, &self.config)
            .await
    }

    /// Linear scan across the cached teams for the app's owner.
    pub(crate) async fn team_id_for_app(&self, app_id: &str) -> Option<i64> {
        let teams = self.teams.read().await;
        for (id, team) in teams.iter() {
            if team.apps.iter().any(|app| app.id == app_id) {
                return Some(*id);
            }
        }
        None
    }

    pub(crate) async fn session_for_app(
        &self,
        app_id: &str,
    ) -> Result<Arc<SessionContext>, AscError> {
        let team_id = self
            .team_id_for_app(app_id)
            .await
            .ok_or(AscError::TeamNotSelected)?;
        self.session_for_team(team_id).await
    }

    /// Wipes identity, caches and sessions, then opens a fresh login
    /// context seeded from whatever cookies this identity left on disk.
    pub(crate) async fn reset_for_login(
        &self,
        username: &str,
    ) -> Result<Arc<SessionContext>, AscError> {
        *self.identity.write().await = Identity::default();
        self.teams.write().await.clear();
        self.sessions.clear().await;
        *self.username.write().await = Some(username.to_string());

        let seed = self.store.load(username, LOGIN_SESSION_LABEL);
        let context = Arc::new(SessionContext::new(
            LOGIN_SESSION_LABEL.to_string(),
            &self.config,
            seed,
        )?);
        *self.login.write().await = Some(Arc::clone(&context));
        Ok(context)
    }

    /// Persists every jar for the current identity. Failures are logged
    /// rather than failing the login; the in-memory session stays valid.
    pub(crate) async fn persist_cookies(&self) {
        let Some(username) = self.username.read().await.clone() else {
            return;
        };
        if let Some(login) = self.login.read().await.as_ref() {
            if let Err(err) = self.store.save(&username, login.label(), login.cookies()) {
                warn!("Failed to persist login cookies: {err}");
            }
        }
        for (team_id, context) in self.sessions.contexts().await {
            if let Err(err) = self.store.save(&username, context.label(), context.cookies()) {
                warn!("Failed to persist cookies for team {team_id}: {err}");
            }
        }
    }
}
