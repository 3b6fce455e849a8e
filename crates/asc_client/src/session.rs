use std::collections::HashMap;
use std::sync::Arc;

use asc_core::Config;
use log::info;
use reqwest::Client;
use reqwest_cookie_store::{CookieStore, CookieStoreMutex};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use tokio::sync::RwLock;

use crate::error::AscError;
use crate::utils::http_utils::default_headers;

/// One isolated cookie-bearing HTTP context. The login phase owns one;
/// every team gets its own so per-team operations never race on a
/// shared "active team" cookie.
#[derive(Debug)]
pub struct SessionContext {
    label: String,
    cookies: Arc<CookieStoreMutex>,
    client: ClientWithMiddleware,
}

impl SessionContext {
    pub(crate) fn new(label: String, config: &Config, seed: CookieStore) -> Result<Self, AscError> {
        let cookies = Arc::new(CookieStoreMutex::new(seed));
        let client = Client::builder()
            .default_headers(default_headers(&config.user_agent))
            .cookie_provider(Arc::clone(&cookies))
            .build()?;
        Ok(SessionContext {
            label,
            cookies,
            client: build_retry_client(client),
        })
    }

    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn client(&self) -> &ClientWithMiddleware {
        &self.client
    }

    pub(crate) fn cookies(&self) -> &Arc<CookieStoreMutex> {
        &self.cookies
    }

    /// Deep copy of the jar, used to seed a new per-team context from
    /// the login context. Round-trips through the store's JSON form so
    /// non-persistent auth cookies survive.
    pub(crate) fn snapshot(&self) -> CookieStore {
        let mut buf = Vec::new();
        {
            let store = self
                .cookies
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if store
                .save_incl_expired_and_nonpersistent_json(&mut buf)
                .is_err()
            {
                return CookieStore::default();
            }
        }
        CookieStore::load_json_all(&buf[..]).unwrap_or_default()
    }
}

fn build_retry_client(client: Client) -> ClientWithMiddleware {
    let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
    ClientBuilder::new(client)
        .with(RetryTransientMiddleware::new_with_policy(retry_policy))
        .build()
}

/// Sole authority for the team id -> session context mapping. Creation
/// is idempotent per team id; the first writer wins and everyone else
/// reuses that context.
#[derive(Debug, Default)]
pub(crate) struct SessionMap {
    inner: RwLock<HashMap<i64, Arc<SessionContext>>>,
}

impl SessionMap {
    pub(crate) async fn session_for(
        &self,
        team_id: i64,
        login: &SessionContext,
        config: &Config,
    ) -> Result<Arc<SessionContext>, AscError> {
        if let Some(existing) = self.inner.read().await.get(&team_id) {
            return Ok(Arc::clone(existing));
        }

        let mut guard = self.inner.write().await;
        // a concurrent caller may have created it between the locks
        if let Some(existing) = guard.get(&team_id) {
            return Ok(Arc::clone(existing));
        }

        info!("Creating session context for team {team_id}");
        let context = Arc::new(SessionContext::new(
            format!("team_{team_id}"),
            config,
            login.snapshot(),
        )?);
        guard.insert(team_id, Arc::clone(&context));
        Ok(context)
    }

    pub(crate) async fn contexts(&self) -> Vec<(i64, Arc<SessionContext>)> {
        self.inner
            .read()
            .await
            .iter()
            .map(|(id, context)| (*id, Arc::clone(context)))
            .collect()
    }

    pub(crate) async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
