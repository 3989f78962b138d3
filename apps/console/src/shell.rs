use anyhow::{anyhow, Context};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info, warn};

use repu_auth::{AuthEvent, Navigator, RouteTable, SessionStore, SledStorage, SystemRole};
use repu_client::{ApiClient, Params};

use crate::config::AppConfig;

const SESSION_DB: &str = "session";

/// Terminal stand-in for the dashboard shell: one client, one navigator,
/// and the auth events the client publishes.
pub struct Shell {
    client: ApiClient,
    navigator: Navigator,
    auth_events: broadcast::Receiver<AuthEvent>,
}

impl Shell {
    pub fn open(cfg: &AppConfig) -> anyhow::Result<Self> {
        let dir = cfg.state_dir();
        std::fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;
        let storage = SledStorage::open(dir.join(SESSION_DB))?;
        let session = Arc::new(SessionStore::load(Arc::new(storage))?);
        let client = ApiClient::new(cfg.client_config()?, session)?;
        Ok(Self::with_client(client))
    }

    pub fn with_client(client: ApiClient) -> Self {
        let navigator = Navigator::new(RouteTable::dashboard(), client.session().clone());
        let auth_events = client.subscribe_auth_events();
        Self {
            client,
            navigator,
            auth_events,
        }
    }

    pub fn location(&self) -> &str {
        self.navigator.current()
    }

    /// Log in from the login page. `redirect` is where to land afterwards
    /// when the role may open it.
    pub async fn login(
        &mut self,
        username: &str,
        password: &str,
        redirect: Option<&str>,
    ) -> anyhow::Result<String> {
        let login_path = self.navigator.table().login_path().to_string();
        self.navigator.navigate(&login_path)?;

        let result = self.client.login(username, password).await;
        self.drain_auth_events()?;
        result?;
        Ok(self.navigator.after_login(redirect)?)
    }

    pub fn logout(&mut self) -> anyhow::Result<String> {
        self.client.logout()?;
        let login_path = self.navigator.table().login_path().to_string();
        Ok(self.navigator.navigate(&login_path)?)
    }

    pub fn whoami(&self) -> Value {
        let session = self.client.session().current_session();
        if !session.is_authenticated() {
            return serde_json::json!({ "authenticated": false });
        }
        serde_json::json!({
            "authenticated": true,
            "role": session.role(),
            "home": SystemRole::home_route(session.role()),
        })
    }

    pub fn open_view(&mut self, path: &str) -> anyhow::Result<String> {
        Ok(self.navigator.navigate(path)?)
    }

    /// GET an endpoint while "standing on" a view; a 401 moves the shell
    /// to the login page before the error is reported.
    pub async fn get(&mut self, path: &str, params: Params, view: Option<&str>) -> anyhow::Result<Value> {
        if let Some(view) = view {
            self.navigator.navigate(view)?;
        }
        let result = self.client.get(path, params).await;
        self.drain_auth_events()?;
        Ok(result?)
    }

    fn drain_auth_events(&mut self) -> anyhow::Result<()> {
        loop {
            match self.auth_events.try_recv() {
                Ok(event) => {
                    if let Some(location) = self.navigator.handle_auth_event(&event)? {
                        info!(%location, "redirected after auth event");
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "auth events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => {
                    debug!("auth events drained");
                    return Ok(());
                }
            }
        }
    }
}

/// `key=value` into a query pair. Numbers and booleans keep their type.
pub fn parse_param(arg: &str) -> anyhow::Result<(String, Value)> {
    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| anyhow!("expected key=value, got {arg:?}"))?;
    if key.trim().is_empty() {
        return Err(anyhow!("empty parameter name in {arg:?}"));
    }
    let value = match serde_json::from_str::<Value>(raw) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(raw.to_string()),
    };
    Ok((key.trim().to_string(), value))
}
