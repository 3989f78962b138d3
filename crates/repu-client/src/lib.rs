use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, instrument, warn};

pub mod api;
pub mod config;
pub mod envelope;
pub mod filters;
pub mod params;
pub mod transport;

pub use api::{NewEvent, ReviewQuery};
pub use config::{ClientConfig, BASE_URL_ENV, REQUEST_TIMEOUT};
pub use envelope::unwrap_response;
pub use filters::GlobalFilters;
pub use params::{clean_params, Params};
pub use transport::{HttpTransport, OutboundRequest, RawResponse, Transport};

pub use repu_auth::{AuthEvent, SessionStore};
pub use repu_error::{ErrorMetadataBuilder, RepuError, Result};

const AUTH_EVENT_CAPACITY: usize = 16;

/// Envelope client: one shared transport plus the outbound (credential) and
/// inbound (envelope unwrap) stages.
///
/// Callers only ever see `data` of successful envelopes, raw bodies of
/// non-envelope endpoints, or a classified [`RepuError`]. A 401 envelope
/// clears the session and publishes [`AuthEvent::SessionExpired`]; routing
/// back to the login view is left to whoever subscribes.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    auth_events: broadcast::Sender<AuthEvent>,
}

impl ApiClient {
    pub fn new(cfg: ClientConfig, session: Arc<SessionStore>) -> Result<Self> {
        let transport = HttpTransport::new(cfg)?;
        Ok(Self::with_transport(Arc::new(transport), session))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        let (auth_events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            transport,
            session,
            auth_events,
        }
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub fn subscribe_auth_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.auth_events.subscribe()
    }

    pub async fn get(&self, path: &str, params: Params) -> Result<Value> {
        self.request(Method::GET, path, params, None).await
    }

    pub async fn post(&self, path: &str, body: Option<Value>, params: Params) -> Result<Value> {
        self.request(Method::POST, path, params, body).await
    }

    pub async fn get_as<T: DeserializeOwned>(&self, path: &str, params: Params) -> Result<T> {
        let value = self.get(path, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn post_as<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
        params: Params,
    ) -> Result<T> {
        let value = self.post(path, body, params).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// sanitize -> attach credential -> send -> unwrap
    #[instrument(skip_all, fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Params,
        body: Option<Value>,
    ) -> Result<Value> {
        let operation = format!("{method} {path}");
        let mut outbound = OutboundRequest::new(method, path);
        outbound.query = clean_params(&params).to_query();
        outbound.body = body;
        self.attach_credentials(&mut outbound);

        debug!(query = outbound.query.len(), "sending request");
        let result = match self.transport.send(outbound).await {
            Ok(resp) => self.handle_inbound(&resp),
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            let role = self.session.current_session().role().to_string();
            let mut metadata = ErrorMetadataBuilder::new("repu-client")
                .operation(&operation)
                .role(&role);
            if let Some(code) = e.envelope_code() {
                metadata = metadata.context("code", &code.to_string());
            }
            if e.is_transport() {
                metadata = metadata.context("stage", "transport");
            }
            e.log(&metadata.build(e));
        }
        result
    }

    /// Read the token per request so login/logout apply immediately.
    fn attach_credentials(&self, request: &mut OutboundRequest) {
        if let Some(token) = self.session.token() {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
    }

    fn handle_inbound(&self, resp: &RawResponse) -> Result<Value> {
        let result = unwrap_response(resp);
        if let Err(RepuError::Authentication { message }) = &result {
            self.on_auth_lost(message);
        }
        result
    }

    fn on_auth_lost(&self, message: &str) {
        warn!(%message, "authentication rejected by server, clearing session");
        if let Err(e) = self.session.clear_session() {
            warn!(error = %e, "session cleared in memory only");
        }
        let event = AuthEvent::SessionExpired {
            message: message.to_string(),
        };
        if self.auth_events.send(event).is_err() {
            debug!("no auth event subscribers");
        }
    }
}
