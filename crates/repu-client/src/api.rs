//! Typed wrappers for the dashboard endpoints. Results other than login are
//! opaque JSON handed to the views as-is.

use repu_core::{LoginRequest, LoginResponse, Session};
use repu_error::{RepuError, Result};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use crate::filters::GlobalFilters;
use crate::params::Params;
use crate::ApiClient;

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_PAGE_SIZE: u32 = 20;
const DEFAULT_TOP_N: u32 = 20;

/// Review list filters on top of the global ones.
#[derive(Debug, Clone, Default)]
pub struct ReviewQuery {
    pub filters: GlobalFilters,
    pub platform_id: Option<i64>,
    pub aspect_id: Option<i64>,
    pub sentiment: Option<String>,
    pub keyword: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ReviewQuery {
    pub fn params(&self) -> Params {
        self.filters.common_params().merge(
            Params::new()
                .with_opt("platformId", self.platform_id)
                .with_opt("aspectId", self.aspect_id)
                .with_opt("sentiment", self.sentiment.as_deref())
                .with_opt("keyword", self.keyword.as_deref())
                .with("page", self.page.unwrap_or(DEFAULT_PAGE))
                .with("pageSize", self.page_size.unwrap_or(DEFAULT_PAGE_SIZE)),
        )
    }
}

/// Marketing or operations event recorded against a product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub product_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub start_date: String,
    pub end_date: Option<String>,
}

impl ApiClient {
    /// Log in and store the returned credential.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse> {
        let body = serde_json::to_value(LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        })?;
        let resp: LoginResponse = self
            .post_as("/api/auth/login", Some(body), Params::new())
            .await?;

        let session = Session::from(resp.clone());
        if !session.is_authenticated() {
            return Err(RepuError::Serialization {
                format: "json".to_string(),
                message: "login response without token or role".to_string(),
            });
        }
        self.session().set_session(session.token(), session.role())?;
        info!(role = %resp.role, "logged in");
        Ok(resp)
    }

    /// Client-side logout; the backend keeps no logout endpoint.
    pub fn logout(&self) -> Result<()> {
        self.session().clear_session()?;
        info!("logged out");
        Ok(())
    }

    // ========== meta ==========

    pub async fn products(&self) -> Result<Value> {
        self.get("/api/meta/products", Params::new()).await
    }

    pub async fn platforms(&self) -> Result<Value> {
        self.get("/api/meta/platforms", Params::new()).await
    }

    pub async fn aspects(&self) -> Result<Value> {
        self.get("/api/meta/aspects", Params::new()).await
    }

    // ========== dashboard / analysis ==========

    pub async fn dashboard_overview(&self, filters: &GlobalFilters) -> Result<Value> {
        self.get("/api/dashboard/overview", filters.common_params())
            .await
    }

    pub async fn aspect_analysis(&self, filters: &GlobalFilters) -> Result<Value> {
        self.get("/api/analysis/aspects", filters.common_params())
            .await
    }

    pub async fn trend(&self, filters: &GlobalFilters, aspect_id: Option<i64>) -> Result<Value> {
        let params = filters
            .common_params()
            .merge(Params::new().with_opt("aspectId", aspect_id));
        self.get("/api/analysis/trend", params).await
    }

    pub async fn keywords(
        &self,
        filters: &GlobalFilters,
        aspect_id: Option<i64>,
        top_n: Option<u32>,
    ) -> Result<Value> {
        let params = filters.common_params().merge(
            Params::new()
                .with_opt("aspectId", aspect_id)
                .with("topN", top_n.unwrap_or(DEFAULT_TOP_N)),
        );
        self.get("/api/analysis/keywords", params).await
    }

    // ========== reviews ==========

    pub async fn reviews(&self, query: &ReviewQuery) -> Result<Value> {
        self.get("/api/reviews", query.params()).await
    }

    pub async fn review_detail(&self, id: i64) -> Result<Value> {
        self.get(&format!("/api/reviews/{id}"), Params::new()).await
    }

    // ========== compare / decision ==========

    pub async fn compare_aspects(
        &self,
        filters: &GlobalFilters,
        competitor_id: Option<i64>,
    ) -> Result<Value> {
        let params = filters
            .common_params()
            .merge(Params::new().with_opt("competitorId", competitor_id));
        self.get("/api/compare/aspects", params).await
    }

    pub async fn suggestions(&self, filters: &GlobalFilters) -> Result<Value> {
        self.get("/api/decision/suggestions", filters.common_params())
            .await
    }

    // ========== alerts ==========

    pub async fn alerts(&self, product_id: Option<i64>, status: Option<&str>) -> Result<Value> {
        let params = Params::new()
            .with_opt("productId", product_id)
            .with_opt("status", status);
        self.get("/api/alerts", params).await
    }

    pub async fn ack_alert(&self, id: i64) -> Result<Value> {
        self.post("/api/alerts/ack", None, Params::new().with("id", id))
            .await
    }

    // ========== events / evaluation ==========

    pub async fn events(&self, product_id: Option<i64>) -> Result<Value> {
        self.get("/api/events", Params::new().with_opt("productId", product_id))
            .await
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<Value> {
        let body = serde_json::to_value(event)?;
        self.post("/api/events", Some(body), Params::new()).await
    }

    pub async fn before_after(&self, event_id: i64) -> Result<Value> {
        self.get(
            "/api/evaluate/before-after",
            Params::new().with("eventId", event_id),
        )
        .await
    }
}
