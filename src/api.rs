//! Typed endpoints of the pallet API.
//!
//! Every call goes through [`PalletApi::execute`], which maps statuses onto
//! [`WorkflowError`]: 2xx passes, 401 fires the session expiry handler and
//! becomes `AuthExpired`, anything else is a `Validation` rejection.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::WorkflowError;
use crate::models::{
    CandidateItem, EntryRequest, LocationSlot, LoginResponse, Operation, PendingTransaction,
    RelocationRequest, ServerMessage,
};
use crate::session::SessionContext;
use crate::transport::{ApiRequest, ApiResponse, Transport};

/// Filters of the consultation search. Blank fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsultationFilter {
    pub pallet_id: Option<String>,
    pub client: Option<String>,
    pub article: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
}

impl ConsultationFilter {
    pub fn pallet(mut self, id: &str) -> Self {
        self.pallet_id = Some(id.to_string());
        self
    }

    pub fn client(mut self, client: &str) -> Self {
        self.client = Some(client.to_string());
        self
    }

    pub fn article(mut self, article: &str) -> Self {
        self.article = Some(article.to_string());
        self
    }

    /// The "all statuses" entry of the picker clears the filter
    pub fn status(mut self, status: &str) -> Self {
        self.status = (status != crate::constants::FILTER_ALL).then(|| status.to_string());
        self
    }

    pub fn location(mut self, location: &str) -> Self {
        self.location = Some(location.to_string());
        self
    }
}

pub struct PalletApi {
    transport: Arc<dyn Transport>,
    session: Arc<SessionContext>,
}

impl PalletApi {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionContext>) -> Self {
        Self { transport, session }
    }

    pub fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    /// Send a request, racing it against `cancel`.
    pub async fn execute(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<ApiResponse, WorkflowError> {
        let path = request.full_path();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WorkflowError::Cancelled),
            result = self.send(request) => result?,
        };

        if response.is_success() {
            return Ok(response);
        }

        if response.status == 401 {
            warn!(path = %path, "🔒 Token rejected by server");
            self.session.on_token_expired();
            return Err(WorkflowError::AuthExpired);
        }

        warn!(path = %path, status = response.status, "⚠️ Request rejected");
        Err(WorkflowError::Validation {
            status: response.status,
            body: response.body,
        })
    }

    /// Every request goes through here so the connectivity signal follows
    /// what the network actually does.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, WorkflowError> {
        match self.transport.send(request).await {
            Ok(response) => {
                self.session.connectivity().mark_reachable();
                Ok(response)
            }
            Err(e) => {
                self.session.connectivity().mark_unreachable();
                Err(e.into())
            }
        }
    }

    /// Check whether the server answers at all, whatever the status.
    /// Used to leave the offline state.
    pub async fn check_link(&self) -> bool {
        let reachable = self.send(ApiRequest::get("/")).await.is_ok();
        debug!(reachable, "Link check");
        reachable
    }

    async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: ApiRequest,
        cancel: &CancellationToken,
    ) -> Result<T, WorkflowError> {
        let response = self.execute(request, cancel).await?;
        serde_json::from_str(&response.body).map_err(|e| WorkflowError::Decode(e.to_string()))
    }

    /// OAuth2 password login. Stores the token and opens the session.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<(), WorkflowError> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() || password.is_empty() {
            return Err(WorkflowError::input("Username and password are required"));
        }

        let request = ApiRequest::post("/auth/login").form(&[
            ("grant_type", "password"),
            ("username", username),
            ("password", password),
            ("scope", ""),
            ("client_id", ""),
            ("client_secret", ""),
        ]);

        // A 401 here means bad credentials, not an expired session
        let response = self.send(request).await?;
        if !response.is_success() {
            warn!(status = response.status, "❌ Login refused");
            return Err(WorkflowError::Validation {
                status: response.status,
                body: response.body,
            });
        }

        let login: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|e| WorkflowError::Decode(e.to_string()))?;
        self.session
            .establish(&login.access_token)
            .map_err(|e| WorkflowError::Input(format!("Could not store credentials: {e:#}")))?;

        info!("✅ Login successful");
        Ok(())
    }

    pub async fn candidates(
        &self,
        operation: Operation,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateItem>, WorkflowError> {
        self.fetch_json(ApiRequest::get(operation.candidates_path()), cancel)
            .await
    }

    /// Submit a whole batch in one request.
    pub async fn submit(
        &self,
        operation: Operation,
        transactions: &[PendingTransaction],
        cancel: &CancellationToken,
    ) -> Result<ServerMessage, WorkflowError> {
        let shape = operation.payload_shape();
        let payloads: Vec<_> = transactions.iter().map(|t| t.payload(shape)).collect();
        let request = ApiRequest::post(operation.submit_path()).json(&payloads)?;

        let response = self.execute(request, cancel).await?;
        if response.body.trim().is_empty() {
            return Ok(ServerMessage::default());
        }
        // The acknowledgement text is informative only
        Ok(serde_json::from_str(&response.body).unwrap_or_default())
    }

    pub async fn locations(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<LocationSlot>, WorkflowError> {
        self.fetch_json(ApiRequest::get("/emplacement"), cancel).await
    }

    pub async fn pallet_info(
        &self,
        pallet_id: &str,
        cancel: &CancellationToken,
    ) -> Result<CandidateItem, WorkflowError> {
        self.fetch_json(ApiRequest::get("/entree/palette").segment(pallet_id), cancel)
            .await
    }

    pub async fn record_entry(
        &self,
        pallet_id: &str,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowError> {
        let request = ApiRequest::post("/entree").json(&EntryRequest {
            num_palette: pallet_id,
            emplacement: location,
        })?;
        self.execute(request, cancel).await.map(|_| ())
    }

    pub async fn relocate(
        &self,
        pallet_id: &str,
        location: &str,
        cancel: &CancellationToken,
    ) -> Result<(), WorkflowError> {
        let request = ApiRequest::patch("/emplacement/palette").json(&RelocationRequest {
            num_palette: pallet_id,
            nouvel_emplacement: location,
        })?;
        self.execute(request, cancel).await.map(|_| ())
    }

    pub async fn consult(
        &self,
        filter: &ConsultationFilter,
        cancel: &CancellationToken,
    ) -> Result<Vec<CandidateItem>, WorkflowError> {
        let request = ApiRequest::get("/consultation")
            .query_opt("num_palette", filter.pallet_id.as_deref())
            .query_opt("client", filter.client.as_deref())
            .query_opt("article", filter.article.as_deref())
            .query_opt("statut", filter.status.as_deref())
            .query_opt("emplacement", filter.location.as_deref());
        self.fetch_json(request, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::{Connectivity, ConnectivityMonitor};
    use crate::constants::TOKEN_KEY;
    use crate::credentials::{CredentialStore, MemoryCredentialStore};
    use crate::transport::scripted::ScriptedTransport;
    use crate::transport::RequestBody;
    use serde_json::json;

    fn build_api(
        transport: Arc<ScriptedTransport>,
        token: Option<&str>,
    ) -> (PalletApi, Arc<MemoryCredentialStore>) {
        let store = Arc::new(match token {
            Some(t) => MemoryCredentialStore::with_entry(TOKEN_KEY, t),
            None => MemoryCredentialStore::new(),
        });
        let session = Arc::new(SessionContext::new(
            store.clone(),
            ConnectivityMonitor::new(Connectivity::Wifi),
        ));
        (PalletApi::new(transport, session), store)
    }

    #[tokio::test]
    async fn test_login_posts_password_form_and_stores_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply_json(json!({"access_token": "jwt-1", "token_type": "bearer"}));
        let (api, store) = build_api(transport.clone(), None);

        api.login("alice", "secret").await.unwrap();

        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("jwt-1"));
        assert!(api.session().is_logged_in());
        let request = &transport.requests()[0];
        assert_eq!(request.path, "/auth/login");
        match &request.body {
            RequestBody::Form(fields) => {
                assert!(fields.contains(&("grant_type".to_string(), "password".to_string())));
                assert!(fields.contains(&("username".to_string(), "alice".to_string())));
            }
            other => panic!("expected form body, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_login_rejects_blank_input_locally() {
        let transport = Arc::new(ScriptedTransport::new());
        let (api, _) = build_api(transport.clone(), None);

        let result = api.login("alice", "  ").await;
        assert!(matches!(result, Err(WorkflowError::Input(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_bad_credentials_do_not_look_like_expiry() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(400, r#"{"detail":"Identifiants invalides"}"#);
        let (api, _) = build_api(transport, None);

        let result = api.login("alice", "wrong").await;
        assert!(matches!(result, Err(WorkflowError::Validation { status: 400, .. })));
    }

    #[tokio::test]
    async fn test_401_fires_session_handler() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(401, "");
        let (api, store) = build_api(transport, Some("old"));
        let cancel = CancellationToken::new();

        let result = api.candidates(Operation::Destruction, &cancel).await;
        assert!(matches!(result, Err(WorkflowError::AuthExpired)));
        assert!(store.get(TOKEN_KEY).is_none());
        assert!(!api.session().is_logged_in());
    }

    #[tokio::test]
    async fn test_cancelled_request_returns_cancelled() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply_json(json!([]));
        let (api, _) = build_api(transport, Some("jwt"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = api.locations(&cancel).await;
        assert!(matches!(result, Err(WorkflowError::Cancelled)));
    }

    #[tokio::test]
    async fn test_consultation_query() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply_json(json!([{"num_palette": "P1", "quantite": 3}]));
        let (api, _) = build_api(transport.clone(), Some("jwt"));

        let filter = ConsultationFilter::default()
            .client("Dupont")
            .status(crate::constants::FILTER_ALL)
            .location("");
        let found = api.consult(&filter, &CancellationToken::new()).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(
            transport.requests()[0].query,
            vec![("client".to_string(), "Dupont".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transport_failure_marks_offline_until_the_server_answers() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("connection refused").reply(404, "");
        let (api, _) = build_api(transport.clone(), Some("jwt"));

        let result = api.locations(&CancellationToken::new()).await;
        assert!(matches!(result, Err(WorkflowError::Network(_))));
        assert!(!api.session().is_online());

        // Any status proves the link is back
        assert!(api.check_link().await);
        assert!(api.session().is_online());
        assert_eq!(transport.requests()[1].path, "/");
    }

    #[tokio::test]
    async fn test_undecodable_candidates() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.reply(200, "<html>proxy login</html>");
        let (api, _) = build_api(transport, Some("jwt"));

        let result = api
            .candidates(Operation::Return, &CancellationToken::new())
            .await;
        assert!(matches!(result, Err(WorkflowError::Decode(_))));
    }
}
