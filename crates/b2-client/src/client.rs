//! Main client implementation

use crate::{
    config::method_url,
    transport::{HttpRequest, HttpResponse, HttpTransport, RequestBody, Transport},
    ClientError, Config, Result, Session,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};

/// B2 storage client
///
/// Holds configuration and a transport, never a session: every operation
/// after [`B2Client::authorize_account`] takes the [`Session`] explicitly.
#[derive(Clone)]
pub struct B2Client {
    config: Config,
    transport: Arc<dyn Transport>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthorizeAccountResponse {
    authorization_token: String,
    api_url: String,
    download_url: String,
}

#[derive(Serialize)]
struct EmptyRequest {}

impl B2Client {
    /// Create a new client backed by `reqwest`
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a client over any transport
    pub fn with_transport(config: Config, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Create with default configuration
    pub fn default_client() -> Result<Self> {
        Self::new(Config::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    // ==================== Authorization ====================

    /// Authorize an account and start a session.
    ///
    /// This is the only call that does not take a [`Session`]. The account ID
    /// and application key are sent as HTTP Basic credentials.
    #[instrument(skip(self, application_key))]
    pub async fn authorize_account(
        &self,
        account_id: &str,
        application_key: &str,
    ) -> Result<Session> {
        let authorization = basic_authorization(account_id, application_key);
        let response: AuthorizeAccountResponse = self
            .call(
                &self.config.api_url,
                "b2_authorize_account",
                &authorization,
                &EmptyRequest {},
            )
            .await?;

        Ok(Session {
            auth_token: response.authorization_token,
            account_id: account_id.to_string(),
            api_url: response.api_url,
            download_url: response.download_url,
        })
    }

    // ==================== Helper Methods ====================

    /// POST a JSON body to an API method and decode the success document
    pub(crate) async fn call<B, T>(
        &self,
        base_url: &str,
        method: &str,
        authorization: &str,
        body: &B,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.post_json(base_url, method, authorization, body).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// POST a JSON body to an API method and return the unread success response
    pub(crate) async fn post_json<B>(
        &self,
        base_url: &str,
        method: &str,
        authorization: &str,
        body: &B,
    ) -> Result<HttpResponse>
    where
        B: Serialize + ?Sized,
    {
        let request = HttpRequest {
            url: method_url(base_url, method),
            headers: vec![
                (USER_AGENT, self.config.user_agent.clone()),
                (AUTHORIZATION, authorization.to_string()),
            ],
            body: RequestBody::Json(serde_json::to_vec(body)?.into()),
        };
        self.execute(method, request).await
    }

    /// Send a request; statuses of 400 and above become [`ClientError::Api`]
    pub(crate) async fn execute(&self, method: &str, request: HttpRequest) -> Result<HttpResponse> {
        debug!("Calling {} at {}", method, request.url);
        let response = self.transport.send(request).await?;

        let status = response.status.as_u16();
        debug!(method, status, "Received response");
        if status >= 400 {
            let body = response.bytes().await?;
            return Err(ClientError::from_error_body(status, &body));
        }

        Ok(response)
    }
}

impl std::fmt::Debug for B2Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("B2Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// `Basic base64(accountId:applicationKey)`
fn basic_authorization(account_id: &str, application_key: &str) -> String {
    let credentials = format!("{}:{}", account_id, application_key);
    format!("Basic {}", STANDARD.encode(credentials))
}
