//! Client configuration

use crate::{ClientError, Result};
use std::time::Duration;
use url::Url;

/// Endpoint for `b2_authorize_account`; later calls use the URLs in the session
pub const DEFAULT_API_URL: &str = "https://api.backblaze.com";

/// Path segment placed between a base URL and the API method name
pub const API_PREFIX: &str = "b2api/v1";

/// Buffer size for hashing, uploading and downloading file content
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Files requested per `b2_list_file_names` call
pub const DEFAULT_LIST_PAGE_SIZE: u32 = 1000;

/// Upper bound on listing pages fetched by a single `list_files` call
pub const DEFAULT_MAX_LIST_PAGES: usize = 10_000;

/// Upload content type that asks the service to detect the MIME type
pub const AUTO_CONTENT_TYPE: &str = "b2/x-auto";

/// Client configuration
#[derive(Clone, Debug)]
pub struct Config {
    /// URL used for account authorization
    pub api_url: String,
    /// User agent string sent with every request
    pub user_agent: String,
    /// Request timeout
    pub timeout: Duration,
    /// Page size for file listings (`maxFileCount`)
    pub list_page_size: u32,
    /// Maximum number of listing pages before giving up
    pub max_list_pages: usize,
    /// Check bucket names locally before creating a bucket
    pub validate_bucket_names: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            user_agent: format!("b2-client/{}", env!("CARGO_PKG_VERSION")),
            timeout: Duration::from_secs(30),
            list_page_size: DEFAULT_LIST_PAGE_SIZE,
            max_list_pages: DEFAULT_MAX_LIST_PAGES,
            validate_bucket_names: true,
        }
    }
}

impl Config {
    /// Create a new config with the given authorization URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            ..Default::default()
        }
    }

    /// Set the authorization URL
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// Set the user agent
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the listing page size
    pub fn with_list_page_size(mut self, size: u32) -> Self {
        self.list_page_size = size.max(1);
        self
    }

    /// Set the listing page limit
    pub fn with_max_list_pages(mut self, pages: usize) -> Self {
        self.max_list_pages = pages.max(1);
        self
    }

    /// Leave bucket name checks entirely to the server
    pub fn without_name_validation(mut self) -> Self {
        self.validate_bucket_names = false;
        self
    }

    /// Check that the configuration can be used to build a client
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_url)
            .map_err(|e| ClientError::Config(format!("invalid api_url {:?}: {}", self.api_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ClientError::Config(format!(
                "api_url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.user_agent.is_empty() {
            return Err(ClientError::Config("user_agent must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Build `{base}/b2api/v1/{method}`
pub(crate) fn method_url(base_url: &str, method: &str) -> String {
    format!("{}/{}/{}", base_url.trim_end_matches('/'), API_PREFIX, method)
}
