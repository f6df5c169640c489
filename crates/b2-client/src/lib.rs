//! # B2 Client SDK
//!
//! A client SDK for B2 cloud object storage.
//!
//! ## Features
//!
//! - **Sessions**: Authorize once, then pass the [`Session`] into every call
//! - **Typed Errors**: API failures, transport failures and local validation are distinct
//! - **Streaming**: Uploads, downloads and SHA-1 hashing never buffer a whole file
//! - **Pagination**: File listings are merged across pages with a bounded cursor loop
//!
//! ## Example
//!
//! ```rust,ignore
//! use b2_client::{B2Client, BucketType, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = B2Client::new(Config::default())?;
//!     let session = client.authorize_account("account-id", "application-key").await?;
//!
//!     // Create a bucket and upload into it
//!     let bucket = client.create_bucket(&session, "my-photos", BucketType::Private).await?;
//!     let ticket = client.get_upload_url(&session, &bucket).await?;
//!     let file = client.upload_file(&ticket, "cat.jpg", "pets/cat.jpg").await?;
//!
//!     // Download it again
//!     client.download_file(&session, &file, "cat-copy.jpg").await?;
//!
//!     for file in client.list_files(&session, &bucket).await? {
//!         println!("{} ({} bytes)", file.name, file.size);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod bucket;
mod client;
mod config;
mod error;
mod file;
mod hashing;
mod transport;
mod types;

#[cfg(test)]
mod mock;

pub use client::B2Client;
pub use config::{
    Config, API_PREFIX, AUTO_CONTENT_TYPE, CHUNK_SIZE, DEFAULT_API_URL, DEFAULT_LIST_PAGE_SIZE,
    DEFAULT_MAX_LIST_PAGES,
};
pub use error::{ClientError, Result};
pub use hashing::{compute_content_hash, content_hash};
pub use transport::{ByteStream, HttpRequest, HttpResponse, HttpTransport, RequestBody, Transport};
pub use types::*;
