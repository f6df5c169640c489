//! Common types for the client SDK

use crate::{ClientError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Bucket names may not start with this prefix
pub const RESERVED_BUCKET_PREFIX: &str = "b2-";

/// Shortest accepted bucket name
pub const MIN_BUCKET_NAME_LEN: usize = 6;

/// Longest accepted bucket name
pub const MAX_BUCKET_NAME_LEN: usize = 50;

/// An authorized session returned by `b2_authorize_account`.
///
/// Sessions are never refreshed in place. When the service starts rejecting
/// the token (see [`ClientError::is_expired_auth`]) authorize again.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Token for the `Authorization` header of every later call
    pub auth_token: String,
    /// Account that owns the session
    pub account_id: String,
    /// Base URL for API calls
    pub api_url: String,
    /// Base URL for downloads
    pub download_url: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("auth_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .field("api_url", &self.api_url)
            .field("download_url", &self.download_url)
            .finish()
    }
}

/// Bucket privacy setting
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BucketType {
    /// Anyone may download files
    Public,
    /// Downloads need an authorization token
    Private,
}

impl BucketType {
    /// Every bucket type, in wire-table order
    pub const ALL: [BucketType; 2] = [BucketType::Public, BucketType::Private];

    /// Wire identifier
    pub fn as_str(self) -> &'static str {
        match self {
            BucketType::Public => "allPublic",
            BucketType::Private => "allPrivate",
        }
    }
}

impl fmt::Display for BucketType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BucketType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ClientError::UnknownBucketType(s.to_string()))
    }
}

impl TryFrom<&str> for BucketType {
    type Error = ClientError;

    fn try_from(s: &str) -> Result<Self> {
        s.parse()
    }
}

impl Serialize for BucketType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BucketType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A bucket
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    /// Bucket name
    pub name: String,
    /// Server-assigned bucket ID, empty until created
    pub id: String,
    /// Privacy setting
    pub bucket_type: BucketType,
}

impl Bucket {
    /// Create a bucket value
    pub fn new(name: impl Into<String>, id: impl Into<String>, bucket_type: BucketType) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            bucket_type,
        }
    }

    /// Change the privacy setting; send with `update_bucket` to apply it
    pub fn with_type(mut self, bucket_type: BucketType) -> Self {
        self.bucket_type = bucket_type;
        self
    }

    /// Check a bucket name against the service's naming rules.
    ///
    /// The service stays the authority; this only fails fast on names it
    /// would certainly reject.
    pub fn validate_name(name: &str) -> Result<()> {
        let len = name.chars().count();
        if len < MIN_BUCKET_NAME_LEN {
            return Err(ClientError::InvalidBucketName(format!(
                "{name:?} is shorter than {MIN_BUCKET_NAME_LEN} characters"
            )));
        }
        if len > MAX_BUCKET_NAME_LEN {
            return Err(ClientError::InvalidBucketName(format!(
                "{name:?} is longer than {MAX_BUCKET_NAME_LEN} characters"
            )));
        }
        if name.starts_with(RESERVED_BUCKET_PREFIX) {
            return Err(ClientError::InvalidBucketName(format!(
                "{name:?} starts with the reserved prefix {RESERVED_BUCKET_PREFIX:?}"
            )));
        }
        if let Some(c) = name.chars().find(|c| !c.is_ascii_alphanumeric() && *c != '-') {
            return Err(ClientError::InvalidBucketName(format!(
                "{name:?} contains {c:?}; only letters, digits and '-' are allowed"
            )));
        }
        Ok(())
    }
}

/// Destination for one upload, from `b2_get_upload_url`
#[derive(Clone, PartialEq, Eq)]
pub struct UploadTicket {
    /// Bucket receiving the upload
    pub bucket: Bucket,
    /// URL to POST the file content to
    pub upload_url: String,
    /// Token for the upload's `Authorization` header
    pub auth_token: String,
}

impl fmt::Debug for UploadTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadTicket")
            .field("bucket", &self.bucket)
            .field("upload_url", &self.upload_url)
            .field("auth_token", &"<redacted>")
            .finish()
    }
}

/// A stored file
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    /// File name
    pub name: String,
    /// MIME type chosen by the service
    pub content_type: String,
    /// Server-assigned file ID
    pub id: String,
    /// Size in bytes
    pub size: u64,
    /// Upload time in milliseconds since the Unix epoch, 0 when unknown
    pub upload_timestamp: u64,
}

impl File {
    /// Upload time, if the service reported one
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        if self.upload_timestamp == 0 {
            return None;
        }
        i64::try_from(self.upload_timestamp)
            .ok()
            .and_then(DateTime::from_timestamp_millis)
    }
}

/// One page of a file listing
#[derive(Clone, Debug, Default)]
pub struct FilePage {
    /// Files in server order
    pub files: Vec<File>,
    /// Name to start the next page at, `None` on the last page
    pub next_file_name: Option<String>,
}

impl FilePage {
    /// Returns true if there is a next page
    pub fn has_next(&self) -> bool {
        self.next_file_name.is_some()
    }
}
