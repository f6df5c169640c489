//! File operations
//!
//! Uploads go straight to the URL in an [`UploadTicket`]; everything else
//! goes through the session's API or download URL.

use crate::{
    compute_content_hash,
    transport::{ByteStream, HttpRequest, RequestBody},
    B2Client, Bucket, ClientError, File, FilePage, Result, Session, UploadTicket,
    AUTO_CONTENT_TYPE,
};
use futures::TryStreamExt;
use reqwest::header::{HeaderName, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{de::IgnoredAny, Deserialize, Serialize};
use std::ffi::OsString;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

const FILE_NAME_HEADER: HeaderName = HeaderName::from_static("x-bz-file-name");
const CONTENT_SHA1_HEADER: HeaderName = HeaderName::from_static("x-bz-content-sha1");

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketIdRequest<'a> {
    bucket_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetUploadUrlResponse {
    upload_url: String,
    authorization_token: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadFileResponse {
    file_id: String,
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    upload_timestamp: Option<u64>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileIdRequest<'a> {
    file_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteFileRequest<'a> {
    file_name: &'a str,
    file_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListFileNamesRequest<'a> {
    bucket_id: &'a str,
    max_file_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_file_name: Option<&'a str>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListFileNamesResponse {
    files: Vec<FileDocument>,
    #[serde(default)]
    next_file_name: Option<String>,
}

/// File description shared by `b2_get_file_info` and `b2_list_file_names`
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileDocument {
    file_id: String,
    file_name: String,
    #[serde(default)]
    content_type: String,
    #[serde(default)]
    content_length: Option<u64>,
    #[serde(default)]
    size: Option<u64>,
    #[serde(default)]
    upload_timestamp: Option<u64>,
}

impl From<FileDocument> for File {
    fn from(doc: FileDocument) -> Self {
        File {
            name: doc.file_name,
            content_type: doc.content_type,
            id: doc.file_id,
            size: doc.content_length.or(doc.size).unwrap_or(0),
            upload_timestamp: doc.upload_timestamp.unwrap_or(0),
        }
    }
}

impl B2Client {
    // ==================== Uploads ====================

    /// Get a destination for one upload into `bucket`.
    ///
    /// Tickets expire; when an upload fails on an expired ticket, ask for a
    /// new one. Nothing here retries on its own.
    #[instrument(skip(self, session), fields(bucket_id = %bucket.id))]
    pub async fn get_upload_url(&self, session: &Session, bucket: &Bucket) -> Result<UploadTicket> {
        let request = BucketIdRequest {
            bucket_id: &bucket.id,
        };
        let response: GetUploadUrlResponse = self
            .call(&session.api_url, "b2_get_upload_url", &session.auth_token, &request)
            .await?;

        Ok(UploadTicket {
            bucket: bucket.clone(),
            upload_url: response.upload_url,
            auth_token: response.authorization_token,
        })
    }

    /// Upload a file from disk under `name`.
    ///
    /// The file is read twice, once for its SHA-1 and once while sending, each
    /// time one chunk at a time.
    #[instrument(skip(self, ticket, path), fields(bucket = %ticket.bucket.name))]
    pub async fn upload_file(
        &self,
        ticket: &UploadTicket,
        path: impl AsRef<Path>,
        name: &str,
    ) -> Result<File> {
        let path = path.as_ref();
        let sha1 = compute_content_hash(path).await?;
        let file = tokio::fs::File::open(path).await?;
        let length = file.metadata().await?.len();
        debug!(length, %sha1, "Uploading {}", path.display());

        let request = HttpRequest {
            url: ticket.upload_url.clone(),
            headers: vec![
                (USER_AGENT, self.config().user_agent.clone()),
                (AUTHORIZATION, ticket.auth_token.clone()),
                (CONTENT_TYPE, AUTO_CONTENT_TYPE.to_string()),
                (FILE_NAME_HEADER, encode_file_name(name)),
                (CONTENT_SHA1_HEADER, sha1),
            ],
            body: RequestBody::File { file, length },
        };

        let response = self.execute("b2_upload_file", request).await?;
        let uploaded: UploadFileResponse = serde_json::from_slice(&response.bytes().await?)?;

        Ok(File {
            name: name.to_string(),
            content_type: uploaded.content_type,
            id: uploaded.file_id,
            size: length,
            upload_timestamp: uploaded.upload_timestamp.unwrap_or(0),
        })
    }

    // ==================== Downloads ====================

    /// Download a file to `destination`, returning the number of bytes written.
    #[instrument(skip(self, session, file, destination), fields(file_id = %file.id))]
    pub async fn download_file(
        &self,
        session: &Session,
        file: &File,
        destination: impl AsRef<Path>,
    ) -> Result<u64> {
        self.download_file_by_id(session, &file.id, destination).await
    }

    /// Download a file by ID to `destination`.
    ///
    /// The body is streamed into a fresh hidden `.partial` file next to
    /// `destination` and renamed into place only once complete. The staging
    /// file is removed on any failure and when the future is dropped early;
    /// `destination` is left untouched in both cases.
    #[instrument(skip(self, session, destination))]
    pub async fn download_file_by_id(
        &self,
        session: &Session,
        file_id: &str,
        destination: impl AsRef<Path>,
    ) -> Result<u64> {
        let destination = destination.as_ref();
        let request = FileIdRequest { file_id };
        let response = self
            .post_json(
                &session.download_url,
                "b2_download_file_by_id",
                &session.auth_token,
                &request,
            )
            .await?;

        // Deleted on drop until persisted
        let staging = staging_file(destination)?;
        let out = tokio::fs::File::from_std(staging.as_file().try_clone()?);
        let written = write_stream(response.body, out).await?;

        staging
            .persist(destination)
            .map_err(|e| ClientError::Io(e.error))?;
        debug!(written, "Downloaded to {}", destination.display());
        Ok(written)
    }

    // ==================== Metadata ====================

    /// Delete one version of a file
    #[instrument(skip(self, session, file), fields(file_id = %file.id, file_name = %file.name))]
    pub async fn delete_file(&self, session: &Session, file: &File) -> Result<()> {
        let request = DeleteFileRequest {
            file_name: &file.name,
            file_id: &file.id,
        };
        let _: IgnoredAny = self
            .call(
                &session.api_url,
                "b2_delete_file_version",
                &session.auth_token,
                &request,
            )
            .await?;
        Ok(())
    }

    /// Fetch a file's metadata
    #[instrument(skip(self, session))]
    pub async fn get_file_info(&self, session: &Session, file_id: &str) -> Result<File> {
        let request = FileIdRequest { file_id };
        let doc: FileDocument = self
            .call(&session.api_url, "b2_get_file_info", &session.auth_token, &request)
            .await?;
        Ok(doc.into())
    }

    // ==================== Listing ====================

    /// List every file in a bucket, following continuation cursors.
    ///
    /// Stops when the service returns no `nextFileName`. Cursors must sort
    /// strictly after the one just sent; a cursor that does not advance, or
    /// `Config::max_list_pages` pages without reaching the end, fails with
    /// [`ClientError::Pagination`].
    #[instrument(skip(self, session), fields(bucket_id = %bucket.id))]
    pub async fn list_files(&self, session: &Session, bucket: &Bucket) -> Result<Vec<File>> {
        let max_pages = self.config().max_list_pages;
        let mut files = Vec::new();
        let mut cursor: Option<String> = None;

        for page_number in 1..=max_pages {
            let page = self
                .list_files_page(session, bucket, cursor.as_deref())
                .await?;
            files.extend(page.files);

            match page.next_file_name {
                None => {
                    debug!(pages = page_number, files = files.len(), "Listing complete");
                    return Ok(files);
                }
                Some(next) if cursor.as_deref().is_some_and(|sent| next.as_str() <= sent) => {
                    warn!(cursor = %next, "Listing cursor did not advance");
                    return Err(ClientError::Pagination(format!(
                        "cursor {:?} does not advance past {:?}",
                        next,
                        cursor.unwrap_or_default()
                    )));
                }
                Some(next) => cursor = Some(next),
            }
        }

        warn!(max_pages, "Listing stopped at page limit");
        Err(ClientError::Pagination(format!(
            "listing did not finish within {} pages",
            max_pages
        )))
    }

    /// Fetch one page of a bucket listing, starting at `start_file_name`
    #[instrument(skip(self, session), fields(bucket_id = %bucket.id))]
    pub async fn list_files_page(
        &self,
        session: &Session,
        bucket: &Bucket,
        start_file_name: Option<&str>,
    ) -> Result<FilePage> {
        let request = ListFileNamesRequest {
            bucket_id: &bucket.id,
            max_file_count: self.config().list_page_size,
            start_file_name,
        };
        let response: ListFileNamesResponse = self
            .call(&session.api_url, "b2_list_file_names", &session.auth_token, &request)
            .await?;

        Ok(FilePage {
            files: response.files.into_iter().map(File::from).collect(),
            next_file_name: response.next_file_name.filter(|name| !name.is_empty()),
        })
    }
}

/// Percent-encode a file name for `X-Bz-File-Name`, keeping `/` separators
fn encode_file_name(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Uniquely named `.<file name>.XXXXXX.partial` in the destination's directory,
/// so the final rename never crosses file systems
fn staging_file(destination: &Path) -> Result<NamedTempFile> {
    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut prefix = OsString::from(".");
    if let Some(name) = destination.file_name() {
        prefix.push(name);
        prefix.push(".");
    }

    Ok(Builder::new()
        .prefix(&prefix)
        .suffix(".partial")
        .tempfile_in(dir)?)
}

async fn write_stream(mut body: ByteStream, mut out: tokio::fs::File) -> Result<u64> {
    let mut written = 0u64;

    while let Some(chunk) = body.try_next().await? {
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }

    out.flush().await?;
    out.sync_all().await?;
    Ok(written)
}
