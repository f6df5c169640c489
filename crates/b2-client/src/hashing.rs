//! SHA-1 content hashing for upload integrity checks
//!
//! The service verifies every upload against the `X-Bz-Content-Sha1` header,
//! so the digest must cover exactly the bytes that are sent.

use crate::{Result, CHUNK_SIZE};
use sha1::{Digest, Sha1};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Hash a file on disk, reading it `CHUNK_SIZE` bytes at a time.
///
/// Returns the digest as 40 lower-case hex characters.
pub async fn compute_content_hash(path: impl AsRef<Path>) -> Result<String> {
    let mut file = tokio::fs::File::open(path.as_ref()).await?;
    let mut hasher = Sha1::new();
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf).await?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Hash an in-memory buffer
pub fn content_hash(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}
