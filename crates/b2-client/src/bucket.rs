//! Bucket operations

use crate::{B2Client, Bucket, BucketType, Result, Session};
use serde::{de::IgnoredAny, Deserialize, Serialize};
use tracing::instrument;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucketRequest<'a> {
    account_id: &'a str,
    bucket_name: &'a str,
    bucket_type: BucketType,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBucketResponse {
    bucket_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BucketRequest<'a> {
    account_id: &'a str,
    bucket_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateBucketRequest<'a> {
    account_id: &'a str,
    bucket_id: &'a str,
    bucket_type: BucketType,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AccountRequest<'a> {
    account_id: &'a str,
}

#[derive(Deserialize)]
struct ListBucketsResponse {
    buckets: Vec<BucketEntry>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketEntry {
    bucket_name: String,
    bucket_id: String,
    bucket_type: String,
}

impl B2Client {
    /// Create a bucket.
    ///
    /// The returned bucket carries the server-assigned ID; name and type are
    /// the ones requested.
    #[instrument(skip(self, session))]
    pub async fn create_bucket(
        &self,
        session: &Session,
        name: &str,
        bucket_type: BucketType,
    ) -> Result<Bucket> {
        if self.config().validate_bucket_names {
            Bucket::validate_name(name)?;
        }

        let request = CreateBucketRequest {
            account_id: &session.account_id,
            bucket_name: name,
            bucket_type,
        };
        let response: CreateBucketResponse = self
            .call(&session.api_url, "b2_create_bucket", &session.auth_token, &request)
            .await?;

        Ok(Bucket::new(name, response.bucket_id, bucket_type))
    }

    /// Delete a bucket. The service refuses while it still holds file versions.
    #[instrument(skip(self, session), fields(bucket_id = %bucket.id))]
    pub async fn delete_bucket(&self, session: &Session, bucket: &Bucket) -> Result<()> {
        let request = BucketRequest {
            account_id: &session.account_id,
            bucket_id: &bucket.id,
        };
        let _: IgnoredAny = self
            .call(&session.api_url, "b2_delete_bucket", &session.auth_token, &request)
            .await?;
        Ok(())
    }

    /// Push the bucket's privacy setting to the service
    #[instrument(skip(self, session), fields(bucket_id = %bucket.id))]
    pub async fn update_bucket(&self, session: &Session, bucket: &Bucket) -> Result<()> {
        let request = UpdateBucketRequest {
            account_id: &session.account_id,
            bucket_id: &bucket.id,
            bucket_type: bucket.bucket_type,
        };
        let _: IgnoredAny = self
            .call(&session.api_url, "b2_update_bucket", &session.auth_token, &request)
            .await?;
        Ok(())
    }

    /// List all buckets of the session's account
    #[instrument(skip(self, session))]
    pub async fn list_buckets(&self, session: &Session) -> Result<Vec<Bucket>> {
        let request = AccountRequest {
            account_id: &session.account_id,
        };
        let response: ListBucketsResponse = self
            .call(&session.api_url, "b2_list_buckets", &session.auth_token, &request)
            .await?;

        response
            .buckets
            .into_iter()
            .map(|entry| -> Result<Bucket> {
                let bucket_type = entry.bucket_type.parse()?;
                Ok(Bucket::new(entry.bucket_name, entry.bucket_id, bucket_type))
            })
            .collect()
    }
}
