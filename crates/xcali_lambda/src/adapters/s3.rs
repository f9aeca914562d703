use async_trait::async_trait;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use chrono::Utc;
use rand::distributions::{Alphanumeric, DistString};
use xcali_core::session::{SessionStore, SessionToken};
use xcali_core::storage_keys::{
    client_asset_object_key, drawing_object_key, name_under_prefix, session_object_key,
    ALLOWED_CREDENTIAL_KEY, DRAWINGS_PREFIX, SESSIONS_PREFIX,
};
use xcali_core::store::{StoreError, StoreResult};

use crate::adapters::asset_store::AssetStore;
use crate::adapters::drawing_store::DrawingStore;
use crate::config::AppConfig;

pub const SESSION_TOKEN_LEN: usize = 32;
const MODIFIED_BY_METADATA: &str = "modified-by";
const DRAWING_CONTENT_TYPE: &str = "application/json";

/// Sessions, the deployment credential, drawings and client assets, all kept
/// in one bucket under separate prefixes.
#[derive(Clone)]
pub struct S3Store {
    bucket: String,
    s3_client: aws_sdk_s3::Client,
}

impl S3Store {
    pub fn new(bucket: impl Into<String>, s3_client: aws_sdk_s3::Client) -> Self {
        Self {
            bucket: bucket.into(),
            s3_client,
        }
    }

    pub async fn from_config(config: &AppConfig) -> Self {
        let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        Self::new(config.bucket.clone(), aws_sdk_s3::Client::new(&aws_config))
    }

    async fn list_names(&self, operation: &'static str, prefix: &str) -> StoreResult<Vec<String>> {
        let mut pages = self
            .s3_client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut names = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|error| {
                StoreError::backend(
                    operation,
                    format!("failed to list objects under {prefix}: {error}"),
                )
            })?;
            names.extend(
                page.contents()
                    .iter()
                    .filter_map(|object| object.key())
                    .filter_map(|key| name_under_prefix(prefix, key))
                    .map(str::to_string),
            );
        }

        Ok(names)
    }

    async fn read_object(&self, operation: &'static str, key: String) -> StoreResult<Vec<u8>> {
        let output = match self
            .s3_client
            .get_object()
            .bucket(&self.bucket)
            .key(&key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(error) => {
                if error
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    return Err(StoreError::not_found(key));
                }
                return Err(StoreError::backend(
                    operation,
                    format!("failed to read object {key} from s3: {error}"),
                ));
            }
        };

        let data = output.body.collect().await.map_err(|error| {
            StoreError::backend(operation, format!("failed to read body of {key}: {error}"))
        })?;
        Ok(data.into_bytes().to_vec())
    }

    async fn write_object(
        &self,
        operation: &'static str,
        key: String,
        body: Vec<u8>,
        content_type: Option<&str>,
        modified_by: Option<&str>,
    ) -> StoreResult<()> {
        let mut request = self
            .s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body));
        if let Some(content_type) = content_type {
            request = request.content_type(content_type);
        }
        if let Some(modified_by) = modified_by {
            request = request.metadata(MODIFIED_BY_METADATA, modified_by);
        }

        request.send().await.map(|_| ()).map_err(|error| {
            StoreError::backend(operation, format!("failed to write object {key} to s3: {error}"))
        })
    }
}

pub fn generate_session_token() -> String {
    Alphanumeric.sample_string(&mut rand::thread_rng(), SESSION_TOKEN_LEN)
}

/// Credential objects are usually uploaded from a shell, so a trailing line
/// break is not part of the credential.
fn credential_from_object(operation: &'static str, bytes: Vec<u8>) -> StoreResult<String> {
    let text = String::from_utf8(bytes)
        .map_err(|_| StoreError::backend(operation, "allowed credential is not valid UTF-8"))?;
    Ok(text.trim_end_matches(['\r', '\n']).to_string())
}

#[async_trait]
impl SessionStore for S3Store {
    async fn list_valid_tokens(&self) -> StoreResult<Vec<String>> {
        self.list_names("list_valid_tokens", SESSIONS_PREFIX).await
    }

    async fn allowed_credential(&self) -> StoreResult<String> {
        let bytes = self
            .read_object("allowed_credential", ALLOWED_CREDENTIAL_KEY.to_string())
            .await?;
        credential_from_object("allowed_credential", bytes)
    }

    async fn create_token(&self) -> StoreResult<SessionToken> {
        let token = generate_session_token();
        let created_at = Utc::now().to_rfc3339();
        self.write_object(
            "create_token",
            session_object_key(&token),
            created_at.into_bytes(),
            Some("text/plain"),
            None,
        )
        .await?;
        Ok(SessionToken::new(token))
    }
}

#[async_trait]
impl DrawingStore for S3Store {
    async fn list_titles(&self) -> StoreResult<Vec<String>> {
        let mut titles = self.list_names("list_titles", DRAWINGS_PREFIX).await?;
        titles.sort();
        Ok(titles)
    }

    async fn get_by_title(&self, title: &str) -> StoreResult<Vec<u8>> {
        self.read_object("get_by_title", drawing_object_key(title))
            .await
    }

    async fn put_by_title(
        &self,
        title: &str,
        content: Vec<u8>,
        modified_by: Option<&str>,
    ) -> StoreResult<()> {
        self.write_object(
            "put_by_title",
            drawing_object_key(title),
            content,
            Some(DRAWING_CONTENT_TYPE),
            modified_by,
        )
        .await
    }
}

#[async_trait]
impl AssetStore for S3Store {
    async fn get_asset(&self, path: &str) -> StoreResult<Vec<u8>> {
        self.read_object("get_asset", client_asset_object_key(path))
            .await
    }
}
