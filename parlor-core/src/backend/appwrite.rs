use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use super::{DocumentStore, FileStore, Query, StoredFile, UNIQUE_ID};
use crate::config::BackendConfig;
use crate::error::{ParlorError, ParlorResult};
use crate::models::{DocumentList, MessageKind};

/// REST client for the document database and storage bucket.
#[derive(Clone)]
pub struct AppwriteClient {
    http: Client,
    endpoint: String,
    project_id: String,
    database_id: String,
    bucket_id: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(rename = "type", default)]
    kind: String,
}

impl AppwriteClient {
    pub fn new(config: &BackendConfig) -> ParlorResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            database_id: config.database_id.clone(),
            bucket_id: config.bucket_id.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    fn files_url(&self) -> String {
        format!("{}/storage/buckets/{}/files", self.endpoint, self.bucket_id)
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Response-Format", "1.5.0")
    }

    async fn read_json(response: Response, collection: &str, id: Option<&str>) -> ParlorResult<Value> {
        let response = Self::check(response, collection, id).await?;
        response
            .json::<Value>()
            .await
            .map_err(|e| ParlorError::BackendParseError(e.to_string()))
    }

    async fn check(response: Response, collection: &str, id: Option<&str>) -> ParlorResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let service = response
            .url()
            .host_str()
            .unwrap_or("backend")
            .to_string();
        let body = response.json::<ErrorBody>().await.ok();
        let message = body
            .as_ref()
            .map(|b| b.message.clone())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.to_string());
        debug!(status = %status, kind = ?body.as_ref().map(|b| &b.kind), "Backend request rejected");

        Err(match status {
            StatusCode::NOT_FOUND if id.is_some() => ParlorError::DocumentNotFound {
                collection: collection.to_string(),
                id: id.unwrap_or_default().to_string(),
            },
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ParlorError::PermissionDenied { service, message }
            }
            StatusCode::TOO_MANY_REQUESTS => ParlorError::RateLimited {
                service,
                retry_after_secs: 60,
            },
            s if s.is_server_error() => ParlorError::BackendUnavailable(message),
            _ => ParlorError::BackendRequestFailed(message),
        })
    }

    async fn send_upload(&self, form: Form) -> ParlorResult<StoredFile> {
        let response = self
            .request(Method::POST, &self.files_url())
            .multipart(form)
            .send()
            .await?;

        let response = match Self::check(response, &self.bucket_id, None).await {
            Ok(r) => r,
            Err(e) => return Err(ParlorError::UploadFailed(e.to_string())),
        };
        response
            .json::<StoredFile>()
            .await
            .map_err(|e| ParlorError::BackendParseError(e.to_string()))
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string()
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn create_document(&self, collection: &str, data: Value) -> ParlorResult<Value> {
        debug!(collection = %collection, "Creating document");
        let response = self
            .request(Method::POST, &self.documents_url(collection))
            .json(&json!({ "documentId": UNIQUE_ID, "data": data }))
            .send()
            .await?;
        Self::read_json(response, collection, None).await
    }

    async fn get_document(&self, collection: &str, id: &str) -> ParlorResult<Value> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let response = self.request(Method::GET, &url).send().await?;
        Self::read_json(response, collection, Some(id)).await
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> ParlorResult<DocumentList<Value>> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.encode()))
            .collect();
        let response = self
            .request(Method::GET, &self.documents_url(collection))
            .query(&params)
            .send()
            .await?;
        let value = Self::read_json(response, collection, None).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn update_document(
        &self,
        collection: &str,
        id: &str,
        data: Value,
    ) -> ParlorResult<Value> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let response = self
            .request(Method::PATCH, &url)
            .json(&json!({ "data": data }))
            .send()
            .await?;
        Self::read_json(response, collection, Some(id)).await
    }

    async fn delete_document(&self, collection: &str, id: &str) -> ParlorResult<()> {
        let url = format!("{}/{}", self.documents_url(collection), id);
        let response = self.request(Method::DELETE, &url).send().await?;
        Self::check(response, collection, Some(id)).await?;
        Ok(())
    }
}

#[async_trait]
impl FileStore for AppwriteClient {
    async fn upload_file(&self, path: &Path) -> ParlorResult<StoredFile> {
        let file = match tokio::fs::File::open(path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ParlorError::MediaFileNotFound(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let length = file.metadata().await?.len();
        let mime = MessageKind::from_path(path).mime_type(path);

        let part = Part::stream_with_length(Body::from(file), length)
            .file_name(file_name_of(path))
            .mime_str(mime)?;
        let form = Form::new().text("fileId", UNIQUE_ID).part("file", part);

        debug!(path = %path.display(), bytes = length, "Uploading media");
        self.send_upload(form).await
    }

    async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        mime_type: &str,
    ) -> ParlorResult<StoredFile> {
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime_type)?;
        let form = Form::new().text("fileId", UNIQUE_ID).part("file", part);
        self.send_upload(form).await
    }

    fn view_url(&self, file_id: &str) -> String {
        format!(
            "{}/{}/view?project={}",
            self.files_url(),
            file_id,
            self.project_id
        )
    }

    async fn delete_file(&self, file_id: &str) -> ParlorResult<()> {
        let url = format!("{}/{}", self.files_url(), file_id);
        let response = self.request(Method::DELETE, &url).send().await?;
        if let Err(e) = Self::check(response, &self.bucket_id, Some(file_id)).await {
            warn!(file_id = %file_id, "Stored file delete failed: {}", e);
            return Err(ParlorError::FileDeleteFailed {
                file_id: file_id.to_string(),
                message: e.to_string(),
            });
        }
        Ok(())
    }
}
