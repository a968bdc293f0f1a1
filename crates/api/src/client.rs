//! REST API client implementation
//!
//! Translates bucket and object operations into account-scoped HTTP calls
//! and implements the ObjectStore trait from r2-core.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, ETAG, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use url::Url;

use r2_core::{
    BucketInfo, BucketRef, Error, ObjectInfo, ObjectMetadata, ObjectPath, ObjectStore, Result,
    StoredObject,
};

use crate::envelope::{self, BucketList, Envelope};

/// Request header carrying the bucket jurisdiction
pub const JURISDICTION_HEADER: &str = "cf-r2-jurisdiction";

/// Account identifier and API token
#[derive(Debug, Clone)]
pub struct Credentials {
    pub account_id: String,
    pub api_token: String,
}

/// HTTP client for the account-scoped bucket API
pub struct RemoteClient {
    http: Client,
    base_url: Url,
    credentials: Credentials,
}

impl RemoteClient {
    /// Create a new client against `base_url`
    pub fn new(credentials: Credentials, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("r2/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Network(format!("Failed to create HTTP client: {e}")))?;
        Self::with_http_client(credentials, base_url, http)
    }

    /// Create a client that sends through an existing reqwest client
    pub fn with_http_client(credentials: Credentials, base_url: &str, http: Client) -> Result<Self> {
        let base_url = Url::parse(base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::Config(format!("API URL '{base_url}' cannot be a base URL")));
        }
        Ok(Self {
            http,
            base_url,
            credentials,
        })
    }

    /// Build `<base>/accounts/<account>/r2/buckets[/<segments>...]`
    ///
    /// Each segment is percent-encoded, including any `/` in object keys.
    fn buckets_url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["accounts", self.credentials.account_id.as_str(), "r2", "buckets"])
                .extend(segments);
        }
        url
    }

    fn request(&self, method: Method, url: Url, jurisdiction: Option<&str>) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.credentials.api_token));
        if let Some(j) = jurisdiction {
            builder = builder.header(JURISDICTION_HEADER, j);
        }
        builder
    }

    /// Request for `create_bucket`
    pub fn create_bucket_request(&self, bucket: &BucketRef) -> RequestBuilder {
        self.request(
            Method::POST,
            self.buckets_url(&[]),
            bucket.jurisdiction.as_deref(),
        )
        .json(&serde_json::json!({ "name": bucket.name }))
    }

    /// Request for `list_buckets`
    pub fn list_buckets_request(&self) -> RequestBuilder {
        self.request(Method::GET, self.buckets_url(&[]), None)
    }

    /// Request for `delete_bucket`
    pub fn delete_bucket_request(&self, bucket: &BucketRef) -> RequestBuilder {
        self.request(
            Method::DELETE,
            self.buckets_url(&[bucket.name.as_str()]),
            bucket.jurisdiction.as_deref(),
        )
    }

    /// Request for `put_object`, with metadata mapped onto standard headers
    pub fn put_object_request(
        &self,
        path: &ObjectPath,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<RequestBuilder> {
        let mut builder = self.request(Method::PUT, self.object_url(path), None);
        for (name, value) in metadata.headers() {
            let value = HeaderValue::from_str(value)
                .map_err(|_| Error::Validation(format!("Invalid value for {name}: {value:?}")))?;
            builder = builder.header(HeaderName::from_static(name), value);
        }
        Ok(builder.body(body))
    }

    /// Request for `get_object`
    pub fn get_object_request(&self, path: &ObjectPath) -> RequestBuilder {
        self.request(Method::GET, self.object_url(path), None)
    }

    /// Request for `delete_object`
    pub fn delete_object_request(&self, path: &ObjectPath) -> RequestBuilder {
        self.request(Method::DELETE, self.object_url(path), None)
    }

    fn object_url(&self, path: &ObjectPath) -> Url {
        self.buckets_url(&[path.bucket.as_str(), "objects", path.key.as_str()])
    }

    /// Send a request and turn non-success statuses into errors
    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        let status = response.status();
        tracing::debug!(url = %response.url(), %status, "API response");
        if status.is_success() {
            return Ok(response);
        }

        let body = response.bytes().await.unwrap_or_default();
        let message = envelope::error_message(&body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
        Err(status_error(status, message))
    }

    /// Send a request whose response is a JSON envelope
    async fn send_json<T: serde::de::DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<Option<T>> {
        let body = self
            .send(builder)
            .await?
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let envelope: Envelope<T> = serde_json::from_slice(&body)?;
        if !envelope.success {
            return Err(Error::General(
                envelope
                    .error_summary()
                    .unwrap_or_else(|| "Request was not successful".into()),
            ));
        }
        Ok(envelope.result)
    }
}

/// Map an HTTP error status onto the core error taxonomy
pub fn status_error(status: StatusCode, message: String) -> Error {
    match status.as_u16() {
        404 => Error::NotFound(message),
        401 | 403 => Error::Auth(message),
        409 => Error::Conflict(message),
        500..=599 => Error::Network(format!("{message} [{status}]")),
        _ => Error::General(format!("{message} [{status}]")),
    }
}

#[async_trait]
impl ObjectStore for RemoteClient {
    async fn create_bucket(&self, bucket: &BucketRef) -> Result<()> {
        self.send_json::<serde_json::Value>(self.create_bucket_request(bucket))
            .await?;
        Ok(())
    }

    async fn list_buckets(&self) -> Result<Vec<BucketInfo>> {
        let list = self
            .send_json::<BucketList>(self.list_buckets_request())
            .await?;

        Ok(list
            .map(|l| l.buckets)
            .unwrap_or_default()
            .into_iter()
            .map(|b| BucketInfo {
                name: b.name,
                creation_date: b.creation_date,
            })
            .collect())
    }

    async fn delete_bucket(&self, bucket: &BucketRef) -> Result<()> {
        self.send_json::<serde_json::Value>(self.delete_bucket_request(bucket))
            .await?;
        Ok(())
    }

    async fn put_object(
        &self,
        path: &ObjectPath,
        body: Vec<u8>,
        metadata: &ObjectMetadata,
    ) -> Result<ObjectInfo> {
        let size = body.len() as u64;
        let response = self
            .send(self.put_object_request(path, body, metadata)?)
            .await?;

        let mut info = ObjectInfo::new(&path.key, size);
        info.checksum = etag(&response);
        Ok(info)
    }

    async fn get_object(&self, path: &ObjectPath) -> Result<StoredObject> {
        let response = self.send(self.get_object_request(path)).await?;

        let metadata = ObjectMetadata::from_headers(
            response
                .headers()
                .iter()
                .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str(), v))),
        );
        let checksum = etag(&response);

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .to_vec();

        let mut info = ObjectInfo::new(&path.key, body.len() as u64);
        info.checksum = checksum;
        Ok(StoredObject {
            body,
            metadata,
            info,
        })
    }

    async fn delete_object(&self, path: &ObjectPath) -> Result<()> {
        self.send(self.delete_object_request(path)).await?;
        Ok(())
    }
}

fn etag(response: &Response) -> Option<String> {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_matches('"').to_string())
}
