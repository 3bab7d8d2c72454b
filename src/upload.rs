// Upload module: sends one image to the hosting service and turns the
// response into a shareable link.
//
// The HTTP exchange sits behind the `Transport` trait so the pipeline can be
// exercised without a network. `HttpTransport` is the real thing: a blocking
// reqwest client built once per process and reused for every upload.

use crate::error::{TransportError, UploadError};
use crate::response::extract_link;
use anyhow::{Context, Result};
use reqwest::blocking::{multipart, Client};
use reqwest::header::AUTHORIZATION;
use reqwest::redirect::Policy;
use std::path::Path;
use std::time::Duration;

/// Image endpoint used when `SNAPLINK_UPLOAD_URL` is not set.
pub const DEFAULT_UPLOAD_URL: &str = "https://api.imgur.com/3/image";

/// Environment variable that overrides the upload endpoint.
pub const UPLOAD_URL_ENV: &str = "SNAPLINK_UPLOAD_URL";

/// Whole-request timeout, connect included.
pub const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

const MAX_REDIRECTS: usize = 10;

/// Everything the transport needs to build one multipart POST.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Sent as the `image` part.
    pub bytes: Vec<u8>,
    /// File name attached to the `image` part.
    pub file_name: String,
    pub client_id: String,
}

/// A single request/response exchange with the hosting service.
///
/// Implementations return the raw response body on a successful transfer and
/// never look inside it.
pub trait Transport {
    fn post_image(&self, request: UploadRequest) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn post_image(&self, request: UploadRequest) -> Result<Vec<u8>, TransportError> {
        (**self).post_image(request)
    }
}

/// Blocking HTTP transport posting multipart form data.
pub struct HttpTransport {
    client: Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(HttpTransport {
            client,
            url: url.into(),
        })
    }

    /// Endpoint from `SNAPLINK_UPLOAD_URL`, or the public image API.
    pub fn from_env() -> Result<Self> {
        let url = std::env::var(UPLOAD_URL_ENV).unwrap_or_else(|_| DEFAULT_UPLOAD_URL.into());
        Self::new(url)
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn post_image(&self, request: UploadRequest) -> Result<Vec<u8>, TransportError> {
        let mime = content_type(&request.file_name);
        let part = multipart::Part::bytes(request.bytes)
            .file_name(request.file_name)
            .mime_str(mime)?;
        let form = multipart::Form::new()
            .part("image", part)
            .text("type", "image");

        log::debug!("POST {}", self.url);
        let res = self
            .client
            .post(&self.url)
            .header(AUTHORIZATION, format!("Client-ID {}", request.client_id))
            .multipart(form)
            .send()?;

        let status = res.status();
        println!("Response code: {}", status);
        if !status.is_success() {
            let txt = res.text().unwrap_or_default();
            log::debug!("Upload rejected: {} - {}", status, txt);
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = res.bytes()?;
        Ok(body.to_vec())
    }
}

/// Mime type for the `image` part, from the file extension.
fn content_type(file_name: &str) -> &'static str {
    match Path::new(file_name).extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Last segment of `path`, splitting on both `/` and `\`.
pub fn image_name(path: &str) -> Option<String> {
    path.split(&['/', '\\'][..])
        .filter(|segment| !segment.is_empty())
        .last()
        .map(str::to_owned)
}

/// Uploads single files through a [`Transport`].
pub struct ImageUploader<T> {
    transport: T,
}

impl<T: Transport> ImageUploader<T> {
    pub fn new(transport: T) -> Self {
        ImageUploader { transport }
    }

    /// Upload the file at `path` and return its hosted link.
    ///
    /// Fails with [`UploadError::FileNotFound`] before touching the transport
    /// when `path` is not a readable regular file.
    pub fn upload(&self, path: &Path, client_id: &str) -> Result<String, UploadError> {
        if !path.is_file() {
            return Err(UploadError::FileNotFound(path.to_path_buf()));
        }
        let bytes =
            std::fs::read(path).map_err(|_| UploadError::FileNotFound(path.to_path_buf()))?;
        let file_name =
            image_name(&path.to_string_lossy()).unwrap_or_else(|| "image".to_string());

        let body = self.transport.post_image(UploadRequest {
            bytes,
            file_name,
            client_id: client_id.to_string(),
        })?;

        extract_link(&body)?.ok_or(UploadError::NoLink)
    }
}
