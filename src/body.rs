use http::Method;
use reqwest::Body;
use tokio_util::io::ReaderStream;

use crate::error::{Error, Result};
use crate::multipart::{MultipartForm, FILE_FIELD};
use crate::query::encode_pairs;
use crate::request::{BodySource, FileUpload};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An encoded request body together with the content type it was encoded as
#[derive(Debug, Default)]
pub struct EncodedBody {
    /// The body; `None` for bodyless requests
    pub body: Option<Body>,
    /// Value for the `Content-Type` header, if the strategy defines one
    pub content_type: Option<String>,
}

impl EncodedBody {
    fn new(body: impl Into<Body>, content_type: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            content_type: Some(content_type.into()),
        }
    }

    /// Buffered body bytes, or `None` for streaming and empty bodies
    pub fn as_bytes(&self) -> Option<&[u8]> {
        self.body.as_ref().and_then(|b| b.as_bytes())
    }
}

/// Encode the body for a request sent with `method`
pub async fn encode_body(method: &Method, source: BodySource) -> Result<EncodedBody> {
    tracing::trace!(strategy = source.kind(), %method, "encoding request body");

    match source {
        BodySource::Empty => Ok(EncodedBody::default()),
        BodySource::Json(payload) => Ok(EncodedBody::new(payload.to_json()?, JSON_CONTENT_TYPE)),
        BodySource::Xml(payload) => Ok(EncodedBody::new(payload.to_xml()?, XML_CONTENT_TYPE)),
        BodySource::File { upload, fields } if method == Method::POST => {
            let FileUpload {
                file_name,
                file_contents,
            } = upload;
            let contents = file_contents
                .ok_or_else(|| Error::invalid_input("file upload has no contents"))?;

            let mut form = MultipartForm::new();
            form.add_file(FILE_FIELD, &file_name, contents).await?;
            form.add_fields(&fields);

            let content_type = form.content_type();
            Ok(EncodedBody::new(form.finish(), content_type))
        }
        BodySource::File { upload, .. } => Ok(raw_upload(upload)),
        BodySource::Form(data) => Ok(EncodedBody::new(encode_pairs(&data), FORM_CONTENT_TYPE)),
    }
}

/// PUT/PATCH style upload: the stream is the body, the type is guessed from
/// the file name
fn raw_upload(upload: FileUpload) -> EncodedBody {
    let content_type = mime_guess::from_path(&upload.file_name)
        .first_raw()
        .unwrap_or_default()
        .to_string();
    let body = upload
        .file_contents
        .map(|contents| Body::wrap_stream(ReaderStream::new(contents)));

    EncodedBody {
        body,
        content_type: Some(content_type),
    }
}
