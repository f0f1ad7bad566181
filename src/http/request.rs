//! Request view handed to processor actions.
//!
//! # Responsibilities
//! - Buffer the request body once so it can be read any number of times
//! - Expose the path variables resolved by the route table
//! - Unify query, form and JSON input behind [`RequestView::data`]
//!
//! # Design Decisions
//! - Content type detection is a case-insensitive substring match, so
//!   parameterized types like `application/json; charset=utf-8` qualify
//! - Query parameters are merged first and form parameters second: on a
//!   colliding key the form value wins
//! - Form bodies are read only for `application/x-www-form-urlencoded` or a
//!   missing content type
//! - `multipart/form-data` parts are split out when the body is buffered;
//!   text parts count as form parameters, file parts are described in
//!   `data()` by name, type and size

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart};
use axum::http::{header, request::Parts, HeaderMap, Method, Request, Uri};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

/// Variables extracted from the matched path pattern, keyed by name.
pub type PathVariables = BTreeMap<String, String>;

const JSON_MIME: &str = "application/json";
const FORM_MIME: &str = "application/x-www-form-urlencoded";
const MULTIPART_MIME: &str = "multipart/form-data";

/// Header carrying the request ID assigned by the transport.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Errors raised while reading request input.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The body claimed to be JSON but did not decode.
    #[error("invalid JSON body: {0}")]
    Json(#[from] serde_json::Error),

    /// The body is not valid UTF-8 text.
    #[error("body is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

/// One part of a `multipart/form-data` body.
#[derive(Debug, Clone)]
pub struct FormPart {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl FormPart {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Whether the part is a file upload rather than a plain field.
    pub fn is_file(&self) -> bool {
        self.file_name.is_some()
    }
}

/// Read-mostly view over one inbound request.
#[derive(Debug)]
pub struct RequestView {
    parts: Parts,
    body: Bytes,
    form_parts: Vec<FormPart>,
    path_variables: PathVariables,
}

impl RequestView {
    /// Build a view from an already buffered request.
    pub fn new(parts: Parts, body: Bytes, path_variables: PathVariables) -> Self {
        Self {
            parts,
            body,
            form_parts: Vec::new(),
            path_variables,
        }
    }

    /// Buffer `request`'s body (up to `limit` bytes) and build a view over it.
    ///
    /// Multipart bodies are split into their parts here; a malformed one is
    /// reported like any other unreadable body.
    pub async fn from_request(
        request: Request<Body>,
        path_variables: PathVariables,
        limit: usize,
    ) -> Result<Self, axum::Error> {
        let (parts, body) = request.into_parts();
        let body = axum::body::to_bytes(body, limit).await?;

        let mut view = Self::new(parts, body, path_variables);
        if view.is_multipart() {
            view.form_parts = read_multipart(&view.parts, &view.body).await?;
        }
        Ok(view)
    }

    /// Variables resolved from the route's path pattern.
    pub fn path_variables(&self) -> &PathVariables {
        &self.path_variables
    }

    /// A single path variable.
    pub fn path_variable(&self, name: &str) -> Option<&str> {
        self.path_variables.get(name).map(String::as_str)
    }

    /// Unified request input.
    ///
    /// JSON bodies are decoded as-is. Anything else yields an object of the
    /// query parameters merged with the form parameters, form values taking
    /// precedence. Uploaded files appear as `{filename, type, size}`
    /// objects. The body is left intact for later reads.
    pub fn data(&self) -> Result<Value, RequestError> {
        if self.is_json() {
            return Ok(serde_json::from_slice(&self.body)?);
        }

        let mut data = Map::new();
        for (key, value) in self.query_params().into_iter().chain(self.form_params()) {
            data.insert(key, Value::String(value));
        }
        for file in self.files() {
            data.insert(
                file.name().to_string(),
                json!({
                    "filename": file.file_name(),
                    "type": file.content_type(),
                    "size": file.data().len(),
                }),
            );
        }
        Ok(Value::Object(data))
    }

    /// Decode a JSON body into `T`, regardless of the declared content type.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, RequestError> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Decoded query string pairs, in order of appearance.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.query()
            .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default()
    }

    /// Decoded form body pairs, from a url-encoded body or the non-file
    /// parts of a multipart one.
    pub fn form_params(&self) -> Vec<(String, String)> {
        if self.is_multipart() {
            return self
                .form_parts
                .iter()
                .filter(|part| !part.is_file())
                .map(|part| (part.name.clone(), String::from_utf8_lossy(&part.data).into_owned()))
                .collect();
        }
        if !self.is_form() {
            return Vec::new();
        }
        url::form_urlencoded::parse(&self.body).into_owned().collect()
    }

    /// Every part of a multipart body, in order.
    pub fn form_parts(&self) -> &[FormPart] {
        &self.form_parts
    }

    /// File uploads from a multipart body.
    pub fn files(&self) -> impl Iterator<Item = &FormPart> {
        self.form_parts.iter().filter(|part| part.is_file())
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn path(&self) -> &str {
        self.parts.uri.path()
    }

    pub fn query(&self) -> Option<&str> {
        self.parts.uri.query()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    /// A header value, if present and visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.parts.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(header::CONTENT_TYPE.as_str())
    }

    /// Request ID assigned by the transport, if any.
    pub fn request_id(&self) -> Option<&str> {
        self.header(X_REQUEST_ID)
    }

    /// The raw buffered body.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// The body as UTF-8 text.
    pub fn text(&self) -> Result<&str, RequestError> {
        Ok(std::str::from_utf8(&self.body)?)
    }

    fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains(JSON_MIME))
            .unwrap_or(false)
    }

    fn is_form(&self) -> bool {
        match self.content_type() {
            Some(ct) => ct.to_ascii_lowercase().contains(FORM_MIME),
            None => true,
        }
    }

    fn is_multipart(&self) -> bool {
        self.content_type()
            .map(|ct| ct.to_ascii_lowercase().contains(MULTIPART_MIME))
            .unwrap_or(false)
    }
}

/// Split a buffered multipart body into its parts.
async fn read_multipart(parts: &Parts, body: &Bytes) -> Result<Vec<FormPart>, axum::Error> {
    let mut request = Request::new(Body::from(body.clone()));
    *request.headers_mut() = parts.headers.clone();
    *request.extensions_mut() = parts.extensions.clone();

    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(axum::Error::new)?;

    let mut form_parts = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(axum::Error::new)? {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let data = field.bytes().await.map_err(axum::Error::new)?;
        form_parts.push(FormPart {
            name,
            file_name,
            content_type,
            data,
        });
    }
    Ok(form_parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    fn view(uri: &str, content_type: Option<&str>, body: &'static [u8]) -> RequestView {
        let mut builder = Request::builder().method("POST").uri(uri);
        if let Some(ct) = content_type {
            builder = builder.header("Content-Type", ct);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        RequestView::new(parts, Bytes::from_static(body), PathVariables::new())
    }

    #[test]
    fn test_json_body_decoded() {
        let req = view("/foo", Some("application/json"), br#"{"foo":"bar"}"#);

        assert_eq!(req.data().unwrap(), json!({ "foo": "bar" }));
        // Body stays readable after decoding
        assert_eq!(req.text().unwrap(), r#"{"foo":"bar"}"#);
        assert_eq!(req.data().unwrap(), json!({ "foo": "bar" }));
    }

    #[test]
    fn test_parameterized_json_content_type() {
        let req = view("/foo", Some("Application/JSON; charset=utf-8"), br#"[1, 2]"#);
        assert_eq!(req.data().unwrap(), json!([1, 2]));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let req = view("/foo", Some("application/json"), b"{not json");
        assert!(matches!(req.data(), Err(RequestError::Json(_))));
    }

    #[test]
    fn test_query_and_form_merged() {
        let req = view(
            "/foo?bar=baz",
            Some("application/x-www-form-urlencoded"),
            b"testing=data",
        );

        assert_eq!(req.data().unwrap(), json!({ "bar": "baz", "testing": "data" }));
    }

    #[test]
    fn test_form_value_wins_over_query() {
        let req = view(
            "/foo?key=from-query&only=query",
            Some("application/x-www-form-urlencoded"),
            b"key=from-form",
        );

        let data = req.data().unwrap();
        assert_eq!(data["key"], "from-form");
        assert_eq!(data["only"], "query");
    }

    #[test]
    fn test_missing_content_type_reads_form() {
        let req = view("/foo", None, b"a=1&b=two+words");
        assert_eq!(req.data().unwrap(), json!({ "a": "1", "b": "two words" }));
    }

    #[test]
    fn test_other_content_types_ignore_body() {
        let req = view("/foo?q=1", Some("text/plain"), b"a=1");
        assert_eq!(req.data().unwrap(), json!({ "q": "1" }));
    }

    #[test]
    fn test_typed_json() {
        #[derive(Deserialize)]
        struct Input {
            foo: String,
        }

        let req = view("/foo", Some("application/json"), br#"{"foo":"bar"}"#);
        let input: Input = req.json().unwrap();
        assert_eq!(input.foo, "bar");
    }

    #[test]
    fn test_path_variables() {
        let (parts, _) = Request::builder().uri("/foo/testing").body(()).unwrap().into_parts();
        let mut vars = PathVariables::new();
        vars.insert("bar".into(), "testing".into());
        let req = RequestView::new(parts, Bytes::new(), vars);

        assert_eq!(req.path_variables()["bar"], "testing");
        assert_eq!(req.path_variable("bar"), Some("testing"));
        assert_eq!(req.path_variable("missing"), None);
        assert_eq!(req.path(), "/foo/testing");
    }

    #[tokio::test]
    async fn test_from_request_buffers_body() {
        let req = Request::builder()
            .uri("/foo")
            .header(X_REQUEST_ID, "abc")
            .body(Body::from("hello"))
            .unwrap();

        let view = RequestView::from_request(req, PathVariables::new(), 1024)
            .await
            .unwrap();
        assert_eq!(view.text().unwrap(), "hello");
        assert_eq!(view.request_id(), Some("abc"));
    }

    #[tokio::test]
    async fn test_from_request_enforces_limit() {
        let req = Request::builder()
            .uri("/foo")
            .body(Body::from("0123456789"))
            .unwrap();

        assert!(RequestView::from_request(req, PathVariables::new(), 4).await.is_err());
    }

    const MULTIPART_BODY: &str = "--XYZ\r\n\
        Content-Disposition: form-data; name=\"testing\"\r\n\r\n\
        data\r\n\
        --XYZ\r\n\
        Content-Disposition: form-data; name=\"upload\"; filename=\"notes.txt\"\r\n\
        Content-Type: text/plain\r\n\r\n\
        hello\r\n\
        --XYZ--\r\n";

    fn multipart_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/foo?bar=baz")
            .header("Content-Type", "multipart/form-data; boundary=XYZ")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_multipart_fields_merged_into_data() {
        let view = RequestView::from_request(multipart_request(MULTIPART_BODY), PathVariables::new(), 1024)
            .await
            .unwrap();

        assert_eq!(
            view.data().unwrap(),
            json!({
                "bar": "baz",
                "testing": "data",
                "upload": { "filename": "notes.txt", "type": "text/plain", "size": 5 },
            })
        );
        assert_eq!(view.form_params(), vec![("testing".to_string(), "data".to_string())]);

        let files: Vec<&FormPart> = view.files().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].data().as_ref(), b"hello");
        assert_eq!(view.form_parts().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_multipart_is_an_error() {
        let result =
            RequestView::from_request(multipart_request("no boundary here"), PathVariables::new(), 1024).await;
        assert!(result.is_err());
    }
}
