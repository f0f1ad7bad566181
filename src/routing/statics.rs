//! Static directory mounts.
//!
//! A mount serves files from a directory under a URL prefix through
//! `tower-http`'s `ServeDir`. Only `GET` and `HEAD` are served; a 404 from
//! the directory lets the request fall through to the not-found path.

use axum::body::Body;
use axum::http::{header, request::Parts, HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri};
use std::path::{Path, PathBuf};
use tower::ServiceExt;
use tower_http::services::ServeDir;

/// A directory served under a URL prefix.
#[derive(Debug, Clone)]
pub struct StaticMount {
    prefix: String,
    directory: PathBuf,
    service: ServeDir,
}

impl StaticMount {
    pub fn new(prefix: &str, directory: impl Into<PathBuf>) -> Self {
        let directory = directory.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
            service: ServeDir::new(&directory),
            directory,
        }
    }

    pub fn prefix(&self) -> &str {
        if self.prefix.is_empty() {
            "/"
        } else {
            &self.prefix
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path relative to the mount, or `None` if `path` lies outside it.
    fn relative<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }

    /// Serve the request from the directory.
    ///
    /// Returns `None` when the mount does not apply or holds no such file.
    pub async fn serve(&self, parts: &Parts) -> Option<Response<Body>> {
        if parts.method != Method::GET && parts.method != Method::HEAD {
            return None;
        }

        let rest = self.relative(parts.uri.path())?;
        let rest = if rest.is_empty() { "/" } else { rest };
        let uri: Uri = match parts.uri.query() {
            Some(query) => format!("{rest}?{query}"),
            None => rest.to_string(),
        }
        .parse()
        .ok()?;

        let mut request = Request::new(Body::empty());
        *request.method_mut() = parts.method.clone();
        *request.uri_mut() = uri;
        *request.headers_mut() = parts.headers.clone();

        let mut response = self
            .service
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|never| match never {});

        if response.status() == StatusCode::NOT_FOUND {
            return None;
        }
        if response.status().is_redirection() {
            self.remount_location(response.headers_mut());
        }

        tracing::debug!(
            prefix = self.prefix(),
            path = parts.uri.path(),
            status = response.status().as_u16(),
            "Served static file"
        );
        Some(response.map(Body::new))
    }

    /// Put the mount prefix back on a redirect issued for the inner path.
    fn remount_location(&self, headers: &mut HeaderMap) {
        let Some(location) = headers.get(header::LOCATION).and_then(|v| v.to_str().ok()) else {
            return;
        };
        if !location.starts_with('/') {
            return;
        }
        if let Ok(value) = HeaderValue::from_str(&format!("{}{location}", self.prefix)) {
            headers.insert(header::LOCATION, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(method: Method, uri: &str) -> Parts {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    #[test]
    fn test_relative_paths() {
        let mount = StaticMount::new("/public/", "/tmp");

        assert_eq!(mount.prefix(), "/public");
        assert_eq!(mount.relative("/public/foo.txt"), Some("/foo.txt"));
        assert_eq!(mount.relative("/public"), Some(""));
        assert_eq!(mount.relative("/publicity"), None);
        assert_eq!(mount.relative("/other/foo.txt"), None);
    }

    #[tokio::test]
    async fn test_serves_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo.txt"), "bar").unwrap();
        let mount = StaticMount::new("/public", dir.path());

        let response = mount.serve(&parts(Method::GET, "/public/foo.txt")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"bar");
    }

    #[tokio::test]
    async fn test_directory_redirect_stays_under_mount() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("sub").join("index.html"), "<p>sub</p>").unwrap();
        let mount = StaticMount::new("/public", dir.path());

        let response = mount.serve(&parts(Method::GET, "/public/sub")).await.unwrap();
        assert!(response.status().is_redirection());
        assert_eq!(response.headers()[header::LOCATION], "/public/sub/");

        let response = mount.serve(&parts(Method::GET, "/public/sub/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body.as_ref(), b"<p>sub</p>");
    }

    #[tokio::test]
    async fn test_missing_file_and_other_methods_fall_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("foo.txt"), "bar").unwrap();
        let mount = StaticMount::new("/public", dir.path());

        assert!(mount.serve(&parts(Method::GET, "/public/nope.txt")).await.is_none());
        assert!(mount.serve(&parts(Method::POST, "/public/foo.txt")).await.is_none());
        assert!(mount.serve(&parts(Method::GET, "/elsewhere/foo.txt")).await.is_none());
    }
}
