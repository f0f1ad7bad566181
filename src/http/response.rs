//! Response construction for processor actions.
//!
//! # Responsibilities
//! - Named constructors for the supported status codes
//! - Typed body setters that keep `Content-Type` in sync
//! - Finalize into the transport's `Response<Body>`
//!
//! # Design Decisions
//! - Every named constructor has a `_with` twin taking a configuration
//!   callback, so actions can build and return in one expression
//! - Finalization consumes the builder; it cannot be mutated afterwards

use axum::body::{Body, Bytes};
use axum::http::header::{self, HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use axum::http::{HeaderMap, Response, StatusCode};
use axum::BoxError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

use crate::routing::ActionResult;

/// Errors raised while building a response.
#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] InvalidHeaderName),

    #[error("invalid header value: {0}")]
    InvalidHeaderValue(#[from] InvalidHeaderValue),

    #[error("failed to serialize JSON body: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mutable response under construction.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

macro_rules! status_constructors {
    ($( $code:literal, $status:ident => $name:ident, $with:ident; )*) => {
        impl ResponseBuilder {
            $(
                #[doc = concat!("Builder with status `", stringify!($code), "`.")]
                pub fn $name() -> Self {
                    Self::with_status(StatusCode::$status)
                }

                #[doc = concat!("Builder with status `", stringify!($code), "`, configured by `configure`.")]
                pub fn $with<F>(configure: F) -> ActionResult
                where
                    F: FnOnce(&mut Self) -> Result<(), BoxError>,
                {
                    Self::$name().configure(configure)
                }
            )*
        }

        /// Named constructors ordered by status code.
        pub const RESPONSE_CODES: &[(u16, &str, fn() -> ResponseBuilder)] = &[
            $( ($code, stringify!($name), ResponseBuilder::$name), )*
        ];
    };
}

status_constructors! {
    200, OK => ok, ok_with;
    201, CREATED => created, created_with;
    202, ACCEPTED => queued, queued_with;
    204, NO_CONTENT => no_content, no_content_with;
    400, BAD_REQUEST => bad_request, bad_request_with;
    401, UNAUTHORIZED => unauthorized, unauthorized_with;
    402, PAYMENT_REQUIRED => payment_required, payment_required_with;
    403, FORBIDDEN => forbidden, forbidden_with;
    404, NOT_FOUND => not_found_status, not_found_status_with;
    405, METHOD_NOT_ALLOWED => unsupported_method, unsupported_method_with;
    422, UNPROCESSABLE_ENTITY => unprocessable_entity, unprocessable_entity_with;
}

impl ResponseBuilder {
    /// Empty builder with an arbitrary status.
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Look up a named constructor by numeric code.
    pub fn for_code(code: u16) -> Option<Self> {
        RESPONSE_CODES
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, _, build)| build())
    }

    /// Apply a configuration callback and hand the builder back as an action result.
    pub fn configure<F>(mut self, configure: F) -> ActionResult
    where
        F: FnOnce(&mut Self) -> Result<(), BoxError>,
    {
        configure(&mut self)?;
        Ok(self)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Set the body to the string form of `value`.
    pub fn set_body(&mut self, value: impl fmt::Display) -> &mut Self {
        self.body = Bytes::from(value.to_string());
        self
    }

    /// Set the body to raw bytes, unchanged.
    pub fn set_raw_body(&mut self, value: impl Into<Bytes>) -> &mut Self {
        self.body = value.into();
        self
    }

    pub fn set_content_type(&mut self, value: &str) -> Result<&mut Self, ResponseError> {
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_str(value)?);
        Ok(self)
    }

    pub fn set_header(&mut self, name: &str, value: &str) -> Result<&mut Self, ResponseError> {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Serialize `object` as the body and mark it `application/json`.
    pub fn set_json_body<T>(&mut self, object: &T) -> Result<&mut Self, ResponseError>
    where
        T: Serialize + ?Sized,
    {
        self.body = Bytes::from(serde_json::to_vec(object)?);
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        Ok(self)
    }

    /// Use `text` as the body and mark it `text/html`.
    pub fn set_html_body(&mut self, text: impl Into<String>) -> &mut Self {
        self.body = Bytes::from(text.into());
        self.headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
        self
    }

    /// Convert into the transport response.
    pub fn finalize(self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
