//! Content-type aware body handling.
//!
//! The declared content type is inspected once per request and mapped to a
//! [`BodyKind`]. Each kind has its own decode step ([`InboundBody::read`]) and
//! its own re-encode step ([`InboundBody::encode`]) so the upstream receives a
//! payload equivalent to what the caller sent.

use std::fmt;

use axum::body::{Body, Bytes};
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::{header, HeaderMap, HeaderValue, Method};
use http_body_util::Limited;
use reqwest::multipart::{Form, Part};
use reqwest::RequestBuilder;

use crate::error::ForwardError;

const APPLICATION_JSON: &str = "application/json";
const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// Body encodings the forwarder distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// GET and HEAD: nothing is read, nothing is sent.
    Empty,
    Json,
    Multipart,
    UrlEncoded,
    /// Any other or missing content type, forwarded byte for byte.
    RawBinary,
}

impl BodyKind {
    /// Select the body kind for a request.
    ///
    /// Matching is case-insensitive. Multipart is prefix-matched so the
    /// boundary parameter is ignored; JSON and urlencoded compare the media
    /// type with any parameters removed.
    pub fn detect(method: &Method, headers: &HeaderMap) -> Self {
        if method == Method::GET || method == Method::HEAD {
            return BodyKind::Empty;
        }

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_ascii_lowercase());

        match content_type.as_deref() {
            Some(ct) if ct.starts_with(MULTIPART_FORM_DATA) => BodyKind::Multipart,
            Some(ct) => match media_type(ct) {
                APPLICATION_JSON => BodyKind::Json,
                FORM_URLENCODED => BodyKind::UrlEncoded,
                _ => BodyKind::RawBinary,
            },
            None => BodyKind::RawBinary,
        }
    }
}

impl fmt::Display for BodyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BodyKind::Empty => "empty",
            BodyKind::Json => "JSON",
            BodyKind::Multipart => "multipart",
            BodyKind::UrlEncoded => "urlencoded",
            BodyKind::RawBinary => "raw",
        };
        f.write_str(name)
    }
}

fn media_type(content_type: &str) -> &str {
    content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
}

/// One named part of a `multipart/form-data` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartField {
    pub name: String,
    pub value: FieldValue,
}

/// A multipart part is either plain text or a named attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    File {
        filename: String,
        content_type: Option<String>,
        data: Bytes,
    },
}

/// A decoded inbound body.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundBody {
    Empty,
    Json(serde_json::Value),
    Multipart(Vec<MultipartField>),
    UrlEncoded(String),
    Raw(Bytes),
}

impl InboundBody {
    /// Read and decode the body of `request` according to `kind`.
    ///
    /// `limit` bounds the number of bytes read for every kind. Object key
    /// order in JSON bodies is kept as sent.
    pub async fn read(kind: BodyKind, request: Request, limit: usize) -> Result<Self, ForwardError> {
        match kind {
            BodyKind::Empty => Ok(InboundBody::Empty),
            BodyKind::Json => {
                let bytes = read_bytes(request, limit).await?;
                serde_json::from_slice(&bytes)
                    .map(InboundBody::Json)
                    .map_err(|e| ForwardError::malformed(kind, e))
            }
            BodyKind::UrlEncoded => {
                let bytes = read_bytes(request, limit).await?;
                String::from_utf8(bytes.into())
                    .map(InboundBody::UrlEncoded)
                    .map_err(|e| ForwardError::malformed(kind, e))
            }
            BodyKind::Multipart => read_multipart(request, limit).await.map(InboundBody::Multipart),
            BodyKind::RawBinary => read_bytes(request, limit).await.map(InboundBody::Raw),
        }
    }

    /// Re-encode for the upstream leg, adjusting `headers` to match.
    pub fn encode(self, headers: &mut HeaderMap) -> Result<OutboundBody, ForwardError> {
        match self {
            InboundBody::Empty => Ok(OutboundBody::None),
            InboundBody::Json(value) => {
                let bytes = serde_json::to_vec(&value)
                    .map_err(|e| ForwardError::malformed(BodyKind::Json, e))?;
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
                Ok(OutboundBody::Bytes(Bytes::from(bytes)))
            }
            InboundBody::Multipart(fields) => {
                // The client generates a fresh boundary along with the header.
                headers.remove(header::CONTENT_TYPE);
                build_form(fields).map(OutboundBody::Multipart)
            }
            InboundBody::UrlEncoded(text) => {
                headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED));
                Ok(OutboundBody::Bytes(Bytes::from(text)))
            }
            InboundBody::Raw(bytes) => Ok(OutboundBody::Bytes(bytes)),
        }
    }
}

/// Payload attached to the upstream request.
#[derive(Debug)]
pub enum OutboundBody {
    None,
    Bytes(Bytes),
    Multipart(Form),
}

impl OutboundBody {
    /// Attach this payload to an outbound request builder.
    pub fn apply(self, builder: RequestBuilder) -> RequestBuilder {
        match self {
            OutboundBody::None => builder,
            OutboundBody::Bytes(bytes) => builder.body(bytes),
            OutboundBody::Multipart(form) => builder.multipart(form),
        }
    }
}

async fn read_bytes(request: Request, limit: usize) -> Result<Bytes, ForwardError> {
    axum::body::to_bytes(request.into_body(), limit)
        .await
        .map_err(ForwardError::BodyRead)
}

async fn read_multipart(request: Request, limit: usize) -> Result<Vec<MultipartField>, ForwardError> {
    let kind = BodyKind::Multipart;
    let (parts, body) = request.into_parts();
    let request = Request::from_parts(parts, Body::new(Limited::new(body, limit)));
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|e| ForwardError::malformed(kind, e.body_text()))?;

    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ForwardError::malformed(kind, e))?
    {
        let name = field.name().unwrap_or_default().to_owned();
        let value = match field.file_name().map(str::to_owned) {
            Some(filename) => {
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await.map_err(|e| ForwardError::malformed(kind, e))?;
                FieldValue::File {
                    filename,
                    content_type,
                    data,
                }
            }
            None => FieldValue::Text(field.text().await.map_err(|e| ForwardError::malformed(kind, e))?),
        };
        fields.push(MultipartField { name, value });
    }

    Ok(fields)
}

fn build_form(fields: Vec<MultipartField>) -> Result<Form, ForwardError> {
    let mut form = Form::new();
    for field in fields {
        form = match field.value {
            FieldValue::Text(text) => form.text(field.name, text),
            FieldValue::File {
                filename,
                content_type,
                data,
            } => {
                let mut part = Part::bytes(data.to_vec()).file_name(filename);
                if let Some(content_type) = content_type {
                    part = part
                        .mime_str(&content_type)
                        .map_err(|e| ForwardError::malformed(BodyKind::Multipart, e))?;
                }
                form.part(field.name, part)
            }
        };
    }
    Ok(form)
}
