// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use staffdesk_app::{Entity, ResourceKind};
use staffdesk_db::{Repository, StoreError};
use std::io::Read;
use std::net::SocketAddr;
use tiny_http::{Header, Request, Response, Server, StatusCode};

pub const DEFAULT_BIND: &str = "127.0.0.1:39393";

/// Where a request path points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/{resource}`
    Collection(ResourceKind),
    /// `/{resource}/`, the unfiltered parent of the nested filter routes.
    Parent(ResourceKind),
    /// `/{resource}/{id}`: a filter key for `GET`, a row key otherwise.
    Member(ResourceKind, String),
}

impl Route {
    pub fn parse(url: &str) -> Option<Self> {
        let path = url.split_once('?').map_or(url, |(path, _)| path);
        let path = path.strip_prefix('/')?;
        match path.split_once('/') {
            None => ResourceKind::parse(path).map(Self::Collection),
            Some((name, "")) => ResourceKind::parse(name).map(Self::Parent),
            Some((name, id)) if !id.contains('/') => {
                ResourceKind::parse(name).map(|kind| Self::Member(kind, id.to_owned()))
            }
            Some(_) => None,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Collection(kind) | Self::Parent(kind) | Self::Member(kind, _) => *kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// JSON, or empty for `204`.
    pub body: Vec<u8>,
}

impl ApiResponse {
    fn json(status: u16, value: &serde_json::Value) -> Self {
        Self {
            status,
            body: value.to_string().into_bytes(),
        }
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: Vec::new(),
        }
    }

    pub fn body_json(&self) -> Result<serde_json::Value> {
        serde_json::from_slice(&self.body).context("decode response body")
    }
}

#[derive(Debug)]
struct ApiError {
    status: u16,
    message: String,
}

impl ApiError {
    fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn into_response(self) -> ApiResponse {
        ApiResponse::json(self.status, &serde_json::json!({ "error": self.message }))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(error_status(&error), format!("{error:#}"))
    }
}

/// Status code for a repository failure.
pub fn error_status(error: &anyhow::Error) -> u16 {
    match error.downcast_ref::<StoreError>() {
        Some(StoreError::Conflict { .. }) => 409,
        Some(StoreError::NotFound { .. } | StoreError::NoFilterRoute(_)) => 404,
        Some(StoreError::InvalidReference { .. } | StoreError::Rejected { .. }) => 400,
        None => 500,
    }
}

/// Answers one request against `repository`.
pub fn handle_request<R: Repository + ?Sized>(
    repository: &R,
    method: &str,
    url: &str,
    body: &[u8],
) -> ApiResponse {
    let response = dispatch(repository, method, url, body).unwrap_or_else(ApiError::into_response);
    if response.status >= 500 {
        tracing::warn!(method, url, status = response.status, "request failed");
    } else {
        tracing::info!(method, url, status = response.status, "handled request");
    }
    response
}

fn dispatch<R: Repository + ?Sized>(
    repository: &R,
    method: &str,
    url: &str,
    body: &[u8],
) -> Result<ApiResponse, ApiError> {
    let route = Route::parse(url).ok_or_else(|| ApiError::new(404, format!("no route for {url}")))?;
    let kind = route.kind();

    match (method, &route) {
        ("GET", Route::Collection(_) | Route::Parent(_)) => {
            list_response(&repository.list(kind)?)
        }
        ("GET", Route::Member(_, id)) => {
            let parent_id = parse_id(id)?;
            list_response(&repository.list_filtered(kind, parent_id)?)
        }
        ("POST", Route::Collection(_) | Route::Parent(_)) => {
            let entity = decode(kind, body)?;
            let id = repository.create(&entity)?;
            Ok(ApiResponse::json(201, &key_body(kind, id)))
        }
        ("PUT", Route::Member(_, id)) => {
            let id = parse_id(id)?;
            let entity = decode(kind, body)?;
            repository.update(id, &entity)?;
            Ok(ApiResponse::json(200, &key_body(kind, id)))
        }
        ("DELETE", Route::Member(_, id)) => {
            repository.delete(kind, parse_id(id)?)?;
            Ok(ApiResponse::no_content())
        }
        _ => Err(ApiError::new(
            405,
            format!("{method} is not allowed on {url}"),
        )),
    }
}

fn list_response(entities: &[Entity]) -> Result<ApiResponse, ApiError> {
    let value = serde_json::to_value(entities)
        .context("encode records")
        .map_err(ApiError::from)?;
    Ok(ApiResponse::json(200, &value))
}

fn decode(kind: ResourceKind, body: &[u8]) -> Result<Entity, ApiError> {
    Entity::from_json(kind, body).map_err(|error| ApiError::new(400, format!("{error:#}")))
}

fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::new(400, format!("record key {raw:?} is not an integer")))
}

fn key_body(kind: ResourceKind, id: i64) -> serde_json::Value {
    let mut members = serde_json::Map::new();
    members.insert(kind.primary_key().to_owned(), id.into());
    serde_json::Value::Object(members)
}

/// REST server over a repository it owns.
pub struct ApiServer<R> {
    server: Server,
    repository: R,
}

impl<R: Repository> ApiServer<R> {
    pub fn bind(addr: &str, repository: R) -> Result<Self> {
        let server = Server::http(addr).map_err(|error| {
            anyhow!("bind REST server on {addr}: {error} -- choose a free [server] bind address")
        })?;
        Ok(Self { server, repository })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.server
            .server_addr()
            .to_ip()
            .ok_or_else(|| anyhow!("REST server is not listening on an IP socket"))
    }

    /// Handles requests until the listener closes.
    pub fn serve(&self) -> Result<()> {
        tracing::info!(addr = %self.server.server_addr(), "serving");
        for request in self.server.incoming_requests() {
            if let Err(error) = self.respond(request) {
                tracing::warn!(error = %format!("{error:#}"), "failed to answer request");
            }
        }
        Ok(())
    }

    fn respond(&self, mut request: Request) -> Result<()> {
        let mut body = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("read request body")?;
        let method = request.method().as_str().to_owned();
        let url = request.url().to_owned();

        let answer = handle_request(&self.repository, &method, &url, &body);
        let status = StatusCode(answer.status);
        if answer.body.is_empty() {
            return request
                .respond(Response::empty(status))
                .context("write response");
        }

        let content_type = Header::from_bytes("Content-Type", "application/json")
            .map_err(|()| anyhow!("build content type header"))?;
        request
            .respond(
                Response::from_data(answer.body)
                    .with_status_code(status)
                    .with_header(content_type),
            )
            .context("write response")
    }
}
