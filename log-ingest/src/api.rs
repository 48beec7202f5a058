//! HTTP resource accepting single logs.

use crate::LogIngestError;
use crate::errors::{ErrorKind, LogApiError, Result};
use crate::metrics_defs::{LOGS_ACCEPTED, LOGS_REJECTED, REQUEST_DURATION};
use crate::service::{LogRequest, LogService};
use crate::validation::parse_dimensions;
use crate::versions::{get_version, list_versions};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST, HeaderMap};
use http_body_util::BodyExt;
use http_body_util::combinators::BoxBody;
use hyper::body::{Body, Bytes, Incoming};
use hyper::service::Service;
use hyper::{Method, Request, Response, StatusCode};
use serde::Serialize;
use shared::http::{empty_response, json_response, make_boxed_error_response};
use shared::{counter, histogram};
use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

pub const SINGLE_LOG_PATH: &str = "/v2.0/log/single";
pub const VERSIONS_PATH: &str = "/";

pub const X_TENANT_ID: &str = "x-tenant-id";
pub const X_ROLES: &str = "x-roles";
pub const X_APPLICATION_TYPE: &str = "x-application-type";
pub const X_DIMENSIONS: &str = "x-dimensions";
pub const CROSS_TENANT_PARAM: &str = "tenant_id";

const VALIDATE_LOG: bool = true;

pub type ResponseBody = BoxBody<Bytes, LogIngestError>;

#[derive(Clone)]
pub struct LogResource {
    service: Arc<LogService>,
    delegate_roles: Arc<[String]>,
}

impl LogResource {
    pub fn new(service: Arc<LogService>, delegate_roles: Vec<String>) -> Self {
        LogResource {
            service,
            delegate_roles: delegate_roles.into(),
        }
    }

    /// Runs a request through the pipeline and renders the outcome.
    pub async fn handle<B>(&self, req: Request<B>) -> Response<ResponseBody>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let start = Instant::now();

        let response = match self.route(req).await {
            Ok(response) => response,
            Err(error) => error_response(error),
        };

        histogram!(REQUEST_DURATION, "status" => response.status().as_str().to_owned())
            .record(start.elapsed().as_secs_f64());
        response
    }

    async fn route<B>(&self, req: Request<B>) -> Result<Response<ResponseBody>>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let path = req.uri().path().to_string();

        if path == SINGLE_LOG_PATH {
            require_method(&req, Method::POST)?;
            self.single(req).await?;
            counter!(LOGS_ACCEPTED).increment(1);
            return Ok(empty_response(StatusCode::NO_CONTENT));
        }

        if path == VERSIONS_PATH {
            require_method(&req, Method::GET)?;
            return ok_json(&list_versions(&base_url(&req), &path));
        }

        match version_id(&path) {
            Some(version_id) => {
                require_method(&req, Method::GET)?;
                ok_json(&get_version(&base_url(&req), &path, version_id)?)
            }
            None => Err(LogApiError::NotFound(path)),
        }
    }

    async fn single<B>(&self, req: Request<B>) -> Result<()>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let (parts, body) = req.into_parts();
        let headers = &parts.headers;

        self.service
            .validate_content_length(content_length(headers))?;
        let content_type = self
            .service
            .validate_content_type(headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()))?;

        let tenant_id = header(headers, X_TENANT_ID)
            .filter(|t| !t.is_empty())
            .ok_or(LogApiError::MissingHeader("X-Tenant-Id"))?;
        tracing::debug!(%tenant_id, "Single log request");

        let cross_tenant_id = cross_tenant_id(parts.uri.query());
        if cross_tenant_id.is_some() && !self.is_delegate(header(headers, X_ROLES).as_deref()) {
            return Err(LogApiError::Forbidden(format!(
                "Project {tenant_id} cannot POST cross tenant metrics"
            )));
        }

        let payload = self.read_body(body).await?;

        let dimensions = header(headers, X_DIMENSIONS)
            .filter(|d| !d.is_empty())
            .map(|d| parse_dimensions(&d))
            .transpose()?;
        let application_type = header(headers, X_APPLICATION_TYPE);

        let log = self.service.new_log(
            LogRequest {
                application_type: application_type.as_deref(),
                dimensions,
                content_type: &content_type,
                payload: &payload,
            },
            VALIDATE_LOG,
        )?;

        let tenant_id = cross_tenant_id.as_deref().unwrap_or(&tenant_id);
        tracing::debug!(%tenant_id, ?log, "Shipping log");

        self.service.send_to_kafka(log, tenant_id).await
    }

    async fn read_body<B>(&self, body: B) -> Result<Bytes>
    where
        B: Body,
        B::Error: std::fmt::Display,
    {
        let payload = body
            .collect()
            .await
            .map_err(|e| LogApiError::RequestBody(e.to_string()))?
            .to_bytes();

        // The declared length was checked already, this guards the actual one.
        let max_log_size = self.service.max_log_size();
        if payload.len() as u64 >= max_log_size {
            return Err(LogApiError::PayloadTooLarge { max: max_log_size });
        }

        Ok(payload)
    }

    fn is_delegate(&self, roles: Option<&str>) -> bool {
        roles.is_some_and(|roles| {
            roles
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .any(|role| self.delegate_roles.iter().any(|d| d == role))
        })
    }
}

impl Service<Request<Incoming>> for LogResource {
    type Response = Response<ResponseBody>;
    type Error = LogIngestError;
    type Future =
        Pin<Box<dyn Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>>;

    fn call(&self, req: Request<Incoming>) -> Self::Future {
        let resource = self.clone();
        Box::pin(async move { Ok(resource.handle(req).await) })
    }
}

fn require_method<B>(req: &Request<B>, method: Method) -> Result<()> {
    if req.method() != method {
        return Err(LogApiError::MethodNotAllowed(req.method().to_string()));
    }
    Ok(())
}

fn ok_json<T: Serialize>(value: &T) -> Result<Response<ResponseBody>> {
    json_response(StatusCode::OK, value)
        .map_err(|e| LogApiError::Internal(format!("Failed to serialize response: {e}")))
}

/// `/v2.0` style single segment paths.
fn version_id(path: &str) -> Option<&str> {
    path.strip_prefix('/').filter(|id| !id.is_empty() && !id.contains('/'))
}

/// Scheme and authority the client used, empty when unknown.
fn base_url<B>(req: &Request<B>) -> String {
    let authority = req
        .uri()
        .authority()
        .map(|a| a.as_str().to_string())
        .or_else(|| {
            req.headers()
                .get(HOST)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        });
    let scheme = req.uri().scheme_str().unwrap_or("http");

    authority
        .map(|authority| format!("{scheme}://{authority}"))
        .unwrap_or_default()
}

fn error_response(error: LogApiError) -> Response<ResponseBody> {
    let kind = error.kind();
    counter!(LOGS_REJECTED, "kind" => kind.as_str()).increment(1);

    match kind {
        ErrorKind::ServerError => tracing::error!(error = %error, "Failed to accept log"),
        _ => tracing::warn!(kind = kind.as_str(), error = %error, "Rejected log"),
    }

    json_response(kind.status(), &error.to_body()).unwrap_or_else(|e| {
        tracing::error!(error = %e, "Failed to serialize error body");
        make_boxed_error_response(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<Cow<'a, str>> {
    headers
        .get(name)
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}

fn content_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

fn cross_tenant_id(query: Option<&str>) -> Option<String> {
    url::form_urlencoded::parse(query?.as_bytes())
        .find(|(name, _)| name == CROSS_TENANT_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}
