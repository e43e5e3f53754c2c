//! Per-request logging context and the access-log middleware.

use crate::logging::{CallSite, Formatter, Level, Logger, ScopedLogger};
use axum::{
    body::HttpBody,
    extract::{ConnectInfo, Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use chrono::{DateTime, Local};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const ACCESS_TIME_FORMAT: &str = "[%d/%b/%Y:%H:%M:%S %z]";

/// Shared state for [`request_logging`].
#[derive(Clone)]
pub struct RequestLogging {
    pub logger: Logger,
    /// Formatter applied to logs written by request handlers
    pub formatter: Option<Arc<dyn Formatter>>,
}

/// Request-scoped logger, available to handlers as `Extension<RequestLog>`.
///
/// Every line logged through it carries the request's attributes
/// (`request.clientip`, `request.method`, ...) and the server's request
/// formatter. Attributes set by handlers, such as `request.user`, also end
/// up in the access line.
#[derive(Clone, Debug)]
pub struct RequestLog {
    scoped: ScopedLogger,
    received_at: DateTime<Local>,
    started: Instant,
}

impl RequestLog {
    pub fn new(logger: Logger, formatter: Option<Arc<dyn Formatter>>) -> Self {
        Self {
            scoped: ScopedLogger::new(logger, formatter),
            received_at: Local::now(),
            started: Instant::now(),
        }
    }

    pub fn set_attr(&self, key: impl Into<String>, value: impl Into<String>) {
        self.scoped.set_attr(key, value);
    }

    pub fn attr(&self, key: &str) -> Option<String> {
        self.scoped.attr(key)
    }

    #[track_caller]
    pub fn debug(&self, args: std::fmt::Arguments<'_>) {
        self.scoped.debug(args);
    }

    #[track_caller]
    pub fn info(&self, args: std::fmt::Arguments<'_>) {
        self.scoped.info(args);
    }

    #[track_caller]
    pub fn warn(&self, args: std::fmt::Arguments<'_>) {
        self.scoped.warn(args);
    }

    #[track_caller]
    pub fn error(&self, args: std::fmt::Arguments<'_>) {
        self.scoped.error(args);
    }

    #[track_caller]
    pub fn fatal(&self, args: std::fmt::Arguments<'_>) {
        self.scoped.fatal(args);
    }

    fn record_request(&self, req: &Request) {
        let client_ip = req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| "-".to_string());
        let header_value = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };

        self.set_attr("request.clientip", client_ip);
        self.set_attr("request.method", req.method().as_str());
        self.set_attr("request.url", req.uri().to_string());
        self.set_attr("request.proto", format!("{:?}", req.version()));
        self.set_attr("request.referer", header_value(header::REFERER));
        self.set_attr("request.useragent", header_value(header::USER_AGENT));
    }

    /// Records response attributes and writes the `access` event.
    fn log_access(&self, response: &Response) {
        let body_len = response
            .headers()
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .or_else(|| response.body().size_hint().exact())
            .unwrap_or(0);

        self.scoped.set_attr_default("request.user", "-");
        self.scoped.set_attr_default("request.auth", "-");
        self.set_attr("request.time", self.received_at.format(ACCESS_TIME_FORMAT).to_string());
        self.set_attr("request.status", response.status().as_u16().to_string());
        self.set_attr("request.bodylen", body_len.to_string());
        self.set_attr("request.timecost", self.started.elapsed().as_millis().to_string());

        self.scoped
            .emit(CallSite::caller(), Level::access(), false, format_args!(""));
    }
}

/// Middleware creating a [`RequestLog`] for every request and writing one
/// access event after the inner service responds.
pub async fn request_logging(
    State(ctx): State<Arc<RequestLogging>>,
    mut req: Request,
    next: Next,
) -> Response {
    let log = RequestLog::new(ctx.logger.clone(), ctx.formatter.clone());
    log.record_request(&req);
    req.extensions_mut().insert(log.clone());

    let response = next.run(req).await;
    log.log_access(&response);
    response
}
