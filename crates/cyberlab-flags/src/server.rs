//! HTTP endpoint for flag validation.
//!
//! Serves `POST /api/ctf/submit` over HTTP/1.1 on a single-threaded tokio
//! runtime. Each connection gets its own task; validation itself is a pure
//! lookup against the shared [`Validator`].

use std::convert::Infallible;
use std::error::Error as StdError;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{ALLOW, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::protocol::SubmitResponse;
use crate::validator::{Validator, Verdict};

/// Route served by the endpoint.
pub const SUBMIT_PATH: &str = "/api/ctf/submit";

/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Body sent when a verdict cannot be serialized.
const FALLBACK_BODY: &str = r#"{"ok":false,"message":"Server error"}"#;

fn json_response(status: StatusCode, body: &SubmitResponse) -> Response<Full<Bytes>> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, Bytes::from(bytes)),
        Err(e) => {
            log::error!("Failed to encode response: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Bytes::from_static(FALLBACK_BODY.as_bytes()),
            )
        },
    };
    let mut resp = Response::new(Full::new(bytes));
    *resp.status_mut() = status;
    resp.headers_mut().insert(
        CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    resp
}

fn empty_response(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::new()));
    *resp.status_mut() = status;
    resp
}

fn verdict_response(verdict: &Verdict) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(verdict.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    json_response(status, &verdict.response)
}

/// Handle one request.
pub async fn handle<B>(
    req: Request<B>,
    validator: Arc<Validator>,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    if req.uri().path() != SUBMIT_PATH {
        return Ok(empty_response(StatusCode::NOT_FOUND));
    }
    if req.method() != Method::POST {
        let mut resp = empty_response(StatusCode::METHOD_NOT_ALLOWED);
        resp.headers_mut()
            .insert(ALLOW, hyper::header::HeaderValue::from_static("POST"));
        return Ok(resp);
    }

    let bytes = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            log::warn!("Failed to read submission body: {e}");
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &SubmitResponse::rejected("Invalid request body"),
            ));
        },
    };
    let body: serde_json::Value = match serde_json::from_slice(&bytes) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Submission body is not JSON: {e}");
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &SubmitResponse::rejected("Invalid request body"),
            ));
        },
    };
    Ok(verdict_response(&validator.validate_value(&body)))
}

/// Accept connections on `listener` until an accept error occurs.
pub async fn serve(listener: TcpListener, validator: Arc<Validator>) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        log::info!("Flag endpoint listening on http://{addr}{SUBMIT_PATH}");
    }
    loop {
        let (stream, remote) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let validator = Arc::clone(&validator);

        tokio::spawn(async move {
            let service = service_fn(move |req| handle(req, Arc::clone(&validator)));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                log::warn!("Error serving connection from {remote}: {e}");
            }
        });
    }
}

/// Bind `addr` and serve on a current-thread runtime. Blocks.
pub fn run(addr: &str, validator: Validator) -> std::io::Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let listener = TcpListener::bind(addr).await?;
        serve(listener, Arc::new(validator)).await
    })
}
