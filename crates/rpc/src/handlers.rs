// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Helpers for handling http requests.

use std::fmt::Debug;

use futures::future::BoxFuture;
use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::{body::Incoming, Request, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::{
    errors::RpcError,
    responses::{bad_request, error_response, json_response, payload_too_large},
};

pub use crate::responses::{Resp, ResponseBody};

/// Largest request body accepted by [handle_post_request].
pub const MAX_BODY_SIZE: usize = 16 * 1024;

/// Application errors that know which HTTP status they map to.
pub trait HttpError: std::error::Error + Send + 'static {
    fn status_code(&self) -> StatusCode;
}

fn failure_response<E: HttpError>(e: E) -> Result<Resp, RpcError> {
    let status = e.status_code();
    if status.is_server_error() {
        error!("Error while processing request: {:?}", e);
    } else {
        warn!("Rejected request: {}", e);
    }
    error_response(status, &e.to_string())
}

/// Helper function for handling post requests.
/// The request body is expected to be a json object.
/// This function gets an asynchronous combinator in input to process the request. The output of the
/// combinator function is serialized in json format and sent as the response body in a single frame.
/// A body larger than [MAX_BODY_SIZE] is answered with `413 (Payload too large)`, one that does not
/// deserialize to `T` with `400 (Bad request)`; an error of the combinator is answered with the
/// status it maps to.
/// This handler returns a [RpcError] in case of connection errors.
pub async fn handle_post_request<T, S, E, F>(req: Request<Incoming>, f: F) -> Result<Resp, RpcError>
where
    T: for<'a> Deserialize<'a> + Debug,
    S: Serialize,
    E: HttpError,
    F: FnOnce(T) -> BoxFuture<'static, Result<S, E>>,
{
    let body = &match Limited::new(req.into_body(), MAX_BODY_SIZE).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            debug!("Request body exceeds {MAX_BODY_SIZE} bytes");
            return payload_too_large();
        }
        Err(e) => {
            return Err(match e.downcast::<hyper::Error>() {
                Ok(e) => RpcError::StreamError(*e),
                Err(e) => RpcError::BodyError(e.to_string()),
            })
        }
    };
    debug!("Request body: {body:?}");
    let value: T = match serde_json::from_slice(body) {
        Err(e) => {
            debug!("Cannot deserialize received value: {e:?}");
            return bad_request(&format!("Malformed request body: {e}"));
        }
        Ok(v) => v,
    };
    debug!("Received POST request, value deserialized to {:?}", value);

    match f(value).await {
        Ok(output) => json_response(StatusCode::OK, &output),
        Err(e) => failure_response(e),
    }
}

/// Helper function for handling get requests that take no input.
pub async fn handle_get_request<S, E, F>(f: F) -> Result<Resp, RpcError>
where
    S: Serialize,
    E: HttpError,
    F: FnOnce() -> BoxFuture<'static, Result<S, E>>,
{
    match f().await {
        Ok(output) => json_response(StatusCode::OK, &output),
        Err(e) => failure_response(e),
    }
}
