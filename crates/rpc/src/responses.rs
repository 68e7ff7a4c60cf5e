// SPDX-FileCopyrightText: 2024 TriliTech <contact@trili.tech>
//
// SPDX-License-Identifier: MIT

//! Standard responses that can be used when handling RPC requests.
//! Every body is JSON; failures carry `{"error": <message>}`.

use std::convert::Infallible;

use http_body_util::{combinators::BoxBody, BodyExt, Full};
use hyper::{body::Bytes, header, Response, StatusCode};
use serde::Serialize;
use tracing::error;

use crate::errors::RpcError;

/// The body of [Response]s returned by the Rpc server.
/// All application logic errors obtained when processing requests
/// are handled by the rpc handlers: in case of errors a response with
/// custom body and status code is returned.
/// Therefore, the error type associated with the response is [Infallible].
pub type ResponseBody = BoxBody<Bytes, Infallible>;

pub type Resp = hyper::Response<ResponseBody>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

fn json_body(status: StatusCode, bytes: Vec<u8>) -> Result<Resp, RpcError> {
    let response = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(bytes)).boxed())?;
    Ok(response)
}

/// Serialize `value` as the body of a response with the given status.
/// A value that cannot be serialized yields `500 (Internal server error)`.
pub fn json_response<T: Serialize>(status: StatusCode, value: &T) -> Result<Resp, RpcError> {
    match serde_json::to_vec(value) {
        Ok(bytes) => json_body(status, bytes),
        Err(e) => {
            error!("Error while serializing response {:?}", e);
            internal_server_error()
        }
    }
}

/// Response with status `status` and body `{"error": message}`.
pub fn error_response(status: StatusCode, message: &str) -> Result<Resp, RpcError> {
    // Serializing a struct of one string field cannot fail.
    let bytes = serde_json::to_vec(&ErrorBody { error: message }).unwrap_or_default();
    json_body(status, bytes)
}

/// Simple handler for non-existing routes. It returns a response with status code `404 (Not found)`.
pub fn not_found() -> Result<Resp, RpcError> {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

/// Returned when the path exists but is not bound to the request method.
pub fn method_not_allowed() -> Result<Resp, RpcError> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Simple handler for bad requests. It returns a response with status code `400 (Bad request)`.
pub fn bad_request(message: &str) -> Result<Resp, RpcError> {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn payload_too_large() -> Result<Resp, RpcError> {
    error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
}

pub fn internal_server_error() -> Result<Resp, RpcError> {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
}
