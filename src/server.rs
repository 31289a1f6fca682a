/*
 * ‌
 * dtc
 * ​
 * Copyright (C) 2026 The dtc Authors
 * ​
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *      http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 * ‍
 */

//! The intake service (C8): a minimal `hyper` HTTP front door exposing
//! `POST /dtc/`, translating wire JSON to and from the coordinator.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{
    BodyExt,
    Full,
};
use hyper::body::{
    Bytes,
    Incoming,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{
    Method,
    Request,
    Response,
    StatusCode,
};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use crate::coordinator::Coordinator;
use crate::outcome::GroupId;

#[derive(serde::Deserialize)]
struct CoordinateRequest {
    #[serde(rename = "groupId")]
    group_id: String,
    action: String,
}

#[derive(serde::Serialize)]
struct CoordinateResponse {
    #[serde(rename = "State")]
    state: crate::outcome::TransactionState,
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

type BoxBody = http_body_util::combinators::BoxBody<Bytes, Infallible>;

fn json_body<T: serde::Serialize>(value: &T) -> BoxBody {
    let bytes = serde_json::to_vec(value).expect("response types are always serializable");
    Full::new(Bytes::from(bytes)).map_err(|never| match never {}).boxed()
}

fn json_response<T: serde::Serialize>(status: StatusCode, value: &T) -> Response<BoxBody> {
    Response::builder()
        .status(status)
        .header("content-type", "application/json")
        .body(json_body(value))
        .expect("status and header are always valid")
}

async fn handle(
    coordinator: Arc<Coordinator>,
    req: Request<Incoming>,
) -> Result<Response<BoxBody>, Infallible> {
    if req.method() != Method::POST || req.uri().path() != "/dtc/" {
        return Ok(json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse { error: "not found".into() },
        ));
    }

    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse { error: format!("failed to read request body: {e}") },
            ))
        }
    };

    let parsed: CoordinateRequest = match serde_json::from_slice(&body) {
        Ok(parsed) => parsed,
        Err(e) => {
            return Ok(json_response(
                StatusCode::BAD_REQUEST,
                &ErrorResponse { error: format!("malformed request body: {e}") },
            ))
        }
    };

    let group_id = GroupId::new(parsed.group_id);

    match coordinator.coordinate(&group_id, &parsed.action).await {
        Ok(state) => Ok(json_response(StatusCode::OK, &CoordinateResponse { state })),
        Err(e) => Ok(json_response(StatusCode::BAD_REQUEST, &ErrorResponse { error: e.to_string() })),
    }
}

/// Serve the intake service on `addr` until the process is signalled to
/// stop. Each accepted connection is handled on its own spawned task, so a
/// misbehaving client can't stall the listener.
pub async fn serve(addr: SocketAddr, coordinator: Arc<Coordinator>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "intake service listening");

    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let coordinator = coordinator.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req| handle(coordinator.clone(), req));
            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                tracing::warn!(%peer, error = %e, "connection error");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coordinate_request_parses_wire_json() {
        let parsed: CoordinateRequest =
            serde_json::from_str(r#"{"groupId": "g-1", "action": "create"}"#).unwrap();
        assert_eq!(parsed.group_id, "g-1");
        assert_eq!(parsed.action, "create");
    }

    #[test]
    fn coordinate_response_serializes_state_under_capitalized_key() {
        let response = CoordinateResponse { state: crate::outcome::TransactionState::Succeeded };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"State":"succeeded"}"#);
    }
}
