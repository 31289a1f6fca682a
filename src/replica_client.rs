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

//! The replica client contract (C1) and its one production implementation,
//! the reqwest-backed [`HttpReplicaClient`] (C5).

use std::time::Duration;

use url::Url;

use crate::outcome::{
    GroupId,
    ReplicaOutcome,
};

const RESOURCE: &str = "v1/group";

/// Default per-call timeout applied to every replica request (§4.2).
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Per-replica operations. A call never returns `Err` to its caller: every
/// failure mode, transport or HTTP, is reified as a [`ReplicaOutcome`] (§4.1).
#[async_trait::async_trait]
pub trait ReplicaClient: Send + Sync {
    /// `GET {base}/v1/group/{id}/`. Used by tests and diagnostics; not on the
    /// core transaction path.
    async fn get(&self, group_id: &GroupId) -> ReplicaOutcome;

    /// `POST {base}/v1/group/` with `{"groupId": id}`. 201 success, 400 no-op.
    async fn post(&self, group_id: &GroupId) -> ReplicaOutcome;

    /// `DELETE {base}/v1/group/` with `{"groupId": id}`. 200 success, 404 no-op.
    async fn delete(&self, group_id: &GroupId) -> ReplicaOutcome;
}

#[derive(serde::Serialize)]
struct GroupBody<'a> {
    #[serde(rename = "groupId")]
    group_id: &'a str,
}

/// Which "already in desired state" status a call expects, for classifying a
/// successful-transport response.
#[derive(Clone, Copy)]
enum NoOpStatus {
    /// 400, for create.
    Create,
    /// 404, for delete.
    Delete,
    /// No no-op status applies.
    None,
}

impl NoOpStatus {
    fn matches(self, status: u16) -> bool {
        match self {
            NoOpStatus::Create => status == 400,
            NoOpStatus::Delete => status == 404,
            NoOpStatus::None => false,
        }
    }
}

/// Fold an HTTP response status into a [`ReplicaOutcome`], applying the
/// already-in-desired-state special case for the given operation.
fn classify_status(status: u16, no_op: NoOpStatus) -> ReplicaOutcome {
    if (200..300).contains(&status) {
        ReplicaOutcome::Success { status }
    } else if no_op.matches(status) {
        ReplicaOutcome::AlreadyInDesiredState { status }
    } else if (400..500).contains(&status) {
        ReplicaOutcome::ClientError { status }
    } else {
        ReplicaOutcome::ServerError { status }
    }
}

/// A `reqwest`-backed [`ReplicaClient`] for one replica base URL.
///
/// Holds a single pooled `reqwest::Client`, built once at [`crate::cluster::Cluster`]
/// construction and shared across every transaction for the process's
/// lifetime.
pub struct HttpReplicaClient {
    http: reqwest::Client,
    base_url: Url,
    call_timeout: Duration,
}

impl HttpReplicaClient {
    /// Build a client for `base_url` with the default call timeout.
    pub fn new(base_url: Url) -> Self {
        Self::with_timeout(base_url, DEFAULT_CALL_TIMEOUT)
    }

    /// Build a client for `base_url` with an explicit per-call timeout.
    ///
    /// The timeout is enforced twice: once by `reqwest` itself via
    /// `ClientBuilder::timeout`, and again by wrapping each call in
    /// `tokio::time::timeout` in [`Self::run`] — belt and braces against a
    /// `reqwest` timeout that, for whatever reason, doesn't fire.
    pub fn with_timeout(base_url: Url, call_timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(call_timeout)
            .build()
            .expect("reqwest client with a timeout is always constructible");
        Self { http, base_url, call_timeout }
    }

    fn group_url(&self) -> Url {
        self.base_url.join(&format!("{RESOURCE}/")).expect("RESOURCE is a valid relative path")
    }

    fn group_item_url(&self, group_id: &GroupId) -> Url {
        self.base_url
            .join(&format!("{RESOURCE}/{}/", group_id.as_str()))
            .expect("RESOURCE and group_id form a valid relative path")
    }

    async fn run(
        &self,
        request: reqwest::RequestBuilder,
        no_op: NoOpStatus,
    ) -> ReplicaOutcome {
        let fut = request.send();

        let result = match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                return ReplicaOutcome::TransportError {
                    cause: format!("timed out after {:?}", self.call_timeout),
                }
            }
        };

        match result {
            Ok(response) => classify_status(response.status().as_u16(), no_op),
            Err(e) => ReplicaOutcome::TransportError { cause: e.to_string() },
        }
    }
}

#[async_trait::async_trait]
impl ReplicaClient for HttpReplicaClient {
    async fn get(&self, group_id: &GroupId) -> ReplicaOutcome {
        let request = self.http.get(self.group_item_url(group_id));
        self.run(request, NoOpStatus::None).await
    }

    async fn post(&self, group_id: &GroupId) -> ReplicaOutcome {
        let body = GroupBody { group_id: group_id.as_str() };
        let request = self.http.post(self.group_url()).json(&body);
        self.run(request, NoOpStatus::Create).await
    }

    async fn delete(&self, group_id: &GroupId) -> ReplicaOutcome {
        let body = GroupBody { group_id: group_id.as_str() };
        let request = self.http.delete(self.group_url()).json(&body);
        self.run(request, NoOpStatus::Delete).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_status_classifies_as_success() {
        assert_eq!(classify_status(201, NoOpStatus::Create), ReplicaOutcome::Success { status: 201 });
        assert_eq!(classify_status(200, NoOpStatus::Delete), ReplicaOutcome::Success { status: 200 });
    }

    #[test]
    fn expected_no_op_statuses_classify_as_already_in_desired_state() {
        assert_eq!(
            classify_status(400, NoOpStatus::Create),
            ReplicaOutcome::AlreadyInDesiredState { status: 400 }
        );
        assert_eq!(
            classify_status(404, NoOpStatus::Delete),
            ReplicaOutcome::AlreadyInDesiredState { status: 404 }
        );
    }

    #[test]
    fn four_hundred_on_delete_is_a_client_error_not_a_no_op() {
        assert_eq!(classify_status(400, NoOpStatus::Delete), ReplicaOutcome::ClientError { status: 400 });
    }

    #[test]
    fn four_oh_four_on_create_is_a_client_error_not_a_no_op() {
        assert_eq!(classify_status(404, NoOpStatus::Create), ReplicaOutcome::ClientError { status: 404 });
    }

    #[test]
    fn other_four_xx_is_client_error() {
        assert_eq!(classify_status(409, NoOpStatus::Create), ReplicaOutcome::ClientError { status: 409 });
    }

    #[test]
    fn five_xx_is_server_error() {
        assert_eq!(classify_status(503, NoOpStatus::Create), ReplicaOutcome::ServerError { status: 503 });
    }
}
