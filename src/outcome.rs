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

use std::fmt;

/// A group identifier. Opaque beyond being a non-empty string; the coordinator
/// never inspects its contents.
#[derive(Clone, Debug, PartialEq, Eq, Hash, serde::Deserialize, serde::Serialize)]
pub struct GroupId(String);

impl GroupId {
    /// Wrap a raw string as a `GroupId`.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for GroupId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for GroupId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// The forward operation a transaction is performing. Used both to pick the
/// wire method and to pick the inverse operation during compensation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    /// Create the group (`POST`).
    Create,

    /// Delete the group (`DELETE`).
    Delete,
}

impl Operation {
    /// The operation that undoes this one.
    pub fn inverse(self) -> Self {
        match self {
            Operation::Create => Operation::Delete,
            Operation::Delete => Operation::Create,
        }
    }

    /// Parse the wire-level `action` string from the intake API (§6).
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "create" => Some(Operation::Create),
            "delete" => Some(Operation::Delete),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Create => "create",
            Operation::Delete => "delete",
        })
    }
}

/// The outcome of a single replica call. Every failure mode a call can hit —
/// transport failure, any HTTP status — is folded into one of these variants;
/// nothing propagates as an error past the replica client (§4.1).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplicaOutcome {
    /// The replica accepted the operation (2xx).
    Success {
        /// The HTTP status code.
        status: u16,
    },

    /// The operation was a no-op because the target state already held:
    /// 400 on create, 404 on delete.
    AlreadyInDesiredState {
        /// The HTTP status code.
        status: u16,
    },

    /// 4xx other than the already-in-desired-state case.
    ClientError {
        /// The HTTP status code.
        status: u16,
    },

    /// 5xx.
    ServerError {
        /// The HTTP status code.
        status: u16,
    },

    /// The call never produced an HTTP response: timeout, connection
    /// failure, DNS failure, and so on.
    TransportError {
        /// A human-readable description of the failure, captured as a string
        /// (rather than the source error) so `ReplicaOutcome` stays
        /// `Send + Sync + 'static` and cheap to clone into a failure report.
        cause: String,
    },
}

impl ReplicaOutcome {
    /// Whether this outcome represents a committing success (as opposed to a
    /// no-op "already in desired state").
    pub fn is_success(&self) -> bool {
        matches!(self, ReplicaOutcome::Success { .. })
    }

    /// Whether this outcome is a no-op because the target state already held.
    pub fn is_already_in_desired_state(&self) -> bool {
        matches!(self, ReplicaOutcome::AlreadyInDesiredState { .. })
    }
}

/// The terminal state returned to callers of the coordinator (§3).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionState {
    /// Safe to consider the operation committed cluster-wide.
    Succeeded,

    /// A partial success was detected and fully compensated.
    RolledBack,

    /// No replica's state changed; the outer layer should retry.
    ToBeRetried,

    /// Terminal, unrecoverable by automatic means.
    Failed,
}

impl TransactionState {
    /// Whether the outer retry loop (§4.5) should re-invoke `coordinate` for this state.
    pub fn should_outer_retry(self) -> bool {
        matches!(self, TransactionState::ToBeRetried | TransactionState::Failed)
    }
}
