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

use std::result::Result as StdResult;

/// `Result<T, Error>`
pub type Result<T> = StdResult<T, Error>;

/// Errors that can escape the coordinator to a caller.
///
/// Per the coordination protocol, almost nothing propagates this way: replica
/// failures are reified into [`crate::outcome::ReplicaOutcome`] and consumed
/// internally by the classifier and compensator. The only error that crosses
/// back to a caller synchronously is an invalid dispatch action.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// `coordinate` was called with an `action` other than `"create"` or `"delete"`.
    #[error("invalid action `{0}`, expected \"create\" or \"delete\"")]
    InvalidAction(String),

    /// The cluster configuration file could not be loaded.
    #[error("failed to load cluster configuration: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from loading a [`crate::cluster::Cluster`] from its INI file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The file could not be read from disk.
    #[error("failed to read cluster file {path}: {source}")]
    Io {
        /// The path that was attempted.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file was not valid INI.
    #[error("failed to parse cluster file {path}: {source}")]
    Parse {
        /// The path that was attempted.
        path: String,
        /// The underlying parse error.
        #[source]
        source: ini::Error,
    },

    /// The file had no `[CLUSTER]` section.
    #[error("cluster file {path} has no [CLUSTER] section")]
    MissingSection {
        /// The path that was attempted.
        path: String,
    },

    /// The `[CLUSTER]` section had no keys, which would make the cluster empty (N=0).
    #[error("cluster file {path} defines zero replicas; a cluster must have N >= 1")]
    EmptyCluster {
        /// The path that was attempted.
        path: String,
    },

    /// A replica's value was not a valid URL.
    #[error("replica `{node}` has an invalid base URL `{value}`: {source}")]
    InvalidUrl {
        /// The INI key (node name).
        node: String,
        /// The INI value.
        value: String,
        /// The underlying URL parse error.
        #[source]
        source: url::ParseError,
    },
}
