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

//! The cluster configuration loader (C6): parses the INI file described in
//! §6 into a fixed, ordered list of replicas.

use std::path::Path;
use std::sync::Arc;

use url::Url;

use crate::error::ConfigError;
use crate::replica_client::{
    HttpReplicaClient,
    ReplicaClient,
};

const SECTION: &str = "CLUSTER";

/// One replica: a name (for logging) and the client that talks to it.
pub struct Replica {
    /// The INI key this replica was configured under, kept for diagnostics
    /// and for the reporting sink's failure reports.
    pub name: String,

    /// The client used to reach this replica.
    pub client: Arc<dyn ReplicaClient>,
}

/// A fixed-cardinality, positionally-indexed set of replicas (§3). Loaded
/// once at process start and shared for the coordinator's lifetime.
pub struct Cluster {
    replicas: Vec<Replica>,
}

impl Cluster {
    /// Build a cluster directly from a list of replicas, in the given order.
    ///
    /// Panics if `replicas` is empty — a cluster must have N >= 1 (§3).
    pub fn new(replicas: Vec<Replica>) -> Self {
        assert!(!replicas.is_empty(), "a cluster must have at least one replica");
        Self { replicas }
    }

    /// Load a cluster from the `[CLUSTER]` section of an INI file (§6). Keys
    /// under the section are replica names; values are base URLs. Insertion
    /// order in the file fixes the positional index.
    pub fn from_ini_file(path: &Path) -> Result<Self, ConfigError> {
        let path_str = path.display().to_string();

        let conf = ini::Ini::load_from_file(path).map_err(|source| match source {
            ini::Error::Io(source) => ConfigError::Io { path: path_str.clone(), source },
            parse_error @ ini::Error::Parse(_) => {
                ConfigError::Parse { path: path_str.clone(), source: parse_error }
            }
        })?;

        let section = conf
            .section(Some(SECTION))
            .ok_or_else(|| ConfigError::MissingSection { path: path_str.clone() })?;

        let mut replicas = Vec::new();
        for (node, value) in section.iter() {
            let base_url = Url::parse(value).map_err(|source| ConfigError::InvalidUrl {
                node: node.to_owned(),
                value: value.to_owned(),
                source,
            })?;

            replicas.push(Replica {
                name: node.to_owned(),
                client: Arc::new(HttpReplicaClient::new(base_url)),
            });
        }

        if replicas.is_empty() {
            return Err(ConfigError::EmptyCluster { path: path_str });
        }

        Ok(Self { replicas })
    }

    /// The number of replicas, N.
    pub fn len(&self) -> usize {
        self.replicas.len()
    }

    /// Whether the cluster has zero replicas. Never true for a `Cluster`
    /// built via [`Cluster::new`] or [`Cluster::from_ini_file`], both of
    /// which reject N=0; kept so callers can write the idiomatic check.
    pub fn is_empty(&self) -> bool {
        self.replicas.is_empty()
    }

    /// Iterate the replicas in positional order.
    pub fn replicas(&self) -> &[Replica] {
        &self.replicas
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn write_cluster_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("create temp cluster file");
        file.write_all(contents.as_bytes()).expect("write temp cluster file");
        file
    }

    #[test]
    fn loads_replicas_in_insertion_order() {
        let file = write_cluster_file(
            "[CLUSTER]\nnode1 = http://replica-1.example:8080\nnode2 = http://replica-2.example:8080\nnode3 = http://replica-3.example:8080\n",
        );

        let cluster = Cluster::from_ini_file(file.path()).expect("valid cluster file");
        assert_eq!(cluster.len(), 3);
        assert_eq!(cluster.replicas()[0].name, "node1");
        assert_eq!(cluster.replicas()[1].name, "node2");
        assert_eq!(cluster.replicas()[2].name, "node3");
    }

    #[test]
    fn missing_section_is_an_error() {
        let file = write_cluster_file("[OTHER]\nnode1 = http://replica-1.example:8080\n");
        let err = Cluster::from_ini_file(file.path()).unwrap_err();
        assert_matches::assert_matches!(err, ConfigError::MissingSection { .. });
    }

    #[test]
    fn empty_section_is_an_error() {
        let file = write_cluster_file("[CLUSTER]\n");
        let err = Cluster::from_ini_file(file.path()).unwrap_err();
        assert_matches::assert_matches!(err, ConfigError::EmptyCluster { .. });
    }

    #[test]
    fn invalid_url_is_an_error() {
        let file = write_cluster_file("[CLUSTER]\nnode1 = not-a-url\n");
        let err = Cluster::from_ini_file(file.path()).unwrap_err();
        assert_matches::assert_matches!(err, ConfigError::InvalidUrl { .. });
    }

    #[test]
    #[should_panic]
    fn new_panics_on_empty_replica_list() {
        let _ = Cluster::new(Vec::new());
    }
}
