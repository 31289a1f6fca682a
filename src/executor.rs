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

//! The fan-out executor (C2): invoke one [`Operation`] concurrently across
//! every replica in a [`Cluster`] and collect the outcomes positionally.

use futures_util::future::join_all;

use crate::cluster::Cluster;
use crate::outcome::{
    GroupId,
    Operation,
    ReplicaOutcome,
};

/// Invoke `op` against every replica in `cluster`, concurrently, for
/// `group_id`. The returned vector is positionally aligned with
/// `cluster.replicas()`: index `i` of the result is the outcome from
/// `cluster.replicas()[i]`.
///
/// Never fails outright and never short-circuits on the first failure — a
/// replica that errors or times out simply contributes a non-success
/// [`ReplicaOutcome`] at its index; every future is waited out before any
/// result is inspected.
pub async fn fan_out(cluster: &Cluster, op: Operation, group_id: &GroupId) -> Vec<ReplicaOutcome> {
    let calls = cluster.replicas().iter().map(|replica| {
        let client = replica.client.clone();
        async move {
            match op {
                Operation::Create => client.post(group_id).await,
                Operation::Delete => client.delete(group_id).await,
            }
        }
    });

    join_all(calls).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };

    use async_trait::async_trait;

    use super::*;
    use crate::cluster::Replica;
    use crate::replica_client::ReplicaClient;

    struct CountingClient {
        calls: Arc<AtomicUsize>,
        outcome: ReplicaOutcome,
    }

    #[async_trait]
    impl ReplicaClient for CountingClient {
        async fn get(&self, _group_id: &GroupId) -> ReplicaOutcome {
            self.outcome.clone()
        }

        async fn post(&self, _group_id: &GroupId) -> ReplicaOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }

        async fn delete(&self, _group_id: &GroupId) -> ReplicaOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone()
        }
    }

    fn replica(name: &str, outcome: ReplicaOutcome, calls: Arc<AtomicUsize>) -> Replica {
        Replica { name: name.to_owned(), client: Arc::new(CountingClient { calls, outcome }) }
    }

    #[tokio::test]
    async fn fans_out_to_every_replica_and_preserves_order() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cluster = Cluster::new(vec![
            replica("node1", ReplicaOutcome::Success { status: 201 }, calls.clone()),
            replica("node2", ReplicaOutcome::ServerError { status: 500 }, calls.clone()),
            replica("node3", ReplicaOutcome::Success { status: 201 }, calls.clone()),
        ]);

        let group_id = GroupId::new("g-1");
        let outcomes = fan_out(&cluster, Operation::Create, &group_id).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(outcomes, vec![
            ReplicaOutcome::Success { status: 201 },
            ReplicaOutcome::ServerError { status: 500 },
            ReplicaOutcome::Success { status: 201 },
        ]);
    }

    #[tokio::test]
    async fn delete_invokes_delete_not_post() {
        let calls = Arc::new(AtomicUsize::new(0));
        let cluster =
            Cluster::new(vec![replica("node1", ReplicaOutcome::Success { status: 200 }, calls.clone())]);

        let group_id = GroupId::new("g-1");
        let outcomes = fan_out(&cluster, Operation::Delete, &group_id).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(outcomes, vec![ReplicaOutcome::Success { status: 200 }]);
    }
}
