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

//! The compensator (C4): undoes a partially-succeeded fan-out by replaying
//! the inverse operation against the replicas that committed, retrying with
//! bounded exponential backoff until either every targeted replica reaches
//! the desired state or the retry budget is exhausted.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoffBuilder;

use crate::cluster::Cluster;
use crate::outcome::{
    GroupId,
    Operation,
    ReplicaOutcome,
};
use crate::reporting::{
    CompensationFailureReport,
    ReportingSink,
};

/// Bounds on the compensator's backoff loop: an initial interval, a cap,
/// and an attempt ceiling.
#[derive(Clone, Copy, Debug)]
pub struct CompensationPolicy {
    /// The first retry's delay.
    pub initial_interval: Duration,
    /// The longest any single retry's delay can grow to.
    pub max_interval: Duration,
    /// How many compensation attempts to make before giving up.
    pub max_attempts: usize,
}

impl Default for CompensationPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(60),
            max_attempts: 3,
        }
    }
}

/// Whether compensation against the success set fully resolved.
#[derive(Debug, PartialEq, Eq)]
pub enum CompensationResult {
    /// Every targeted replica reached the desired (compensated) state.
    RolledBack,
    /// The retry budget was exhausted with at least one replica still
    /// unresolved; the sink has already been notified.
    Failed,
}

/// Compensate the replicas named by `success_set`: call the inverse of
/// `forward_op` against each, retrying the whole success-set fan-out with
/// exponential backoff until every outcome is a committing success or a
/// no-op, or until `policy.max_attempts` is exhausted.
///
/// A 4xx on the inverse call is not automatically a dead end: it's folded in
/// with everything else and just means that particular attempt didn't fully
/// resolve, so the loop backs off and tries again like any other failure.
pub async fn compensate(
    cluster: &Cluster,
    forward_op: Operation,
    group_id: &GroupId,
    success_set: &[usize],
    policy: CompensationPolicy,
    sink: &dyn ReportingSink,
) -> CompensationResult {
    let inverse_op = forward_op.inverse();

    let mut backoff = ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_interval)
        .with_max_interval(policy.max_interval)
        .with_max_elapsed_time(None)
        .build();

    let mut attempt = 0;

    let last_outcomes = loop {
        attempt += 1;

        let outcomes = compensate_once(cluster, inverse_op, group_id, success_set).await;

        if outcomes.iter().all(|o| o.is_success() || o.is_already_in_desired_state()) {
            return CompensationResult::RolledBack;
        }

        if attempt >= policy.max_attempts {
            break outcomes;
        }

        let delay = backoff.next_backoff().unwrap_or(policy.max_interval);
        tracing::warn!(
            group_id = %group_id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            "compensation attempt left replicas unresolved; backing off"
        );
        tokio::time::sleep(delay).await;
    };

    sink.report_compensation_failure(&CompensationFailureReport {
        group_id: group_id.clone(),
        intended_operation: forward_op,
        success_set: success_set.to_vec(),
        last_outcomes,
    });

    CompensationResult::Failed
}

async fn compensate_once(
    cluster: &Cluster,
    inverse_op: Operation,
    group_id: &GroupId,
    success_set: &[usize],
) -> Vec<ReplicaOutcome> {
    let replicas = cluster.replicas();
    let calls = success_set.iter().map(|&index| {
        let client = replicas[index].client.clone();
        async move {
            match inverse_op {
                Operation::Create => client.post(group_id).await,
                Operation::Delete => client.delete(group_id).await,
            }
        }
    });

    futures_util::future::join_all(calls).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{
        AtomicUsize,
        Ordering,
    };
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::cluster::Replica;
    use crate::replica_client::ReplicaClient;
    use crate::reporting::NullReportingSink;

    struct ScriptedClient {
        attempts: Arc<AtomicUsize>,
        /// Outcome to return on the Nth call (1-indexed), clamped to the last entry.
        script: Vec<ReplicaOutcome>,
    }

    #[async_trait]
    impl ReplicaClient for ScriptedClient {
        async fn get(&self, _group_id: &GroupId) -> ReplicaOutcome {
            unimplemented!("not exercised by the compensator")
        }

        async fn post(&self, _group_id: &GroupId) -> ReplicaOutcome {
            self.next()
        }

        async fn delete(&self, _group_id: &GroupId) -> ReplicaOutcome {
            self.next()
        }
    }

    impl ScriptedClient {
        fn next(&self) -> ReplicaOutcome {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            self.script.get(n).cloned().unwrap_or_else(|| self.script.last().unwrap().clone())
        }
    }

    fn policy() -> CompensationPolicy {
        CompensationPolicy {
            initial_interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            max_attempts: 3,
        }
    }

    #[tokio::test]
    async fn rolls_back_when_inverse_succeeds_immediately() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let cluster = Cluster::new(vec![Replica {
            name: "node1".into(),
            client: Arc::new(ScriptedClient {
                attempts: attempts.clone(),
                script: vec![ReplicaOutcome::Success { status: 200 }],
            }),
        }]);

        let group_id = GroupId::new("g-1");
        let sink = NullReportingSink;
        let result =
            compensate(&cluster, Operation::Create, &group_id, &[0], policy(), &sink).await;

        assert_eq!(result, CompensationResult::RolledBack);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_rolls_back() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let cluster = Cluster::new(vec![Replica {
            name: "node1".into(),
            client: Arc::new(ScriptedClient {
                attempts: attempts.clone(),
                script: vec![
                    ReplicaOutcome::ServerError { status: 500 },
                    ReplicaOutcome::Success { status: 200 },
                ],
            }),
        }]);

        let group_id = GroupId::new("g-1");
        let sink = NullReportingSink;
        let result =
            compensate(&cluster, Operation::Create, &group_id, &[0], policy(), &sink).await;

        assert_eq!(result, CompensationResult::RolledBack);
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn reports_failure_after_exhausting_attempts() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let cluster = Cluster::new(vec![Replica {
            name: "node1".into(),
            client: Arc::new(ScriptedClient {
                attempts: attempts.clone(),
                script: vec![ReplicaOutcome::ServerError { status: 500 }],
            }),
        }]);

        let group_id = GroupId::new("g-1");
        let sink = NullReportingSink;
        let result =
            compensate(&cluster, Operation::Create, &group_id, &[0], policy(), &sink).await;

        assert_eq!(result, CompensationResult::Failed);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn backoff_delays_stay_within_policy_bounds() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let cluster = Cluster::new(vec![Replica {
            name: "node1".into(),
            client: Arc::new(ScriptedClient {
                attempts: attempts.clone(),
                script: vec![ReplicaOutcome::ServerError { status: 500 }],
            }),
        }]);

        let policy = CompensationPolicy {
            initial_interval: Duration::from_millis(10),
            max_interval: Duration::from_millis(30),
            max_attempts: 4,
        };

        let group_id = GroupId::new("g-1");
        let sink = NullReportingSink;
        let start = std::time::Instant::now();
        let result =
            compensate(&cluster, Operation::Create, &group_id, &[0], policy, &sink).await;
        let elapsed = start.elapsed();

        assert_eq!(result, CompensationResult::Failed);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
        // 3 backoff waits between 4 attempts, each capped at max_interval: the
        // total sleep time can never exceed max_attempts * max_interval.
        assert!(
            elapsed < policy.max_interval * policy.max_attempts as u32,
            "elapsed {elapsed:?} exceeded the backoff upper bound"
        );
    }
}
