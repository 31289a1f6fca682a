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

//! The coordinator (C4.5): the public surface that drives one transaction
//! from dispatch through fan-out, classification, compensation, and the
//! outer retry loop to a terminal [`TransactionState`].

use std::sync::Arc;
use std::time::Duration;

use crate::classifier::{
    classify,
    Classification,
};
use crate::cluster::Cluster;
use crate::compensator::{
    compensate,
    CompensationPolicy,
    CompensationResult,
};
use crate::error::{
    Error,
    Result,
};
use crate::executor::fan_out;
use crate::outcome::{
    GroupId,
    Operation,
    TransactionState,
};
use crate::reporting::ReportingSink;

/// Bounds for one `coordinate` call: the compensator's backoff policy plus
/// how many times the outer loop re-runs the whole forward-fan-out-compensate
/// cycle before giving up (§4.5).
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// Backoff bounds passed through to the compensator.
    pub compensation: CompensationPolicy,
    /// How many times `coordinate` re-attempts the transaction end to end.
    pub max_outer_attempts: usize,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { compensation: CompensationPolicy::default(), max_outer_attempts: 3 }
    }
}

impl RetryPolicy {
    /// A policy with no backoff and a single outer attempt, for tests that
    /// want deterministic, fast failure.
    pub fn immediate(max_outer_attempts: usize) -> Self {
        Self {
            compensation: CompensationPolicy {
                initial_interval: Duration::from_millis(1),
                max_interval: Duration::from_millis(1),
                max_attempts: 1,
            },
            max_outer_attempts,
        }
    }
}

/// Drives transactions against one [`Cluster`].
pub struct Coordinator {
    cluster: Cluster,
    policy: RetryPolicy,
    sink: Arc<dyn ReportingSink>,
}

impl Coordinator {
    /// Build a coordinator for `cluster`, applying `policy` to every
    /// transaction and reporting unresolved compensations to `sink`.
    pub fn new(cluster: Cluster, policy: RetryPolicy, sink: Arc<dyn ReportingSink>) -> Self {
        Self { cluster, policy, sink }
    }

    /// Dispatch on the wire-level `action` string (§6): `"create"` or
    /// `"delete"`. Returns [`Error::InvalidAction`] for anything else.
    pub async fn coordinate(&self, group_id: &GroupId, action: &str) -> Result<TransactionState> {
        let op = Operation::parse(action).ok_or_else(|| Error::InvalidAction(action.to_owned()))?;
        Ok(self.run(op, group_id).await)
    }

    /// Create `group_id` across the cluster.
    pub async fn create(&self, group_id: &GroupId) -> TransactionState {
        self.run(Operation::Create, group_id).await
    }

    /// Delete `group_id` across the cluster.
    pub async fn delete(&self, group_id: &GroupId) -> TransactionState {
        self.run(Operation::Delete, group_id).await
    }

    async fn run(&self, op: Operation, group_id: &GroupId) -> TransactionState {
        use tracing::Instrument;

        let span = tracing::info_span!("dtc_transaction", %group_id, %op);

        async {
            let mut state = TransactionState::ToBeRetried;

            for attempt in 1..=self.policy.max_outer_attempts {
                state = self.attempt_once(op, group_id).await;
                tracing::info!(attempt, ?state, "transaction attempt complete");

                if !state.should_outer_retry() {
                    return state;
                }
            }

            state
        }
        .instrument(span)
        .await
    }

    async fn attempt_once(&self, op: Operation, group_id: &GroupId) -> TransactionState {
        let outcomes = fan_out(&self.cluster, op, group_id).await;

        match classify(&outcomes) {
            Classification::Succeeded => TransactionState::Succeeded,
            Classification::ToBeRetried => TransactionState::ToBeRetried,
            Classification::NeedsCompensation { success_set } => {
                let result = compensate(
                    &self.cluster,
                    op,
                    group_id,
                    &success_set,
                    self.policy.compensation,
                    self.sink.as_ref(),
                )
                .await;

                match result {
                    CompensationResult::RolledBack => TransactionState::RolledBack,
                    CompensationResult::Failed => TransactionState::Failed,
                }
            }
        }
    }
}
