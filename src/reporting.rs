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

//! The reporting sink (C7): where the compensator hands off a transaction it
//! could not fully resolve, for whatever downstream alerting or paging a
//! deployment wants.

use crate::outcome::{
    GroupId,
    Operation,
    ReplicaOutcome,
};

/// Everything known about a transaction at the point compensation gave up.
#[derive(Debug, Clone)]
pub struct CompensationFailureReport {
    /// The group the transaction was acting on.
    pub group_id: GroupId,

    /// The forward operation that was being compensated (the report records
    /// the *forward* operation; the compensator ran its inverse).
    pub intended_operation: Operation,

    /// Indices (into the cluster's replica list) that succeeded on the
    /// forward pass and were targeted for compensation.
    pub success_set: Vec<usize>,

    /// The last compensation attempt's per-replica outcomes, positionally
    /// aligned with `success_set`.
    pub last_outcomes: Vec<ReplicaOutcome>,
}

/// Where an unresolvable transaction gets reported (§4.4). Implementations
/// must not panic or block indefinitely — the compensator calls this
/// synchronously on the failure path.
pub trait ReportingSink: Send + Sync {
    /// Called exactly once per transaction that exhausts compensation
    /// retries without reaching a fully consistent cluster state.
    fn report_compensation_failure(&self, report: &CompensationFailureReport);
}

/// Logs the report via `tracing::error!` and otherwise does nothing. The
/// default sink for the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReportingSink;

impl ReportingSink for TracingReportingSink {
    fn report_compensation_failure(&self, report: &CompensationFailureReport) {
        tracing::error!(
            group_id = %report.group_id,
            intended_operation = %report.intended_operation,
            success_set = ?report.success_set,
            last_outcomes = ?report.last_outcomes,
            "compensation failed; cluster is left in a partial state"
        );
    }
}

/// Discards every report. Useful in tests that don't want log noise or that
/// assert on call count separately.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullReportingSink;

impl ReportingSink for NullReportingSink {
    fn report_compensation_failure(&self, _report: &CompensationFailureReport) {}
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        reports: Mutex<Vec<CompensationFailureReport>>,
    }

    impl ReportingSink for RecordingSink {
        fn report_compensation_failure(&self, report: &CompensationFailureReport) {
            self.reports.lock().unwrap().push(report.clone());
        }
    }

    #[test]
    fn sink_receives_the_report_it_was_given() {
        let sink = RecordingSink::default();
        let report = CompensationFailureReport {
            group_id: GroupId::new("g-1"),
            intended_operation: Operation::Create,
            success_set: vec![0, 2],
            last_outcomes: vec![ReplicaOutcome::ServerError { status: 500 }],
        };

        sink.report_compensation_failure(&report);

        let reports = sink.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].group_id, report.group_id);
    }

    #[test]
    fn null_sink_does_not_panic() {
        let sink = NullReportingSink;
        sink.report_compensation_failure(&CompensationFailureReport {
            group_id: GroupId::new("g-1"),
            intended_operation: Operation::Delete,
            success_set: vec![],
            last_outcomes: vec![],
        });
    }
}
