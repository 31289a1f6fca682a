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

//! The outcome classifier (C3): a pure function from an outcome vector to a
//! [`Classification`], per the decision table in §4.3.

use crate::outcome::ReplicaOutcome;

/// The result of classifying one fan-out's outcome vector.
#[derive(Debug, PartialEq, Eq)]
pub enum Classification {
    /// Every replica is in the desired post-state already.
    Succeeded,

    /// At least one replica committed and at least one did not; the
    /// `success_set` names the indices (into the original outcome vector,
    /// and thus the original replica list) that need compensating.
    NeedsCompensation {
        /// Indices of replicas whose forward outcome was `Success`.
        success_set: Vec<usize>,
    },

    /// No replica changed state and none was already in the desired state;
    /// the outer layer should retry the whole transaction.
    ToBeRetried,
}

/// Classify a fan-out's outcome vector (§4.3).
///
/// `outcomes` must be non-empty; the cluster this core runs against is
/// always N >= 1 (§3).
pub fn classify(outcomes: &[ReplicaOutcome]) -> Classification {
    assert!(!outcomes.is_empty(), "cannot classify an empty outcome vector");

    let success_set: Vec<usize> = outcomes
        .iter()
        .enumerate()
        .filter(|(_, o)| o.is_success())
        .map(|(i, _)| i)
        .collect();

    let any_error = outcomes.iter().any(|o| !o.is_success() && !o.is_already_in_desired_state());

    if success_set.is_empty() {
        // No replica committed on this attempt. If every outcome was a no-op,
        // the cluster is already in the desired post-state. But if an error
        // is mixed in with no-ops (or it's all errors), nothing confirms that
        // errored replica's state, so this can't be SUCCEEDED — retry instead.
        return if any_error { Classification::ToBeRetried } else { Classification::Succeeded };
    }

    if success_set.len() == outcomes.len() {
        // all Success
        return Classification::Succeeded;
    }

    if any_error {
        Classification::NeedsCompensation { success_set }
    } else {
        // mix of Success and AlreadyInDesiredState, no errors: cluster is in
        // the desired post-state cluster-wide.
        Classification::Succeeded
    }
}
