// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

use prometheus::{
    register_int_counter_vec_with_registry, register_int_gauge_with_registry, IntCounterVec,
    IntGauge, Registry,
};

#[derive(Clone, Debug)]
pub struct IndexerMetrics {
    pub(crate) events_processed: IntCounterVec,
    pub(crate) events_skipped: IntCounterVec,
    // Data the handlers tolerate but flag: negative balances, unknown voters, saturated amounts
    pub(crate) anomalies: IntCounterVec,
    pub(crate) last_processed_block: IntGauge,
}

impl IndexerMetrics {
    pub fn new(registry: &Registry) -> Self {
        Self {
            events_processed: register_int_counter_vec_with_registry!(
                "governance_events_processed_total",
                "Total number of events applied to the projection, by event type",
                &["event"],
                registry,
            )
            .unwrap(),
            events_skipped: register_int_counter_vec_with_registry!(
                "governance_events_skipped_total",
                "Total number of events not applied, by reason",
                &["reason"],
                registry,
            )
            .unwrap(),
            anomalies: register_int_counter_vec_with_registry!(
                "governance_anomalies_total",
                "Total number of data anomalies observed while projecting, by kind",
                &["kind"],
                registry,
            )
            .unwrap(),
            last_processed_block: register_int_gauge_with_registry!(
                "governance_last_processed_block",
                "Block number of the last applied event",
                registry,
            )
            .unwrap(),
        }
    }

    pub fn new_for_testing() -> Self {
        let registry = Registry::new();
        Self::new(&registry)
    }

    pub fn processed_count(&self, event: &str) -> u64 {
        self.events_processed.with_label_values(&[event]).get()
    }

    pub fn skipped_count(&self, reason: &str) -> u64 {
        self.events_skipped.with_label_values(&[reason]).get()
    }

    pub fn anomaly_count(&self, kind: &str) -> u64 {
        self.anomalies.with_label_values(&[kind]).get()
    }

    pub fn last_processed_block(&self) -> i64 {
        self.last_processed_block.get()
    }
}
