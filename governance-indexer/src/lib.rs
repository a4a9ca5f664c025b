// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0
pub mod config;
pub mod decimals;
pub mod decode;
pub mod events;
pub mod handlers;
pub mod metrics;
pub mod progress;
pub mod reader;
pub mod runner;


pub use handlers::GovernanceProjector;
pub use runner::{run_event_handler, ApplyOutcome, EventRunner, RunSummary};
