//! Integration test suite for weft.
//!
//! These tests drive the public API end to end: decomposition into a
//! synthesized workflow, step execution against an in-memory worker pool,
//! and the job queue under concurrent producers and consumers.
//!
//! # Test Categories
//!
//! - `workflow_e2e`: Task to workflow to aggregated result
//! - `parallel_steps`: Majority merge and worker exclusivity
//! - `voting`: Reviewer vote steps
//! - `lifecycle`: Retry, routing, timeout, cancellation and limits
//! - `queue_concurrency`: Job queue ordering under contention
//!
//! Workers are scripted in-process; nothing touches the network.

mod fixtures;

mod lifecycle;
mod parallel_steps;
mod voting;
mod workflow_e2e;
