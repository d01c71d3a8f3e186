//! Integration test suite for daysim.
//!
//! These tests drive whole runs through the public API with scripted
//! generators, so no external command is ever invoked.
//!
//! # Test Categories
//!
//! - `simulation_e2e`: batch runs from inputs to report
//! - `streaming`: unit order, spawned runs, pause and stop
//! - `failure_isolation`: generator failures and fatal errors
//! - `overlay`: overlay edits feeding a run

mod fixtures;

mod failure_isolation;
mod overlay;
mod simulation_e2e;
mod streaming;
