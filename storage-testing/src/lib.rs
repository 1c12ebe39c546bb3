// SPDX-License-Identifier: GPL-3.0-only

//! Scenario fixtures and runner for the storage configuration crates
//!
//! Scenarios live in `resources/scenarios`, products in `resources/products`.

pub mod errors;
pub mod runner;
pub mod scenario;
