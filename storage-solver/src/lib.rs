// SPDX-License-Identifier: GPL-3.0-only

//! Resolution of storage configurations against a device inventory
//!
//! - **solver**: binds searches to devices and fills every product default
//! - **support**: tells whether a resolved configuration fits the simplified model
//!
//! Both take the inventory and the product defaults as explicit arguments
//! and never keep state between calls.

mod alias;
mod boot;
mod encryption;
mod filesystem;
mod nodes;
mod search;
mod size;
pub mod solver;
pub mod support;

pub use solver::ConfigSolver;
pub use support::{ModelSupportChecker, Rule, SupportReport, Violation};

use storage_contracts::{DeviceInventory, SolveError};
use storage_types::{Config, ProductDefaults};

/// Resolve `config` against the given inventory and product defaults
pub fn solve(
    config: &Config,
    inventory: &dyn DeviceInventory,
    product: &ProductDefaults,
) -> Result<Config, SolveError> {
    ConfigSolver::new(inventory, product).solve(config)
}

/// Whether a resolved configuration can be shown as a simplified model
pub fn is_model_supported(config: &Config, product: &ProductDefaults) -> bool {
    ModelSupportChecker::new(product).check(config).is_supported()
}
