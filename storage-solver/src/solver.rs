// SPDX-License-Identifier: GPL-3.0-only

//! Config solver
//!
//! Turns a decoded configuration into a resolved one: searches bound to
//! inventory devices, product encryption applied, filesystem types and
//! sizes filled and a boot device picked. The input is never modified.

use storage_contracts::{DeviceInventory, SolveError};
use storage_types::{Config, ProductDefaults};
use tracing::debug;

use crate::search::SearchSolver;
use crate::{alias, boot, encryption, filesystem, size};

pub struct ConfigSolver<'a> {
    inventory: &'a dyn DeviceInventory,
    product: &'a ProductDefaults,
}

impl<'a> ConfigSolver<'a> {
    pub fn new(inventory: &'a dyn DeviceInventory, product: &'a ProductDefaults) -> Self {
        Self { inventory, product }
    }

    pub fn solve(&self, config: &Config) -> Result<Config, SolveError> {
        let mut config = config.clone();

        alias::check_definitions(&config)?;
        SearchSolver::new(self.inventory).solve(&mut config)?;
        encryption::solve(&mut config, self.product);
        filesystem::solve(&mut config, self.product);
        size::solve(&mut config, self.inventory, self.product);
        boot::solve(&mut config);
        alias::check_references(&config)?;

        debug!(
            drives = config.drives.len(),
            md_raids = config.md_raids.len(),
            volume_groups = config.volume_groups.len(),
            "Config solved"
        );
        Ok(config)
    }
}
