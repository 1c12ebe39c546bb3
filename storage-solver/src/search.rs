//! Binding of searches to inventory devices
//!
//! Nodes are visited in document order (drives, then MD RAIDs, each followed
//! by its partitions) and a device claimed by one search is never offered to
//! a later one. Candidates keep the inventory order.

use std::collections::HashSet;

use storage_contracts::{DeviceInventory, SolveError};
use storage_types::{Config, Device, Drive, IfNotFound, MdRaid, Partition, Search};
use tracing::{debug, info};

enum Outcome<'a> {
    Found(Vec<&'a Device>),
    Skip,
    Create,
}

pub(crate) struct SearchSolver<'a> {
    inventory: &'a dyn DeviceInventory,
    claimed: HashSet<String>,
}

impl<'a> SearchSolver<'a> {
    pub(crate) fn new(inventory: &'a dyn DeviceInventory) -> Self {
        Self {
            inventory,
            claimed: HashSet::new(),
        }
    }

    pub(crate) fn solve(mut self, config: &mut Config) -> Result<(), SolveError> {
        let drives = std::mem::take(&mut config.drives);
        for (index, drive) in drives.into_iter().enumerate() {
            let solved = self.drive(drive, &format!("drives[{index}]"))?;
            config.drives.extend(solved);
        }

        let md_raids = std::mem::take(&mut config.md_raids);
        for (index, md_raid) in md_raids.into_iter().enumerate() {
            let solved = self.md_raid(md_raid, &format!("mdRaids[{index}]"))?;
            config.md_raids.extend(solved);
        }

        Ok(())
    }

    fn drive(&mut self, drive: Drive, path: &str) -> Result<Vec<Drive>, SolveError> {
        let search = normalized(drive.search.as_ref()).unwrap_or_else(Search::first_device);
        let inventory = self.inventory;

        match self.resolve(&search, inventory.drives(), path)? {
            Outcome::Found(devices) => {
                let mut solved = Vec::with_capacity(devices.len());
                for (copy, device) in devices.into_iter().enumerate() {
                    debug!(path, device = %device.name, "Drive bound");
                    let partitions = self.partitions(&drive.partitions, Some(device), path)?;
                    solved.push(Drive {
                        search: Some(search.bound_to(device)),
                        alias: first_copy_alias(drive.alias.as_ref(), copy),
                        partitions,
                        ..drive.clone()
                    });
                }
                Ok(solved)
            }
            Outcome::Skip => Ok(Vec::new()),
            Outcome::Create => {
                let partitions = self.partitions(&drive.partitions, None, path)?;
                Ok(vec![Drive {
                    search: Some(search),
                    partitions,
                    ..drive
                }])
            }
        }
    }

    fn md_raid(&mut self, md_raid: MdRaid, path: &str) -> Result<Vec<MdRaid>, SolveError> {
        let Some(search) = normalized(md_raid.search.as_ref()) else {
            let partitions = self.partitions(&md_raid.partitions, None, path)?;
            return Ok(vec![MdRaid {
                search: None,
                partitions,
                ..md_raid
            }]);
        };
        let inventory = self.inventory;

        match self.resolve(&search, inventory.md_raids(), path)? {
            Outcome::Found(devices) => {
                let mut solved = Vec::with_capacity(devices.len());
                for (copy, device) in devices.into_iter().enumerate() {
                    debug!(path, device = %device.name, "MD RAID bound");
                    let partitions = self.partitions(&md_raid.partitions, Some(device), path)?;
                    solved.push(MdRaid {
                        search: Some(search.bound_to(device)),
                        alias: first_copy_alias(md_raid.alias.as_ref(), copy),
                        partitions,
                        ..md_raid.clone()
                    });
                }
                Ok(solved)
            }
            Outcome::Skip => Ok(Vec::new()),
            Outcome::Create => {
                let partitions = self.partitions(&md_raid.partitions, None, path)?;
                Ok(vec![MdRaid {
                    search: Some(search),
                    partitions,
                    ..md_raid
                }])
            }
        }
    }

    fn partitions(
        &mut self,
        partitions: &[Partition],
        parent: Option<&Device>,
        path: &str,
    ) -> Result<Vec<Partition>, SolveError> {
        let inventory = self.inventory;
        let candidates = parent
            .map(|parent| inventory.partitions_of(&parent.name))
            .unwrap_or_default();

        let mut solved = Vec::with_capacity(partitions.len());
        for (index, partition) in partitions.iter().enumerate() {
            let path = format!("{path}.partitions[{index}]");

            let Some(search) = normalized(partition.search.as_ref()) else {
                solved.push(Partition {
                    search: None,
                    ..partition.clone()
                });
                continue;
            };

            match self.resolve(&search, candidates.clone(), &path)? {
                Outcome::Found(devices) => {
                    for (copy, device) in devices.into_iter().enumerate() {
                        debug!(path = %path, device = %device.name, "Partition bound");
                        solved.push(Partition {
                            search: Some(search.bound_to(device)),
                            alias: first_copy_alias(partition.alias.as_ref(), copy),
                            ..partition.clone()
                        });
                    }
                }
                Outcome::Skip => {}
                Outcome::Create => solved.push(Partition {
                    search: Some(search),
                    ..partition.clone()
                }),
            }
        }

        Ok(solved)
    }

    fn resolve(
        &mut self,
        search: &Search,
        candidates: Vec<&'a Device>,
        path: &str,
    ) -> Result<Outcome<'a>, SolveError> {
        let found = self.claim(search, candidates);
        if !found.is_empty() {
            return Ok(Outcome::Found(found));
        }

        match search.if_not_found {
            IfNotFound::Error => Err(SolveError::unresolved(path)),
            IfNotFound::Skip => {
                info!(path, "No device found, skipping the node");
                Ok(Outcome::Skip)
            }
            IfNotFound::Create => {
                info!(path, "No device found, creating a new one");
                Ok(Outcome::Create)
            }
        }
    }

    /// Take the unclaimed candidates the search accepts, up to its `max`
    fn claim(&mut self, search: &Search, candidates: Vec<&'a Device>) -> Vec<&'a Device> {
        let limit = search.max.map_or(usize::MAX, |max| max as usize);

        let found: Vec<&'a Device> = candidates
            .into_iter()
            .filter(|device| !self.claimed.contains(&device.name))
            .filter(|device| match search.device_name() {
                // Already bound by a previous solve
                Some(name) => device.name == name,
                None => search.matches(device),
            })
            .take(limit)
            .collect();

        for device in &found {
            self.claimed.insert(device.name.clone());
        }

        found
    }
}

/// An alias names one node, so only the first copy of a multi-match search keeps it
fn first_copy_alias(alias: Option<&String>, copy: usize) -> Option<String> {
    alias.filter(|_| copy == 0).cloned()
}

/// A search without any content is the same as no search
fn normalized(search: Option<&Search>) -> Option<Search> {
    search.filter(|search| !search.is_empty()).cloned()
}
