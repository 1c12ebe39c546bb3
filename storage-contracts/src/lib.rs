// SPDX-License-Identifier: GPL-3.0-only

pub mod protocol;
pub mod traits;

pub use protocol::{SchemaError, SolveError, SolveErrorKind};
pub use traits::DeviceInventory;
