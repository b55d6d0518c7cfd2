//! Typed clients for individual Logo Objects entities.
//!
//! Each entity gets a field enum naming its vendor columns, a record DTO,
//! and a client that implements `Resource` and adds the entity's own search
//! helpers and action endpoints.

mod export_movement_slips;
mod shifts;

pub use export_movement_slips::{ExportMovementSlip, ExportMovementSlipField, ExportMovementSlips};
pub use shifts::{Shift, ShiftField, Shifts};
