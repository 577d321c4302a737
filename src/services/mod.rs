//! Service layer: ports (traits + data contracts) and their adapters.

pub mod adapters;
pub mod ports;
