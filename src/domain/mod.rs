// Domain layer: core models and ports. No I/O here, adapters live under crate::adapters.

pub mod model;
pub mod ports;
