// Domain layer: JSON:API models and the port the deployer drives.

pub mod model;
pub mod ports;
