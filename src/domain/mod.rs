// Domain layer: request/response models and the ports the compositor talks to.

pub mod model;
pub mod ports;
