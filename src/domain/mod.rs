// Domain layer: reservation models and the remote service port. No HTTP code here.

pub mod model;
pub mod ports;
