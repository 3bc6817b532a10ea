// Domain layer: map models and ports. Concrete collaborators live under adapters.

pub mod model;
pub mod ports;
