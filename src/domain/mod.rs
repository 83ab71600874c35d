// Domain layer: report models and ports (interfaces) to the detection service, renderers and storage.

pub mod model;
pub mod ports;
