// Domain layer: the prefecture catalog, signal types, classification and the store ports.

pub mod catalog;
pub mod model;
pub mod ports;
pub mod severity;
