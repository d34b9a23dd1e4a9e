mod service;
mod track;
mod vehicle;

pub use service::{CompositionEntry, ConnectionHistory, OriginalNumbers, Service, TrainSet};
pub use track::{CapacityStatus, TrackCatalog, TrackDefinition};
pub use vehicle::{VehicleCatalog, VehicleType};
