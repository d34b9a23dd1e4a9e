use super::TrainSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Vehicle type definition, supplied by the rolling-stock layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleType {
    pub name: String,
    pub base_length_meters: u32,
    pub can_be_multiple: bool,
    #[serde(default)]
    pub category: String,
}

/// Lookup table from vehicle-type id to its definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleCatalog {
    types: IndexMap<String, VehicleType>,
}

impl VehicleCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, vehicle: VehicleType) {
        self.types.insert(id.into(), vehicle);
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&VehicleType> {
        self.types.get(id)
    }

    /// Physical length of a train set in meters. Unknown vehicle types
    /// contribute zero length rather than failing the lookup.
    #[must_use]
    pub fn train_set_length(&self, set: &TrainSet) -> u32 {
        match set {
            TrainSet::Unit { vehicle_type_id, count } => self
                .get(vehicle_type_id)
                .map_or(0, |v| v.base_length_meters * count),
            TrainSet::Composition { vehicles } => vehicles
                .iter()
                .map(|entry| self.get(&entry.vehicle_type_id).map_or(0, |v| v.base_length_meters))
                .sum(),
        }
    }

    /// The stock Swedish catalog the board ships with
    #[must_use]
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        let entries = [
            ("X2", "X2", 135, true, "high_speed"),
            ("REGINA", "Regina", 54, true, "regional"),
            ("SJ3000", "SJ 3000", 107, false, "intercity"),
            ("ORESUND", "Öresundståg", 79, true, "regional"),
            ("PENDELTAG", "Pendeltåg", 68, true, "commuter"),
            ("LOCOMOTIVE_RC", "Rc Lok", 16, false, "locomotive"),
            ("LOCOMOTIVE_CARGO", "Godslok", 20, false, "cargo"),
            ("WAGON_PASSENGER", "Personvagn", 26, false, "wagon"),
            ("WAGON_CARGO", "Godsvagn", 15, false, "wagon"),
            ("MAINTENANCE", "Banunderhåll", 25, false, "maintenance"),
        ];
        for (id, name, length, multiple, category) in entries {
            catalog.insert(
                id,
                VehicleType {
                    name: name.to_string(),
                    base_length_meters: length,
                    can_be_multiple: multiple,
                    category: category.to_string(),
                },
            );
        }
        catalog
    }
}
