//! Migration framework for saved-state format changes.
//!
//! Each migration is self-contained and migrations chain, so any old save
//! can be upgraded step by step to the current version. Migrations operate
//! on raw JSON values since the persisted format is a JSON envelope.

use serde_json::{json, Map, Value};

/// One step from a source format version to the next
pub trait Migration {
    fn source_version(&self) -> u32;

    fn target_version(&self) -> u32;

    /// Transform the raw saved value into the target version's shape
    ///
    /// # Errors
    /// Returns an error if the saved value cannot be migrated.
    fn migrate(&self, value: Value) -> Result<Value, String>;
}

/// Chain of migrations applied sequentially
#[derive(Default)]
pub struct MigrationChain {
    migrations: Vec<Box<dyn Migration>>,
}

impl MigrationChain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_migration(&mut self, migration: Box<dyn Migration>) {
        self.migrations.push(migration);
    }

    /// Upgrade `value` from `from_version` to `to_version`
    ///
    /// # Errors
    /// Returns an error if no migration path exists or any step fails.
    pub fn migrate(&self, value: Value, from_version: u32, to_version: u32) -> Result<Value, String> {
        if from_version == to_version {
            return Ok(value);
        }
        if from_version > to_version {
            return Err(format!(
                "Cannot downgrade saved state from version {from_version} to {to_version}"
            ));
        }

        let mut current_version = from_version;
        let mut current = value;
        while current_version < to_version {
            let migration = self
                .migrations
                .iter()
                .find(|m| m.source_version() == current_version)
                .ok_or_else(|| format!("No migration found from version {current_version}"))?;

            let next_version = migration.target_version();
            if next_version <= current_version {
                return Err(format!(
                    "Migration from v{current_version} goes to v{next_version}, which is not forward progress"
                ));
            }

            current = migration.migrate(current)?;
            current_version = next_version;
        }
        Ok(current)
    }
}

/// The complete chain for all known format versions
#[must_use]
pub fn create_migration_chain() -> MigrationChain {
    let mut chain = MigrationChain::new();
    chain.add_migration(Box::new(V1ToV2Migration));
    chain
}

/// v1 is the legacy version-less shape: the bare state object at the top
/// level, no envelope, and possibly missing fields. Wraps it into the
/// versioned envelope and fills defaults.
pub struct V1ToV2Migration;

fn fill_default(obj: &mut Map<String, Value>, key: &str, default: Value) {
    if !obj.contains_key(key) || obj[key].is_null() {
        obj.insert(key.to_string(), default);
    }
}

impl Migration for V1ToV2Migration {
    fn source_version(&self) -> u32 {
        1
    }

    fn target_version(&self) -> u32 {
        2
    }

    fn migrate(&self, value: Value) -> Result<Value, String> {
        // Some v1 saves already nested the state under "data"
        let data = match value.get("data") {
            Some(nested) => nested.clone(),
            None => value,
        };
        let Value::Object(mut obj) = data else {
            return Err("Legacy saved state is not an object".to_string());
        };

        fill_default(&mut obj, "trains", json!([]));

        let derived_next_id = obj
            .get("trains")
            .and_then(Value::as_array)
            .map_or(1, |trains| {
                trains
                    .iter()
                    .filter_map(|t| t.get("id").and_then(Value::as_u64))
                    .max()
                    .map_or(1, |m| m + 1)
            });
        fill_default(&mut obj, "nextTrainId", json!(derived_next_id));
        fill_default(&mut obj, "currentStartHour", json!(6));
        fill_default(&mut obj, "viewHours", json!(12));
        fill_default(&mut obj, "actionHistory", json!([]));
        fill_default(&mut obj, "historyPointer", json!(-1));

        Ok(json!({
            "version": 2,
            "timestamp": Value::Null,
            "data": Value::Object(obj),
        }))
    }
}
