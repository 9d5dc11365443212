//! Data-driven effect definition loading
//!
//! Effect definitions are declared in RON config files instead of hardcoded
//! in Rust, so balance changes don't require recompilation. Every definition
//! is validated at load time; the library hands out shared `Arc`s safe to
//! clone across many live instances.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use bevy::prelude::Resource;
use serde::Deserialize;

use crate::effect::definition::EffectDefinition;

/// Named, validated effect definitions loaded from a RON file.
#[derive(Debug, Default, Resource)]
pub struct EffectLibrary {
    definitions: HashMap<String, Arc<EffectDefinition>>,
}

/// On-disk shape of an effect definition file.
#[derive(Debug, Deserialize)]
struct EffectLibraryFile {
    effects: Vec<EffectDefinition>,
}

impl EffectLibrary {
    /// Load and validate a definition file.
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read effect definitions '{}': {}", path.display(), e))?;
        Self::load_from_str(&contents)
    }

    /// Parse and validate definitions from RON text.
    pub fn load_from_str(contents: &str) -> Result<Self, String> {
        let file: EffectLibraryFile =
            ron::from_str(contents).map_err(|e| format!("Failed to parse effect definitions: {}", e))?;

        let mut definitions = HashMap::new();
        for definition in file.effects {
            definition.validate()?;
            let name = definition.name.clone();
            if definitions.insert(name.clone(), Arc::new(definition)).is_some() {
                return Err(format!("Duplicate effect definition: '{}'", name));
            }
        }
        Ok(Self { definitions })
    }

    pub fn get(&self, name: &str) -> Option<&Arc<EffectDefinition>> {
        self.definitions.get(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }
}
