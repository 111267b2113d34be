//! Keybinding persistence and conflict detection.
//!
//! [`InputMap`] round-trips through `input.ron` next to the viewer config.
//! Loading never fails: a missing or malformed file yields the defaults.

use crate::action_map::{Action, InputBinding, InputMap};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

/// Errors from saving a keybinding file.
#[derive(Debug, thiserror::Error)]
pub enum BindingsError {
    #[error("failed to write keybindings: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize keybindings: {0}")]
    Serialize(#[from] ron::Error),
}

/// The same [`InputBinding`] used by more than one action.
#[derive(Debug, Clone)]
pub struct Conflict {
    pub binding: InputBinding,
    pub actions: Vec<Action>,
}

impl InputMap {
    /// Every binding shared by two or more actions (or listed twice for one).
    #[must_use]
    pub fn detect_conflicts(&self) -> Vec<Conflict> {
        let mut seen: HashMap<InputBinding, Vec<Action>> = HashMap::new();

        for (action, bindings) in &self.bindings {
            for binding in bindings {
                seen.entry(*binding).or_default().push(*action);
            }
        }

        seen.into_iter()
            .filter(|(_, actions)| actions.len() > 1)
            .map(|(binding, mut actions)| {
                actions.sort_by_key(|a| Action::ALL.iter().position(|x| x == a));
                Conflict { binding, actions }
            })
            .collect()
    }

    /// Write the map to `path` as RON, creating parent directories.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save(&self, path: &Path) -> Result<(), BindingsError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Load a map from `path`, falling back to [`InputMap::default`] with a
    /// warning if the file is missing or malformed. Actions the file leaves
    /// out keep their default bindings.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!(
                    "Could not read keybinding file {}: {e}; using defaults",
                    path.display()
                );
                return Self::default();
            }
        };
        match Self::from_ron(&contents) {
            Ok(loaded) => {
                let mut map = Self::default();
                map.bindings.extend(loaded.bindings);
                for conflict in map.detect_conflicts() {
                    warn!(
                        "Binding {:?} is shared by {:?}",
                        conflict.binding, conflict.actions
                    );
                }
                info!("Loaded keybindings from {}", path.display());
                map
            }
            Err(e) => {
                warn!(
                    "Malformed keybinding file {}: {e}; using defaults",
                    path.display()
                );
                Self::default()
            }
        }
    }
}
