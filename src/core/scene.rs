//! Scene serialization and deserialization
//!
//! Captures a world's transform forest (names, local transforms, parent and
//! child links, hidden flags) and rebuilds it. Supports RON (Rusty Object
//! Notation) and JSON files.

use std::fs;
use std::path::Path;

use hecs::Entity;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::ecs::{HierarchyError, Name, Transform, World};

/// A serializable hierarchy node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedEntity {
    /// Optional entity name
    pub name: Option<String>,
    /// Local transform
    #[serde(default)]
    pub transform: Transform,
    /// Parent entity index (if any)
    pub parent_index: Option<usize>,
    /// Child entity indices, in attach order
    #[serde(default)]
    pub children_indices: Vec<usize>,
    /// Hidden by a direct `hide`
    #[serde(default)]
    pub hidden: bool,
}

impl Default for SerializedEntity {
    fn default() -> Self {
        Self {
            name: None,
            transform: Transform::default(),
            parent_index: None,
            children_indices: Vec::new(),
            hidden: false,
        }
    }
}

/// A serializable scene containing one or more transform trees
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scene {
    /// Scene name
    pub name: String,
    /// Scene version for compatibility
    pub version: u32,
    /// All entities in the scene, each tree in pre-order
    pub entities: Vec<SerializedEntity>,
}

impl Scene {
    /// Create a new empty scene
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            entities: Vec::new(),
        }
    }

    /// Add an entity to the scene
    pub fn add_entity(&mut self, entity: SerializedEntity) -> usize {
        let index = self.entities.len();
        self.entities.push(entity);
        index
    }

    /// Capture every transform tree in `world`.
    #[must_use]
    pub fn from_world(world: &World, name: impl Into<String>) -> Self {
        let mut order = Vec::new();
        for root in world.roots() {
            world.traverse(root, |entity, _, _| {
                order.push(entity);
                true
            });
        }
        let index: FxHashMap<Entity, usize> =
            order.iter().enumerate().map(|(i, &e)| (e, i)).collect();

        let mut scene = Self::new(name);
        for &entity in &order {
            let Some(node) = world.node(entity) else {
                continue;
            };
            scene.add_entity(SerializedEntity {
                name: world.get::<Name>(entity).ok().map(|n| n.0.clone()),
                transform: *node.local(),
                parent_index: node.parent().and_then(|p| index.get(&p).copied()),
                children_indices: node
                    .children()
                    .iter()
                    .filter_map(|c| index.get(c).copied())
                    .collect(),
                hidden: node.is_hidden(),
            });
        }
        scene
    }

    /// Check that every index is in range and parent and child links agree.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidIndex`] or [`SceneError::Inconsistent`]
    pub fn validate(&self) -> Result<(), SceneError> {
        let len = self.entities.len();
        for (i, entity) in self.entities.iter().enumerate() {
            if let Some(parent) = entity.parent_index {
                if parent >= len {
                    return Err(SceneError::InvalidIndex { entity: i, index: parent });
                }
                if !self.entities[parent].children_indices.contains(&i) {
                    return Err(SceneError::Inconsistent(i));
                }
            }
            for &child in &entity.children_indices {
                if child >= len {
                    return Err(SceneError::InvalidIndex { entity: i, index: child });
                }
                if self.entities[child].parent_index != Some(i) {
                    return Err(SceneError::Inconsistent(child));
                }
            }
        }
        Ok(())
    }

    /// Spawn the scene's trees into `world`, returning the new entities in
    /// scene order. Nothing is left behind on failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the scene fails [`validate`](Self::validate) or its
    /// links form a cycle
    pub fn instantiate(&self, world: &mut World) -> Result<Vec<Entity>, SceneError> {
        self.validate()?;

        let spawned: Vec<Entity> = self
            .entities
            .iter()
            .enumerate()
            .map(|(i, e)| {
                let name = e.name.clone().unwrap_or_else(|| format!("entity{i}"));
                world.spawn_node(name, e.transform)
            })
            .collect();

        if let Err(error) = self.link(world, &spawned) {
            for &entity in &spawned {
                let _ = world.despawn(entity);
            }
            return Err(error);
        }

        log::debug!(
            "Instantiated scene '{}' with {} entities",
            self.name,
            spawned.len()
        );
        Ok(spawned)
    }

    fn link(&self, world: &mut World, spawned: &[Entity]) -> Result<(), SceneError> {
        for (i, entity) in self.entities.iter().enumerate() {
            for &child in &entity.children_indices {
                world.attach_child(spawned[i], spawned[child], false)?;
            }
        }
        for (i, entity) in self.entities.iter().enumerate() {
            if entity.hidden {
                world.hide(spawned[i])?;
            }
        }
        Ok(())
    }

    /// Save the scene to a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_ron(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let ron_string = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| SceneError::SerializeError(e.to_string()))?;
        fs::write(path, ron_string).map_err(|e| SceneError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scene from a RON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_ron(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::IoError(e.to_string()))?;
        let scene: Scene =
            ron::from_str(&content).map_err(|e| SceneError::DeserializeError(e.to_string()))?;
        Ok(scene)
    }

    /// Save the scene to a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or serialization fails
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), SceneError> {
        let json_string = serde_json::to_string_pretty(self)
            .map_err(|e| SceneError::SerializeError(e.to_string()))?;
        fs::write(path, json_string).map_err(|e| SceneError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Load a scene from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let content = fs::read_to_string(path).map_err(|e| SceneError::IoError(e.to_string()))?;
        let scene: Scene = serde_json::from_str(&content)
            .map_err(|e| SceneError::DeserializeError(e.to_string()))?;
        Ok(scene)
    }

    /// Load a scene, picking the format from the file extension (`.json`,
    /// anything else is read as RON)
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or deserialization fails
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::load_json(path),
            _ => Self::load_ron(path),
        }
    }

    /// Get the number of entities
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Check if the scene is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Errors that can occur during scene operations
#[derive(Debug, Clone)]
pub enum SceneError {
    /// IO error
    IoError(String),
    /// Serialization error
    SerializeError(String),
    /// Deserialization error
    DeserializeError(String),
    /// An entity refers to an index outside the scene
    InvalidIndex { entity: usize, index: usize },
    /// Parent and child links of an entity disagree
    Inconsistent(usize),
    /// The hierarchy refused a link
    Hierarchy(HierarchyError),
}

impl std::fmt::Display for SceneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::IoError(e) => write!(f, "IO error: {e}"),
            Self::SerializeError(e) => write!(f, "Serialization error: {e}"),
            Self::DeserializeError(e) => write!(f, "Deserialization error: {e}"),
            Self::InvalidIndex { entity, index } => {
                write!(f, "Entity {entity} refers to missing index {index}")
            }
            Self::Inconsistent(i) => write!(f, "Entity {i} has mismatched parent/child links"),
            Self::Hierarchy(e) => write!(f, "Hierarchy error: {e}"),
        }
    }
}

impl std::error::Error for SceneError {}

impl From<HierarchyError> for SceneError {
    fn from(e: HierarchyError) -> Self {
        Self::Hierarchy(e)
    }
}
