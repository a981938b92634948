//! The generated adventure document and its constraints.
//!
//! Field names here are the canonical internal spelling. Backend- and
//! client-specific key spellings are handled in [`crate::wire`].

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Default cap on exposition length, in characters.
pub const DEFAULT_EXPOSITION_MAX_CHARS: usize = 500;

/// A single obstacle within a scene.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    /// Classification such as trap, enemy, puzzle, or a combination.
    #[serde(rename = "type")]
    pub kind: String,
    /// What stands in the players' way.
    pub description: String,
    /// Optional game statistics for the encounter.
    #[serde(default)]
    pub stats: Option<String>,
}

/// One scene of the rising action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    /// What the players must accomplish in this scene.
    pub challenge: String,
    /// Where the scene takes place.
    pub setting: String,
    /// An event or discovery that overturns something the players believed.
    #[serde(default)]
    pub plot_twist: Option<String>,
    /// A hint pointing the players toward their goal.
    #[serde(default)]
    pub clue: Option<String>,
    /// Encounters in narrative order.
    pub encounters: Vec<Encounter>,
}

/// A complete generated adventure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAdventure {
    /// Background knowledge or prologue.
    pub exposition: String,
    /// The event that pulls the players into the adventure.
    pub incitement: String,
    /// Scenes between the incitement and the climax, in narrative order.
    pub rising_action: Vec<Scene>,
    /// The final and most difficult scene.
    pub climax: String,
    /// Epilogue or rewards.
    pub denouement: String,
}

/// Constraints a generated adventure must satisfy to be accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdventureLimits {
    /// Exposition must be strictly shorter than this many characters.
    pub exposition_max_chars: usize,
    /// Exact number of scenes expected in the rising action.
    pub scene_count: usize,
    /// Inclusive upper bound on encounters per scene.
    pub max_encounters_per_scene: usize,
}

impl AdventureLimits {
    /// Validates `adventure` against these limits.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MalformedResponse` describing the first
    /// violated constraint.
    pub fn check(&self, adventure: &GeneratedAdventure) -> Result<(), GenerationError> {
        let exposition_len = adventure.exposition.chars().count();
        if exposition_len >= self.exposition_max_chars {
            return Err(GenerationError::MalformedResponse(format!(
                "exposition is {exposition_len} characters, must be less than {}",
                self.exposition_max_chars
            )));
        }

        if adventure.rising_action.len() != self.scene_count {
            return Err(GenerationError::MalformedResponse(format!(
                "expected {} scenes in the rising action, got {}",
                self.scene_count,
                adventure.rising_action.len()
            )));
        }

        for (index, scene) in adventure.rising_action.iter().enumerate() {
            let count = scene.encounters.len();
            if count == 0 || count > self.max_encounters_per_scene {
                return Err(GenerationError::MalformedResponse(format!(
                    "scene {} has {count} encounters, expected between 1 and {}",
                    index + 1,
                    self.max_encounters_per_scene
                )));
            }
        }

        Ok(())
    }
}
