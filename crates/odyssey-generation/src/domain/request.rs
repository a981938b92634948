//! Generation parameters supplied by the caller.

use odyssey_core::adventure::AdventureLimits;
use odyssey_core::error::GenerationError;

/// Structured parameters for one adventure generation.
///
/// Integer fields are signed so that out-of-range input (for example a
/// negative scene count) reaches [`GenerationRequest::validate`] and is
/// reported as `InvalidRequest` instead of failing deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    /// Name of the roleplaying ruleset.
    pub game: String,
    /// Party size.
    pub players: i64,
    /// Number of scenes in the rising action.
    pub scene_count: i64,
    /// Inclusive upper bound on encounters per scene.
    pub max_encounters_per_scene: i64,
    /// Chance, per scene, that a plot twist is present.
    pub plot_twist_percent: i64,
    /// Chance, per scene, that a clue is present.
    pub clue_percent: i64,
    /// Description of a custom ruleset.
    pub homebrew_description: Option<String>,
    /// Published or homebrew campaign setting.
    pub campaign_setting: Option<String>,
    /// Character level of the party.
    pub level: Option<String>,
    /// Experience points of the party.
    pub experience: Option<String>,
    /// Trailing instruction, e.g. a request to continue a previous adventure.
    pub context: Option<String>,
}

impl GenerationRequest {
    /// Checks every required parameter.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidRequest` naming the first field that
    /// is blank or out of range.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if self.game.trim().is_empty() {
            return Err(GenerationError::InvalidRequest(
                "game must not be blank".to_owned(),
            ));
        }
        at_least_one("players", self.players)?;
        at_least_one("scene_count", self.scene_count)?;
        at_least_one("max_encounters_per_scene", self.max_encounters_per_scene)?;
        percentage("plot_twist_percent", self.plot_twist_percent)?;
        percentage("clue_percent", self.clue_percent)?;
        Ok(())
    }

    /// Percentage of scenes whose plot twist should be null.
    #[must_use]
    pub fn null_plot_twist_percent(&self) -> i64 {
        100 - self.plot_twist_percent
    }

    /// Percentage of scenes whose clue should be null.
    #[must_use]
    pub fn null_clue_percent(&self) -> i64 {
        100 - self.clue_percent
    }

    /// Validates the request and derives the limits a generated adventure
    /// must satisfy.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidRequest` if validation fails.
    pub fn limits(&self, exposition_max_chars: usize) -> Result<AdventureLimits, GenerationError> {
        self.validate()?;
        Ok(AdventureLimits {
            exposition_max_chars,
            scene_count: to_usize("scene_count", self.scene_count)?,
            max_encounters_per_scene: to_usize(
                "max_encounters_per_scene",
                self.max_encounters_per_scene,
            )?,
        })
    }
}

/// Returns the trimmed value of an optional field, or `None` when it is
/// absent or blank.
pub(crate) fn non_blank(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

fn at_least_one(name: &str, value: i64) -> Result<(), GenerationError> {
    if value < 1 {
        return Err(GenerationError::InvalidRequest(format!(
            "{name} must be at least 1, got {value}"
        )));
    }
    Ok(())
}

fn percentage(name: &str, value: i64) -> Result<(), GenerationError> {
    if !(0..=100).contains(&value) {
        return Err(GenerationError::InvalidRequest(format!(
            "{name} must be between 0 and 100, got {value}"
        )));
    }
    Ok(())
}

fn to_usize(name: &str, value: i64) -> Result<usize, GenerationError> {
    let Ok(converted) = usize::try_from(value) else {
        return Err(GenerationError::InvalidRequest(format!(
            "{name} is out of range: {value}"
        )));
    };
    Ok(converted)
}
