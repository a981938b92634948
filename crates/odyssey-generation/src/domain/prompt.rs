//! Prompt construction.
//!
//! Pure functions only: the same request and wire format always produce the
//! same prompt.

use std::fmt::Write;

use odyssey_core::wire::WireFormat;

use super::request::{GenerationRequest, non_blank};

/// Exposition length the prompt asks for. Kept below the validation cap so
/// that a model overshooting slightly is still accepted.
pub const PROMPT_EXPOSITION_CHARS: usize = 400;

const CLUE_EXAMPLES: &str = "Each clue should be related to the scene's setting or an encounter. \
EXAMPLE 1: challenge: track down a bad guy. setting: the bad guy's office with a computer. \
clue: The computer shows the bad guy's calendar, which has an appointment tomorrow at 9:00 a.m. in a nearby park. \
EXAMPLE 2: challenge: deactivate the security cameras in the starbase. setting: the security chief's office. \
encounters: [enemy: the security chief]. \
clue: If subdued and interrogated, the security chief can provide the access code to deactivate the security cameras. \
EXAMPLE 3: encounters: [enemies: 2 bugbears, trap: swinging log trap]. \
clue: the bugbears know how to disarm the swinging log trap.";

/// Builds the generation prompt for `request`, naming output keys the way
/// `format` spells them.
///
/// Assumes `request` has been validated.
#[must_use]
pub fn build_prompt(request: &GenerationRequest, format: WireFormat) -> String {
    let game = request.game.trim();
    let mut prompt = format!("Write an adventure for the {game} roleplaying game, ");

    if let Some(setting) = non_blank(request.campaign_setting.as_ref()) {
        let _ = write!(prompt, "{setting} campaign setting, ");
    }
    let _ = write!(prompt, "for {} players.", request.players);

    if let Some(level) = non_blank(request.level.as_ref()) {
        let _ = write!(
            prompt,
            " The players are level {level}. The difficulty of the adventure should be \
             appropriate to the number of players and their level."
        );
    }

    if let Some(experience) = non_blank(request.experience.as_ref()) {
        let _ = write!(
            prompt,
            " The players have {experience} experience points. The difficulty of the adventure \
             should be appropriate to the number of players and their experience."
        );
    }

    if let Some(homebrew) = non_blank(request.homebrew_description.as_ref()) {
        let _ = write!(
            prompt,
            " The following is a description of {game}, a homebrew roleplaying game:\n{homebrew}\n"
        );
    }

    prompt.push(' ');
    prompt.push_str(&structural_instructions(request, format));

    if let Some(context) = non_blank(request.context.as_ref()) {
        prompt.push('\n');
        prompt.push_str(context);
    }

    prompt
}

/// The fixed part of the prompt: scene count, output schema, null rates,
/// and clue examples.
fn structural_instructions(request: &GenerationRequest, format: WireFormat) -> String {
    let keys = format.keys();
    let scenes = request.scene_count;
    let max_encounters = request.max_encounters_per_scene;
    let null_plot_twists = request.null_plot_twist_percent();
    let null_clues = request.null_clue_percent();

    format!(
        r#"The rising action should include {scenes} scenes. Each encounter is a trap, enemies, a puzzle (in which case, describe the solution), or some other obstacle. Respond in JSON using the following format:
{{
    "{exposition}": "Background knowledge the players might possess, if any, or prologue. Use up to {PROMPT_EXPOSITION_CHARS} characters for the exposition.",
    "{incitement}": "The event that directly involves the players and starts the adventure",
    "{rising_action}": [{{
        "challenge": "something the players must accomplish to get one step closer to their goal",
        "setting": "where the scene takes place, which should be more specific than the name of a city",
        "encounters": [
            {{
                "type": "trap, enemy, puzzle, or a combination",
                "description": "something or someone that stands in their way, which could be a trap, a puzzle, an enemy or enemies, or a combination thereof",
                "stats": "game statistics for the encounter, or null"
            }}
        ],
        "plot_twist": "An event or discovery that changes something the players believed to be true, or null",
        "clue": "a hint about what the players should do next or information that brings the players closer to completing the overall adventure, or null"
    }}],
    "{climax}": "The final and most difficult scene, occurring after the last scene in the {rising_action}, that determines whether the players complete the adventure. The {climax} is not just the last scene in the {rising_action}. Although this value is a string, it should include descriptions of a setting, challenge (objective), and a single encounter",
    "{denouement}": "Epilogue or rewards the players can expect if successful"
}}

Each scene has a challenge and an array of encounters. Each array of encounters includes a different random number of encounters, between 1 and {max_encounters} (inclusive). Also, {null_plot_twists}% of plot twists are null and {null_clues}% of clues are null. For example, one scene may have 3 encounters, a plot twist, and a null clue. Another scene may have 1 encounter, a null plot twist, and a clue.

{CLUE_EXAMPLES}"#,
        exposition = keys.exposition,
        incitement = keys.incitement,
        rising_action = keys.rising_action,
        climax = keys.climax,
        denouement = keys.denouement,
    )
}
