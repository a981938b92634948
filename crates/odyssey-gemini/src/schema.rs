//! Response schema for schema-enforced generation.
//!
//! Expressed in the `OpenAPI` subset Gemini accepts for `responseSchema`.
//! Top-level keys follow the configured wire format so that the decoded
//! output folds back onto the canonical model.

use odyssey_core::wire::WireFormat;
use serde_json::{Map, Value, json};

fn string(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn nullable_string(description: &str) -> Value {
    json!({ "type": "STRING", "description": description, "nullable": true })
}

fn encounter_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": string("trap, enemy, puzzle, or a combination"),
            "description": string("something or someone that stands in the players' way"),
            "stats": nullable_string("game statistics for the encounter"),
        },
        "required": ["type", "description"],
        "propertyOrdering": ["type", "description", "stats"],
    })
}

fn scene_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "challenge": string("what the players must accomplish in this scene"),
            "setting": string("where the scene takes place"),
            "plot_twist": nullable_string(
                "an event or discovery that changes something the players believed"
            ),
            "clue": nullable_string("a hint about what the players should do next"),
            "encounters": { "type": "ARRAY", "items": encounter_schema() },
        },
        "required": ["challenge", "setting", "encounters"],
        "propertyOrdering": ["challenge", "setting", "encounters", "plot_twist", "clue"],
    })
}

/// Builds the adventure response schema using `format`'s key spellings.
#[must_use]
pub fn response_schema(format: WireFormat) -> Value {
    let keys = format.keys();
    let order = [
        keys.exposition,
        keys.incitement,
        keys.rising_action,
        keys.climax,
        keys.denouement,
    ];

    let mut properties = Map::new();
    properties.insert(
        keys.exposition.to_owned(),
        string("background knowledge or prologue"),
    );
    properties.insert(
        keys.incitement.to_owned(),
        string("the event that starts the adventure"),
    );
    properties.insert(
        keys.rising_action.to_owned(),
        json!({ "type": "ARRAY", "items": scene_schema() }),
    );
    properties.insert(
        keys.climax.to_owned(),
        string("the final and most difficult scene"),
    );
    properties.insert(
        keys.denouement.to_owned(),
        string("epilogue or rewards"),
    );

    json!({
        "type": "OBJECT",
        "properties": properties,
        "required": order,
        "propertyOrdering": order,
    })
}
