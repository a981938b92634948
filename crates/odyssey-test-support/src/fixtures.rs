//! Ready-made adventure documents.

use odyssey_core::adventure::{Encounter, GeneratedAdventure, Scene};

/// Builds a valid adventure with `scenes` scenes of `encounters_per_scene`
/// encounters each. Plot twists appear on even scenes and clues on odd ones,
/// so both nullable fields are exercised.
#[must_use]
pub fn sample_adventure(scenes: usize, encounters_per_scene: usize) -> GeneratedAdventure {
    let rising_action = (1..=scenes)
        .map(|n| Scene {
            challenge: format!("Recover fragment {n} of the sunken map"),
            setting: format!("Chamber {n} of the drowned observatory"),
            plot_twist: (n % 2 == 0).then(|| format!("The guide forged fragment {n}")),
            clue: (n % 2 == 1).then(|| format!("Tide marks point to chamber {}", n + 1)),
            encounters: (1..=encounters_per_scene)
                .map(|e| Encounter {
                    kind: if e % 2 == 0 { "trap" } else { "enemy" }.to_owned(),
                    description: format!("Obstacle {e} guarding fragment {n}"),
                    stats: (e == 1).then(|| "AC 13, HP 22".to_owned()),
                })
                .collect(),
        })
        .collect();

    GeneratedAdventure {
        exposition: "The observatory sank beneath Lake Ostra a century ago.".to_owned(),
        incitement: "A dying cartographer hands the party a waterlogged letter.".to_owned(),
        rising_action,
        climax: "The drowned astronomer awakens in the flooded dome.".to_owned(),
        denouement: "The restored map reveals the way to the Sky Archive.".to_owned(),
    }
}
