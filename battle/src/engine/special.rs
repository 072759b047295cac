//! Class-dependent special abilities

use gitbattle_protocol::{Character, ClassTag};

use super::damage::{Hit, roll_hit};
use super::random::RandomSource;

const TWIN_HIT_MULTIPLIER: f64 = 0.6;
const BLAST_MULTIPLIER: f64 = 1.5;
const RECOIL_FRACTION: f64 = 0.10;
const SHIELD_SELF_HEAL: u32 = 10;
const SMASH_MULTIPLIER: f64 = 1.2;

/// Display name of a class's special ability
pub fn special_name(class: ClassTag) -> &'static str {
    match class {
        ClassTag::FrontendWarrior => "PIXEL SLASH",
        ClassTag::BackendMage => "DDOS BLAST",
        ClassTag::DevOpsPaladin => "CONTAINER SHIELD",
        ClassTag::FullStackSorcerer | ClassTag::Novice => "HELLO WORLD SMASH",
    }
}

/// What a special does before it is applied to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpecialEffect {
    /// Hits against the defender, in order
    pub hits: Vec<Hit>,
    /// HP restored to the caster
    pub self_heal: u32,
    /// Damage the caster deals to itself
    pub recoil: u32,
}

impl SpecialEffect {
    pub fn total_damage(&self) -> u32 {
        self.hits.iter().map(|hit| hit.damage).sum()
    }
}

/// Roll the caster's special against the defender
pub(crate) fn roll_special<R: RandomSource + ?Sized>(
    caster: &Character,
    defender: &Character,
    rng: &mut R,
) -> SpecialEffect {
    let (attacker, target) = (&caster.stats, &defender.stats);

    match caster.class_tag {
        ClassTag::FrontendWarrior => SpecialEffect {
            hits: vec![
                roll_hit(attacker, target, TWIN_HIT_MULTIPLIER, rng),
                roll_hit(attacker, target, TWIN_HIT_MULTIPLIER, rng),
            ],
            self_heal: 0,
            recoil: 0,
        },
        ClassTag::BackendMage => SpecialEffect {
            hits: vec![roll_hit(attacker, target, BLAST_MULTIPLIER, rng)],
            self_heal: 0,
            recoil: (caster.stats.hp as f64 * RECOIL_FRACTION).floor() as u32,
        },
        ClassTag::DevOpsPaladin => SpecialEffect {
            hits: vec![roll_hit(attacker, target, 1.0, rng)],
            self_heal: SHIELD_SELF_HEAL,
            recoil: 0,
        },
        ClassTag::FullStackSorcerer | ClassTag::Novice => SpecialEffect {
            hits: vec![roll_hit(attacker, target, SMASH_MULTIPLIER, rng)],
            self_heal: 0,
            recoil: 0,
        },
    }
}
