use gitbattle_protocol::Stats;

use super::random::RandomSource;

/// No hit ever deals less than this (before crits)
pub const MIN_DAMAGE: u32 = 5;

/// Defense can absorb at most this share of the base damage
const MAX_BLOCK_SHARE: f64 = 0.40;

const BASE_CRIT_CHANCE: f64 = 0.05;
const CRIT_PER_SPEED: f64 = 0.01;
const MAX_CRIT_CHANCE: f64 = 0.50;
const CRIT_MULTIPLIER: f64 = 1.5;

/// Outcome of a single rolled hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hit {
    pub damage: u32,
    pub crit: bool,
}

impl Hit {
    /// " CRIT!" suffix for log lines
    pub fn crit_suffix(&self) -> &'static str {
        if self.crit { " CRIT!" } else { "" }
    }
}

/// Crit chance grows with the attacker's speed advantage, capped at 50%.
pub fn crit_chance(attacker: &Stats, defender: &Stats) -> f64 {
    let advantage = attacker.speed.saturating_sub(defender.speed) as f64;
    (BASE_CRIT_CHANCE + advantage * CRIT_PER_SPEED).clamp(0.0, MAX_CRIT_CHANCE)
}

/// Roll one hit of `attacker` against `defender`.
///
/// Takes exactly two draws: variance first, then the crit roll.
pub fn roll_hit<R: RandomSource + ?Sized>(
    attacker: &Stats,
    defender: &Stats,
    multiplier: f64,
    rng: &mut R,
) -> Hit {
    let base = attacker.attack as f64 * 1.8 + 5.0;
    let block = (defender.defense as f64).min(base * MAX_BLOCK_SHARE);

    let mut raw = base - block;
    raw *= rng.uniform(0.9, 1.1);
    raw *= multiplier;

    let mut damage = (raw.floor() as u32).max(MIN_DAMAGE);

    let crit = rng.next_f64() < crit_chance(attacker, defender);
    if crit {
        damage = (damage as f64 * CRIT_MULTIPLIER).floor() as u32;
    }

    Hit { damage, crit }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::random::SequenceRandom;

    fn stats(attack: u32, defense: u32, speed: u32) -> Stats {
        Stats {
            hp: 100,
            attack,
            defense,
            speed,
        }
    }

    #[test]
    fn test_basic_hit() {
        let attacker = stats(20, 5, 20);
        let defender = stats(10, 10, 10);
        let mut rng = SequenceRandom::new(vec![0.75, 0.9]);

        let hit = roll_hit(&attacker, &defender, 1.0, &mut rng);

        // base = 20 * 1.8 + 5 = 41, block = 10, 31 * 1.05 = 32.55
        assert_eq!(hit, Hit { damage: 32, crit: false });
        assert_eq!(rng.draws(), 2);
    }

    #[test]
    fn test_crit_hit() {
        let attacker = stats(20, 5, 20);
        let defender = stats(10, 10, 10);
        let mut rng = SequenceRandom::new(vec![0.75, 0.1]);

        let hit = roll_hit(&attacker, &defender, 1.0, &mut rng);

        // crit chance = 0.05 + 10 * 0.01 = 0.15
        assert_eq!(hit, Hit { damage: 48, crit: true });
        assert_eq!(hit.crit_suffix(), " CRIT!");
    }

    #[test]
    fn test_damage_floor() {
        let attacker = stats(1, 5, 10);
        let defender = stats(10, 500, 10);
        let mut rng = SequenceRandom::new(vec![0.0, 0.99]);

        let hit = roll_hit(&attacker, &defender, 0.6, &mut rng);
        assert_eq!(hit.damage, MIN_DAMAGE);
        assert!(!hit.crit);
    }

    #[test]
    fn test_floored_hit_can_still_crit() {
        let attacker = stats(1, 5, 10);
        let defender = stats(10, 500, 10);
        let mut rng = SequenceRandom::new(vec![0.0, 0.0]);

        let hit = roll_hit(&attacker, &defender, 0.6, &mut rng);
        assert_eq!(hit, Hit { damage: 7, crit: true });
    }

    #[test]
    fn test_damage_never_below_floor() {
        for attack in [0, 1, 5, 50, 200] {
            for defense in [0, 10, 1000] {
                for multiplier in [0.6, 1.0, 1.2, 1.5] {
                    for draw in [0.0, 0.5, 0.999] {
                        let mut rng = SequenceRandom::constant(draw);
                        let hit =
                            roll_hit(&stats(attack, 5, 10), &stats(10, defense, 30), multiplier, &mut rng);
                        assert!(
                            hit.damage >= MIN_DAMAGE,
                            "atk {attack} def {defense} x{multiplier} draw {draw}: {}",
                            hit.damage
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_block_is_capped() {
        let attacker = stats(50, 5, 10);

        // base = 95, so any defense above 38 blocks the same amount
        let against_cap = roll_hit(&attacker, &stats(10, 38, 10), 1.0, &mut SequenceRandom::new(vec![0.75, 0.99]));
        let against_wall = roll_hit(&attacker, &stats(10, 1000, 10), 1.0, &mut SequenceRandom::new(vec![0.75, 0.99]));

        assert_eq!(against_cap, against_wall);
    }

    #[test]
    fn test_crit_chance() {
        assert_eq!(crit_chance(&stats(1, 1, 10), &stats(1, 1, 10)), 0.05);
        assert_eq!(crit_chance(&stats(1, 1, 5), &stats(1, 1, 40)), 0.05);
        assert!((crit_chance(&stats(1, 1, 20), &stats(1, 1, 10)) - 0.15).abs() < 1e-9);
        assert_eq!(crit_chance(&stats(1, 1, 200), &stats(1, 1, 10)), 0.50);
    }
}
