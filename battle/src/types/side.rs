//! Per-side battle state

/// One of the two fighters, from the local participant's perspective
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Side {
    Player,
    Opponent,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Player => Side::Opponent,
            Side::Opponent => Side::Player,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Player => "player",
            Side::Opponent => "opponent",
        }
    }
}

/// HP and ability bookkeeping for one side
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SideState {
    /// Current HP, always within `0..=max_hp`
    pub hp: u32,

    pub max_hp: u32,

    /// Heals spent this battle
    pub heals_used: u32,

    /// Remaining resolved turns before heal can be used again
    pub heal_cooldown: u32,

    /// Remaining resolved turns before the special can be used again
    pub special_cooldown: u32,
}

impl SideState {
    /// Full HP, nothing used, nothing on cooldown
    pub fn new(max_hp: u32) -> Self {
        Self {
            hp: max_hp,
            max_hp,
            heals_used: 0,
            heal_cooldown: 0,
            special_cooldown: 0,
        }
    }

    pub fn is_knocked_out(&self) -> bool {
        self.hp == 0
    }

    /// Current HP as a fraction of max (0.0 when max is 0)
    pub fn hp_fraction(&self) -> f64 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f64 / self.max_hp as f64
    }

    /// Whether heal is off cooldown and, if capped, not exhausted
    pub fn heal_ready(&self, cap: Option<u32>) -> bool {
        self.heal_cooldown == 0 && cap.is_none_or(|cap| self.heals_used < cap)
    }

    /// Remove HP (floored at 0), returns the HP actually lost
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Add HP (capped at max), returns the HP actually gained
    pub fn restore(&mut self, amount: u32) -> u32 {
        let gained = amount.min(self.max_hp.saturating_sub(self.hp));
        self.hp += gained;
        gained
    }

    /// Decrement both cooldowns once, floored at 0
    pub fn tick_cooldowns(&mut self) {
        self.heal_cooldown = self.heal_cooldown.saturating_sub(1);
        self.special_cooldown = self.special_cooldown.saturating_sub(1);
    }
}
