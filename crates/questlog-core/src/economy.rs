//! Static economy tables.
//!
//! Maps (pillar, difficulty) to energy cost and XP reward, and holds the
//! level curve, recovery rate and reward constants. Difficulty multipliers
//! are kept in tenths so every derived value is computed with exact integer
//! arithmetic.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Energy capacity of a fresh character.
pub const MAX_ENERGY: u32 = 100;
/// XP needed to leave level 1.
pub const BASE_XP_PER_LEVEL: u32 = 300;
/// Growth factor of the level curve.
pub const XP_SCALING_FACTOR: f64 = 1.25;
/// Energy units regenerated per hour.
pub const ENERGY_RECOVERY_RATE: u32 = 8;
/// Share of a missed task's XP reward taken as penalty.
pub const XP_PENALTY_PERCENT: u32 = 30;
/// Cap on XP lost in one reconciliation pass, as a share of current XP.
pub const MAX_DAILY_XP_LOSS_PERCENT: u32 = 15;
pub const CRITICAL_HIT_CHANCE: f64 = 0.1;
pub const CRITICAL_HIT_MULTIPLIER_PERCENT: u32 = 150;
/// Energy refunded on a critical hit.
pub const CRITICAL_ENERGY_REFUND: u32 = 5;
pub const ENERGY_PER_QURAN_PAGE: u32 = 3;
/// Weekly challenge bonus, as a share of the current level's max XP.
pub const WEEKLY_CHALLENGE_BONUS_PERCENT: u32 = 25;
/// Daily quest bonus, as a share of the current level's max XP.
pub const DAILY_QUEST_BONUS_PERCENT: u32 = 15;
/// Attribute gain per completed task at multiplier 1.0.
pub const ATTRIBUTE_GAIN_PER_TASK: f64 = 0.5;

/// Life domain a task belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pillar {
    Learning,
    Studying,
    Exercise,
    Work,
    Entertainment,
    Quran,
}

/// Base (D-rank) rates of a pillar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseRate {
    /// Energy spent; negative values regenerate energy.
    pub energy: i32,
    pub xp: u32,
}

impl Pillar {
    /// Fixed iteration order. Ties in best/worst pillar selection resolve
    /// to the earlier entry.
    pub const ALL: [Pillar; 6] = [
        Pillar::Learning,
        Pillar::Studying,
        Pillar::Exercise,
        Pillar::Work,
        Pillar::Entertainment,
        Pillar::Quran,
    ];

    pub fn base_rate(self) -> BaseRate {
        match self {
            Pillar::Learning => BaseRate { energy: 8, xp: 15 },
            Pillar::Studying => BaseRate { energy: 10, xp: 18 },
            Pillar::Exercise => BaseRate { energy: 12, xp: 25 },
            Pillar::Work => BaseRate { energy: 10, xp: 20 },
            Pillar::Entertainment => BaseRate { energy: -5, xp: 5 },
            Pillar::Quran => BaseRate { energy: -2, xp: 0 },
        }
    }

    /// Pillars with negative base energy give energy back instead of spending it.
    pub fn is_regenerative(self) -> bool {
        self.base_rate().energy < 0
    }

    pub fn name(self) -> &'static str {
        match self {
            Pillar::Learning => "Learning",
            Pillar::Studying => "Studying",
            Pillar::Exercise => "Exercise",
            Pillar::Work => "Work",
            Pillar::Entertainment => "Entertainment",
            Pillar::Quran => "Quran",
        }
    }
}

impl fmt::Display for Pillar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pillar {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Pillar::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                format!(
                    "Invalid pillar: '{s}'. Use learning/studying/exercise/work/entertainment/quran"
                )
            })
    }
}

/// Difficulty tier, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    E,
    D,
    C,
    B,
    A,
    S,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::D
    }
}

impl Difficulty {
    pub const ALL: [Difficulty; 6] = [
        Difficulty::E,
        Difficulty::D,
        Difficulty::C,
        Difficulty::B,
        Difficulty::A,
        Difficulty::S,
    ];

    /// Reward/cost multiplier in tenths (D = 10 = 1.0x).
    pub fn multiplier_tenths(self) -> u32 {
        match self {
            Difficulty::E => 8,
            Difficulty::D => 10,
            Difficulty::C => 15,
            Difficulty::B => 22,
            Difficulty::A => 35,
            Difficulty::S => 50,
        }
    }

    pub fn multiplier(self) -> f64 {
        f64::from(self.multiplier_tenths()) / 10.0
    }

    /// B, A and S count as hard tasks.
    pub fn is_hard(self) -> bool {
        self >= Difficulty::B
    }

    pub fn label(self) -> &'static str {
        match self {
            Difficulty::E => "E-Rank (Easy)",
            Difficulty::D => "D-Rank (Normal)",
            Difficulty::C => "C-Rank (Hard)",
            Difficulty::B => "B-Rank (Expert)",
            Difficulty::A => "A-Rank (Master)",
            Difficulty::S => "S-Rank (Hell)",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Difficulty::E => "E",
            Difficulty::D => "D",
            Difficulty::C => "C",
            Difficulty::B => "B",
            Difficulty::A => "A",
            Difficulty::S => "S",
        };
        f.write_str(s)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "E" => Ok(Difficulty::E),
            "D" => Ok(Difficulty::D),
            "C" => Ok(Difficulty::C),
            "B" => Ok(Difficulty::B),
            "A" => Ok(Difficulty::A),
            "S" => Ok(Difficulty::S),
            _ => Err(format!("Invalid difficulty: '{s}'. Use E/D/C/B/A/S")),
        }
    }
}

/// Percent adjustments applied at completion time (100 = unchanged).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeModifier {
    pub xp_percent: u32,
    pub energy_percent: u32,
}

impl TimeModifier {
    pub const NEUTRAL: TimeModifier = TimeModifier {
        xp_percent: 100,
        energy_percent: 100,
    };
}

impl Default for TimeModifier {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Energy cost and XP reward of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskEconomy {
    pub energy_cost: i32,
    pub xp_reward: u32,
}

/// Stored economy of a (pillar, difficulty) pair: `ceil(base * multiplier)`.
pub fn task_economy(pillar: Pillar, difficulty: Difficulty) -> TaskEconomy {
    let base = pillar.base_rate();
    let tenths = i64::from(difficulty.multiplier_tenths());
    TaskEconomy {
        energy_cost: ceil_div(i64::from(base.energy) * tenths, 10) as i32,
        xp_reward: ceil_div(i64::from(base.xp) * tenths, 10) as u32,
    }
}

/// Economy at completion time with a time-of-day modifier applied.
///
/// Regenerative pillars keep their stored (unmodified) energy value.
pub fn modified_economy(
    pillar: Pillar,
    difficulty: Difficulty,
    modifier: TimeModifier,
) -> TaskEconomy {
    let base = pillar.base_rate();
    let tenths = i64::from(difficulty.multiplier_tenths());

    let energy_cost = if pillar.is_regenerative() {
        task_economy(pillar, difficulty).energy_cost
    } else {
        ceil_div(
            i64::from(base.energy) * tenths * i64::from(modifier.energy_percent),
            1000,
        ) as i32
    };
    let xp_reward = ceil_div(
        i64::from(base.xp) * tenths * i64::from(modifier.xp_percent),
        1000,
    ) as u32;

    TaskEconomy {
        energy_cost,
        xp_reward,
    }
}

/// Ceiling of `numerator / denominator` for a positive denominator.
pub fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    let quotient = numerator.div_euclid(denominator);
    if numerator.rem_euclid(denominator) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

/// `floor(value * percent / 100)` without intermediate floats.
pub fn percent_of(value: u32, percent: u32) -> u32 {
    (u64::from(value) * u64::from(percent) / 100) as u32
}

/// A recovery task injected while energy is critically low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShadowQuest {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub energy_restore: u32,
}

/// Catalogue the shadow reaction draws from.
pub const SHADOW_QUESTS: [ShadowQuest; 6] = [
    ShadowQuest {
        id: "shadow_nap",
        title: "Power nap",
        description: "Lie down for twenty minutes.",
        energy_restore: 30,
    },
    ShadowQuest {
        id: "shadow_hydrate",
        title: "Hydrate",
        description: "Drink a full glass of water.",
        energy_restore: 15,
    },
    ShadowQuest {
        id: "shadow_reset",
        title: "Desk reset",
        description: "Step away and tidy your space for five minutes.",
        energy_restore: 10,
    },
    ShadowQuest {
        id: "shadow_breath",
        title: "Box breathing",
        description: "Four rounds of 4-4-4-4 breathing.",
        energy_restore: 20,
    },
    ShadowQuest {
        id: "shadow_mob",
        title: "Mobility break",
        description: "Stretch hips, back and shoulders.",
        energy_restore: 25,
    },
    ShadowQuest {
        id: "shadow_med",
        title: "Short meditation",
        description: "Sit quietly for ten minutes.",
        energy_restore: 15,
    },
];

/// Daily quest targets.
pub const DAILY_QUEST_PUSHUPS: u32 = 100;
pub const DAILY_QUEST_SITUPS: u32 = 100;
pub const DAILY_QUEST_SQUATS: u32 = 100;
/// Kilometres.
pub const DAILY_QUEST_RUN_KM: u32 = 10;
