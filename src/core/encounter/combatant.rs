//! Combatant state.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::content::ContentItem;

use super::dice::DiceExpression;
use super::error::{EncounterError, Result};

/// Which side of the encounter a combatant fights on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Party,
    Opponents,
}

impl Side {
    pub fn opposing(&self) -> Side {
        match self {
            Side::Party => Side::Opponents,
            Side::Opponents => Side::Party,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Party => "party",
            Side::Opponents => "opponents",
        }
    }
}

/// Status markers carried by a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFlag {
    /// At zero hp, eligible for stabilization (downed-state rule).
    Downed,
    /// Stabilized while downed; out of the fight but safe.
    Stable,
    /// Removed by the instant-death rule.
    Dead,
    /// Successfully fled; absent for all further resolution.
    Fled,
}

/// One combatant inside a single encounter run.
///
/// Owned by the engine; mutable only within that run and never shared
/// across concurrent encounters. `hp` is clamped at zero.
#[derive(Debug, Clone, Serialize)]
pub struct Combatant {
    /// Canonical content ref for stat-block combatants, or the party
    /// member's slug.
    pub ref_id: String,
    /// Display name used as the event actor.
    pub name: String,
    pub side: Side,
    pub hp: i64,
    pub max_hp: i64,
    pub ac: i64,
    pub attack_bonus: i64,
    /// Damage dice rolled on a hit.
    pub damage: DiceExpression,
    /// Healing dice, when this combatant can heal.
    pub heal: Option<DiceExpression>,
    /// Remaining self-heals.
    pub heals_left: u32,
    pub status: BTreeSet<StatusFlag>,
}

impl Combatant {
    /// Build a combatant from a content stat block.
    ///
    /// # Errors
    ///
    /// [`EncounterError::InvalidEncounter`] when `hp` or `damage` are
    /// missing; [`EncounterError::InvalidDiceExpression`] on malformed
    /// damage dice.
    pub fn from_item(item: &ContentItem, side: Side, name: String) -> Result<Self> {
        let hp = item.hp().ok_or_else(|| EncounterError::InvalidEncounter {
            reason: format!("stat block {} has no hp", item.id),
        })?;
        let damage_expr = item.damage().ok_or_else(|| EncounterError::InvalidEncounter {
            reason: format!("stat block {} has no damage dice", item.id),
        })?;
        Ok(Self {
            ref_id: item.id.clone(),
            name,
            side,
            hp,
            max_hp: hp,
            ac: item.ac().unwrap_or(10),
            attack_bonus: item.attack_bonus().unwrap_or(0),
            damage: DiceExpression::parse(damage_expr)?,
            heal: None,
            heals_left: 0,
            status: BTreeSet::new(),
        })
    }

    pub fn has(&self, flag: StatusFlag) -> bool {
        self.status.contains(&flag)
    }

    /// Standing combatants keep their side in the fight.
    pub fn is_standing(&self) -> bool {
        self.hp > 0 && !self.has(StatusFlag::Fled)
    }

    /// Active combatants take turns and can be targeted.
    pub fn is_active(&self) -> bool {
        self.is_standing() && !self.has(StatusFlag::Dead)
    }

    /// Downed and not yet stabilized.
    pub fn needs_stabilizing(&self) -> bool {
        self.has(StatusFlag::Downed) && !self.has(StatusFlag::Stable) && !self.has(StatusFlag::Dead)
    }

    /// Apply damage, clamping hp at zero. On the transition to zero the
    /// instant-death rule is evaluated (never cached) and the resulting
    /// flag is returned.
    pub fn apply_damage(&mut self, amount: i64, instant_death: bool) -> Option<StatusFlag> {
        let was_up = self.hp > 0;
        self.hp = (self.hp - amount).max(0);
        if was_up && self.hp == 0 {
            let flag = if instant_death {
                StatusFlag::Dead
            } else {
                StatusFlag::Downed
            };
            self.status.insert(flag);
            Some(flag)
        } else {
            None
        }
    }

    /// Heal up to `max_hp`; returns the hp actually restored.
    pub fn apply_healing(&mut self, amount: i64) -> i64 {
        let healed = amount.min(self.max_hp - self.hp);
        self.hp += healed;
        healed
    }
}

/// A player-character definition supplied to encounter setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerCharacter {
    pub name: String,
    pub hp: i64,
    pub ac: i64,
    pub attack: i64,
    /// Damage dice notation.
    pub damage: String,
    /// Healing dice notation, if the character carries healing.
    pub heal: Option<String>,
    /// Number of self-heals available.
    pub heals: u32,
}

impl Default for PlayerCharacter {
    fn default() -> Self {
        Self {
            name: "Hero".to_string(),
            hp: 20,
            ac: 14,
            attack: 4,
            damage: "1d8+2".to_string(),
            heal: Some("1d4+2".to_string()),
            heals: 2,
        }
    }
}

impl PlayerCharacter {
    /// Build the party-side combatant for this character.
    pub fn to_combatant(&self) -> Result<Combatant> {
        let slug = self.name.to_lowercase().split_whitespace().collect::<Vec<_>>().join("-");
        let heal = match &self.heal {
            Some(expr) => Some(DiceExpression::parse(expr)?),
            None => None,
        };
        Ok(Combatant {
            ref_id: slug,
            name: self.name.clone(),
            side: Side::Party,
            hp: self.hp,
            max_hp: self.hp,
            ac: self.ac,
            attack_bonus: self.attack,
            damage: DiceExpression::parse(&self.damage)?,
            heal,
            heals_left: self.heals,
            status: BTreeSet::new(),
        })
    }
}
