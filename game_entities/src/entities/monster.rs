//! Monsters: hostile things that greet the player and drop rewards.

use attributed_core::{Inherits, Reflect, ScopeId, Signature};
use serde::{Deserialize, Serialize};

use super::Thing;

/// A [`Thing`] with an entry message and a list of reward scopes.
///
/// Rewards are references to scopes owned elsewhere in the tree; a monster
/// never owns its rewards.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub thing: Thing,
    pub entry_message: String,
    pub reward: Vec<ScopeId>,
}

impl Monster {
    pub const ENTRY_MESSAGE: &'static str = "EntryMessage";
    pub const REWARD: &'static str = "Reward";

    pub fn new(name: impl Into<String>, entry_message: impl Into<String>) -> Self {
        Self {
            thing: Thing::new(name),
            entry_message: entry_message.into(),
            reward: Vec::new(),
        }
    }

    pub fn add_reward(&mut self, reward: ScopeId) {
        if !self.reward.contains(&reward) {
            self.reward.push(reward);
        }
    }
}

impl Reflect for Monster {
    const TYPE_NAME: &'static str = "Monster";

    fn signatures() -> Vec<Signature> {
        vec![
            Signature::field(
                Self::ENTRY_MESSAGE,
                |m: &Monster| &m.entry_message,
                |m: &mut Monster| &mut m.entry_message,
            ),
            Signature::field(Self::REWARD, |m: &Monster| &m.reward, |m: &mut Monster| &mut m.reward),
        ]
    }
}

impl Inherits<Thing> for Monster {
    fn base(&self) -> &Thing {
        &self.thing
    }

    fn base_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attributed_core::{DatumType, ScopeArena};

    #[test]
    fn test_reward_is_variable_reference_table() {
        let signatures = Monster::signatures();
        let reward = &signatures[1];
        assert_eq!(reward.datum_type(), DatumType::ExternalTable);
        assert!(!reward.is_fixed_size());
    }

    #[test]
    fn test_add_reward_ignores_duplicates() {
        let mut arena = ScopeArena::new();
        let chest = arena.create_scope();
        let mut monster = Monster::new("Goblin", "Grr");
        monster.add_reward(chest);
        monster.add_reward(chest);
        assert_eq!(monster.reward, vec![chest]);
    }

    #[test]
    fn test_monster_serializes_with_base() {
        let monster = Monster::new("Goblin", "You shall not pass");
        let json = serde_json::to_value(&monster).unwrap();
        assert_eq!(json["thing"]["name"], "Goblin");
        assert_eq!(json["entry_message"], "You shall not pass");
    }
}
