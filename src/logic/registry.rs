//! Player registry: the roster and player portraits.

use crate::models::{
    default_roster, derive_id, NewPlayer, Player, PlayerId, PlayerUpdate, ScoreError,
};
use std::collections::BTreeMap;

/// Known players in registry order. Portraits live on the player but are
/// split out for persistence (see [`PlayerRegistry::images`]).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PlayerRegistry {
    players: Vec<Player>,
}

impl Default for PlayerRegistry {
    fn default() -> Self {
        Self {
            players: default_roster(),
        }
    }
}

impl PlayerRegistry {
    pub fn new(players: Vec<Player>) -> Self {
        Self { players }
    }

    /// Rebuild from the persisted player list and the separate image record.
    /// Images for unknown ids are dropped.
    pub fn from_parts(mut players: Vec<Player>, mut images: BTreeMap<PlayerId, String>) -> Self {
        for p in &mut players {
            p.image = images.remove(&p.id);
        }
        Self { players }
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn get(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Player, ScoreError> {
        self.players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ScoreError::NotFound(format!("player '{}'", id)))
    }

    /// Create a player. The id is derived from the name and must be unique.
    pub fn add_player(&mut self, data: NewPlayer) -> Result<Player, ScoreError> {
        let id = derive_id(&data.name);
        if id.is_empty() {
            return Err(ScoreError::InvalidConfig("player name must not be empty".into()));
        }
        if self.contains(&id) {
            return Err(ScoreError::DuplicateId(id));
        }
        let player = Player::from_new(data, self.players.len());
        self.players.push(player.clone());
        Ok(player)
    }

    /// Merge updates into an existing player. The id never changes.
    pub fn update_player(&mut self, id: &str, updates: PlayerUpdate) -> Result<Player, ScoreError> {
        if matches!(&updates.name, Some(n) if n.trim().is_empty()) {
            return Err(ScoreError::InvalidConfig("player name must not be empty".into()));
        }
        let player = self.get_mut(id)?;
        player.apply(updates);
        Ok(player.clone())
    }

    /// Delete a player together with their portrait.
    pub fn remove_player(&mut self, id: &str) -> Result<Player, ScoreError> {
        let idx = self
            .players
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ScoreError::NotFound(format!("player '{}'", id)))?;
        Ok(self.players.remove(idx))
    }

    /// Set or clear (`None`) a player's portrait.
    pub fn set_player_image(&mut self, id: &str, image: Option<String>) -> Result<(), ScoreError> {
        self.get_mut(id)?.image = image;
        Ok(())
    }

    /// Restore the built-in roster, discarding custom players and images.
    pub fn reset_players(&mut self) {
        self.players = default_roster();
    }

    /// Ids of main (competitive) players, in registry order.
    pub fn main_players(&self) -> Vec<PlayerId> {
        self.players
            .iter()
            .filter(|p| p.is_main)
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn is_main(&self, id: &str) -> bool {
        self.get(id).is_some_and(|p| p.is_main)
    }

    /// Player list with portraits stripped, for the main player record.
    pub fn without_images(&self) -> Vec<Player> {
        self.players
            .iter()
            .cloned()
            .map(|mut p| {
                p.image = None;
                p
            })
            .collect()
    }

    /// Portraits by player id, for the separate image record.
    pub fn images(&self) -> BTreeMap<PlayerId, String> {
        self.players
            .iter()
            .filter_map(|p| p.image.clone().map(|img| (p.id.clone(), img)))
            .collect()
    }
}
