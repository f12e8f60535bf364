//! Player, creation/update payloads, and the built-in roster.

use serde::{Deserialize, Serialize};

/// Stable player identifier: slug derived from the name at creation.
pub type PlayerId = String;

/// Display colors handed out to new players, cycling by roster size.
pub const PALETTE: [&str; 8] = [
    "#e63946", "#457b9d", "#2a9d8f", "#f4a261", "#9b5de5", "#f15bb5", "#00bbf9", "#8ac926",
];

/// Built-in roster restored by a player reset: (name, avatar, is_main).
pub const DEFAULT_ROSTER: [(&str, &str, bool); 5] = [
    ("Alex", "mario", true),
    ("Sam", "link", true),
    ("Jordan", "kirby", true),
    ("Riley", "pikachu", true),
    ("Casey", "yoshi", false),
];

/// A registered player.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: String,
    /// 1-2 letter fallback shown when there is no portrait.
    pub initial: String,
    /// Symbolic avatar id (fighter icon).
    pub avatar: String,
    /// Encoded portrait. Persisted apart from the player list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Counts toward competitive rotations; false for casual players.
    #[serde(default = "default_is_main")]
    pub is_main: bool,
}

fn default_is_main() -> bool {
    true
}

/// Input for creating a player. Only `name` is required.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayer {
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_main: Option<bool>,
}

impl NewPlayer {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a player. There is no id field: ids never change,
/// and an `id` key in a JSON body is dropped on deserialization.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub initial: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub is_main: Option<bool>,
}

impl Player {
    /// Build a player from creation input. `roster_size` picks the default color.
    pub fn from_new(data: NewPlayer, roster_size: usize) -> Self {
        let name = data.name.trim().to_string();
        Self {
            id: derive_id(&name),
            color: data
                .color
                .unwrap_or_else(|| PALETTE[roster_size % PALETTE.len()].to_string()),
            initial: data.initial.unwrap_or_else(|| derive_initial(&name)),
            avatar: data.avatar.unwrap_or_default(),
            image: None,
            is_main: data.is_main.unwrap_or(true),
            name,
        }
    }

    /// Apply a partial update. A name change recomputes the initial unless
    /// the update sets one explicitly.
    pub fn apply(&mut self, updates: PlayerUpdate) {
        if let Some(name) = updates.name {
            let name = name.trim().to_string();
            if name != self.name {
                self.initial = derive_initial(&name);
                self.name = name;
            }
        }
        if let Some(initial) = updates.initial {
            self.initial = initial;
        }
        if let Some(color) = updates.color {
            self.color = color;
        }
        if let Some(avatar) = updates.avatar {
            self.avatar = avatar;
        }
        if let Some(is_main) = updates.is_main {
            self.is_main = is_main;
        }
    }
}

/// Build the default roster in order.
pub fn default_roster() -> Vec<Player> {
    DEFAULT_ROSTER
        .iter()
        .enumerate()
        .map(|(i, (name, avatar, is_main))| {
            Player::from_new(
                NewPlayer {
                    name: name.to_string(),
                    avatar: Some(avatar.to_string()),
                    is_main: Some(*is_main),
                    ..NewPlayer::default()
                },
                i,
            )
        })
        .collect()
}

/// Lowercased, underscore-joined name: "Jean Paul" -> "jean_paul".
pub fn derive_id(name: &str) -> PlayerId {
    name.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// First letter of the first two words, or the first two letters of a single word.
pub fn derive_initial(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let letters: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    };
    letters.to_uppercase()
}
