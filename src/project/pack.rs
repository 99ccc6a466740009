//! Character / Action Pack documents: the JSON exchanged between segment curation and playback.
//!
//! Two reader-facing shapes are accepted: the current multi-action pack
//! (`{ id, name, actions: [{ name, frames }], ... }`) and the legacy two-list character
//! (`{ id, name, idle: [...], talking: [...] }`). Parsing tries each shape in turn.

use std::time::{SystemTime, UNIX_EPOCH};

use kurbo::Point;

use crate::foundation::core::ImageRef;
use crate::foundation::error::{StudioError, StudioResult};

/// Action name given to the `idle` list of a legacy character.
pub const LEGACY_IDLE_ACTION: &str = "Idle (Legacy)";
/// Action name given to the `talking` list of a legacy character.
pub const LEGACY_TALKING_ACTION: &str = "Talking (Legacy)";

/// A named, ordered frame list.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CharacterAction {
    /// Action name, unique within a character.
    pub name: String,
    /// Frame references in playback order.
    pub frames: Vec<ImageRef>,
}

/// Stage placement saved alongside a character.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    /// Character offset from the stage center, in stage pixels.
    pub char_position: Point,
    /// Character scale factor.
    pub char_scale: f64,
    /// Background offset from the stage origin, in stage pixels.
    pub bg_position: Point,
    /// Background scale factor.
    pub bg_scale: f64,
    /// Optional background image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_image: Option<ImageRef>,
    /// Optional background music, base64 or data URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_music_data: Option<String>,
    /// Display name of the background music.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg_music_name: Option<String>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            char_position: Point::ZERO,
            char_scale: 1.0,
            bg_position: Point::ZERO,
            bg_scale: 1.0,
            background_image: None,
            bg_music_data: None,
            bg_music_name: None,
        }
    }
}

/// A character: a set of named actions plus optional playback defaults and scene placement.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    /// Pack identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Export time in milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    /// Actions in export order.
    pub actions: Vec<CharacterAction>,
    /// Action looped while idle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_idle_action: Option<String>,
    /// Action driven while speaking.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_talking_action: Option<String>,
    /// Saved stage placement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scene_config: Option<SceneConfig>,
}

#[derive(serde::Deserialize)]
struct PackShape {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    timestamp: Option<u64>,
    actions: Vec<CharacterAction>,
    #[serde(default, rename = "defaultIdleAction")]
    default_idle_action: Option<String>,
    #[serde(default, rename = "defaultTalkingAction")]
    default_talking_action: Option<String>,
    #[serde(default, rename = "sceneConfig")]
    scene_config: Option<SceneConfig>,
}

#[derive(serde::Deserialize)]
struct LegacyCharacterShape {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    idle: Vec<ImageRef>,
    talking: Vec<ImageRef>,
}

impl Character {
    /// Parse a character from JSON text, accepting the pack and the legacy shape.
    pub fn from_json(text: &str) -> StudioResult<Self> {
        let value: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| StudioError::invalid_asset(format!("not JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Parse a character from an already decoded JSON value.
    pub fn from_value(value: serde_json::Value) -> StudioResult<Self> {
        let character = if let Ok(pack) = serde_json::from_value::<PackShape>(value.clone()) {
            Self {
                id: pack.id.unwrap_or_else(|| now_millis().to_string()),
                name: pack.name.unwrap_or_else(|| "Action Pack".to_string()),
                timestamp: pack.timestamp,
                actions: pack.actions,
                default_idle_action: pack.default_idle_action,
                default_talking_action: pack.default_talking_action,
                scene_config: pack.scene_config,
            }
        } else if let Ok(legacy) = serde_json::from_value::<LegacyCharacterShape>(value) {
            Self {
                id: legacy.id.unwrap_or_else(|| now_millis().to_string()),
                name: legacy.name.unwrap_or_else(|| "Legacy Character".to_string()),
                timestamp: None,
                actions: vec![
                    CharacterAction {
                        name: LEGACY_IDLE_ACTION.to_string(),
                        frames: legacy.idle,
                    },
                    CharacterAction {
                        name: LEGACY_TALKING_ACTION.to_string(),
                        frames: legacy.talking,
                    },
                ],
                default_idle_action: None,
                default_talking_action: None,
                scene_config: None,
            }
        } else {
            return Err(StudioError::invalid_asset(
                "expected an action pack or a legacy idle/talking character",
            ));
        };

        if character.actions.is_empty() {
            return Err(StudioError::invalid_asset("character has no actions"));
        }
        Ok(character)
    }

    /// Read and parse a character file.
    pub fn load(path: &std::path::Path) -> StudioResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            StudioError::invalid_asset(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }

    /// Pretty-printed JSON.
    pub fn to_json_pretty(&self) -> StudioResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StudioError::serde(e.to_string()))
    }

    /// Look up an action by name.
    pub fn action(&self, name: &str) -> Option<&CharacterAction> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Name of the action to loop while idle: the declared default if it exists, else the first
    /// action.
    pub fn idle_action_name(&self) -> Option<&str> {
        self.declared(self.default_idle_action.as_deref())
            .or_else(|| self.actions.first().map(|a| a.name.as_str()))
    }

    /// Name of the action to drive while speaking: the declared default if it exists, else the
    /// second action, else the first.
    pub fn talking_action_name(&self) -> Option<&str> {
        self.declared(self.default_talking_action.as_deref())
            .or_else(|| self.actions.get(1).or(self.actions.first()).map(|a| a.name.as_str()))
    }

    fn declared(&self, name: Option<&str>) -> Option<&str> {
        name.and_then(|n| self.action(n)).map(|a| a.name.as_str())
    }
}

/// Legacy single-action export of one segment.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LegacyAction {
    /// Segment identifier.
    pub id: String,
    /// Segment name.
    pub name: String,
    /// Export time in milliseconds since the Unix epoch.
    pub timestamp: u64,
    /// Tagged frame references in frame order.
    pub frames: Vec<ImageRef>,
}

/// Milliseconds since the Unix epoch, used for pack identifiers and timestamps.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/project/pack.rs"]
mod tests;
