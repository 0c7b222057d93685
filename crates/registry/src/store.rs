use serde::{Deserialize, Serialize};

/// One trigger-word to LoRA file association as persisted on disk.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingEntry {
    pub trigger_word: String,
    pub lora_file: String,
    /// Absent means "fall back to `Settings::default_strength` at match time".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f32>,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub case_sensitive: bool,
    /// Declared and persisted, not enforced by matching (at most one entry
    /// is ever reported per search).
    #[serde(default = "default_max_lora_count")]
    pub max_lora_count: u32,
    #[serde(default = "default_strength")]
    pub default_strength: f32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_lora_count: default_max_lora_count(),
            default_strength: default_strength(),
        }
    }
}

/// Partial settings merge for `Registry::update_settings`.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct SettingsUpdate {
    pub case_sensitive: Option<bool>,
    pub max_lora_count: Option<u32>,
    pub default_strength: Option<f32>,
}

impl Settings {
    pub fn merge(&mut self, update: SettingsUpdate) {
        if let Some(case_sensitive) = update.case_sensitive {
            self.case_sensitive = case_sensitive;
        }
        if let Some(max_lora_count) = update.max_lora_count {
            self.max_lora_count = max_lora_count;
        }
        if let Some(default_strength) = update.default_strength {
            self.default_strength = default_strength;
        }
    }
}

/// Partial entry update for `Registry::update`. Only the recognized fields
/// are representable; anything else a caller sends is dropped at parse time.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct MappingUpdate {
    pub lora_file: Option<String>,
    pub strength: Option<f32>,
    pub description: Option<String>,
}

/// The persisted document: ordered mapping list plus global settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappingStore {
    #[serde(default)]
    pub lora_mappings: Vec<MappingEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl Default for MappingStore {
    /// The document written on first load: one placeholder entry the user is
    /// expected to edit, plus default settings.
    fn default() -> Self {
        Self {
            lora_mappings: vec![MappingEntry {
                trigger_word: "example_trigger".to_string(),
                lora_file: "example_lora.safetensors".to_string(),
                strength: Some(1.0),
                description: "example - edit this entry".to_string(),
            }],
            settings: Settings::default(),
        }
    }
}

const fn default_max_lora_count() -> u32 {
    3
}

const fn default_strength() -> f32 {
    1.0
}
