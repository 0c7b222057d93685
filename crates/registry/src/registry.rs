use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;

use crate::error::{RegistryError, Result};
use crate::store::{MappingEntry, MappingStore, MappingUpdate, Settings, SettingsUpdate};

/// The first entry (in stored order) whose trigger word occurs in the input
/// text as a standalone token.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchResult {
    /// Trigger word in its original stored casing.
    pub trigger_word: String,
    pub lora_file: String,
    /// Entry strength, or `settings.default_strength` when the entry has none.
    pub strength: f32,
    pub description: String,
}

/// Owns the in-memory mapping store and is the sole writer of the persisted
/// document. Construct once and share; every mutation persists immediately.
#[derive(Debug)]
pub struct Registry {
    config_path: PathBuf,
    store: MappingStore,
}

impl Registry {
    /// Reads the persisted document at `config_path`. A missing or unreadable
    /// document is replaced by the default store (one placeholder entry),
    /// which is written back best-effort. Never fails.
    pub fn load(config_path: impl Into<PathBuf>) -> Self {
        let config_path = config_path.into();
        let store = read_store(&config_path);
        Self { config_path, store }
    }

    /// Discards in-memory state and re-reads from disk. Unsaved in-memory
    /// divergence (a mutation whose save failed) is reverted.
    pub fn reload(&mut self) {
        self.store = read_store(&self.config_path);
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Scans entries in stored order and returns the first whose trigger word
    /// matches `text` on a word boundary. Later entries are never evaluated.
    #[must_use]
    pub fn search(&self, text: &str) -> Option<MatchResult> {
        if text.is_empty() {
            return None;
        }

        let case_sensitive = self.store.settings.case_sensitive;
        let haystack = if case_sensitive {
            text.to_string()
        } else {
            text.to_lowercase()
        };

        for entry in &self.store.lora_mappings {
            let trigger = if case_sensitive {
                entry.trigger_word.clone()
            } else {
                entry.trigger_word.to_lowercase()
            };

            let pattern = format!(r"\b{}\b", regex::escape(&trigger));
            let re = match Regex::new(&pattern) {
                Ok(re) => re,
                Err(err) => {
                    log::warn!("skipping unmatchable trigger '{trigger}': {err}");
                    continue;
                }
            };

            if re.is_match(&haystack) {
                return Some(MatchResult {
                    trigger_word: entry.trigger_word.clone(),
                    lora_file: entry.lora_file.clone(),
                    strength: entry
                        .strength
                        .unwrap_or(self.store.settings.default_strength),
                    description: entry.description.clone(),
                });
            }
        }

        None
    }

    /// Appends a new mapping and persists the store. Rejects a trigger word
    /// that already exists under case-insensitive comparison without touching
    /// disk or memory.
    pub fn add(
        &mut self,
        trigger_word: &str,
        lora_file: &str,
        strength: f32,
        description: &str,
    ) -> Result<()> {
        if self.position_of(trigger_word).is_some() {
            return Err(RegistryError::DuplicateTrigger(trigger_word.to_string()));
        }

        self.store.lora_mappings.push(MappingEntry {
            trigger_word: trigger_word.to_string(),
            lora_file: lora_file.to_string(),
            strength: Some(strength),
            description: description.to_string(),
        });
        self.save()
    }

    /// Removes the first entry matching `trigger_word` case-insensitively and
    /// persists. The store is unchanged when no entry matches.
    pub fn remove(&mut self, trigger_word: &str) -> Result<()> {
        let Some(pos) = self.position_of(trigger_word) else {
            return Err(RegistryError::TriggerNotFound(trigger_word.to_string()));
        };
        self.store.lora_mappings.remove(pos);
        self.save()
    }

    /// Applies the provided fields to the entry matching `trigger_word`
    /// case-insensitively, then persists.
    pub fn update(&mut self, trigger_word: &str, update: MappingUpdate) -> Result<()> {
        let Some(pos) = self.position_of(trigger_word) else {
            return Err(RegistryError::TriggerNotFound(trigger_word.to_string()));
        };

        let entry = &mut self.store.lora_mappings[pos];
        if let Some(lora_file) = update.lora_file {
            entry.lora_file = lora_file;
        }
        if let Some(strength) = update.strength {
            entry.strength = Some(strength);
        }
        if let Some(description) = update.description {
            entry.description = description;
        }
        self.save()
    }

    /// Defensive copy of the stored entries, in stored order.
    #[must_use]
    pub fn mappings(&self) -> Vec<MappingEntry> {
        self.store.lora_mappings.clone()
    }

    #[must_use]
    pub fn settings(&self) -> Settings {
        self.store.settings
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<()> {
        self.store.settings.merge(update);
        self.save()
    }

    /// A failed write leaves the in-memory mutation in place; the caller sees
    /// the error and disk stays stale until the next successful save or a
    /// `reload()`.
    fn save(&self) -> Result<()> {
        persist(&self.config_path, &self.store)
    }

    fn position_of(&self, trigger_word: &str) -> Option<usize> {
        let needle = trigger_word.to_lowercase();
        self.store
            .lora_mappings
            .iter()
            .position(|m| m.trigger_word.to_lowercase() == needle)
    }
}

fn read_store(path: &Path) -> MappingStore {
    match fs::read(path) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(store) => store,
            Err(err) => {
                log::warn!(
                    "mapping config {} is corrupt ({err}), rebuilding defaults",
                    path.display()
                );
                write_default_store(path)
            }
        },
        Err(err) => {
            log::warn!(
                "mapping config {} is unreadable ({err}), rebuilding defaults",
                path.display()
            );
            write_default_store(path)
        }
    }
}

fn write_default_store(path: &Path) -> MappingStore {
    let store = MappingStore::default();
    if let Err(err) = persist(path, &store) {
        log::warn!("could not write default mapping config: {err}");
    }
    store
}

fn persist(path: &Path, store: &MappingStore) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let bytes = serde_json::to_vec_pretty(store)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn registry_with(entries: &[(&str, &str, f32)]) -> (tempfile::TempDir, Registry) {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lora_mapping.json");
        let mut registry = Registry::load(&path);
        registry.remove("example_trigger").unwrap();
        for (trigger, file, strength) in entries {
            registry.add(trigger, file, *strength, "").unwrap();
        }
        (temp, registry)
    }

    #[test]
    fn missing_config_yields_default_store_and_writes_it() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("config").join("lora_mapping.json");
        let registry = Registry::load(&path);

        let mappings = registry.mappings();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].trigger_word, "example_trigger");
        assert_eq!(registry.settings(), Settings::default());
        assert!(path.exists(), "default config must be written back");
    }

    #[test]
    fn corrupt_config_yields_default_store() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lora_mapping.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let registry = Registry::load(&path);
        assert_eq!(registry.mappings().len(), 1);
        assert_eq!(registry.mappings()[0].trigger_word, "example_trigger");

        // The rebuilt document must now parse.
        let reparsed: MappingStore =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(reparsed, MappingStore::default());
    }

    #[test]
    fn search_returns_first_match_in_stored_order() {
        let (_temp, registry) =
            registry_with(&[("miku", "m.safetensors", 0.7), ("girl", "g.safetensors", 0.5)]);

        let result = registry.search("a girl drawn as miku").unwrap();
        assert_eq!(result.trigger_word, "miku");
        assert_eq!(result.lora_file, "m.safetensors");
        assert_eq!(result.strength, 0.7);
    }

    #[test]
    fn search_is_case_insensitive_by_default() {
        let (_temp, registry) = registry_with(&[("Miku", "m.safetensors", 0.7)]);

        let result = registry.search("i love miku today").unwrap();
        assert_eq!(result.trigger_word, "Miku", "original casing is reported");
        assert!(registry.search("MIKU portrait").is_some());
    }

    #[test]
    fn search_requires_word_boundaries() {
        let (_temp, registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);

        assert!(registry.search("mikuloid singing").is_none());
        assert!(registry.search("miku2 model").is_none());
        assert!(registry.search("miku, singing").is_some());
    }

    #[test]
    fn cat_does_not_match_inside_catgirl() {
        let (_temp, registry) = registry_with(&[
            ("cat", "a.safetensors", 1.0),
            ("catgirl", "b.safetensors", 0.8),
        ]);

        let result = registry.search("I saw a catgirl").unwrap();
        assert_eq!(result.trigger_word, "catgirl");
        assert_eq!(result.strength, 0.8);

        let result = registry.search("I have a cat").unwrap();
        assert_eq!(result.trigger_word, "cat");
        assert_eq!(result.strength, 1.0);
    }

    #[test]
    fn search_empty_text_matches_nothing() {
        let (_temp, registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);
        assert!(registry.search("").is_none());
    }

    #[test]
    fn absent_strength_falls_back_to_default() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("lora_mapping.json");
        let store = MappingStore {
            lora_mappings: vec![MappingEntry {
                trigger_word: "miku".to_string(),
                lora_file: "m.safetensors".to_string(),
                strength: None,
                description: String::new(),
            }],
            settings: Settings {
                default_strength: 0.6,
                ..Settings::default()
            },
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&store).unwrap()).unwrap();

        let registry = Registry::load(&path);
        assert_eq!(registry.search("hello miku").unwrap().strength, 0.6);
    }

    #[test]
    fn case_sensitive_mode_respects_casing() {
        let (_temp, mut registry) = registry_with(&[("Miku", "m.safetensors", 0.7)]);
        registry
            .update_settings(SettingsUpdate {
                case_sensitive: Some(true),
                ..SettingsUpdate::default()
            })
            .unwrap();

        assert!(registry.search("i love miku").is_none());
        assert!(registry.search("i love Miku").is_some());
    }

    #[test]
    fn add_rejects_case_insensitive_duplicate() {
        let (_temp, mut registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);

        let err = registry.add("MIKU", "other.safetensors", 1.0, "").unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTrigger(_)));
        assert_eq!(registry.mappings().len(), 1);
        assert_eq!(registry.mappings()[0].lora_file, "m.safetensors");
    }

    #[test]
    fn remove_missing_trigger_leaves_store_unchanged() {
        let (_temp, mut registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);

        let err = registry.remove("rin").unwrap_err();
        assert!(matches!(err, RegistryError::TriggerNotFound(_)));
        assert_eq!(registry.mappings().len(), 1);
    }

    #[test]
    fn remove_deletes_exactly_one_entry_and_persists() {
        let (_temp, mut registry) =
            registry_with(&[("miku", "m.safetensors", 0.7), ("rin", "r.safetensors", 0.9)]);

        registry.remove("MIKU").unwrap();
        assert_eq!(registry.mappings().len(), 1);
        assert_eq!(registry.mappings()[0].trigger_word, "rin");

        let reloaded = Registry::load(registry.config_path());
        assert_eq!(reloaded.mappings(), registry.mappings());
    }

    #[test]
    fn update_applies_only_provided_fields() {
        let (_temp, mut registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);

        registry
            .update(
                "miku",
                MappingUpdate {
                    strength: Some(1.2),
                    ..MappingUpdate::default()
                },
            )
            .unwrap();

        let entry = &registry.mappings()[0];
        assert_eq!(entry.lora_file, "m.safetensors");
        assert_eq!(entry.strength, Some(1.2));
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_temp, mut registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);
        registry
            .update_settings(SettingsUpdate {
                default_strength: Some(0.8),
                max_lora_count: Some(5),
                ..SettingsUpdate::default()
            })
            .unwrap();

        let reloaded = Registry::load(registry.config_path());
        assert_eq!(reloaded.mappings(), registry.mappings());
        assert_eq!(reloaded.settings(), registry.settings());
    }

    #[test]
    fn mappings_returns_a_defensive_copy() {
        let (_temp, registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);

        let mut copy = registry.mappings();
        copy[0].trigger_word = "mutated".to_string();
        assert_eq!(registry.mappings()[0].trigger_word, "miku");
    }

    #[test]
    fn reload_reverts_unsaved_divergence() {
        let (_temp, mut registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);

        // Mutate the document behind the registry's back, then reload.
        std::fs::write(
            registry.config_path(),
            serde_json::to_vec_pretty(&MappingStore {
                lora_mappings: vec![],
                settings: Settings::default(),
            })
            .unwrap(),
        )
        .unwrap();

        registry.reload();
        assert!(registry.mappings().is_empty());
    }

    #[test]
    fn persisted_document_uses_snake_case_wire_names() {
        let (_temp, registry) = registry_with(&[("miku", "m.safetensors", 0.7)]);
        let raw = std::fs::read_to_string(registry.config_path()).unwrap();
        assert!(raw.contains("\"lora_mappings\""));
        assert!(raw.contains("\"trigger_word\""));
        assert!(raw.contains("\"lora_file\""));
        assert!(raw.contains("\"case_sensitive\""));
        assert!(raw.contains("\"max_lora_count\""));
        assert!(raw.contains("\"default_strength\""));
    }
}
