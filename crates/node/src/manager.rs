use std::fmt;

use lora_registry::Registry;

/// Admin actions exposed by the manager surface. Every action renders to a
/// human-readable result; nothing here propagates errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ManagerAction {
    List,
    Add,
    Remove,
    Reload,
}

impl ManagerAction {
    #[must_use]
    pub fn parse(action: &str) -> Option<Self> {
        match action {
            "list" => Some(Self::List),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "reload" => Some(Self::Reload),
            _ => None,
        }
    }
}

impl fmt::Display for ManagerAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::List => "list",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Reload => "reload",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ManagerParams {
    pub trigger_word: String,
    pub lora_file: String,
    pub strength: f32,
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionOutcome {
    pub success: bool,
    pub message: String,
}

impl ActionOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Runs one admin action against the registry. The outcome carries a
/// human-readable message plus a success flag for callers that need an exit
/// code or an HTTP envelope.
pub fn run(registry: &mut Registry, action: ManagerAction, params: &ManagerParams) -> ActionOutcome {
    match action {
        ManagerAction::List => ActionOutcome::ok(render_list(registry)),
        ManagerAction::Add => {
            if params.trigger_word.is_empty() || params.lora_file.is_empty() {
                return ActionOutcome::failed("error: trigger word and LoRA file are required");
            }
            match registry.add(
                &params.trigger_word,
                &params.lora_file,
                params.strength,
                &params.description,
            ) {
                Ok(()) => ActionOutcome::ok(format!(
                    "added: '{}' -> {}",
                    params.trigger_word, params.lora_file
                )),
                Err(err) => ActionOutcome::failed(format!("add failed: {err}")),
            }
        }
        ManagerAction::Remove => {
            if params.trigger_word.is_empty() {
                return ActionOutcome::failed("error: trigger word to remove is required");
            }
            match registry.remove(&params.trigger_word) {
                Ok(()) => ActionOutcome::ok(format!("removed: '{}'", params.trigger_word)),
                Err(err) => ActionOutcome::failed(format!("remove failed: {err}")),
            }
        }
        ManagerAction::Reload => {
            registry.reload();
            ActionOutcome::ok("mapping config reloaded")
        }
    }
}

/// Text-only rendering of `run`, for surfaces that show a single result
/// string. Unknown action names become an error message instead of a panic.
pub fn dispatch(registry: &mut Registry, action: &str, params: &ManagerParams) -> String {
    match ManagerAction::parse(action) {
        Some(action) => run(registry, action, params).message,
        None => format!("unknown action: {action}"),
    }
}

fn render_list(registry: &Registry) -> String {
    let mappings = registry.mappings();
    if mappings.is_empty() {
        return "no LoRA mappings registered".to_string();
    }

    let default_strength = registry.settings().default_strength;
    let mut lines = vec!["=== registered LoRA mappings ===".to_string()];
    for (i, entry) in mappings.iter().enumerate() {
        let mut line = format!(
            "{}. '{}' -> {} (strength: {})",
            i + 1,
            entry.trigger_word,
            entry.lora_file,
            entry.strength.unwrap_or(default_strength)
        );
        if !entry.description.is_empty() {
            line.push_str(&format!(" - {}", entry.description));
        }
        lines.push(line);
    }
    lines.join("\n")
}
