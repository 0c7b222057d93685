use lora_registry::{MatchResult, Registry};

/// Result of the auto-apply lookup. The caller resolves the file path and
/// performs the actual weight patch; the facade only decides what to apply.
#[derive(Clone, Debug, PartialEq)]
pub enum ApplyOutcome {
    /// Auto-apply was switched off; no lookup was performed.
    Disabled,
    /// No trigger word in the text matched a registered mapping.
    NoTrigger,
    Matched {
        trigger_word: String,
        lora_file: String,
        strength: f32,
    },
}

/// Thin query over the registry: first stored entry matching `text`.
#[must_use]
pub fn first_match(registry: &Registry, text: &str) -> Option<MatchResult> {
    registry.search(text)
}

/// Decides which LoRA (if any) to apply for `text`. A `manual_strength >= 0`
/// overrides the registry's effective strength; the conventional sentinel for
/// "use the registry value" is -1.0.
#[must_use]
pub fn auto_apply(
    registry: &Registry,
    text: &str,
    enabled: bool,
    manual_strength: f32,
) -> ApplyOutcome {
    if !enabled {
        return ApplyOutcome::Disabled;
    }

    match first_match(registry, text) {
        Some(result) => {
            let strength = if manual_strength >= 0.0 {
                manual_strength
            } else {
                result.strength
            };
            ApplyOutcome::Matched {
                trigger_word: result.trigger_word,
                lora_file: result.lora_file,
                strength,
            }
        }
        None => ApplyOutcome::NoTrigger,
    }
}
