use std::path::{Path, PathBuf};

use lora_registry::Registry;

use crate::facade::{auto_apply, ApplyOutcome};

/// Resolves a logical LoRA file name to a path on disk, probing a set of
/// LoRA directories in order.
pub trait LoraResolver {
    fn resolve(&self, file_name: &str) -> Option<PathBuf>;
}

/// Filesystem resolver over a list of LoRA directories.
#[derive(Clone, Debug)]
pub struct DirResolver {
    dirs: Vec<PathBuf>,
}

impl DirResolver {
    #[must_use]
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        Self { dirs }
    }
}

impl LoraResolver for DirResolver {
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        self.dirs
            .iter()
            .map(|dir| dir.join(file_name))
            .find(|candidate| candidate.exists())
    }
}

/// The external weighted-adjustment call: merges a LoRA file into the model
/// and clip handles, producing patched copies. Host-provided; the node
/// treats it as opaque and keeps the originals when it fails.
pub trait WeightPatcher {
    type Model;
    type Clip;

    fn apply(
        &self,
        model: &Self::Model,
        clip: &Self::Clip,
        lora_path: &Path,
        model_strength: f32,
        clip_strength: f32,
    ) -> anyhow::Result<(Self::Model, Self::Clip)>;
}

/// The auto-apply operation: detect a trigger word in the text, resolve the
/// mapped LoRA file and patch the model/clip pair with it.
pub struct AutoLoraNode<P, R> {
    patcher: P,
    resolver: R,
}

impl<P: WeightPatcher, R: LoraResolver> AutoLoraNode<P, R> {
    pub fn new(patcher: P, resolver: R) -> Self {
        Self { patcher, resolver }
    }

    /// Returns the (possibly patched) model and clip, the text unchanged, and
    /// a status string describing what happened. Failures never propagate:
    /// the original handles come back with an error status.
    pub fn apply(
        &self,
        registry: &Registry,
        model: P::Model,
        clip: P::Clip,
        text: &str,
        enabled: bool,
        manual_strength: f32,
    ) -> (P::Model, P::Clip, String, String) {
        let outcome = auto_apply(registry, text, enabled, manual_strength);
        let (trigger_word, lora_file, strength) = match outcome {
            ApplyOutcome::Disabled => {
                return (model, clip, text.to_string(), "auto LoRA disabled".to_string());
            }
            ApplyOutcome::NoTrigger => {
                return (
                    model,
                    clip,
                    text.to_string(),
                    "no trigger word matched".to_string(),
                );
            }
            ApplyOutcome::Matched {
                trigger_word,
                lora_file,
                strength,
            } => (trigger_word, lora_file, strength),
        };

        let Some(lora_path) = self.resolver.resolve(&lora_file) else {
            let status = format!("error: LoRA file not found - {lora_file}");
            log::warn!("[auto-lora] {status}");
            return (model, clip, text.to_string(), status);
        };

        match self
            .patcher
            .apply(&model, &clip, &lora_path, strength, strength)
        {
            Ok((model, clip)) => {
                let status = format!("applied: {trigger_word} -> {lora_file} (strength: {strength})");
                log::info!("[auto-lora] {status}");
                (model, clip, text.to_string(), status)
            }
            Err(err) => {
                let status = format!("error: {err}");
                log::warn!("[auto-lora] LoRA apply failed: {err}");
                (model, clip, text.to_string(), status)
            }
        }
    }
}
