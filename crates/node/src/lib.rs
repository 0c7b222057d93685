mod facade;
mod manager;
mod node;

pub use facade::{auto_apply, first_match, ApplyOutcome};
pub use manager::{dispatch, run, ActionOutcome, ManagerAction, ManagerParams};
pub use node::{AutoLoraNode, DirResolver, LoraResolver, WeightPatcher};
