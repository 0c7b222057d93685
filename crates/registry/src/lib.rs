mod error;
mod registry;
mod store;

pub use error::{RegistryError, Result};
pub use registry::{MatchResult, Registry};
pub use store::{MappingEntry, MappingStore, MappingUpdate, Settings, SettingsUpdate};
