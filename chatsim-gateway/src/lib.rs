pub mod extract;
pub mod orchestrator;
pub mod prompt;
pub mod providers;
pub mod server;
pub mod state;

pub use orchestrator::{GenerateError, Orchestrator, ProviderSet};
pub use providers::{CharacterResolver, Provider, ProviderError};
pub use state::AppState;
