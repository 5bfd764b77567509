mod environment;
mod settings;

pub use environment::{ENVIRONMENT_VAR, Environment};
pub use settings::{
    AuthProvider, AuthSettings, ChatSettings, DatabaseSettings, LlmProvider, LlmSettings,
    LoggingSettings, ServerSettings, Settings, StoreProvider,
};
