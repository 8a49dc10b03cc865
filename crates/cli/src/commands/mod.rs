pub mod account;
pub mod config;
pub mod registry;
pub mod utils;
pub mod watch;

pub use account::account;
pub use config::{handle_config_command, ConfigCommands};
pub use registry::{discover, reset, set, status};
pub use watch::watch;
