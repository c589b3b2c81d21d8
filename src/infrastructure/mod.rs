pub mod github_adapter;
pub mod local_config_adapter;
pub mod shell_adapter;
pub mod token_providers;
