use std::sync::Arc;

use crate::buttons::ButtonRegistry;
use crate::commands::CommandRegistry;
use crate::config::ConfigStore;
use crate::services::{CommandExecutorService, ThreadCreationService};

pub struct AppState {
    pub configs: Arc<ConfigStore>,
    pub threads: Arc<ThreadCreationService>,
    pub commands: Arc<CommandRegistry>,
    pub buttons: Arc<ButtonRegistry>,
    pub executor: Arc<CommandExecutorService>,
}

impl AppState {
    pub fn new(configs: Arc<ConfigStore>, log_created_threads: bool) -> Self {
        let commands = Arc::new(CommandRegistry::new());
        let executor = Arc::new(CommandExecutorService::new());
        let buttons = Arc::new(ButtonRegistry::new(commands.clone(), executor.clone()));
        let threads = Arc::new(ThreadCreationService::new(
            configs.clone(),
            buttons.clone(),
            log_created_threads,
        ));

        Self {
            configs,
            threads,
            commands,
            buttons,
            executor,
        }
    }
}

pub type Context<'a> = poise::Context<'a, AppState, anyhow::Error>;
