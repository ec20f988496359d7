mod close;
mod title;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;

use crate::commands::CommandRegistry;
use crate::interaction::InteractionContext;
use crate::model::ButtonSpec;
use crate::services::CommandExecutorService;

pub use close::CloseButton;
pub use title::TitleButton;

/// A button Needle attaches to messages and answers presses for.
#[async_trait]
pub trait NeedleButton: Send + Sync {
    fn custom_id(&self) -> &'static str;

    /// The rendered button; callers may override style and label.
    fn builder(&self, text: &str) -> ButtonSpec;

    async fn press(&self, context: &InteractionContext) -> Result<()>;
}

pub struct ButtonRegistry {
    buttons: HashMap<&'static str, Arc<dyn NeedleButton>>,
}

impl ButtonRegistry {
    pub fn new(commands: Arc<CommandRegistry>, executor: Arc<CommandExecutorService>) -> Self {
        let mut buttons: HashMap<&'static str, Arc<dyn NeedleButton>> = HashMap::new();
        let close = CloseButton::new(commands.clone(), executor);
        let title = TitleButton::new(commands);
        buttons.insert(close.custom_id(), Arc::new(close));
        buttons.insert(title.custom_id(), Arc::new(title));
        Self { buttons }
    }

    pub fn get(&self, custom_id: &str) -> Option<Arc<dyn NeedleButton>> {
        self.buttons.get(custom_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_knows_close_and_title() {
        let registry = ButtonRegistry::new(
            Arc::new(CommandRegistry::new()),
            Arc::new(CommandExecutorService::new()),
        );
        assert_eq!(registry.get("close").unwrap().custom_id(), "close");
        assert_eq!(registry.get("title").unwrap().custom_id(), "title");
        assert!(registry.get("other").is_none());
    }
}
