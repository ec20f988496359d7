pub mod command_executor;
pub mod thread_creation;

pub use command_executor::CommandExecutorService;
pub use thread_creation::ThreadCreationService;
