pub mod messages;
pub mod notifier;
