mod config;
mod scheduler;
mod stage_builder;

pub use config::RunConfig;
pub use scheduler::{CooperativeScheduler, Scheduler, TickReport};
pub use stage_builder::build_scenes;
