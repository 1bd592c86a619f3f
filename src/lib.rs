pub mod accumulator;
pub mod cli;
pub mod config;
pub mod database_ops;
pub mod entities;
pub mod env_boot;
pub mod error;
pub mod orchestrator;
pub mod provider;
pub mod seed;
pub mod task;
pub mod throttle;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use config::SeederConfig;
pub use error::{SeedError, SeedResult};
pub use seed::Seeder;
