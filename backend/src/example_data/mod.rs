//! Example data seeding for demos and local development.
//!
//! The `example-data` crate generates a deterministic dataset; this module
//! pushes it through the same driving ports the HTTP adapter uses, so every
//! seeded record passes domain validation.

mod config;
mod seeder;

pub use config::{ExampleDataSettings, SeedSelection, SeedSettingsError, SeedTarget};
pub use seeder::{
    ExampleDataSeeder, ExampleDataSeedingError, SeedOutcome, SeedPorts, SeedingResult,
    plan_dataset,
};
