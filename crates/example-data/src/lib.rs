//! Deterministic example social data generation for demonstration purposes.
//!
//! This crate generates believable, reproducible users, posts, comments,
//! follow edges and likes from a JSON seed registry. It is independent of
//! backend domain types to avoid circular dependencies; the backend's `seed`
//! binary converts the output into domain requests.
//!
//! # Example
//!
//! ```
//! use example_data::{SeedRegistry, generate_example_dataset};
//!
//! let json = r#"{
//!     "version": 1,
//!     "tags": ["rust", "hiking"],
//!     "seeds": [{"name": "test-seed", "seed": 42, "userCount": 3}]
//! }"#;
//!
//! let registry = SeedRegistry::from_json(json).expect("valid registry");
//! let seed_def = registry.find_seed("test-seed").expect("seed exists");
//! let dataset = generate_example_dataset(&registry, seed_def).expect("generation succeeds");
//!
//! assert_eq!(dataset.users.len(), 3);
//! ```

mod error;
mod generator;
mod registry;
mod seed;
mod validation;

pub use error::{GenerationError, RegistryError};
pub use generator::generate_example_dataset;
pub use registry::{SeedDefinition, SeedRegistry};
pub use seed::{
    ExampleCommentSeed, ExampleDataset, ExampleFollowSeed, ExampleLikeSeed, ExamplePostSeed,
    ExampleUserSeed,
};
pub use validation::{
    COMMENT_MAX, CONTENT_MAX, TAG_MAX, TAGS_MAX, TITLE_MAX, USERNAME_MAX, is_valid_text,
    is_valid_username,
};
