//! Settings for the `seed` binary, layered by OrthoConfig from defaults,
//! `EXAMPLE_DATA_*` environment variables and command-line flags.

use std::path::PathBuf;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_SEED: &str = "mossy-owl";

fn bundled_registry() -> PathBuf {
    [env!("CARGO_MANIFEST_DIR"), "fixtures", "example-data", "seeds.json"]
        .iter()
        .collect()
}

/// Which registry entry to generate and how many accounts it should hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSelection {
    /// Registry entry name.
    pub name: String,
    /// Replaces the entry's own account count when set.
    pub user_count: Option<usize>,
}

/// Where a seed run sends its dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedTarget<'a> {
    /// Write through the Diesel adapters at this connection string.
    Database(&'a str),
    /// Generate and summarise without connecting anywhere.
    DryRun,
}

/// Raised when the settings cannot describe a runnable seed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SeedSettingsError {
    /// Neither a database nor a dry run was requested.
    #[error("EXAMPLE_DATA_DATABASE_URL must be set unless EXAMPLE_DATA_DRY_RUN is true")]
    MissingDatabaseUrl,
    /// The seed name was blank after trimming.
    #[error("the seed name must not be blank")]
    BlankSeed,
}

/// Configuration values controlling the `seed` binary.
#[derive(Debug, Clone, Default, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EXAMPLE_DATA")]
pub struct ExampleDataSettings {
    /// PostgreSQL connection string of the database to seed.
    pub database_url: Option<String>,
    /// Registry entry to generate. Defaults to `mossy-owl`.
    pub seed: Option<String>,
    /// Account count override for the chosen entry.
    pub users: Option<usize>,
    /// Registry file. Defaults to the bundled `fixtures/example-data/seeds.json`.
    pub registry: Option<PathBuf>,
    /// Generate the dataset and log its size without writing it.
    pub dry_run: Option<bool>,
}

impl ExampleDataSettings {
    /// Resolve the registry entry to generate.
    ///
    /// # Errors
    ///
    /// Returns [`SeedSettingsError::BlankSeed`] when the name is whitespace.
    pub fn selection(&self) -> Result<SeedSelection, SeedSettingsError> {
        let name = self.seed.as_deref().unwrap_or(DEFAULT_SEED).trim();
        if name.is_empty() {
            return Err(SeedSettingsError::BlankSeed);
        }
        Ok(SeedSelection {
            name: name.to_owned(),
            user_count: self.users,
        })
    }

    /// Resolve where the dataset goes. A dry run wins over a database URL.
    ///
    /// # Errors
    ///
    /// Returns [`SeedSettingsError::MissingDatabaseUrl`] when no dry run is
    /// requested and the URL is missing or blank.
    pub fn target(&self) -> Result<SeedTarget<'_>, SeedSettingsError> {
        if self.dry_run.unwrap_or(false) {
            return Ok(SeedTarget::DryRun);
        }
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(SeedTarget::Database)
            .ok_or(SeedSettingsError::MissingDatabaseUrl)
    }

    /// Registry file to read.
    pub fn registry_path(&self) -> PathBuf {
        self.registry.clone().unwrap_or_else(bundled_registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 5] = [
        "EXAMPLE_DATA_DATABASE_URL",
        "EXAMPLE_DATA_SEED",
        "EXAMPLE_DATA_USERS",
        "EXAMPLE_DATA_REGISTRY",
        "EXAMPLE_DATA_DRY_RUN",
    ];

    fn load_with(vars: &[(&str, &str)]) -> ExampleDataSettings {
        let _guard = lock_env(VARS.map(|name| {
            let value = vars
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value).to_owned());
            (name, value)
        }));
        ExampleDataSettings::load_from_iter([OsString::from("seed")]).expect("config should load")
    }

    #[rstest]
    fn bare_settings_select_the_bundled_default() {
        let settings = load_with(&[]);
        assert_eq!(
            settings.selection(),
            Ok(SeedSelection {
                name: DEFAULT_SEED.to_owned(),
                user_count: None,
            })
        );
        assert_eq!(settings.registry_path(), bundled_registry());
        assert_eq!(settings.target(), Err(SeedSettingsError::MissingDatabaseUrl));
    }

    #[rstest]
    fn environment_selects_seed_and_database() {
        let settings = load_with(&[
            ("EXAMPLE_DATA_DATABASE_URL", " postgres://localhost/social "),
            ("EXAMPLE_DATA_SEED", "snowy-penguin"),
            ("EXAMPLE_DATA_USERS", "5"),
            ("EXAMPLE_DATA_REGISTRY", "/tmp/seeds.json"),
        ]);

        let selection = settings.selection().expect("selection");
        assert_eq!(selection.name, "snowy-penguin");
        assert_eq!(selection.user_count, Some(5));
        assert_eq!(settings.registry_path(), PathBuf::from("/tmp/seeds.json"));
        assert_eq!(
            settings.target(),
            Ok(SeedTarget::Database("postgres://localhost/social"))
        );
    }

    #[rstest]
    fn dry_run_needs_no_database() {
        let settings = load_with(&[("EXAMPLE_DATA_DRY_RUN", "true")]);
        assert_eq!(settings.target(), Ok(SeedTarget::DryRun));
    }

    #[rstest]
    #[case("   ")]
    #[case("")]
    fn blank_urls_are_missing(#[case] url: &str) {
        let settings = ExampleDataSettings {
            database_url: Some(url.to_owned()),
            ..ExampleDataSettings::default()
        };
        assert_eq!(settings.target(), Err(SeedSettingsError::MissingDatabaseUrl));
    }

    #[rstest]
    fn blank_seed_names_are_rejected() {
        let settings = ExampleDataSettings {
            seed: Some("  ".to_owned()),
            ..ExampleDataSettings::default()
        };
        assert_eq!(settings.selection(), Err(SeedSettingsError::BlankSeed));
    }
}
