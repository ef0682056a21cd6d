//! Resolution of effective settings from CLI arguments and saved values

use crate::cli::main_impl::Cli;
use crate::settings::Settings;

/// Merge CLI arguments over saved settings
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    /// Arguments given on the command line win; the rest come from `saved`
    pub(crate) fn resolve(cli: &Cli, saved: &Settings) -> Settings {
        let pick = |arg: &Option<String>, stored: &str| {
            arg.clone().unwrap_or_else(|| stored.to_string())
        };

        Settings {
            image_dir: pick(&cli.image_dir, &saved.image_dir),
            mask_dir: pick(&cli.mask_dir, &saved.mask_dir),
            output_dir: pick(&cli.output_dir, &saved.output_dir),
        }
    }
}
