//! Config CLI command
//!
//! Shows the data locations and settings, and updates settings when any
//! option is given.

use clap::Args;

use crate::config::paths::TandemPaths;
use crate::config::settings::Settings;
use crate::engine::Thresholds;
use crate::error::{TandemError, TandemResult};

#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
    /// Display name of the first participant
    #[arg(long)]
    pub user1_name: Option<String>,
    /// Display name of the second participant
    #[arg(long)]
    pub user2_name: Option<String>,
    /// Currency symbol used for display
    #[arg(long)]
    pub currency: Option<String>,
    /// Warning threshold, percent of budget
    #[arg(long)]
    pub yellow: Option<f64>,
    /// Over threshold, percent of budget
    #[arg(long)]
    pub red: Option<f64>,
}

impl ConfigArgs {
    fn is_empty(&self) -> bool {
        self.user1_name.is_none()
            && self.user2_name.is_none()
            && self.currency.is_none()
            && self.yellow.is_none()
            && self.red.is_none()
    }

    /// Apply the given options to `settings`
    pub fn apply(&self, settings: &mut Settings) -> TandemResult<()> {
        let thresholds = Thresholds {
            yellow: self.yellow.unwrap_or(settings.thresholds.yellow),
            red: self.red.unwrap_or(settings.thresholds.red),
        };
        thresholds
            .validate()
            .map_err(|e| TandemError::Validation(e.to_string()))?;

        let names = [&self.user1_name, &self.user2_name];
        if names.iter().any(|n| n.as_deref().is_some_and(|n| n.trim().is_empty())) {
            return Err(TandemError::Validation("Participant names cannot be empty".into()));
        }

        if let Some(name) = &self.user1_name {
            settings.user1_name = name.trim().to_string();
        }
        if let Some(name) = &self.user2_name {
            settings.user2_name = name.trim().to_string();
        }
        if let Some(symbol) = &self.currency {
            settings.currency_symbol = symbol.clone();
        }
        settings.thresholds = thresholds;
        Ok(())
    }
}

/// Handle the config command
pub fn handle_config_command(
    paths: &TandemPaths,
    settings: &mut Settings,
    args: ConfigArgs,
) -> TandemResult<()> {
    if !args.is_empty() {
        args.apply(settings)?;
        settings.save(paths)?;
        println!("Settings updated.");
        println!();
    }

    println!("Tandem Configuration");
    println!("====================");
    println!("Base directory: {}", paths.base_dir().display());
    println!("Data directory: {}", paths.data_dir().display());
    println!();
    println!("Settings:");
    println!("  Participants:      {} and {}", settings.user1_name, settings.user2_name);
    println!("  Currency symbol:   {}", settings.currency_symbol);
    println!("  Warning threshold: {}%", settings.thresholds.yellow);
    println!("  Over threshold:    {}%", settings.thresholds.red);

    Ok(())
}
