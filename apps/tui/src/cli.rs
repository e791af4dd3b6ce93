use clap::{CommandFactory, Parser};
use co2_dashboard::{FilterField, FilterState};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "co2-dashboard", version, about = "CO2 emissions dashboard")]
pub struct CliArgs {
    /// Print stats and exit
    #[arg(long)]
    pub headless: bool,

    /// Print headless stats as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Statistics service base URL
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// Number of top emitters to request
    #[arg(long = "top-n", value_name = "N")]
    pub top_n: Option<usize>,

    /// Write logs to this file
    #[arg(long = "log-file", value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Initial year filter
    #[arg(long, value_name = "YEAR")]
    pub year: Option<String>,

    /// Initial region filter
    #[arg(long, value_name = "REGION")]
    pub region: Option<String>,

    /// Initial category filter
    #[arg(long, value_name = "CATEGORY")]
    pub category: Option<String>,
}

impl CliArgs {
    pub fn apply_env_overrides(&self) {
        if let Some(url) = &self.api_url {
            std::env::set_var("CO2_API_URL", url);
        }
        if let Some(n) = self.top_n {
            std::env::set_var("CO2_TOP_N", n.to_string());
        }
        if let Some(path) = &self.log_file {
            std::env::set_var("CO2_LOG_FILE", path);
        }
        if self.debug {
            std::env::set_var("DEBUG", "1");
        }
    }

    /// Filter selection requested on the command line.
    pub fn initial_filters(&self) -> FilterState {
        let mut filters = FilterState::default();
        let fields = [
            (FilterField::Year, &self.year),
            (FilterField::Region, &self.region),
            (FilterField::Category, &self.category),
        ];
        for (field, value) in fields {
            if let Some(value) = value {
                filters.set(field, value.as_str());
            }
        }
        filters
    }

    pub fn help_text() -> String {
        let mut command = Self::command();
        let mut buffer = Vec::new();
        command.write_help(&mut buffer).ok();
        String::from_utf8_lossy(&buffer).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_filters_from_flags() {
        let args = CliArgs::parse_from(["co2-dashboard", "--year", "2021", "--region", "ANDINA"]);
        let filters = args.initial_filters();
        assert_eq!(filters.get(FilterField::Year), "2021");
        assert_eq!(filters.get(FilterField::Region), "ANDINA");
        assert!(!filters.is_active(FilterField::Category));
    }

    #[test]
    fn no_flags_means_unfiltered() {
        let args = CliArgs::parse_from(["co2-dashboard", "--headless"]);
        assert!(args.headless);
        assert!(args.initial_filters().is_unfiltered());
    }

    #[test]
    fn help_mentions_api_url() {
        assert!(CliArgs::help_text().contains("--api-url"));
    }
}
