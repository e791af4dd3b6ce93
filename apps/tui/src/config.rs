use crate::api::TopEmittersParams;
use crate::normalize::ShapeSchema;
use color_eyre::eyre::eyre;
use dotenv::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_FALLBACK_YEARS: [i32; 4] = [2020, 2021, 2022, 2023];

/// Process-wide settings, resolved once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub request_timeout: Duration,
    pub top_emitters: TopEmittersParams,
    pub fallback_years: Vec<i32>,
    pub container_aliases: Vec<String>,
    pub value_aliases: Vec<String>,
    pub name_aliases: Vec<String>,
    pub log_file: Option<PathBuf>,
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            top_emitters: TopEmittersParams::default(),
            fallback_years: DEFAULT_FALLBACK_YEARS.to_vec(),
            container_aliases: Vec::new(),
            value_aliases: Vec::new(),
            name_aliases: Vec::new(),
            log_file: None,
            debug: false,
        }
    }
}

impl AppConfig {
    /// Built-in payload aliases plus any configured extras.
    pub fn shape_schema(&self) -> ShapeSchema {
        let schema = self
            .container_aliases
            .iter()
            .fold(ShapeSchema::default(), |schema, key| schema.with_container(key));
        let schema = self
            .value_aliases
            .iter()
            .fold(schema, |schema, alias| schema.with_value_alias(alias));
        self.name_aliases
            .iter()
            .fold(schema, |schema, alias| schema.with_name_alias(alias))
    }
}

/// Initializes the application configuration from `.env` and the environment
pub fn init_app_config() -> color_eyre::eyre::Result<AppConfig> {
    // Load environment variables from .env file
    dotenv().ok();

    let defaults = AppConfig::default();

    let api_base_url = env::var("CO2_API_URL").unwrap_or(defaults.api_base_url);
    validate_base_url(&api_base_url)?;

    let request_timeout = match env::var("CO2_API_TIMEOUT_SECS") {
        Ok(raw) => Duration::from_secs(
            raw.trim()
                .parse()
                .map_err(|e| eyre!("Invalid CO2_API_TIMEOUT_SECS {raw}: {e}"))?,
        ),
        Err(_) => defaults.request_timeout,
    };

    let top_n = match env::var("CO2_TOP_N") {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| eyre!("Invalid CO2_TOP_N {raw}: {e}"))?,
        Err(_) => defaults.top_emitters.n,
    };
    let top_by = env::var("CO2_TOP_BY")
        .ok()
        .filter(|by| !by.trim().is_empty())
        .unwrap_or(defaults.top_emitters.by);

    let fallback_years = match env::var("CO2_FALLBACK_YEARS") {
        Ok(raw) => parse_years(&raw)?,
        Err(_) => defaults.fallback_years,
    };

    let container_aliases = env::var("CO2_CONTAINER_ALIASES")
        .map(|raw| parse_list(&raw))
        .unwrap_or_default();
    let value_aliases = env::var("CO2_VALUE_ALIASES")
        .map(|raw| parse_list(&raw))
        .unwrap_or_default();
    let name_aliases = env::var("CO2_NAME_ALIASES")
        .map(|raw| parse_list(&raw))
        .unwrap_or_default();

    let log_file = env::var("CO2_LOG_FILE")
        .ok()
        .filter(|path| !path.trim().is_empty())
        .map(PathBuf::from);

    let debug = env::var("DEBUG").is_ok_and(|value| value != "0" && !value.is_empty());

    Ok(AppConfig {
        api_base_url,
        request_timeout,
        top_emitters: TopEmittersParams {
            n: top_n,
            by: top_by,
        },
        fallback_years,
        container_aliases,
        value_aliases,
        name_aliases,
        log_file,
        debug,
    })
}

/// Accepts only absolute `http`/`https` URLs; `localhost:8000` parses as
/// scheme `localhost` and must be rejected here.
pub fn validate_base_url(raw: &str) -> color_eyre::eyre::Result<Url> {
    let url = Url::parse(raw).map_err(|e| eyre!("Invalid CO2_API_URL {raw}: {e}"))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err(eyre!("Invalid CO2_API_URL {raw}: missing host")),
        scheme => Err(eyre!(
            "Invalid CO2_API_URL {raw}: unsupported scheme '{scheme}', expected http or https"
        )),
    }
}

/// Parses a comma separated year list such as `2020,2021`.
pub fn parse_years(raw: &str) -> color_eyre::eyre::Result<Vec<i32>> {
    parse_list(raw)
        .iter()
        .map(|year| {
            year.parse::<i32>()
                .map_err(|e| eyre!("Invalid year {year}: {e}"))
        })
        .collect()
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_service_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8000");
        assert_eq!(config.fallback_years, vec![2020, 2021, 2022, 2023]);
        assert_eq!(config.top_emitters.n, 10);
        assert_eq!(config.top_emitters.by, "REGION");
    }

    #[test]
    fn base_url_requires_http_scheme() {
        assert!(validate_base_url("http://localhost:8000").is_ok());
        assert!(validate_base_url("https://stats.example.org/api/").is_ok());

        let err = validate_base_url("localhost:8000").unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'localhost'"));
        assert!(validate_base_url("ftp://localhost").is_err());
        assert!(validate_base_url("not a url").is_err());
    }

    #[test]
    fn parse_years_accepts_spacing() {
        assert_eq!(parse_years(" 2019, 2020 ,,2021").ok(), Some(vec![2019, 2020, 2021]));
        assert!(parse_years("2020,twenty").is_err());
    }

    #[test]
    fn shape_schema_appends_configured_aliases() {
        let config = AppConfig {
            container_aliases: vec!["emissions".to_string()],
            value_aliases: vec!["total_emissions".to_string()],
            name_aliases: vec!["SECTOR".to_string()],
            ..AppConfig::default()
        };
        let schema = config.shape_schema();
        assert_eq!(
            schema.value_keys().last().map(String::as_str),
            Some("total_emissions")
        );
        assert_eq!(schema.name_keys().last().map(String::as_str), Some("SECTOR"));
        assert_eq!(schema.containers().first().map(String::as_str), Some("time_series"));
        assert_eq!(schema.containers().last().map(String::as_str), Some("emissions"));

        let payload = serde_json::json!({"emissions": [{"SECTOR": "A", "total_emissions": 3}]});
        let series = schema.normalize(&payload, "name");
        assert_eq!(series.name_key, "SECTOR");
        assert_eq!(series.points(), vec![("A".to_string(), 3.0)]);
    }
}
