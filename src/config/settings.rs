use std::env;
use config::{Config, File, ConfigError};
use dotenv::dotenv;
use secrecy::{ExposeSecret, SecretString};
use chrono_tz::Tz;

use crate::game::points::PointsConfiguration;

#[derive(serde::Deserialize, Debug)]
pub struct Settings{
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub provider: ProviderSettings,
    pub scheduler: SchedulerSettings,
    #[serde(default)]
    pub scoring: PointsConfiguration,
}

#[derive(serde::Deserialize, Debug)]
pub struct DatabaseSettings{
    pub user: String,
    pub password: SecretString,
    pub port: u16,
    pub host: String,
    pub db_name: String,
    #[serde(default)]
    pub db_url: Option<SecretString>
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> SecretString {
        match &self.db_url {
            Some(db_url) => db_url.clone(),
            None => {
                SecretString::new(format!(
                    "postgres://{}:{}@{}:{}/{}",
                    self.user, self.password.expose_secret(), self.host, self.port, self.db_name
                ).into_boxed_str())
            }
        }
    }
}

#[derive(serde::Deserialize, Debug)]
pub struct ApplicationSettings{
    pub name: String,
    pub log_level: String,
    /// IANA zone of the tournament, e.g. "Europe/Madrid"
    pub timezone: String,
}

impl ApplicationSettings {
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|e| {
            ConfigError::Message(format!("invalid application.timezone '{}': {}", self.timezone, e))
        })
    }
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ProviderSettings {
    pub base_url: String,
    /// Path appended to `base_url`; `{round}` is replaced by the round number
    pub round_path: String,
    pub timeout_secs: u64,
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,
}

fn default_max_rounds() -> u32 {
    16
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    /// Cron expressions (with seconds) for the current round recompute
    pub recompute_crons: Vec<String>,
    pub probe_cron: String,
    pub sweep_cron: String,
    pub sweep_window_start_hour: u32,
    pub sweep_window_end_hour: u32,
    pub ledger_purge_cron: String,
    pub ledger_retention_days: i64,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            recompute_crons: vec!["0 0 6 * * *".to_string(), "0 0 18 * * *".to_string()],
            probe_cron: "0 0 11 * * *".to_string(),
            sweep_cron: "0 */5 * * * *".to_string(),
            sweep_window_start_hour: 15,
            sweep_window_end_hour: 1,
            ledger_purge_cron: "0 30 3 * * *".to_string(),
            ledger_retention_days: 30,
        }
    }
}

pub fn get_config() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    dotenv().ok();

    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let env_filename = format!("{}.yml", environment.as_str());
    let config = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yml")))
        .add_source(File::from(configuration_directory.join(env_filename)))
        .add_source(
            config::Environment::default()
                .prefix("POSTGRES")
                .prefix_separator("__")
                .separator("__")
        )
        .add_source(
            config::Environment::default()
                .prefix("APP")
                .prefix_separator("__")
                .separator("__")
        )
        .build()?;

    let mut settings = config.try_deserialize::<Settings>()?;

    // Hosted environments expose the DATABASE_URL directly
    if let Ok(db_url) = env::var("DATABASE_URL") {
        settings.database.db_url = Some(SecretString::new(db_url.into_boxed_str()));
    }

    // Fail early on a bad zone rather than on the first scheduled tick
    settings.application.timezone()?;

    Ok(settings)
}

#[derive(Debug, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. \
                Use either `local` or `production`.",
                other
            )),
        }
    }
}
