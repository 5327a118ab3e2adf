use chrono_tz::Tz;
use once_cell::sync::Lazy;
use secrecy::SecretString;
use std::sync::Arc;

use matchday_engine::config::settings::{
    ApplicationSettings, DatabaseSettings, ProviderSettings, SchedulerSettings, Settings,
};
use matchday_engine::game::points::PointsConfiguration;
use matchday_engine::telemetry::{get_subscriber, init_subscriber};
use matchday_engine::{build_engine, Engine, EngineParts};

use super::fakes::{FakeProvider, FakeRegistry, MemoryStore, RecordingReporter};

pub const TIMEZONE: Tz = chrono_tz::Europe::Madrid;

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub fn init_tracing() {
    Lazy::force(&TRACING);
}

pub fn test_settings(max_rounds: u32) -> Settings {
    Settings {
        database: DatabaseSettings {
            user: "postgres".to_string(),
            password: SecretString::new("password".to_string().into_boxed_str()),
            port: 5432,
            host: "127.0.0.1".to_string(),
            db_name: "matchday_test".to_string(),
            db_url: None,
        },
        application: ApplicationSettings {
            name: "test".to_string(),
            log_level: "info".to_string(),
            timezone: TIMEZONE.name().to_string(),
        },
        provider: ProviderSettings {
            base_url: "http://127.0.0.1:9090".to_string(),
            round_path: "/matchdays/{round}".to_string(),
            timeout_secs: 5,
            max_rounds,
        },
        scheduler: SchedulerSettings::default(),
        scoring: PointsConfiguration::default(),
    }
}

/// Engine wired against in-memory collaborators
pub struct TestEngine {
    pub provider: Arc<FakeProvider>,
    pub store: Arc<MemoryStore>,
    pub registry: Arc<FakeRegistry>,
    pub reporter: Arc<RecordingReporter>,
    pub engine: Engine,
}

pub fn spawn_engine(max_rounds: u32) -> TestEngine {
    spawn_engine_with(test_settings(max_rounds))
}

pub fn spawn_engine_with(settings: Settings) -> TestEngine {
    init_tracing();

    let provider = Arc::new(FakeProvider::default());
    let store = Arc::new(MemoryStore::default());
    let registry = Arc::new(FakeRegistry::default());
    let reporter = Arc::new(RecordingReporter::default());

    let parts = EngineParts {
        provider: provider.clone(),
        round_config: store.clone(),
        predictions: store.clone(),
        points: store.clone(),
        executions: store.clone(),
        registry: registry.clone(),
        reporter: reporter.clone(),
    };
    let engine = build_engine(&settings, TIMEZONE, parts);

    TestEngine {
        provider,
        store,
        registry,
        reporter,
        engine,
    }
}
