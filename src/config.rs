use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// EvalLab Workbench: serves the evaluation workbench over a JSON API.
#[derive(Parser, Debug, Clone)]
#[command(name = "evallab-workbench")]
pub struct CliArgs {
    /// Static JSON fixture to serve data from (ignored when --api-base is set)
    #[arg(short = 'f', long = "fixture", default_value = DEFAULT_FIXTURE_PATH)]
    pub fixture: PathBuf,

    /// Evaluation REST API to use instead of the fixture
    #[arg(long = "api-base")]
    pub api_base: Option<Url>,

    /// Datasets REST API
    #[arg(long = "datasets-api", default_value = DEFAULT_API_BASE)]
    pub datasets_api: Url,

    /// Workbench HTTP port
    #[arg(long = "port", default_value_t = DEFAULT_WORKBENCH_PORT)]
    pub port: u16,

    /// Directory for persisted settings (defaults to the local data dir)
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Timeout applied to every backend fetch; unset waits indefinitely
    #[arg(long = "fetch-timeout-ms")]
    pub fetch_timeout_ms: Option<u64>,

    /// Simulated run latency of the fixture backend
    #[arg(long = "run-delay-ms", default_value_t = FIXTURE_RUN_DELAY_MS)]
    pub run_delay_ms: u64,

    /// Simulated per-model latency of fixture comparisons
    #[arg(long = "compare-delay-ms", default_value_t = FIXTURE_COMPARE_DELAY_MS)]
    pub compare_delay_ms: u64,

    /// Also write logs to this file
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BackendConfig {
    Fixture {
        path: PathBuf,
        run_delay: Duration,
        compare_delay: Duration,
    },
    Http {
        base: Url,
    },
}

#[derive(Debug, Clone)]
pub struct WorkbenchConfig {
    pub backend: BackendConfig,
    pub datasets_api: Url,
    pub port: u16,
    pub data_dir: PathBuf,
    pub fetch_timeout: Option<Duration>,
    pub log_file: Option<PathBuf>,
}

// Port and endpoint defaults
pub const DEFAULT_WORKBENCH_PORT: u16 = 8090;
pub const DEFAULT_API_BASE: &str = "http://localhost:8080/api";
pub const DEFAULT_FIXTURE_PATH: &str = "mock-data.json";

// Fixture backend simulation
pub const FIXTURE_RUN_DELAY_MS: u64 = 2000;
pub const FIXTURE_COMPARE_DELAY_MS: u64 = 3000;

// Comparison bounds
pub const COMPARE_MIN_MODELS: usize = 2;
pub const COMPARE_MAX_MODELS: usize = 5;

// Catalog
pub const RECENT_PROJECTS_LIMIT: usize = 5;

// Settings
pub const SETTINGS_FILE_NAME: &str = "workbench-settings.json";
pub const DEFAULT_COST_PER_1K_TOKENS: f64 = 0.002;

// Activity feed
pub const ACTIVITY_BUFFER_SIZE: usize = 500;

// HTTP client
pub const HTTP_CLIENT_POOL_IDLE_PER_HOST: usize = 4;

impl WorkbenchConfig {
    pub fn from_args(args: CliArgs) -> Self {
        let backend = match args.api_base {
            Some(base) => BackendConfig::Http { base },
            None => BackendConfig::Fixture {
                path: args.fixture,
                run_delay: Duration::from_millis(args.run_delay_ms),
                compare_delay: Duration::from_millis(args.compare_delay_ms),
            },
        };

        let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

        WorkbenchConfig {
            backend,
            datasets_api: args.datasets_api,
            port: args.port,
            data_dir,
            fetch_timeout: args.fetch_timeout_ms.map(Duration::from_millis),
            log_file: args.log_file,
        }
    }

    /// Fixture path, when serving from one. Dataset listing falls back to it.
    pub fn fixture_path(&self) -> Option<&PathBuf> {
        match &self.backend {
            BackendConfig::Fixture { path, .. } => Some(path),
            BackendConfig::Http { .. } => None,
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("evallab-workbench")
}
