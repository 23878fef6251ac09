use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use imgedit_engine::EngineConfig;
use imgedit_events::WebhookConfig;
use imgedit_pipeline::PipelineConfig;
use imgedit_worker::RunnerConfig;

/// Error raised when the environment does not describe a runnable server.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Server configuration loaded from environment variables.
///
/// Everything except `ENGINE_URL` has a default suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds. Longer than the engine timeout so a
    /// slow synchronous turn surfaces the engine's own error.
    pub request_timeout_secs: u64,
    /// Time workers get to drain the task queue on shutdown.
    pub shutdown_timeout_secs: u64,
    pub engine: EngineConfig,
    pub images: PipelineConfig,
    pub runner: RunnerConfig,
    pub webhook: WebhookConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                    | Default                    |
    /// |----------------------------|----------------------------|
    /// | `HOST`                     | `0.0.0.0`                  |
    /// | `PORT`                     | `8000`                     |
    /// | `CORS_ORIGINS`             | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS`     | `330`                      |
    /// | `SHUTDOWN_TIMEOUT_SECS`    | `30`                       |
    /// | `ENGINE_URL`               | required                   |
    /// | `ENGINE_API_KEY`           | unset                      |
    /// | `ENGINE_TIMEOUT_SECS`      | `300`                      |
    /// | `HTTP_PROXY_URL`           | unset                      |
    /// | `IMAGE_OUTPUT_DIR`         | `/data/outputs`            |
    /// | `IMAGE_BASE_URL`           | unset (serve at `/images`) |
    /// | `IMAGE_FETCH_TIMEOUT_SECS` | `30`                       |
    /// | `TASK_WORKERS`             | `4`                        |
    /// | `TASK_QUEUE_CAPACITY`      | `64`                       |
    /// | `WEBHOOK_TIMEOUT_SECS`     | `10`                       |
    /// | `WEBHOOK_BASE_DELAY_MS`    | `1000`                     |
    /// | `WEBHOOK_MAX_ATTEMPTS`     | `3`                        |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`ServerConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let cors_origins = env
            .string("CORS_ORIGINS")
            .unwrap_or_else(|| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let proxy = env.string("HTTP_PROXY_URL");

        let engine_url = env
            .string("ENGINE_URL")
            .ok_or(ConfigError::Missing("ENGINE_URL"))?;
        let mut engine = EngineConfig::new(engine_url);
        engine.api_key = env.string("ENGINE_API_KEY");
        engine.timeout = Duration::from_secs(env.parse("ENGINE_TIMEOUT_SECS", 300)?);
        engine.proxy = proxy.clone();

        let images = PipelineConfig {
            output_dir: env
                .string("IMAGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PipelineConfig::default().output_dir),
            base_url: env.string("IMAGE_BASE_URL"),
            proxy,
            timeout: Duration::from_secs(env.parse("IMAGE_FETCH_TIMEOUT_SECS", 30)?),
        };

        let webhook = WebhookConfig {
            request_timeout: Duration::from_secs(env.parse("WEBHOOK_TIMEOUT_SECS", 10)?),
            base_delay: Duration::from_millis(env.parse("WEBHOOK_BASE_DELAY_MS", 1000)?),
            max_attempts: env.parse("WEBHOOK_MAX_ATTEMPTS", 3)?,
        };

        let runner = RunnerConfig {
            workers: env.parse("TASK_WORKERS", 4)?,
            queue_capacity: env.parse("TASK_QUEUE_CAPACITY", 64)?,
            webhook_max_attempts: webhook.max_attempts,
        };

        Ok(Self {
            host: env.string("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: env.parse("PORT", 8000)?,
            cors_origins,
            request_timeout_secs: env.parse("REQUEST_TIMEOUT_SECS", 330)?,
            shutdown_timeout_secs: env.parse("SHUTDOWN_TIMEOUT_SECS", 30)?,
            engine,
            images,
            runner,
            webhook,
        })
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Trimmed value; blank counts as unset.
    fn string(&self, var: &str) -> Option<String> {
        (self.0)(var)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.string(var) {
            None => Ok(default),
            Some(value) => value.parse().map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        }
    }
}
