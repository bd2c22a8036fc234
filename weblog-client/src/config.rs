use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// Websocket endpoint the weblog producer publishes on.
    pub weblog_ws_url: String,
    /// Delay before the first reconnect attempt.
    pub reconnect_initial: Duration,
    /// Cap for the exponential reconnect backoff.
    pub reconnect_max: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            weblog_ws_url: env_str("WEBLOG_WS_URL", "ws://localhost:8765/ws"),
            reconnect_initial: Duration::from_millis(env_parse(
                "WEBLOG_RECONNECT_INITIAL_MS",
                500,
            )?),
            reconnect_max: Duration::from_millis(env_parse("WEBLOG_RECONNECT_MAX_MS", 30_000)?),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Failed to parse env var {key}={val}: {e}")),
        Err(_) => Ok(default),
    }
}
