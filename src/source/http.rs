use std::time::Duration;

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(default)
}

fn connect_timeout() -> Duration {
    Duration::from_secs(env_u64("RTASKSYNC_HTTP_CONNECT_TIMEOUT_SECS", 5).max(1))
}

fn request_timeout() -> Duration {
    Duration::from_secs(env_u64("RTASKSYNC_HTTP_TIMEOUT_SECS", 30).max(1))
}

fn user_agent() -> String {
    format!("rtasksync/{}", env!("CARGO_PKG_VERSION"))
}

/// Client with harmonized defaults shared by both adapters.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(user_agent())
        .connect_timeout(connect_timeout())
        .timeout(request_timeout())
        .build()
        .unwrap_or_else(|e| {
            log::warn!("falling back to default http client: {e}");
            reqwest::Client::new()
        })
}
