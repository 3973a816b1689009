pub struct YahooApiConfig {
    pub timeout_ms: u64,
    pub retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for YahooApiConfig {
    fn default() -> Self {
        Self {
            timeout_ms: YAHOO.client.timeout_ms,
            retries: YAHOO.client.retries,
            backoff_ms: YAHOO.client.backoff_ms,
            max_backoff_ms: YAHOO.client.max_backoff_ms,
        }
    }
}

/// REST constraints: request budget per minute and fetch concurrency.
pub struct RestLimits {
    pub requests_per_minute: u32,
    pub chart_call_weight: u32,
    pub concurrent_fetch_tasks: usize,
}

pub struct ClientDefaults {
    pub timeout_ms: u64,
    /// Extra attempts after the first, only for rate-limit / transport failures.
    pub retries: u32,
    pub backoff_ms: u64,
    pub max_backoff_ms: u64,
}

pub struct YahooConfig {
    pub chart_base_url: &'static str,
    pub user_agent: &'static str,
    pub limits: RestLimits,
    pub client: ClientDefaults,
}

pub const YAHOO: YahooConfig = YahooConfig {
    chart_base_url: "https://query1.finance.yahoo.com/v8/finance/chart",
    // The chart endpoint rejects requests without a browser-like agent.
    user_agent: "Mozilla/5.0 (X11; Linux x86_64) sentiment-move/0.1",
    limits: RestLimits {
        requests_per_minute: 120,
        chart_call_weight: 1,
        concurrent_fetch_tasks: 8,
    },
    client: ClientDefaults {
        timeout_ms: 10_000,
        retries: 3,
        backoff_ms: 2_000,
        max_backoff_ms: 60_000,
    },
};
