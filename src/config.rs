use anyhow::{Context, Result};
use std::time::Duration;

pub const DEFAULT_RESPONSE_TEXT: &str = "Thanks for your message! I'll get back to you soon.";

#[derive(Debug, Clone)]
pub struct Config {
    /// Id of the local user. Messages with this sender are "ours".
    pub self_id: String,
    /// Sender name used in reply snapshots of our own messages.
    pub self_label: String,
    pub response_delay: Duration,
    pub response_text: String,
    pub bus_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            self_id: "me".to_string(),
            self_label: "You".to_string(),
            response_delay: Duration::from_millis(1000),
            response_text: DEFAULT_RESPONSE_TEXT.to_string(),
            bus_capacity: 100,
        }
    }
}

impl Config {
    /// Build the config from `ZECHAT_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(id) = lookup("ZECHAT_SELF_ID") {
            config.self_id = id;
        }
        if let Some(label) = lookup("ZECHAT_SELF_LABEL") {
            config.self_label = label;
        }
        if let Some(ms) = lookup("ZECHAT_RESPONSE_DELAY_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .context("ZECHAT_RESPONSE_DELAY_MS must be a number of milliseconds")?;
            config.response_delay = Duration::from_millis(ms);
        }
        if let Some(text) = lookup("ZECHAT_RESPONSE_TEXT") {
            config.response_text = text;
        }
        if let Some(cap) = lookup("ZECHAT_BUS_CAPACITY") {
            config.bus_capacity = cap
                .trim()
                .parse()
                .context("ZECHAT_BUS_CAPACITY must be a positive integer")?;
            anyhow::ensure!(config.bus_capacity > 0, "ZECHAT_BUS_CAPACITY must be > 0");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.self_id, "me");
        assert_eq!(config.self_label, "You");
        assert_eq!(config.response_delay, Duration::from_secs(1));
        assert_eq!(config.response_text, DEFAULT_RESPONSE_TEXT);
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("ZECHAT_SELF_ID", "u42"),
            ("ZECHAT_RESPONSE_DELAY_MS", " 250 "),
            ("ZECHAT_BUS_CAPACITY", "16"),
        ]))
        .unwrap();
        assert_eq!(config.self_id, "u42");
        assert_eq!(config.response_delay, Duration::from_millis(250));
        assert_eq!(config.bus_capacity, 16);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("ZECHAT_RESPONSE_DELAY_MS", "soon")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("ZECHAT_BUS_CAPACITY", "0")])).is_err());
    }
}
