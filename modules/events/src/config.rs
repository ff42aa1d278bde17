use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::tags::EmptyTagPolicy;
use crate::domain::validate::parse_price;

/// Configuration for the events module (key `events` under `modules`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EventsConfig {
    /// Base URL relative photo references are joined onto.
    #[serde(default = "default_media_base_url")]
    pub media_base_url: String,
    /// Price applied when a create request omits it; `None` keeps it null.
    #[serde(default)]
    pub default_price: Option<Decimal>,
    #[serde(default)]
    pub empty_tag_policy: EmptyTagPolicy,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            media_base_url: default_media_base_url(),
            default_price: None,
            empty_tag_policy: EmptyTagPolicy::default(),
        }
    }
}

impl EventsConfig {
    /// `default_price` checked against the same rules as request prices.
    pub fn checked_default_price(&self) -> anyhow::Result<Option<Decimal>> {
        self.default_price
            .map(|p| {
                parse_price(&p.to_string())
                    .map_err(|e| anyhow::anyhow!("Invalid events default_price '{p}': {e}"))
            })
            .transpose()
    }
}

fn default_media_base_url() -> String {
    "http://127.0.0.1:8000/media/".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = EventsConfig::default();
        assert_eq!(cfg.media_base_url, "http://127.0.0.1:8000/media/");
        assert_eq!(cfg.default_price, None);
        assert_eq!(cfg.empty_tag_policy, EmptyTagPolicy::Reject);
    }

    #[test]
    fn parses_partial_json() {
        let cfg: EventsConfig = serde_json::from_str(
            r#"{"default_price": "0.00", "empty_tag_policy": "drop"}"#,
        )
        .unwrap();
        assert_eq!(cfg.default_price, Some(Decimal::new(0, 2)));
        assert_eq!(cfg.empty_tag_policy, EmptyTagPolicy::Drop);
        assert_eq!(cfg.media_base_url, default_media_base_url());
    }

    #[test]
    fn default_price_follows_price_rules() {
        let with = |raw: &str| EventsConfig {
            default_price: Some(raw.parse().unwrap()),
            ..Default::default()
        };
        assert_eq!(
            with("7.5").checked_default_price().unwrap(),
            Some(Decimal::new(75, 1))
        );
        assert_eq!(EventsConfig::default().checked_default_price().unwrap(), None);

        let err = with("-1").checked_default_price().unwrap_err().to_string();
        assert!(err.contains("greater than or equal to 0"), "{err}");
        let err = with("1.234").checked_default_price().unwrap_err().to_string();
        assert!(err.contains("decimal places"), "{err}");
        assert!(with("123456789.50").checked_default_price().is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let res: Result<EventsConfig, _> = serde_json::from_str(r#"{"page_size": 10}"#);
        assert!(res.is_err());
    }
}
