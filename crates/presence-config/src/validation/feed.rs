use super::helpers::validate_range;
use crate::schema::{FeedSource, RelayConfig, SUPPORTED_BAUD_RATES};

pub(crate) fn validate_feed(errors: &mut Vec<String>, config: &RelayConfig) {
    let feed = &config.feed;
    match feed.source {
        FeedSource::Serial => {
            if feed.device.trim().is_empty() {
                errors.push("feed.device must not be empty when feed.source = \"serial\"".into());
            }
            if !SUPPORTED_BAUD_RATES.contains(&feed.baud_rate) {
                errors.push(format!(
                    "feed.baud_rate = {} is not one of {:?}",
                    feed.baud_rate, SUPPORTED_BAUD_RATES
                ));
            }
        }
        FeedSource::WebSocket => {
            if !(feed.url.starts_with("ws://") || feed.url.starts_with("wss://")) {
                errors.push(format!(
                    "feed.url = {:?} must start with ws:// or wss://",
                    feed.url
                ));
            }
            validate_range(
                errors,
                "feed.reconnect_delay_secs",
                feed.reconnect_delay_secs,
                0,
                3600,
            );
        }
        FeedSource::None | FeedSource::Stdin => {}
    }
}
