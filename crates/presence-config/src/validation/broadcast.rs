use crate::schema::RelayConfig;

use super::helpers::validate_range;

pub(crate) fn validate_broadcast(errors: &mut Vec<String>, config: &RelayConfig) {
    let broadcast = &config.broadcast;
    validate_range(
        errors,
        "broadcast.heartbeat_interval_secs",
        broadcast.heartbeat_interval_secs,
        1,
        3600,
    );
    validate_range(
        errors,
        "broadcast.observer_queue",
        broadcast.observer_queue as u64,
        1,
        4096,
    );
    validate_range(
        errors,
        "broadcast.send_timeout_ms",
        broadcast.send_timeout_ms,
        100,
        60_000,
    );
}
