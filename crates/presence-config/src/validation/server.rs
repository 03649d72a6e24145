use crate::schema::RelayConfig;

use super::helpers::validate_range;

pub(crate) fn validate_server(errors: &mut Vec<String>, config: &RelayConfig) {
    let server = &config.server;
    validate_range(errors, "server.port", u64::from(server.port), 1, 65535);

    if server.bind.trim().is_empty() {
        errors.push("server.bind must not be empty".into());
    }
    if !server.ws_path.starts_with('/') {
        errors.push(format!(
            "server.ws_path = {:?} must start with '/'",
            server.ws_path
        ));
    }
    if server.ws_path.starts_with("/api/") {
        errors.push(format!(
            "server.ws_path = {:?} collides with the /api routes",
            server.ws_path
        ));
    }
}
