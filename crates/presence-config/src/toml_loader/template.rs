//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub fn default_config_toml() -> String {
    r##"# presence-relay configuration
# Only override what you want to change -- missing fields use defaults.

[server]
# bind = "0.0.0.0"
# port = 8085            # 1-65535
# ws_path = "/ws"
# static_dir = "public"  # serve dashboard assets from this directory

[feed]
# source = "none"        # none, serial, stdin, websocket
# device = "/dev/ttyUSB0" # or COM3 on Windows
# baud_rate = 115200
# url = "ws://192.168.4.1:81"    # sensor WebSocket server (source = "websocket")
# reconnect_delay_secs = 5       # 0-3600, 0 = do not redial

[classifier]
# preset = "full"        # full, keyword
# rules = ["structured_count", "structured_flag", "key_value", "csv", "keyword"]

[broadcast]
# heartbeat_interval_secs = 15   # 1-3600
# observer_queue = 64            # 1-4096
# send_timeout_ms = 5000         # 100-60000
# tag_field = "kind"             # kind, type

[logging]
# level = "info"         # trace, debug, info, warn, error
"##
    .to_string()
}
