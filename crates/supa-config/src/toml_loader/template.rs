//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# supa-realtime configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[project]
# host = "abcdefgh.supabase.co"
# api_key = "your-anon-key"

[realtime]
# secure = true                  # wss when true, ws when false
# heartbeat_interval_secs = 10   # 1-300
# custom_url = "wss://example.com/realtime/v1/websocket?apikey=..."
# connect_timeout_secs = 15      # 1-120
# join_timeout_secs = 10         # 1-120

[realtime.websocket]
# subprotocols = []
# max_message_size = 16777216

[logging]
# level = "info"                 # trace, debug, info, warn, error
"##
    .to_string()
}
