//! Maps the config file onto the runtime client configuration.

use std::time::Duration;

use supa_config::SupaConfig;
use supa_realtime::{RealtimeConfig, WebSocketOptions};

pub fn realtime_config(config: &SupaConfig) -> RealtimeConfig {
    let realtime = &config.realtime;
    RealtimeConfig {
        host: config.project.host.clone(),
        api_key: config.project.api_key.clone(),
        secure: realtime.secure,
        heartbeat_interval: Duration::from_secs(realtime.heartbeat_interval_secs),
        custom_url: realtime.custom_url.clone(),
        connect_timeout: Duration::from_secs(realtime.connect_timeout_secs),
        join_timeout: Duration::from_secs(realtime.join_timeout_secs),
        websocket: WebSocketOptions {
            subprotocols: realtime.websocket.subprotocols.clone(),
            max_message_size: realtime.websocket.max_message_size,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_every_field() {
        let mut config = SupaConfig::default();
        config.project.host = "abcdefgh.supabase.co".into();
        config.project.api_key = "anon".into();
        config.realtime.secure = false;
        config.realtime.heartbeat_interval_secs = 30;
        config.realtime.join_timeout_secs = 5;
        config.realtime.websocket.subprotocols = vec!["phoenix".into()];
        config.realtime.websocket.max_message_size = Some(1 << 20);

        let realtime = realtime_config(&config);

        assert_eq!(realtime.heartbeat_interval, Duration::from_secs(30));
        assert_eq!(realtime.join_timeout, Duration::from_secs(5));
        assert_eq!(realtime.connect_timeout, Duration::from_secs(15));
        assert_eq!(realtime.websocket.subprotocols, vec!["phoenix"]);
        assert_eq!(realtime.websocket.max_message_size, Some(1 << 20));
        assert_eq!(
            realtime.realtime_url(),
            "ws://abcdefgh.supabase.co/realtime/v1/websocket?apikey=anon"
        );
    }

    #[test]
    fn defaults_match_client_defaults() {
        let realtime = realtime_config(&SupaConfig::default());
        let client_defaults = RealtimeConfig::default();
        assert_eq!(realtime.secure, client_defaults.secure);
        assert_eq!(realtime.heartbeat_interval, client_defaults.heartbeat_interval);
        assert_eq!(realtime.connect_timeout, client_defaults.connect_timeout);
        assert_eq!(realtime.join_timeout, client_defaults.join_timeout);
    }
}
