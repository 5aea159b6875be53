use super::Config;

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Config {
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("PLANWRIGHT_DRY_RUN")
            && let Some(enabled) = parse_flag(&value)
        {
            self.execution.dry_run = enabled;
        }

        if let Ok(value) = std::env::var("PLANWRIGHT_VERBOSE")
            && let Some(enabled) = parse_flag(&value)
        {
            self.execution.verbose = enabled;
        }

        if let Ok(level) = std::env::var("PLANWRIGHT_LOG_LEVEL")
            && !level.is_empty()
        {
            self.logging.level = level;
        }

        if let Ok(value) = std::env::var("PLANWRIGHT_ACTION_TIMEOUT_MS")
            && let Ok(millis) = value.parse::<u64>()
            && millis > 0
        {
            self.execution.action_timeout_ms = Some(millis);
        }
    }
}
