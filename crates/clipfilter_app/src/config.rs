use clipfilter_engine::EngineSettings;

const BACKEND_URL_VAR: &str = "CLIPFILTER_BACKEND_URL";
const VIDEO_URL_VAR: &str = "CLIPFILTER_VIDEO_URL";

/// Application configuration loaded from environment variables.
///
/// | Env Var                  | Default                  |
/// |--------------------------|--------------------------|
/// | `CLIPFILTER_BACKEND_URL` | `http://localhost:8080`  |
/// | `CLIPFILTER_VIDEO_URL`   | empty                    |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub backend_url: String,
    /// Pre-filled into the form; the user can still type another url.
    pub default_video_url: String,
}

impl AppConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        Self {
            backend_url: read(BACKEND_URL_VAR)
                .unwrap_or_else(|| EngineSettings::default().base_url),
            default_video_url: read(VIDEO_URL_VAR).unwrap_or_default(),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings::with_base_url(self.backend_url.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_use_defaults() {
        let config = AppConfig::from_lookup(|_| None);
        assert_eq!(config.backend_url, "http://localhost:8080");
        assert_eq!(config.default_video_url, "");
    }

    #[test]
    fn variables_are_trimmed_and_blank_ignored() {
        let config = AppConfig::from_lookup(|key| match key {
            BACKEND_URL_VAR => Some(" http://media.internal:9000 ".to_string()),
            VIDEO_URL_VAR => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.backend_url, "http://media.internal:9000");
        assert_eq!(config.default_video_url, "");
    }

    #[test]
    fn engine_settings_keep_default_cadence() {
        let config = AppConfig::from_lookup(|key| {
            (key == BACKEND_URL_VAR).then(|| "http://media.internal:9000".to_string())
        });
        let settings = config.engine_settings();
        assert_eq!(settings.base_url, "http://media.internal:9000");
        assert_eq!(settings.poll_interval, EngineSettings::default().poll_interval);
        assert!(settings.validate().is_ok());
    }
}
