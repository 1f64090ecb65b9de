//! Relay configuration loaded from environment variables.
//!
//! All settings except the bot token have sensible defaults so the relay can
//! start with near-zero configuration for local development.

use std::path::PathBuf;

use polyglot_translate::{Provider, ProviderSettings};

/// Relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Bot token for the chat platform.
    /// Env: `BOT_TOKEN`
    pub bot_token: String,

    /// REST API root of the chat platform (no trailing slash).
    /// Env: `CHAT_API_BASE`
    /// Default: `https://discord.com/api/v10`
    pub chat_api_base: String,

    /// Filesystem path of the SQLite database.
    /// Env: `DATABASE_PATH`
    /// Default: `data/polyglot.db`
    pub database_path: PathBuf,

    /// Fallback language when neither channel nor guild configures one.
    /// Env: `DEFAULT_GUILD_LANG`
    /// Default: `en`
    pub default_guild_lang: String,

    /// Default relay mode for unconfigured guilds.
    /// Env: `DEFAULT_MODE`
    /// Default: `on_demand`
    pub default_mode: String,

    /// Cap on target languages in inline auto mode.
    /// Env: `INLINE_AUTO_MAX_LANGS`
    /// Default: `1`
    pub inline_auto_max_langs: usize,

    /// Provider fallback order and credentials.
    /// Env: `TRANSLATOR_PROVIDER`, `TRANSLATOR_FALLBACKS`, `OPENAI_API_KEY`,
    /// `OPENAI_MODEL`, `DEEPL_API_KEY`, `GOOGLE_PROJECT_ID`,
    /// `GOOGLE_APPLICATION_CREDENTIALS`, `PROVIDER_RATE`, `PROVIDER_BURST`
    pub providers: ProviderSettings,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_api_base: "https://discord.com/api/v10".to_string(),
            database_path: PathBuf::from("data/polyglot.db"),
            default_guild_lang: "en".to_string(),
            default_mode: "on_demand".to_string(),
            inline_auto_max_langs: 1,
            providers: ProviderSettings::default(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(token) = std::env::var("BOT_TOKEN") {
            config.bot_token = token;
        }

        if let Ok(base) = std::env::var("CHAT_API_BASE") {
            config.chat_api_base = base.trim_end_matches('/').to_string();
        }

        if let Ok(path) = std::env::var("DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(lang) = std::env::var("DEFAULT_GUILD_LANG") {
            config.default_guild_lang = lang;
        }

        if let Ok(mode) = std::env::var("DEFAULT_MODE") {
            config.default_mode = mode;
        }

        if let Ok(val) = std::env::var("INLINE_AUTO_MAX_LANGS") {
            if let Ok(n) = val.parse::<usize>() {
                config.inline_auto_max_langs = n.max(1);
            }
        }

        config.providers = provider_settings_from_env();

        config
    }
}

fn provider_settings_from_env() -> ProviderSettings {
    let mut settings = ProviderSettings::default();

    let primary = std::env::var("TRANSLATOR_PROVIDER")
        .ok()
        .and_then(|raw| match Provider::from_str(&raw) {
            Some(p) => Some(p),
            None => {
                tracing::warn!(value = %raw, "unsupported TRANSLATOR_PROVIDER, using default");
                None
            }
        })
        .unwrap_or(Provider::OpenAi);

    let mut order = vec![primary];
    if let Ok(raw) = std::env::var("TRANSLATOR_FALLBACKS") {
        for item in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match Provider::from_str(item) {
                Some(provider) if !order.contains(&provider) => order.push(provider),
                Some(_) => {}
                None => tracing::warn!(value = %item, "ignoring unsupported fallback provider"),
            }
        }
    }
    settings.order = order;

    settings.openai_api_key = std::env::var("OPENAI_API_KEY").ok().filter(|s| !s.is_empty());
    if let Ok(model) = std::env::var("OPENAI_MODEL") {
        settings.openai_model = model;
    }
    settings.deepl_api_key = std::env::var("DEEPL_API_KEY").ok().filter(|s| !s.is_empty());
    settings.google_project_id = std::env::var("GOOGLE_PROJECT_ID").ok().filter(|s| !s.is_empty());
    settings.google_credentials = std::env::var("GOOGLE_APPLICATION_CREDENTIALS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from);

    if let Ok(val) = std::env::var("PROVIDER_RATE") {
        if let Ok(rate) = val.parse::<f64>() {
            if rate > 0.0 {
                settings.rate = rate;
            }
        }
    }
    if let Ok(val) = std::env::var("PROVIDER_BURST") {
        if let Ok(burst) = val.parse::<f64>() {
            if burst > 0.0 {
                settings.burst = burst;
            }
        }
    }

    settings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = RelayConfig::default();
        assert_eq!(config.default_guild_lang, "en");
        assert_eq!(config.default_mode, "on_demand");
        assert_eq!(config.providers.order, vec![Provider::OpenAi]);
    }
}
