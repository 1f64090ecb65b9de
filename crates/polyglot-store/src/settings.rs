//! Guild, user and channel preference storage.

use chrono::{DateTime, Utc};
use polyglot_core::{ChannelId, GuildId, UserId};
use rusqlite::{params, OptionalExtension};

use crate::database::Database;
use crate::error::Result;
use crate::models::{ChannelOverride, GuildSettings, UserSettings};

impl Database {
    pub fn get_or_create_guild(&self, guild_id: GuildId) -> Result<GuildSettings> {
        if let Some(existing) = self.get_guild_settings(guild_id)? {
            return Ok(existing);
        }
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT OR IGNORE INTO guild_settings (guild_id, created_at, updated_at)
             VALUES (?1, ?2, ?2)",
            params![guild_id.0 as i64, now],
        )?;
        self.get_guild_settings(guild_id)?
            .ok_or(crate::error::StoreError::NotFound)
    }

    pub fn get_guild_settings(&self, guild_id: GuildId) -> Result<Option<GuildSettings>> {
        let row = self
            .conn()
            .query_row(
                "SELECT guild_id, default_lang, default_mode, inline_auto_max_langs,
                        retention_hours, created_at, updated_at
                 FROM guild_settings WHERE guild_id = ?1",
                params![guild_id.0 as i64],
                row_to_guild,
            )
            .optional()?;
        Ok(row)
    }

    pub fn set_guild_defaults(
        &self,
        guild_id: GuildId,
        default_lang: Option<&str>,
        default_mode: Option<&str>,
    ) -> Result<GuildSettings> {
        self.get_or_create_guild(guild_id)?;
        if let Some(lang) = default_lang {
            self.conn().execute(
                "UPDATE guild_settings SET default_lang = ?2, updated_at = ?3 WHERE guild_id = ?1",
                params![guild_id.0 as i64, lang, Utc::now().to_rfc3339()],
            )?;
        }
        if let Some(mode) = default_mode {
            self.conn().execute(
                "UPDATE guild_settings SET default_mode = ?2, updated_at = ?3 WHERE guild_id = ?1",
                params![guild_id.0 as i64, mode, Utc::now().to_rfc3339()],
            )?;
        }
        self.get_guild_settings(guild_id)?
            .ok_or(crate::error::StoreError::NotFound)
    }

    pub fn get_or_create_user(&self, user_id: UserId) -> Result<UserSettings> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT OR IGNORE INTO users (user_id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![user_id.0 as i64, now],
        )?;
        self.conn()
            .query_row(
                "SELECT user_id, preferred_lang, dm_mirror_enabled, created_at, updated_at
                 FROM users WHERE user_id = ?1",
                params![user_id.0 as i64],
                row_to_user,
            )
            .map_err(Into::into)
    }

    pub fn set_user_language(&self, user_id: UserId, lang: Option<&str>) -> Result<UserSettings> {
        self.get_or_create_user(user_id)?;
        self.conn().execute(
            "UPDATE users SET preferred_lang = ?2, updated_at = ?3 WHERE user_id = ?1",
            params![user_id.0 as i64, lang, Utc::now().to_rfc3339()],
        )?;
        self.get_or_create_user(user_id)
    }

    pub fn set_user_dm_mirror(&self, user_id: UserId, enabled: bool) -> Result<UserSettings> {
        self.get_or_create_user(user_id)?;
        self.conn().execute(
            "UPDATE users SET dm_mirror_enabled = ?2, updated_at = ?3 WHERE user_id = ?1",
            params![user_id.0 as i64, enabled, Utc::now().to_rfc3339()],
        )?;
        self.get_or_create_user(user_id)
    }

    /// Erase everything stored about a user.
    pub fn forget_user(&self, user_id: UserId) -> Result<()> {
        self.conn()
            .execute("DELETE FROM users WHERE user_id = ?1", params![user_id.0 as i64])?;
        Ok(())
    }

    pub fn get_channel_override(&self, channel_id: ChannelId) -> Result<Option<ChannelOverride>> {
        let row = self
            .conn()
            .query_row(
                "SELECT channel_id, guild_id, enabled, mode, target_langs, updated_at
                 FROM channel_overrides WHERE channel_id = ?1",
                params![channel_id.0 as i64],
                row_to_override,
            )
            .optional()?;
        Ok(row)
    }

    pub fn upsert_channel_override(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        enabled: Option<bool>,
        mode: Option<&str>,
        target_langs: Option<&[String]>,
    ) -> Result<ChannelOverride> {
        let now = Utc::now().to_rfc3339();
        self.conn().execute(
            "INSERT OR IGNORE INTO channel_overrides (channel_id, guild_id, updated_at)
             VALUES (?1, ?2, ?3)",
            params![channel_id.0 as i64, guild_id.0 as i64, now],
        )?;
        if let Some(enabled) = enabled {
            self.conn().execute(
                "UPDATE channel_overrides SET enabled = ?2, updated_at = ?3 WHERE channel_id = ?1",
                params![channel_id.0 as i64, enabled, now],
            )?;
        }
        if let Some(mode) = mode {
            self.conn().execute(
                "UPDATE channel_overrides SET mode = ?2, updated_at = ?3 WHERE channel_id = ?1",
                params![channel_id.0 as i64, mode, now],
            )?;
        }
        if let Some(langs) = target_langs {
            let mut deduped: Vec<&str> = langs.iter().map(|s| s.as_str()).filter(|s| !s.is_empty()).collect();
            deduped.sort_unstable();
            deduped.dedup();
            let joined = if deduped.is_empty() { None } else { Some(deduped.join(",")) };
            self.conn().execute(
                "UPDATE channel_overrides SET target_langs = ?2, updated_at = ?3 WHERE channel_id = ?1",
                params![channel_id.0 as i64, joined, now],
            )?;
        }
        self.get_channel_override(channel_id)?
            .ok_or(crate::error::StoreError::NotFound)
    }
}

fn row_to_guild(row: &rusqlite::Row<'_>) -> rusqlite::Result<GuildSettings> {
    Ok(GuildSettings {
        guild_id: GuildId(row.get::<_, i64>(0)? as u64),
        default_lang: row.get(1)?,
        default_mode: row.get(2)?,
        inline_auto_max_langs: row.get(3)?,
        retention_hours: row.get(4)?,
        created_at: parse_ts(row, 5)?,
        updated_at: parse_ts(row, 6)?,
    })
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<UserSettings> {
    Ok(UserSettings {
        user_id: UserId(row.get::<_, i64>(0)? as u64),
        preferred_lang: row.get(1)?,
        dm_mirror_enabled: row.get(2)?,
        created_at: parse_ts(row, 3)?,
        updated_at: parse_ts(row, 4)?,
    })
}

fn row_to_override(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChannelOverride> {
    Ok(ChannelOverride {
        channel_id: ChannelId(row.get::<_, i64>(0)? as u64),
        guild_id: GuildId(row.get::<_, i64>(1)? as u64),
        enabled: row.get(2)?,
        mode: row.get(3)?,
        target_langs: row.get(4)?,
        updated_at: parse_ts(row, 5)?,
    })
}

fn parse_ts(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guild_defaults_round_trip() {
        let db = Database::in_memory().unwrap();
        let fresh = db.get_or_create_guild(GuildId(7)).unwrap();
        assert_eq!(fresh.default_mode, "on_demand");
        assert_eq!(fresh.inline_auto_max_langs, 1);

        let updated = db
            .set_guild_defaults(GuildId(7), Some("es"), Some("inline_auto"))
            .unwrap();
        assert_eq!(updated.default_lang.as_deref(), Some("es"));
        assert_eq!(updated.default_mode, "inline_auto");
    }

    #[test]
    fn user_preferences_round_trip() {
        let db = Database::in_memory().unwrap();
        let user = db.set_user_language(UserId(42), Some("fr")).unwrap();
        assert_eq!(user.preferred_lang.as_deref(), Some("fr"));
        assert!(!user.dm_mirror_enabled);

        let user = db.set_user_dm_mirror(UserId(42), true).unwrap();
        assert!(user.dm_mirror_enabled);

        db.forget_user(UserId(42)).unwrap();
        let fresh = db.get_or_create_user(UserId(42)).unwrap();
        assert_eq!(fresh.preferred_lang, None);
    }

    #[test]
    fn channel_override_dedupes_langs() {
        let db = Database::in_memory().unwrap();
        let langs = vec!["fr".to_string(), "es".to_string(), "fr".to_string()];
        let or = db
            .upsert_channel_override(GuildId(1), ChannelId(20), Some(true), Some("inline_auto"), Some(&langs))
            .unwrap();
        assert!(or.enabled);
        assert_eq!(or.target_lang_list(), vec!["es", "fr"]);
    }
}
