use chrono::{DateTime, Utc};
use polyglot_core::{ChannelId, DeliveryKind, GuildId, MessageId};
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::MessageMapping;

impl Database {
    /// Record a freshly dispatched translated copy.  Returns the row id.
    #[allow(clippy::too_many_arguments)]
    pub fn insert_message_mapping(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
        original_msg_id: MessageId,
        translated_msg_id: MessageId,
        dst_lang: &str,
        kind: DeliveryKind,
    ) -> Result<i64> {
        self.conn().execute(
            "INSERT INTO message_map
                 (guild_id, channel_id, original_msg_id, translated_msg_id, dst_lang, target_kind, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                guild_id.0 as i64,
                channel_id.0 as i64,
                original_msg_id.0 as i64,
                translated_msg_id.0 as i64,
                dst_lang,
                kind.as_str(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Every translated copy of `original_msg_id`, across languages and
    /// delivery kinds.  Read when the original is deleted or edited.
    pub fn mappings_for_original(&self, original_msg_id: MessageId) -> Result<Vec<MessageMapping>> {
        let mut stmt = self.conn().prepare(
            "SELECT id, guild_id, channel_id, original_msg_id, translated_msg_id,
                    dst_lang, target_kind, created_at
             FROM message_map
             WHERE original_msg_id = ?1
             ORDER BY id",
        )?;

        let rows = stmt.query_map(params![original_msg_id.0 as i64], row_to_mapping)?;

        let mut mappings = Vec::new();
        for row in rows {
            mappings.push(row?);
        }
        Ok(mappings)
    }

    pub fn delete_message_mapping(&self, id: i64) -> Result<bool> {
        let affected = self
            .conn()
            .execute("DELETE FROM message_map WHERE id = ?1", params![id])?;
        Ok(affected > 0)
    }
}

fn row_to_mapping(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageMapping> {
    let kind_str: String = row.get(6)?;
    let kind = DeliveryKind::from_str(&kind_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            6,
            rusqlite::types::Type::Text,
            format!("unknown delivery kind '{kind_str}'").into(),
        )
    })?;

    let ts_str: String = row.get(7)?;
    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&ts_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(MessageMapping {
        id: row.get(0)?,
        guild_id: GuildId(row.get::<_, i64>(1)? as u64),
        channel_id: ChannelId(row.get::<_, i64>(2)? as u64),
        original_msg_id: MessageId(row.get::<_, i64>(3)? as u64),
        translated_msg_id: MessageId(row.get::<_, i64>(4)? as u64),
        dst_lang: row.get(5)?,
        kind,
        created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mapping_round_trip() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert_message_mapping(
                GuildId(1),
                ChannelId(2),
                MessageId(3),
                MessageId(4),
                "es",
                DeliveryKind::Inline,
            )
            .unwrap();
        assert!(id > 0);

        let mappings = db.mappings_for_original(MessageId(3)).unwrap();
        assert_eq!(mappings.len(), 1);
        assert_eq!(mappings[0].translated_msg_id, MessageId(4));
        assert_eq!(mappings[0].dst_lang, "es");
        assert_eq!(mappings[0].kind, DeliveryKind::Inline);
    }

    #[test]
    fn one_mapping_per_language_and_kind() {
        let db = Database::in_memory().unwrap();
        for (lang, kind) in [
            ("es", DeliveryKind::Threaded),
            ("fr", DeliveryKind::Threaded),
            ("es", DeliveryKind::Dm),
        ] {
            db.insert_message_mapping(GuildId(1), ChannelId(2), MessageId(9), MessageId(10), lang, kind)
                .unwrap();
        }
        assert_eq!(db.mappings_for_original(MessageId(9)).unwrap().len(), 3);
    }

    #[test]
    fn delete_removes_row() {
        let db = Database::in_memory().unwrap();
        let id = db
            .insert_message_mapping(
                GuildId(1),
                ChannelId(2),
                MessageId(3),
                MessageId(4),
                "de",
                DeliveryKind::Dm,
            )
            .unwrap();

        assert!(db.delete_message_mapping(id).unwrap());
        assert!(!db.delete_message_mapping(id).unwrap());
        assert!(db.mappings_for_original(MessageId(3)).unwrap().is_empty());
    }
}
