use polyglot_core::glossary::GlossaryTerm;
use polyglot_core::GuildId;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::GlossaryEntry;

impl Database {
    /// Insert or replace a glossary term for a guild.
    pub fn upsert_glossary_term(&self, entry: &GlossaryEntry) -> Result<()> {
        self.conn().execute(
            "INSERT INTO glossary (guild_id, term, translation, context, priority)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT (guild_id, term) DO UPDATE SET
                 translation = excluded.translation,
                 context = excluded.context,
                 priority = excluded.priority",
            params![
                entry.guild_id.0 as i64,
                entry.term,
                entry.translation,
                entry.context,
                entry.priority,
            ],
        )?;
        Ok(())
    }

    pub fn remove_glossary_term(&self, guild_id: GuildId, term: &str) -> Result<bool> {
        let affected = self.conn().execute(
            "DELETE FROM glossary WHERE guild_id = ?1 AND term = ?2",
            params![guild_id.0 as i64, term],
        )?;
        Ok(affected > 0)
    }

    /// All glossary entries for a guild, ascending by priority.
    pub fn list_glossary_entries(&self, guild_id: GuildId) -> Result<Vec<GlossaryEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT guild_id, term, translation, context, priority
             FROM glossary
             WHERE guild_id = ?1
             ORDER BY priority, term",
        )?;

        let rows = stmt.query_map(params![guild_id.0 as i64], |row| {
            Ok(GlossaryEntry {
                guild_id: GuildId(row.get::<_, i64>(0)? as u64),
                term: row.get(1)?,
                translation: row.get(2)?,
                context: row.get(3)?,
                priority: row.get(4)?,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Glossary entries for a guild in the shape the substitution engine
    /// consumes.
    pub fn list_glossary_terms(&self, guild_id: GuildId) -> Result<Vec<GlossaryTerm>> {
        Ok(self
            .list_glossary_entries(guild_id)?
            .into_iter()
            .map(|entry| GlossaryTerm {
                term: entry.term,
                translation: entry.translation,
                priority: entry.priority,
            })
            .collect())
    }
}
