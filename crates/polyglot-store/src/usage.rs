//! Daily translation-volume accounting per guild.

use chrono::{NaiveDate, Utc};
use polyglot_core::GuildId;
use rusqlite::params;

use crate::database::Database;
use crate::error::Result;
use crate::models::UsageStats;

impl Database {
    /// Add `characters` and `cost` to today's bucket for the guild.
    pub fn increment_usage(&self, guild_id: GuildId, characters: i64, cost: f64) -> Result<UsageStats> {
        let today = Utc::now().date_naive();
        self.conn().execute(
            "INSERT INTO usage (guild_id, day, char_count, cost_estimate_usd)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (guild_id, day) DO UPDATE SET
                 char_count = char_count + excluded.char_count,
                 cost_estimate_usd = cost_estimate_usd + excluded.cost_estimate_usd",
            params![guild_id.0 as i64, today.to_string(), characters, cost],
        )?;
        self.usage_for_day(guild_id, today)
    }

    fn usage_for_day(&self, guild_id: GuildId, day: NaiveDate) -> Result<UsageStats> {
        self.conn()
            .query_row(
                "SELECT guild_id, day, char_count, cost_estimate_usd
                 FROM usage WHERE guild_id = ?1 AND day = ?2",
                params![guild_id.0 as i64, day.to_string()],
                row_to_usage,
            )
            .map_err(Into::into)
    }

    /// Usage rows for the last `days` days, oldest first.
    pub fn usage_for_period(&self, guild_id: GuildId, days: i64) -> Result<Vec<UsageStats>> {
        let earliest = Utc::now().date_naive() - chrono::Duration::days(days - 1);
        let mut stmt = self.conn().prepare(
            "SELECT guild_id, day, char_count, cost_estimate_usd
             FROM usage
             WHERE guild_id = ?1 AND day >= ?2
             ORDER BY day",
        )?;

        let rows = stmt.query_map(params![guild_id.0 as i64, earliest.to_string()], row_to_usage)?;

        let mut stats = Vec::new();
        for row in rows {
            stats.push(row?);
        }
        Ok(stats)
    }
}

fn row_to_usage(row: &rusqlite::Row<'_>) -> rusqlite::Result<UsageStats> {
    let day_str: String = row.get(1)?;
    let day = day_str.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(UsageStats {
        guild_id: GuildId(row.get::<_, i64>(0)? as u64),
        day,
        char_count: row.get(2)?,
        cost_estimate_usd: row.get(3)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_accumulate_within_a_day() {
        let db = Database::in_memory().unwrap();
        db.increment_usage(GuildId(5), 120, 0.002).unwrap();
        let stats = db.increment_usage(GuildId(5), 80, 0.001).unwrap();
        assert_eq!(stats.char_count, 200);
        assert!((stats.cost_estimate_usd - 0.003).abs() < 1e-9);
    }

    #[test]
    fn period_query_scopes_by_guild() {
        let db = Database::in_memory().unwrap();
        db.increment_usage(GuildId(5), 10, 0.0).unwrap();
        db.increment_usage(GuildId(6), 99, 0.0).unwrap();

        let stats = db.usage_for_period(GuildId(5), 7).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].char_count, 10);
    }
}
