use crate::db::{self, Db, UnitOfWork};
use crate::error::{log_failure, AppError};
use crate::models::match_reward::MatchStats;
use crate::models::progression::*;
use crate::services::leveling::Leveling;
use rusqlite::{params, Connection, OptionalExtension, Row};

const PROGRESSION_COLUMNS: &str = "player_id, level, experience, prestige_tier, currency_balance,
     matches_played, total_kills, total_deaths, total_waves_survived,
     total_scrap_earned, total_currency_earned, last_updated";

fn progression_from_row(row: &Row<'_>) -> rusqlite::Result<PlayerProgression> {
    Ok(PlayerProgression {
        player_id: row.get(0)?,
        level: row.get(1)?,
        experience: row.get(2)?,
        prestige_tier: row.get(3)?,
        currency_balance: row.get(4)?,
        matches_played: row.get(5)?,
        total_kills: row.get(6)?,
        total_deaths: row.get(7)?,
        total_waves_survived: row.get(8)?,
        total_scrap_earned: row.get(9)?,
        total_currency_earned: row.get(10)?,
        last_updated: row.get(11)?,
    })
}

pub fn load(
    conn: &Connection,
    player_id: i64,
) -> Result<Option<PlayerProgression>, rusqlite::Error> {
    conn.query_row(
        &format!("SELECT {PROGRESSION_COLUMNS} FROM player_progression WHERE player_id = ?1"),
        params![player_id],
        progression_from_row,
    )
    .optional()
}

pub fn ensure_record(uow: &UnitOfWork<'_>, player_id: i64) -> Result<(), rusqlite::Error> {
    let created = uow.execute(
        "INSERT OR IGNORE INTO player_progression (player_id, last_updated) VALUES (?1, ?2)",
        params![player_id, db::now()],
    )?;
    if created > 0 {
        tracing::debug!(player_id, "progression record created");
    }
    Ok(())
}

pub fn load_or_create(
    uow: &UnitOfWork<'_>,
    player_id: i64,
) -> Result<PlayerProgression, rusqlite::Error> {
    ensure_record(uow, player_id)?;
    load(uow, player_id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

pub fn record_match_stats(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    stats: &MatchStats,
) -> Result<(), rusqlite::Error> {
    uow.execute(
        "UPDATE player_progression SET
             matches_played = matches_played + 1,
             total_kills = total_kills + ?2,
             total_deaths = total_deaths + ?3,
             total_waves_survived = total_waves_survived + ?4,
             total_scrap_earned = total_scrap_earned + ?5,
             total_currency_earned = total_currency_earned + ?6,
             last_updated = ?7
         WHERE player_id = ?1",
        params![
            player_id,
            stats.kills,
            stats.deaths,
            stats.waves_survived,
            stats.scrap_earned,
            stats.data_earned,
            db::now(),
        ],
    )?;
    Ok(())
}

pub fn add_experience(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    xp: i64,
) -> Result<(i64, i64), rusqlite::Error> {
    let new_xp: i64 = uow.query_row(
        "UPDATE player_progression SET experience = experience + ?2, last_updated = ?3
         WHERE player_id = ?1 RETURNING experience",
        params![player_id, xp, db::now()],
        |row| row.get(0),
    )?;
    Ok((new_xp - xp, new_xp))
}

pub fn set_level(uow: &UnitOfWork<'_>, player_id: i64, level: i64) -> Result<(), rusqlite::Error> {
    uow.execute(
        "UPDATE player_progression SET level = ?2, last_updated = ?3 WHERE player_id = ?1",
        params![player_id, level, db::now()],
    )?;
    Ok(())
}

/// Applies `delta` to the balance in one guarded statement.
///
/// Returns the new balance, or `None` when the result would go negative;
/// in that case nothing is written.
pub fn adjust_balance(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    delta: i64,
) -> Result<Option<i64>, rusqlite::Error> {
    uow.query_row(
        "UPDATE player_progression
         SET currency_balance = currency_balance + ?2, last_updated = ?3
         WHERE player_id = ?1 AND currency_balance + ?2 >= 0
         RETURNING currency_balance",
        params![player_id, delta, db::now()],
        |row| row.get(0),
    )
    .optional()
}

pub fn reset_for_prestige(uow: &UnitOfWork<'_>, player_id: i64) -> Result<i64, rusqlite::Error> {
    uow.query_row(
        "UPDATE player_progression
         SET level = 1, experience = 0, prestige_tier = prestige_tier + 1, last_updated = ?2
         WHERE player_id = ?1
         RETURNING prestige_tier",
        params![player_id, db::now()],
        |row| row.get(0),
    )
}

// A stored level that disagrees with the experience is recomputed and persisted.
pub fn get_progression(
    db: &Db,
    leveling: &Leveling,
    player_id: i64,
) -> Result<ProgressionView, AppError> {
    db.unit_of_work(|uow| {
        let mut progression = load_or_create(uow, player_id)?;
        let level = leveling.level_for(progression.experience);
        if level != progression.level {
            tracing::info!(
                player_id,
                stored = progression.level,
                computed = level,
                "recomputing stale level"
            );
            set_level(uow, player_id, level)?;
            progression.level = level;
        }
        let progress = leveling.progress(progression.experience);
        Ok(ProgressionView {
            progression,
            xp_into_level: progress.xp_into_level,
            xp_to_next_level: progress.xp_to_next_level,
        })
    })
    .map_err(log_failure(player_id, "get_progression"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_uow<T>(db: &Db, f: impl FnOnce(&UnitOfWork<'_>) -> Result<T, rusqlite::Error>) -> T {
        db.unit_of_work(f).unwrap()
    }

    #[test]
    fn test_first_access_creates_defaults() {
        let db = Db::open_in_memory().unwrap();
        let view = get_progression(&db, &Leveling::default(), 7).unwrap();
        assert_eq!(view.progression.player_id, 7);
        assert_eq!(view.progression.level, 1);
        assert_eq!(view.progression.experience, 0);
        assert_eq!(view.progression.prestige_tier, 0);
        assert_eq!(view.progression.currency_balance, 0);
        assert_eq!(view.xp_to_next_level, 1000);
    }

    #[test]
    fn test_adjust_balance_rejects_overdraft() {
        let db = Db::open_in_memory().unwrap();
        with_uow(&db, |uow| {
            ensure_record(uow, 1)?;
            assert_eq!(adjust_balance(uow, 1, 30)?, Some(30));
            assert_eq!(adjust_balance(uow, 1, -31)?, None);
            assert_eq!(adjust_balance(uow, 1, -30)?, Some(0));
            Ok(())
        });
    }

    #[test]
    fn test_match_stats_accumulate() {
        let db = Db::open_in_memory().unwrap();
        let stats = MatchStats {
            kills: 3,
            deaths: 1,
            waves_survived: 4,
            scrap_earned: 20,
            data_earned: 5,
        };
        let progression = with_uow(&db, |uow| {
            ensure_record(uow, 1)?;
            record_match_stats(uow, 1, &stats)?;
            record_match_stats(uow, 1, &stats)?;
            load_or_create(uow, 1)
        });
        assert_eq!(progression.matches_played, 2);
        assert_eq!(progression.total_kills, 6);
        assert_eq!(progression.total_deaths, 2);
        assert_eq!(progression.total_waves_survived, 8);
        assert_eq!(progression.total_scrap_earned, 40);
        assert_eq!(progression.total_currency_earned, 10);
    }

    #[test]
    fn test_stale_level_is_recomputed_on_read() {
        let db = Db::open_in_memory().unwrap();
        with_uow(&db, |uow| {
            ensure_record(uow, 1)?;
            add_experience(uow, 1, 2500)?;
            Ok(())
        });
        let view = get_progression(&db, &Leveling::new(1000), 1).unwrap();
        assert_eq!(view.progression.level, 3);
        let stored = db.with_conn(|conn| load(conn, 1)).unwrap().unwrap();
        assert_eq!(stored.level, 3);
    }

    #[test]
    fn test_prestige_reset_returns_new_tier() {
        let db = Db::open_in_memory().unwrap();
        let (tier, progression) = with_uow(&db, |uow| {
            ensure_record(uow, 1)?;
            add_experience(uow, 1, 4200)?;
            set_level(uow, 1, 5)?;
            let tier = reset_for_prestige(uow, 1)?;
            Ok((tier, load_or_create(uow, 1)?))
        });
        assert_eq!(tier, 1);
        assert_eq!(progression.level, 1);
        assert_eq!(progression.experience, 0);
    }
}
