use crate::db::{self, Db, UnitOfWork};
use crate::error::{log_failure, AppError};
use crate::models::cosmetic::UnlockMethod;
use crate::models::currency::TransactionKind;
use crate::models::match_reward::*;
use crate::models::progression::PlayerProgression;
use crate::services::follow_up::{self, FollowUp};
use crate::services::leveling::Leveling;
use crate::services::{cosmetics, ledger, progression};
use crate::validation;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use uuid::Uuid;

pub const BASE_MATCH_XP: i64 = 100;
pub const XP_PER_KILL: i64 = 10;
pub const XP_PER_WAVE: i64 = 50;
pub const XP_PER_SCRAP: i64 = 1;

fn too_large() -> AppError {
    AppError::InvalidStats("stats too large".into())
}

/// `100 + 10 * kills + 50 * waves + scrap`. Deaths and currency earned do
/// not contribute.
pub fn match_experience(stats: &MatchStats) -> Result<i64, AppError> {
    let kills = stats.kills.checked_mul(XP_PER_KILL).ok_or_else(too_large)?;
    let waves = stats
        .waves_survived
        .checked_mul(XP_PER_WAVE)
        .ok_or_else(too_large)?;
    let scrap = stats
        .scrap_earned
        .checked_mul(XP_PER_SCRAP)
        .ok_or_else(too_large)?;
    BASE_MATCH_XP
        .checked_add(kills)
        .and_then(|xp| xp.checked_add(waves))
        .and_then(|xp| xp.checked_add(scrap))
        .ok_or_else(too_large)
}

// SQLite turns an overflowing integer sum into a REAL, so every counter the
// match touches is checked before the update runs.
fn check_totals(before: &PlayerProgression, stats: &MatchStats, xp: i64) -> Result<(), AppError> {
    let sums = [
        before.experience.checked_add(xp),
        before.matches_played.checked_add(1),
        before.total_kills.checked_add(stats.kills),
        before.total_deaths.checked_add(stats.deaths),
        before.total_waves_survived.checked_add(stats.waves_survived),
        before.total_scrap_earned.checked_add(stats.scrap_earned),
        before.total_currency_earned.checked_add(stats.data_earned),
    ];
    if sums.iter().any(Option::is_none) {
        return Err(too_large());
    }
    Ok(())
}

fn recorded_result(
    conn: &Connection,
    match_id: &str,
    player_id: i64,
) -> Result<Option<MatchRewardResult>, AppError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT result FROM match_rewards WHERE match_id = ?1 AND player_id = ?2",
            params![match_id, player_id],
            |row| row.get(0),
        )
        .optional()?;
    stored
        .map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(|e| AppError::Internal(format!("stored match result unreadable: {e}")))
}

fn record_result(
    uow: &UnitOfWork<'_>,
    match_id: &str,
    result: &MatchRewardResult,
) -> Result<(), AppError> {
    let json = serde_json::to_string(result)
        .map_err(|e| AppError::Internal(format!("match result not serializable: {e}")))?;
    uow.execute(
        "INSERT INTO match_rewards (match_id, player_id, result, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![match_id, result.player_id, json, db::now()],
    )?;
    Ok(())
}

fn apply_match_rewards(
    uow: &UnitOfWork<'_>,
    leveling: &Leveling,
    player_id: i64,
    stats: &MatchStats,
    match_id: Option<&str>,
) -> Result<MatchRewardResult, AppError> {
    validation::validate_match_stats(stats)?;
    let xp_gained = match_experience(stats)?;

    if let Some(match_id) = match_id {
        if let Some(result) = recorded_result(uow, match_id, player_id)? {
            tracing::info!(player_id, match_id, "match rewards already applied");
            return Ok(result);
        }
    }

    let before = progression::load_or_create(uow, player_id)?;
    check_totals(&before, stats, xp_gained)?;
    progression::record_match_stats(uow, player_id, stats)?;
    let (_, experience) = progression::add_experience(uow, player_id, xp_gained)?;

    let level = leveling.level_for(experience);
    let leveled_up = level > before.level;
    let mut follow_ups = Vec::new();
    if leveled_up {
        follow_ups.push(FollowUp::RecordLevel { level });
        follow_ups.extend(
            cosmetics::level_up_rewards(uow, before.level, level)?
                .into_iter()
                .map(|cosmetic_id| FollowUp::GrantCosmetic {
                    cosmetic_id,
                    method: UnlockMethod::LevelUp,
                }),
        );
    }
    let unlocked_cosmetic_ids = follow_up::run(uow, player_id, follow_ups)?
        .iter()
        .filter_map(|outcome| outcome.granted_cosmetic())
        .collect();

    let currency_balance = match ledger::apply_currency_delta(
        uow,
        player_id,
        stats.data_earned,
        TransactionKind::MatchReward,
        match_id,
    )? {
        Some(txn) => txn.balance_after,
        None => before.currency_balance,
    };

    tracing::info!(
        player_id,
        xp_gained,
        experience,
        level,
        levels_gained = leveling.levels_gained(before.experience, experience),
        currency_awarded = stats.data_earned,
        "match rewards applied"
    );

    let result = MatchRewardResult {
        player_id,
        xp_gained,
        experience,
        level,
        leveled_up,
        currency_awarded: stats.data_earned,
        currency_balance,
        unlocked_cosmetic_ids,
    };
    if let Some(match_id) = match_id {
        record_result(uow, match_id, &result)?;
    }
    Ok(result)
}

/// Applies one player's result in its own unit of work. With a match id a
/// repeated call returns the first result instead of paying out again.
pub fn award_match_rewards(
    db: &Db,
    leveling: &Leveling,
    player_id: i64,
    stats: MatchStats,
    match_id: Option<Uuid>,
) -> Result<MatchRewardResult, AppError> {
    let match_ref = match_id.map(|id| id.to_string());
    db.unit_of_work(|uow| {
        apply_match_rewards(uow, leveling, player_id, &stats, match_ref.as_deref())
    })
    .map_err(log_failure(player_id, "award_match_rewards"))
}

/// Applies every player of a match inside a single unit of work: the match
/// commits for all of its players or for none. Players already paid for this
/// match get their recorded result back.
pub fn award_match(
    db: &Db,
    leveling: &Leveling,
    match_id: Uuid,
    report: MatchReport,
) -> Result<MatchRewardSummary, AppError> {
    let mut seen = HashSet::with_capacity(report.players.len());
    for entry in &report.players {
        if !seen.insert(entry.player_id) {
            return Err(AppError::InvalidStats(format!(
                "player {} reported twice",
                entry.player_id
            )));
        }
    }

    let match_ref = match_id.to_string();
    let results = db.unit_of_work(|uow| {
        report
            .players
            .iter()
            .map(|entry| {
                apply_match_rewards(uow, leveling, entry.player_id, &entry.stats, Some(&match_ref))
                    .map_err(log_failure(entry.player_id, "award_match"))
            })
            .collect::<Result<Vec<_>, _>>()
    })?;

    tracing::info!(%match_id, players = results.len(), "match rewards committed");
    Ok(MatchRewardSummary {
        match_id: match_ref,
        results,
    })
}
