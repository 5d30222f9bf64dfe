//! Side effects that may fail without aborting the mutation that caused them.
//!
//! Each follow-up runs under its own savepoint inside the caller's unit of
//! work; a failure discards only that follow-up's writes and is logged.

use crate::db::UnitOfWork;
use crate::models::cosmetic::{GrantOutcome, UnlockMethod};
use crate::services::{cosmetics, progression};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUp {
    RecordLevel { level: i64 },
    GrantCosmetic { cosmetic_id: i64, method: UnlockMethod },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUpStatus {
    Applied,
    /// Nothing to do, e.g. the cosmetic was already owned.
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpOutcome {
    pub follow_up: FollowUp,
    pub status: FollowUpStatus,
}

impl FollowUpOutcome {
    pub fn granted_cosmetic(&self) -> Option<i64> {
        match (self.follow_up, &self.status) {
            (FollowUp::GrantCosmetic { cosmetic_id, .. }, FollowUpStatus::Applied) => {
                Some(cosmetic_id)
            }
            _ => None,
        }
    }
}

fn apply(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    follow_up: FollowUp,
) -> Result<FollowUpStatus, rusqlite::Error> {
    match follow_up {
        FollowUp::RecordLevel { level } => {
            progression::set_level(uow, player_id, level)?;
            Ok(FollowUpStatus::Applied)
        }
        FollowUp::GrantCosmetic {
            cosmetic_id,
            method,
        } => match cosmetics::grant_cosmetic(uow, player_id, cosmetic_id, method)? {
            GrantOutcome::Granted => Ok(FollowUpStatus::Applied),
            GrantOutcome::AlreadyOwned => Ok(FollowUpStatus::Skipped),
        },
    }
}

/// Runs every follow-up in order. Only a failure to manage the savepoint
/// itself is returned as an error.
pub fn run(
    uow: &UnitOfWork<'_>,
    player_id: i64,
    follow_ups: Vec<FollowUp>,
) -> Result<Vec<FollowUpOutcome>, rusqlite::Error> {
    let mut outcomes = Vec::with_capacity(follow_ups.len());
    for follow_up in follow_ups {
        let status = match uow.savepoint(|uow| apply(uow, player_id, follow_up))? {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!(player_id, ?follow_up, error = %e, "follow-up failed");
                FollowUpStatus::Failed(e.to_string())
            }
        };
        if status == FollowUpStatus::Skipped {
            tracing::debug!(player_id, ?follow_up, "follow-up skipped");
        }
        outcomes.push(FollowUpOutcome { follow_up, status });
    }
    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Db;
    use crate::models::cosmetic::{Rarity, Slot};
    use crate::services::fixtures;

    #[test]
    fn test_failed_follow_up_does_not_abort_others() {
        let db = Db::open_in_memory().unwrap();
        let badge = fixtures::cosmetic(&db, "Veteran", Slot::Badge, Rarity::Rare, 0, 0, false);

        let outcomes = db
            .unit_of_work(|uow| {
                progression::ensure_record(uow, 1)?;
                run(
                    uow,
                    1,
                    vec![
                        // Unknown cosmetic violates the foreign key.
                        FollowUp::GrantCosmetic {
                            cosmetic_id: 9_999,
                            method: UnlockMethod::LevelUp,
                        },
                        FollowUp::GrantCosmetic {
                            cosmetic_id: badge,
                            method: UnlockMethod::LevelUp,
                        },
                        FollowUp::GrantCosmetic {
                            cosmetic_id: badge,
                            method: UnlockMethod::LevelUp,
                        },
                        FollowUp::RecordLevel { level: 4 },
                    ],
                )
            })
            .unwrap();

        assert!(matches!(outcomes[0].status, FollowUpStatus::Failed(_)));
        assert_eq!(outcomes[1].status, FollowUpStatus::Applied);
        assert_eq!(outcomes[1].granted_cosmetic(), Some(badge));
        assert_eq!(outcomes[2].status, FollowUpStatus::Skipped);
        assert_eq!(outcomes[3].status, FollowUpStatus::Applied);

        let owned = fixtures::ownership_count(&db, 1);
        assert_eq!(owned, 1);
        let level = db
            .with_conn(|conn| progression::load(conn, 1))
            .unwrap()
            .unwrap()
            .level;
        assert_eq!(level, 4);
    }
}
