use crate::db::Db;
use crate::error::{log_failure, AppError};
use crate::models::cosmetic::UnlockMethod;
use crate::models::progression::PrestigeResult;
use crate::services::follow_up::{self, FollowUp};
use crate::services::{cosmetics, progression};

/// Not idempotent: each call advances the tier again.
pub fn prestige_player(db: &Db, player_id: i64) -> Result<PrestigeResult, AppError> {
    db.unit_of_work(|uow| {
        progression::ensure_record(uow, player_id)?;
        let prestige_tier = progression::reset_for_prestige(uow, player_id)?;

        let grants = cosmetics::prestige_rewards(uow, player_id, prestige_tier)?
            .into_iter()
            .map(|cosmetic_id| FollowUp::GrantCosmetic {
                cosmetic_id,
                method: UnlockMethod::Prestige,
            })
            .collect();
        let granted_cosmetic_ids: Vec<i64> = follow_up::run(uow, player_id, grants)?
            .iter()
            .filter_map(|outcome| outcome.granted_cosmetic())
            .collect();

        tracing::info!(
            player_id,
            prestige_tier,
            granted = granted_cosmetic_ids.len(),
            "player prestiged"
        );
        Ok(PrestigeResult {
            prestige_tier,
            granted_cosmetic_ids,
        })
    })
    .map_err(log_failure(player_id, "prestige_player"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::cosmetic::{Rarity, Slot};
    use crate::models::currency::CurrencyGrantRequest;
    use crate::services::{fixtures, leveling::Leveling, ledger};

    #[test]
    fn test_prestige_grants_tier_cosmetics_once() {
        let db = Db::open_in_memory().unwrap();
        let tier1 =
            fixtures::cosmetic(&db, "Tier I Halo", Slot::ParticleEffect, Rarity::Epic, 1, 0, true);
        let tier2 =
            fixtures::cosmetic(&db, "Tier II Crown", Slot::Badge, Rarity::Legendary, 2, 0, true);

        let first = prestige_player(&db, 1).unwrap();
        assert_eq!(first.prestige_tier, 1);
        assert_eq!(first.granted_cosmetic_ids, vec![tier1]);

        let second = prestige_player(&db, 1).unwrap();
        assert_eq!(second.prestige_tier, 2);
        assert_eq!(second.granted_cosmetic_ids, vec![tier2]);

        assert_eq!(fixtures::ownership_count(&db, 1), 2);
    }

    #[test]
    fn test_prestige_skips_owned_cosmetics() {
        let db = Db::open_in_memory().unwrap();
        let tier1 =
            fixtures::cosmetic(&db, "Tier I Halo", Slot::ParticleEffect, Rarity::Epic, 1, 0, true);
        fixtures::grant(&db, 1, tier1);

        let result = prestige_player(&db, 1).unwrap();
        assert_eq!(result.prestige_tier, 1);
        assert!(result.granted_cosmetic_ids.is_empty());
        assert_eq!(fixtures::ownership_count(&db, 1), 1);
    }

    #[test]
    fn test_prestige_resets_level_but_not_currency() {
        let db = Db::open_in_memory().unwrap();
        fixtures::add_experience(&db, 1, 5_400);
        ledger::grant_currency(
            &db,
            1,
            CurrencyGrantRequest {
                amount: 75,
                kind: None,
                reference_id: None,
            },
        )
        .unwrap();

        prestige_player(&db, 1).unwrap();

        let view = progression::get_progression(&db, &Leveling::new(1000), 1).unwrap();
        assert_eq!(view.progression.level, 1);
        assert_eq!(view.progression.experience, 0);
        assert_eq!(view.progression.prestige_tier, 1);
        assert_eq!(view.progression.currency_balance, 75);
        assert_eq!(ledger::get_transactions(&db, 1, 10).unwrap().len(), 1);
    }
}
