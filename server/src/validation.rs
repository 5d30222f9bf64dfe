use crate::error::AppError;
use crate::models::match_reward::MatchStats;

const MAX_LOADOUT_NAME_LEN: usize = 32;

pub fn validate_loadout_name(name: &str) -> Result<String, AppError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest("Loadout name cannot be empty".into()));
    }
    if trimmed.chars().count() > MAX_LOADOUT_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Loadout name longer than {MAX_LOADOUT_NAME_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}

pub fn validate_match_stats(stats: &MatchStats) -> Result<(), AppError> {
    let fields = [
        ("kills", stats.kills),
        ("deaths", stats.deaths),
        ("waves_survived", stats.waves_survived),
        ("scrap_earned", stats.scrap_earned),
        ("data_earned", stats.data_earned),
    ];
    for (name, value) in fields {
        if value < 0 {
            return Err(AppError::InvalidStats(format!("{name} cannot be negative")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loadout_name_is_trimmed_and_bounded() {
        assert_eq!(validate_loadout_name("  Ranked ").unwrap(), "Ranked");
        assert!(validate_loadout_name("   ").is_err());
        assert!(validate_loadout_name(&"x".repeat(33)).is_err());
        assert!(validate_loadout_name(&"x".repeat(32)).is_ok());
    }

    #[test]
    fn test_negative_stats_rejected() {
        assert!(validate_match_stats(&MatchStats::default()).is_ok());
        let err = validate_match_stats(&MatchStats {
            deaths: -1,
            ..MatchStats::default()
        })
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidStats(msg) if msg.contains("deaths")));
    }
}
