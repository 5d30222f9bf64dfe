pub mod cosmetics;
pub mod follow_up;
pub mod ledger;
pub mod leveling;
pub mod loot;
pub mod match_rewards;
pub mod prestige;
pub mod progression;

#[cfg(test)]
pub mod fixtures;
