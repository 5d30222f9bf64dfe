pub mod cosmetics;
pub mod currency;
pub mod loot;
pub mod matches;
pub mod progression;
