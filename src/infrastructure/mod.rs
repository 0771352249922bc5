pub mod mock;
pub mod persistence;
pub mod prices;
pub mod reference;
