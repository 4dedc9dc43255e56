pub mod auction;
pub mod bidding;
pub mod database;
pub mod handlers;
pub mod listing;
pub mod notifier;
pub mod permissions;
pub mod query;
pub mod scheduler;
