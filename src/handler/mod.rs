pub mod bids;
pub mod notifications;
pub mod payments;
pub mod projects;
