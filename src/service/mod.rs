pub mod bid_service;
pub mod error;
pub mod escrow_service;
pub mod notification_service;
pub mod project_service;

#[cfg(test)]
pub mod test_support;
