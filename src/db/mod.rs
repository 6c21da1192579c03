pub mod biddb;
pub mod db;
pub mod ledgerdb;
pub mod notificationdb;
pub mod projectdb;
pub mod userdb;
