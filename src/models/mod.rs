pub mod accountmodel;
pub mod bidmodel;
pub mod notificationmodel;
pub mod paymentmodel;
pub mod projectmodel;
pub mod usermodel;
