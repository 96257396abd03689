pub mod event;
pub mod notification;
pub mod registration;
pub mod reminder;
pub mod session;
pub mod user;
