pub mod event;
pub mod notification;
pub mod session;
pub mod user;
