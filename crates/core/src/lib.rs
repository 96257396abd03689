pub mod checkin;
pub mod errors;
pub mod models;
pub mod status;
