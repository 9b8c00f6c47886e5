pub mod behavior;
pub mod user;
