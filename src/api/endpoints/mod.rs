pub mod consult;
pub mod diagnose;
pub mod health;
pub mod interactions;
pub mod log;
