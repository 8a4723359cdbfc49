pub mod check;
pub mod config;
pub mod scrub;
pub mod simulate;
