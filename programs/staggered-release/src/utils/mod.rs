pub mod account;
pub mod release;
pub mod schedule;
pub mod token;
