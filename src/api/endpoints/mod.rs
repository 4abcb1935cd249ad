//! API endpoint handlers. Blocking pipeline work runs on the blocking pool.

pub mod ask;
pub mod health;
pub mod procedures;
pub mod ticket;
