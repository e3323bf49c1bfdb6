//! Background Tasks Module
//!
//! Optional tasks a caller may run next to a shared cache. Nothing here is
//! started implicitly; expiry in the cache itself stays lazy.
//!
//! # Tasks
//! - Expiry sweep: Purges stale entries at a fixed interval

mod sweep;

pub use sweep::spawn_sweep_task;
