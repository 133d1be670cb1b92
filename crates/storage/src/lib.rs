#![forbid(unsafe_code)]

//! Persistence adapters for progress trackers and per-subject levels.

pub mod repository;
pub mod sqlite;
