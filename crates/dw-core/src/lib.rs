//! Core library for daywatch: save-file decoding, day extraction, the
//! scheduled-message table, and configuration.

pub mod config;
pub mod level;
pub mod motd;
pub mod nbt;

#[doc(hidden)]
pub mod test_utils;
