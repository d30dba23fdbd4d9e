//! The polling layer of daywatch: a fixed-interval watch loop over a
//! level file, a console announcer for day changes, and cooperative
//! shutdown plumbing.

pub mod announce;
pub mod shutdown;
pub mod watcher;
