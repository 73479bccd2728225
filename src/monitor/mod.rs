//! Log monitoring
//!
//! Follows a growing log file from its end, extracts MAC addresses from new
//! lines and acts on them. The loop is single-threaded: it reads until no
//! complete line is available, then waits on a [`Waker`] before trying again.

pub mod polling;
pub mod tail;
pub mod tracker;
pub mod waker;

pub use polling::Watcher;
pub use tail::LogTail;
pub use tracker::HandledTracker;
pub use waker::Waker;
