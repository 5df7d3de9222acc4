/// State management module
///
/// This module holds the orchestrator's data structures:
/// - Newest-first galleries with a current selection (gallery.rs)
/// - The capped debug log behind the debug panel (debug_log.rs)
///
/// Everything here is plain data; mutation happens only from the
/// orchestrator's update loop in response to messages.

pub mod gallery;
pub mod debug_log;

pub use debug_log::DebugLog;
pub use gallery::Gallery;
