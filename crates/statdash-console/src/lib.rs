//! statdash console - terminal dashboard for the survey filter API
//!
//! Two independent components share the screen: the filter panel, which
//! builds a query and shows the resulting table, and a toggleable chat panel.
//! Both are plain state machines driven by key handlers; the TUI only
//! snapshots and renders them.

pub mod chat_widget;
pub mod cli;
pub mod config;
pub mod console;
pub mod filter_panel;
pub mod input;
pub mod logging;
