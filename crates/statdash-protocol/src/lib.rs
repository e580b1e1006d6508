//! statdash protocol - wire types for the dashboard backend
//!
//! Describes the two endpoints the dashboard talks to (`GET /api/filter` and
//! `POST /chat`), the filter key set, the chat transcript entries, and the
//! table layout derived from a filter result set.

pub mod constants;
pub mod error;
pub mod messages;
pub mod table;
pub mod types;

pub use constants::*;
pub use error::*;
pub use messages::*;
pub use table::*;
pub use types::*;
