// Application layer - drives the ledger from a line-oriented terminal menu.
// The ledger itself never does I/O; everything user-facing lives here.

pub mod error;
pub mod session;

pub use error::*;
pub use session::*;
