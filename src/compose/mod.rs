//! Combining governed functions with follow-up actions and executors
//!
//! - [`chain`] runs an action once a governed body finishes;
//! - [`bind_executor`] ties a handler or a body to the executor it must run
//!   on.

mod bind;
mod chain;

pub use bind::{Bound, bind_executor};
pub use chain::{Chain, chain};
