//! Commonly used imports
//!
//! Use `use await_context::prelude::*;` for quick access to the most common
//! types, functions, and macros.

// Core types
pub use crate::{AwaitContext, Awaitable, Governed, Resumption, Step, Suspended};

// Starting and composing bodies
pub use crate::{Launcher, bind_executor, chain};

// Operations
pub use crate::{dispatch_with, post_catching, post_with, try_post_with};

// Completion conventions
pub use crate::{CompletionHandler, CompletionToken, Plain, WithCode, WithError};

// Errors
pub use crate::{Error, ErrorCode, ErrorSlot};

// Executors
pub use crate::executor::{Executor, InlineExecutor, LoopExecutor, LoopScheduler};

// Jump table
pub use crate::{reenter, suspend};
