//! # Await Context: Stackless Coroutines over Completion Handlers
//!
//! Write asynchronous control flow in direct style on top of callback-based
//! operations, without a runtime-managed stack per task.
//!
//! ## Core Pieces
//!
//! - **[`Governed`]**: a function that is re-entered from the top after each
//!   suspension, jumping to the point it left off
//! - **[`AwaitContext`]**: the handle passed to every pass; given to an
//!   asynchronous operation as its completion token, it parks the body until
//!   the operation completes
//! - **[`Launcher`]**: starts a governed function on an executor
//! - **[`reenter!`] / [`suspend!`]**: write the jump table
//!
//! ## Key Features
//!
//! - **Outcome deduction**: an operation completing with no value, one value,
//!   or several values hands back `()`, the value, or a tuple
//! - **Error conventions**: failures reported through an [`ErrorCode`] or an
//!   `Option<Error>` lead argument are raised at the resumption point, or
//!   written to an [`ErrorSlot`] installed with [`AwaitContext::redirect`]
//! - **Composable**: chain a follow-up with [`Governed::then`], pin work to
//!   an executor with [`bind_executor`]
//!
//! ## Example
//!
//! ```
//! use await_context::prelude::*;
//!
//! let scheduler = LoopScheduler::new();
//! let ex = scheduler.executor();
//!
//! let body = {
//!     let ex = ex.clone();
//!     move |sum: &mut u32, ctx: AwaitContext<LoopExecutor>| -> Resumption<u32> {
//!         reenter!(co = ctx; {
//!             0 => { suspend!(co, 1, post_with(&ex, || 40_u32, ctx.clone())); }
//!             1 => {
//!                 *sum += co.outcome::<u32>()?;
//!                 suspend!(co, 2, post_with(&ex, || 2_u32, ctx.clone()));
//!             }
//!             2 => { Ok(Step::Complete(*sum + co.outcome::<u32>()?)) }
//!         })
//!     }
//! };
//!
//! let answer = std::sync::Arc::new(std::sync::Mutex::new(0));
//! let report = {
//!     let answer = answer.clone();
//!     move |v: u32| *answer.lock().unwrap() = v
//! };
//!
//! Launcher::on(&ex, body.then(report)).call(0).unwrap();
//! scheduler.run().unwrap();
//! assert_eq!(*answer.lock().unwrap(), 42);
//! ```
//!
//! ## Common Functions
//!
//! **Starting bodies:**
//! - [`Launcher::on(executor, f)`](Launcher::on) - Launch on an explicit executor
//! - [`Launcher::new(f)`](Launcher::new) - Launch on the executor `f` declares
//!
//! **Operations:**
//! - [`post_with`] / [`dispatch_with`] - Run a closure, complete with its value
//! - [`try_post_with`] - Complete through the error-code convention
//! - [`post_catching`] - Complete through the error-indicator convention
//!
//! **Executors:**
//! - [`LoopScheduler`](executor::LoopScheduler) - A run loop, on one or many threads
//! - [`InlineExecutor`](executor::InlineExecutor) - Runs everything immediately

mod context;
mod coroutine;
mod error;
mod frame;
mod governed;
mod initiate;
mod launch;
mod outcome;
mod step;

pub mod compose;
pub mod executor;
pub mod prelude;

pub use compose::{Bound, Chain, bind_executor, chain};
pub use context::{
    AwaitContext, AwaitHandler, Awaitable, CompletionHandler, CompletionToken, FrameExecutor,
};
pub use coroutine::{Coroutine, Reenter};
pub use error::{Error, ErrorCode, ErrorSlot, Result};
pub use executor::{
    ContextId, Executor, InlineExecutor, LoopExecutor, LoopScheduler, SchedulerConfig, Task,
};
pub use governed::Governed;
pub use initiate::{dispatch_with, post_catching, post_with, try_post_with};
pub use launch::Launcher;
pub use outcome::{Arity, Lead, Plain, Signature, Values, WithCode, WithError};
pub use step::{Step, Suspended};

/// Result of one pass through a governed body.
pub type Resumption<R> = std::result::Result<Step<Suspended, R>, Error>;
