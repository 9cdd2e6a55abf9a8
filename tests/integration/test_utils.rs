//! Shared helpers for integration tests

use std::sync::Once;

use await_context::{CompletionHandler, CompletionToken, ErrorCode, Executor, WithCode};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Installs a subscriber writing through the test harness. Filtered by
/// `RUST_LOG`, silent by default.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// A fake stream read: completes later on `executor` with an error code, the
/// number of bytes read, and whether the end was reached.
pub fn async_read<E, T>(executor: &E, result: Result<usize, i32>, token: T) -> T::Output
where
    E: Executor,
    T: CompletionToken<WithCode<(usize, bool)>>,
{
    let (handler, output) = token.into_completion();
    let work = executor.make_work();
    executor.post(Box::new(move || {
        let _work = work;
        let args = match result {
            Ok(len) => (ErrorCode::success(), len, len == 0),
            Err(value) => (ErrorCode::new(value, ErrorCode::SYSTEM), 0, false),
        };
        handler.complete(args)
    }));
    output
}

/// A fake timer wait: completes later on `executor` with only an error code.
pub fn async_wait<E, T>(executor: &E, token: T) -> T::Output
where
    E: Executor,
    T: CompletionToken<WithCode<()>>,
{
    let (handler, output) = token.into_completion();
    let work = executor.make_work();
    executor.post(Box::new(move || {
        let _work = work;
        handler.complete((ErrorCode::success(),))
    }));
    output
}
