//! Property-based tests for resumption bookkeeping

use std::sync::Arc;

use await_context::prelude::*;
use await_context::AwaitHandler;
use parking_lot::Mutex;
use proptest::prelude::*;

type Parked = Arc<Mutex<Option<AwaitHandler<InlineExecutor, Plain<(u32,)>>>>>;

/// Trace of one frame: labels entered, values received, a context to query
/// its state afterwards.
#[derive(Default)]
struct Trace {
    entered: Vec<i32>,
    received: Vec<u32>,
    ctx: Option<AwaitContext<InlineExecutor>>,
}

/// A body with `n` suspensions, written against the jump table directly
/// since the count is only known at run time.
fn counted(
    n: i32,
    parked: Parked,
    trace: Arc<Mutex<Trace>>,
) -> impl FnMut(&mut u32, AwaitContext<InlineExecutor>) -> Resumption<u32> + Send + 'static {
    move |total: &mut u32, ctx: AwaitContext<InlineExecutor>| {
        let mut co = ctx.reenter();
        co.rethrow()?;
        let at = co.position();
        {
            let mut trace = trace.lock();
            trace.entered.push(at);
            trace.ctx.get_or_insert_with(|| ctx.clone());
            if at > 0 {
                let value = co.outcome::<u32>()?;
                trace.received.push(value);
                *total += value;
            }
        }
        if at < n {
            co.enter(at + 1);
            let (handler, awaitable) = CompletionToken::<Plain<(u32,)>>::into_completion(ctx.clone());
            *parked.lock() = Some(handler);
            return co.suspended(awaitable);
        }
        Ok(Step::Complete(*total))
    }
}

proptest! {
    #[test]
    fn test_n_suspensions_need_exactly_n_completions(values in prop::collection::vec(0u32..1000, 0..24)) {
        let n = values.len() as i32;
        let parked: Parked = Arc::default();
        let trace = Arc::new(Mutex::new(Trace::default()));

        let first = Launcher::on(&InlineExecutor::new(), counted(n, parked.clone(), trace.clone()))
            .call(0)
            .unwrap();
        prop_assert_eq!(first.is_complete(), n == 0);

        let mut completions = 0;
        let mut feed = values.iter().copied();
        loop {
            // the completion parks the next handler, so release the lock first
            let next = parked.lock().take();
            let Some(handler) = next else { break };
            let value = feed.next().unwrap();
            handler.complete((value,)).unwrap();
            completions += 1;
        }

        let mut trace = trace.lock();
        let ctx = trace.ctx.take().unwrap();
        prop_assert_eq!(completions, values.len());
        prop_assert_eq!(&trace.entered, &(0..=n).collect::<Vec<_>>());
        prop_assert_eq!(&trace.received, &values);
        prop_assert!(ctx.is_complete());
    }
}
