//! Bodies resumed by completions arriving on several worker threads

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use await_context::prelude::*;
use parking_lot::Mutex;

use super::test_utils::init_tracing;

fn three_steps(
    ex: &LoopExecutor,
    sum: Arc<AtomicU64>,
    done: Arc<AtomicUsize>,
) -> impl Governed<LoopExecutor, u64, Output = ()> + use<> {
    let ex = ex.clone();
    move |acc: &mut u64, ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
        reenter!(co = ctx; {
            0 => { suspend!(co, 1, post_with(&ex, || 1_u64, ctx.clone())); }
            1 => {
                *acc += co.outcome::<u64>()?;
                suspend!(co, 2, post_with(&ex, || 10_u64, ctx.clone()));
            }
            2 => {
                *acc += co.outcome::<u64>()?;
                suspend!(co, 3, dispatch_with(&ex, || 100_u64, ctx.clone()));
            }
            3 => {
                *acc += co.outcome::<u64>()?;
                sum.fetch_add(*acc, Ordering::SeqCst);
                done.fetch_add(1, Ordering::SeqCst);
                Ok(Step::Complete(()))
            }
        })
    }
}

#[test]
fn test_many_frames_on_a_thread_pool() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();
    let sum = Arc::new(AtomicU64::new(0));
    let done = Arc::new(AtomicUsize::new(0));

    for seed in 0..64_u64 {
        let body = three_steps(&ex, sum.clone(), done.clone());
        let first = Launcher::on(&ex, body).call(seed).unwrap();
        assert!(first.is_yielded());
    }

    scheduler.run_threads(4).unwrap();
    assert_eq!(done.load(Ordering::SeqCst), 64);
    assert_eq!(sum.load(Ordering::SeqCst), (0..64).sum::<u64>() + 64 * 111);
    assert_eq!(scheduler.outstanding_work(), 0);
}

#[test]
fn test_every_failing_frame_is_reported_by_the_pool() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();

    for id in 0..2_u32 {
        let body = {
            let ex = ex.clone();
            move |_: &mut (), ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
                reenter!(co = ctx; {
                    0 => { suspend!(co, 1, post_with(&ex, move || id, ctx.clone())); }
                    1 => { Err(Error::msg(format!("frame {} failed", co.outcome::<u32>()?))) }
                })
            }
        };
        Launcher::on(&ex, body).call(()).unwrap();
    }

    let mut failures = vec![scheduler.run_threads(2).unwrap_err().to_string()];
    failures.push(scheduler.run().unwrap_err().to_string());
    failures.sort();
    assert_eq!(failures, vec!["frame 0 failed", "frame 1 failed"]);
    assert_eq!(scheduler.run().unwrap(), 0);
    assert_eq!(scheduler.outstanding_work(), 0);
}

type Spawned = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Completes from a fresh OS thread, racing the pass that initiated it.
fn racing_op<T>(spawned: &Spawned, value: u32, token: T) -> T::Output
where
    T: CompletionToken<Plain<(u32,)>>,
{
    let (handler, output) = token.into_completion();
    let worker = std::thread::spawn(move || {
        if let Err(err) = handler.complete((value,)) {
            panic!("completion failed: {err}");
        }
    });
    spawned.lock().push(worker);
    output
}

#[test]
fn test_completion_racing_the_initiating_pass_is_not_lost() {
    init_tracing();
    let spawned: Spawned = Arc::default();
    let results = Arc::new(Mutex::new(Vec::new()));

    for id in 0..32_u32 {
        let body = {
            let (spawned, results) = (spawned.clone(), results.clone());
            move |_: &mut (), ctx: AwaitContext<InlineExecutor>| -> Resumption<()> {
                reenter!(co = ctx; {
                    0 => { suspend!(co, 1, racing_op(&spawned, id, ctx.clone())); }
                    1 => {
                        let a = co.outcome::<u32>()?;
                        suspend!(co, 2, racing_op(&spawned, a * 2, ctx.clone()));
                    }
                    2 => {
                        results.lock().push(co.outcome::<u32>()?);
                        Ok(Step::Complete(()))
                    }
                })
            }
        };
        Launcher::on(&InlineExecutor::new(), body).call(()).unwrap();
    }

    // workers spawn further workers, so drain until none are left
    loop {
        let batch: Vec<_> = spawned.lock().drain(..).collect();
        if batch.is_empty() {
            break;
        }
        for worker in batch {
            worker.join().unwrap();
        }
    }

    let mut got = results.lock().clone();
    got.sort_unstable();
    assert_eq!(got, (0..32).map(|id| id * 2).collect::<Vec<_>>());
}
