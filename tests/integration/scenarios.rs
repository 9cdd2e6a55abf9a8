//! End-to-end scenarios on a single-threaded run loop

use std::sync::Arc;

use await_context::prelude::*;
use parking_lot::Mutex;

use super::test_utils::{async_read, async_wait, init_tracing};

#[derive(Debug, Default)]
struct Transfer {
    first: Option<u32>,
    reached_end: bool,
}

/// Awaits a value, then an operation failing with `code`.
fn value_then_failure(
    ex: &LoopExecutor,
    code: i32,
    seen: Arc<Mutex<Transfer>>,
) -> impl Governed<LoopExecutor, (), Output = ()> + use<> {
    let ex = ex.clone();
    move |_: &mut (), ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
        reenter!(co = ctx; {
            0 => { suspend!(co, 1, post_with(&ex, || 42_u32, ctx.clone())); }
            1 => {
                seen.lock().first = Some(co.outcome::<u32>()?);
                suspend!(co, 2, try_post_with(&ex, move || -> Result<u8, ErrorCode> {
                    Err(ErrorCode::new(code, ErrorCode::SYSTEM))
                }, ctx.clone()));
            }
            2 => {
                seen.lock().reached_end = true;
                Ok(Step::Complete(()))
            }
        })
    }
}

#[test]
fn test_value_then_failure_raises_at_outer_caller() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();
    let seen = Arc::new(Mutex::new(Transfer::default()));

    let first = Launcher::on(&ex, value_then_failure(&ex, 111, seen.clone()))
        .call(())
        .unwrap();
    assert_eq!(first, Step::Yielded(Suspended::at(1)));

    let err = scheduler.run().unwrap_err();
    assert_eq!(err.code(), Some(ErrorCode::new(111, ErrorCode::SYSTEM)));
    assert_eq!(seen.lock().first, Some(42));
    assert!(!seen.lock().reached_end);

    // the frame is gone, nothing keeps the loop alive
    assert_eq!(scheduler.outstanding_work(), 0);
    assert_eq!(scheduler.run().unwrap(), 0);
}

#[test]
fn test_chained_follow_up_fires_once_after_resolution() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();
    let fired = Arc::new(Mutex::new(0_usize));

    let x = {
        let ex = ex.clone();
        move |_: &mut (), ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
            reenter!(co = ctx; {
                0 => { suspend!(co, 1, post_with(&ex, || (), ctx.clone())); }
                1 => { Ok(Step::Complete(())) }
            })
        }
    };
    let y = {
        let fired = fired.clone();
        move |()| *fired.lock() += 1
    };

    Launcher::on(&ex, chain(x, y)).call(()).unwrap();
    assert_eq!(*fired.lock(), 0);

    scheduler.run().unwrap();
    assert_eq!(*fired.lock(), 1);
}

#[test]
fn test_redirected_read_failure_continues_with_code() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();
    let log = Arc::new(Mutex::new(Vec::new()));

    let reader = {
        let (ex, log) = (ex.clone(), log.clone());
        move |ec: &mut ErrorSlot, ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
            reenter!(co = ctx; {
                0 => { suspend!(co, 1, async_read(&ex, Err(104), ctx.redirect(ec))); }
                1 => {
                    let (len, eof) = co.outcome::<(usize, bool)>()?;
                    log.lock().push(format!("{} {len} {eof}", ec.get()));
                    suspend!(co, 2, async_read(&ex, Ok(0), ctx.clone()));
                }
                2 => {
                    let (len, eof) = co.outcome::<(usize, bool)>()?;
                    log.lock().push(format!("{len} {eof}"));
                    Ok(Step::Complete(()))
                }
            })
        }
    };

    Launcher::on(&ex, reader).call(ErrorSlot::new()).unwrap();
    scheduler.run().unwrap();
    assert_eq!(*log.lock(), vec!["system:104 0 false", "0 true"]);
}

#[test]
fn test_outcome_shape_follows_arity() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();
    let shapes = Arc::new(Mutex::new(Vec::new()));

    let body = {
        let (ex, shapes) = (ex.clone(), shapes.clone());
        move |_: &mut (), ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
            reenter!(co = ctx; {
                0 => {
                    suspend!(co, 1, async_wait(&ex, ctx.clone()));
                }
                1 => {
                    let () = co.outcome::<()>()?;
                    shapes.lock().push("unit");
                    suspend!(co, 2, post_with(&ex, || 'c', ctx.clone()));
                }
                2 => {
                    let c: char = co.outcome()?;
                    assert_eq!(c, 'c');
                    shapes.lock().push("single");
                    suspend!(co, 3, async_read(&ex, Ok(8), ctx.clone()));
                }
                3 => {
                    assert_eq!(co.outcome::<(usize, bool)>()?, (8, false));
                    shapes.lock().push("tuple");
                    Ok(Step::Complete(()))
                }
            })
        }
    };

    Launcher::on(&ex, body).call(()).unwrap();
    scheduler.run().unwrap();
    assert_eq!(*shapes.lock(), vec!["unit", "single", "tuple"]);
}

#[test]
fn test_wrong_outcome_type_is_reported() {
    init_tracing();
    let scheduler = LoopScheduler::new();
    let ex = scheduler.executor();

    let body = {
        let ex = ex.clone();
        move |_: &mut (), ctx: AwaitContext<LoopExecutor>| -> Resumption<()> {
            reenter!(co = ctx; {
                0 => { suspend!(co, 1, post_with(&ex, || 5_i64, ctx.clone())); }
                1 => {
                    co.outcome::<u8>()?;
                    Ok(Step::Complete(()))
                }
            })
        }
    };

    Launcher::on(&ex, body).call(()).unwrap();
    let err = scheduler.run().unwrap_err();
    assert!(matches!(err, Error::OutcomeMismatch { expected: "u8" }));
}

#[test]
fn test_configured_scheduler_runs_bodies() {
    init_tracing();
    let config: await_context::executor::SchedulerConfig =
        serde_json::from_str(r#"{ "name": "io", "threads": 2 }"#).unwrap();
    let scheduler = LoopScheduler::with_config(config);
    assert_eq!(scheduler.config().name, "io");

    let ex = scheduler.executor();
    let body = {
        let ex = ex.clone();
        move |n: &mut u64, ctx: AwaitContext<LoopExecutor>| -> Resumption<u64> {
            reenter!(co = ctx; {
                0 => { suspend!(co, 1, dispatch_with(&ex, { let n = *n; move || n * n }, ctx.clone())); }
                1 => { Ok(Step::Complete(co.outcome::<u64>()?)) }
            })
        }
    };

    Launcher::on(&ex, body).call(12).unwrap();
    assert_eq!(scheduler.run_pool().unwrap(), 1);
}
