//! The heap-resident record behind a suspended governed body.

use std::any::Any;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::AwaitContext;
use crate::coroutine::{Coroutine, Reenter};
use crate::error::{Error, ErrorSlot, Result};
use crate::executor::Executor;
use crate::governed::Governed;
use crate::step::{Step, Suspended};
use crate::Resumption;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Drive {
    Idle,
    Running,
    /// A completion asked for a resumption while a pass was running.
    Notified,
}

/// The untyped part of a frame: everything a completion handler touches.
#[derive(Debug)]
pub(crate) struct FrameState {
    coroutine: Mutex<Coroutine>,
    pending: Mutex<Option<Error>>,
    redirect: Mutex<Option<ErrorSlot>>,
    outcome: Mutex<Option<Box<dyn Any + Send>>>,
    drive: Mutex<Drive>,
}

impl FrameState {
    pub(crate) fn new() -> Self {
        FrameState {
            coroutine: Mutex::new(Coroutine::new()),
            pending: Mutex::new(None),
            redirect: Mutex::new(None),
            outcome: Mutex::new(None),
            drive: Mutex::new(Drive::Idle),
        }
    }

    pub fn position(&self) -> i32 {
        self.coroutine.lock().position()
    }

    pub fn is_complete(&self) -> bool {
        self.coroutine.lock().is_complete()
    }

    pub(crate) fn reenter(&self) -> Reenter<'_> {
        Reenter::new(self)
    }

    pub(crate) fn advance(&self, label: i32) {
        self.coroutine.lock().advance(label);
    }

    pub(crate) fn terminate(&self) {
        let mut co = self.coroutine.lock();
        if !co.is_complete() {
            co.terminate();
            tracing::debug!("frame reached terminal state");
        }
    }

    /// Stores the failure the next pass raises. An earlier failure for the
    /// same suspension wins; the later one is logged.
    pub(crate) fn set_pending(&self, err: Error) {
        if let Err(err) = self.offer_pending(err) {
            tracing::error!(error = %err, "second failure for one suspension");
        }
    }

    /// Like [`set_pending`](Self::set_pending), but hands `err` back when the
    /// frame already holds a failure or can no longer be resumed.
    pub(crate) fn offer_pending(&self, err: Error) -> Result<()> {
        if self.is_complete() {
            return Err(err);
        }
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return Err(err);
        }
        *pending = Some(err);
        Ok(())
    }

    pub(crate) fn take_pending(&self) -> Option<Error> {
        self.pending.lock().take()
    }

    pub(crate) fn install_redirect(&self, slot: Option<ErrorSlot>) {
        *self.redirect.lock() = slot;
    }

    pub(crate) fn take_redirect(&self) -> Option<ErrorSlot> {
        self.redirect.lock().take()
    }

    pub(crate) fn store_outcome(&self, value: Box<dyn Any + Send>) {
        *self.outcome.lock() = Some(value);
    }

    pub(crate) fn clear_outcome(&self) {
        self.outcome.lock().take();
    }

    pub(crate) fn take_outcome(&self) -> Option<Box<dyn Any + Send>> {
        self.outcome.lock().take()
    }

    /// Claims the right to run a pass. Returns `false` if a pass is already
    /// running, in which case that pass will run again once it parks.
    fn begin_pass(&self) -> bool {
        let mut drive = self.drive.lock();
        match *drive {
            Drive::Idle => {
                *drive = Drive::Running;
                true
            }
            Drive::Running | Drive::Notified => {
                *drive = Drive::Notified;
                false
            }
        }
    }

    /// Releases the pass. Returns `true` if a resumption arrived meanwhile
    /// and the caller must run another pass.
    fn end_pass(&self) -> bool {
        let mut drive = self.drive.lock();
        match *drive {
            Drive::Notified => {
                *drive = Drive::Running;
                true
            }
            _ => {
                *drive = Drive::Idle;
                false
            }
        }
    }
}

/// Object-safe view of a frame, held by contexts and completion handlers.
pub(crate) trait Resume: Send + Sync {
    fn state(&self) -> &FrameState;

    /// Runs the body from its current position, propagating a failure raised
    /// by the pass.
    fn resume(self: Arc<Self>) -> Result<()>;
}

/// A governed body together with its captured arguments and the work token
/// keeping its executor alive.
pub(crate) struct Frame<E: Executor, F, A> {
    state: FrameState,
    executor: E,
    _work: E::Work,
    body: Mutex<(F, A)>,
}

impl<E, F, A> Frame<E, F, A>
where
    E: Executor,
    F: Governed<E, A>,
    A: Send + 'static,
{
    pub(crate) fn new(executor: E, work: E::Work, func: F, args: A) -> Arc<Self> {
        tracing::debug!(body = std::any::type_name::<F>(), "frame created");
        Arc::new(Frame {
            state: FrameState::new(),
            executor,
            _work: work,
            body: Mutex::new((func, args)),
        })
    }

    /// Runs passes until the body parks with no resumption queued, or
    /// finishes. Returns the last pass's result.
    pub(crate) fn drive(self: &Arc<Self>) -> Resumption<F::Output> {
        if self.state.is_complete() {
            tracing::warn!("attempted to resume a finished frame");
            return Err(Error::AlreadyComplete);
        }
        if !self.state.begin_pass() {
            tracing::trace!("resumption folded into the running pass");
            return Ok(Step::Yielded(Suspended::at(self.state.position())));
        }
        loop {
            let result = {
                let mut body = self.body.lock();
                let (func, args) = &mut *body;
                let ctx = AwaitContext::new(self.executor.clone(), self.clone() as Arc<dyn Resume>);
                tracing::trace!(position = self.state.position(), "resuming");
                func.resume(args, ctx)
            };
            match &result {
                Ok(Step::Yielded(_)) => {}
                Ok(Step::Complete(_)) => self.state.terminate(),
                Err(err) => {
                    tracing::debug!(error = %err, "frame raised");
                    self.state.terminate();
                }
            }
            if self.state.end_pass() {
                if !self.state.is_complete() {
                    continue;
                }
                tracing::warn!("completion arrived for a finished frame");
            }
            return result;
        }
    }
}

impl<E, F, A> Resume for Frame<E, F, A>
where
    E: Executor,
    F: Governed<E, A>,
    A: Send + 'static,
{
    fn state(&self) -> &FrameState {
        &self.state
    }

    fn resume(self: Arc<Self>) -> Result<()> {
        self.drive().map(|_| ())
    }
}
