/// Result of running a governed body for one pass: either it suspended at a
/// labelled point, or it reached its end with a final value.
///
/// # Examples
///
/// ```rust
/// use await_context::{Step, Suspended};
///
/// let parked: Step<Suspended, u32> = Step::Yielded(Suspended::at(3));
/// let finished: Step<Suspended, u32> = Step::Complete(7);
///
/// assert!(parked.is_yielded());
/// assert_eq!(finished.map_complete(|v| v * 2), Step::Complete(14));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step<Y, D> {
    /// The body parked itself and is waiting for a completion
    Yielded(Y),
    /// The body ran to its end
    Complete(D),
}

/// Marker yielded by a pass that stopped at a suspension point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Suspended {
    label: i32,
}

impl Suspended {
    /// A marker for the suspension point `label`.
    pub const fn at(label: i32) -> Self {
        Suspended { label }
    }

    /// The label the frame will re-enter at.
    pub const fn label(&self) -> i32 {
        self.label
    }
}

impl<Y, D> Step<Y, D> {
    /// Returns `true` if the pass suspended.
    #[inline]
    pub const fn is_yielded(&self) -> bool {
        matches!(self, Step::Yielded(_))
    }

    /// Returns `true` if the pass ran the body to its end.
    #[inline]
    pub const fn is_complete(&self) -> bool {
        matches!(self, Step::Complete(_))
    }

    /// Converts into `Option<Y>`, discarding a final value.
    #[inline]
    pub fn yielded_value(self) -> Option<Y> {
        match self {
            Step::Yielded(y) => Some(y),
            Step::Complete(_) => None,
        }
    }

    /// Converts into `Option<D>`, discarding a suspension marker.
    ///
    /// ```rust
    /// use await_context::{Step, Suspended};
    ///
    /// let done: Step<Suspended, &str> = Step::Complete("done");
    /// assert_eq!(done.complete_value(), Some("done"));
    ///
    /// let parked: Step<Suspended, &str> = Step::Yielded(Suspended::at(1));
    /// assert_eq!(parked.complete_value(), None);
    /// ```
    #[inline]
    pub fn complete_value(self) -> Option<D> {
        match self {
            Step::Yielded(_) => None,
            Step::Complete(d) => Some(d),
        }
    }

    /// Maps the final value, leaving a suspension untouched.
    #[inline]
    pub fn map_complete<D2, F>(self, f: F) -> Step<Y, D2>
    where
        F: FnOnce(D) -> D2,
    {
        match self {
            Step::Yielded(y) => Step::Yielded(y),
            Step::Complete(d) => Step::Complete(f(d)),
        }
    }

    /// Maps the suspension marker, leaving a final value untouched.
    #[inline]
    pub fn map_yielded<Y2, F>(self, f: F) -> Step<Y2, D>
    where
        F: FnOnce(Y) -> Y2,
    {
        match self {
            Step::Yielded(y) => Step::Yielded(f(y)),
            Step::Complete(d) => Step::Complete(d),
        }
    }

    #[inline]
    pub const fn as_ref(&self) -> Step<&Y, &D> {
        match *self {
            Step::Yielded(ref y) => Step::Yielded(y),
            Step::Complete(ref d) => Step::Complete(d),
        }
    }

    /// Returns the final value.
    ///
    /// # Panics
    ///
    /// Panics with `msg` if the pass suspended.
    #[inline]
    #[track_caller]
    pub fn expect_complete(self, msg: &str) -> D {
        match self {
            Step::Yielded(_) => panic!("{}", msg),
            Step::Complete(d) => d,
        }
    }

    /// Returns the suspension marker.
    ///
    /// # Panics
    ///
    /// Panics with `msg` if the pass completed.
    #[inline]
    #[track_caller]
    pub fn expect_yielded(self, msg: &str) -> Y {
        match self {
            Step::Yielded(y) => y,
            Step::Complete(_) => panic!("{}", msg),
        }
    }

    #[inline]
    #[track_caller]
    pub fn unwrap_complete(self) -> D {
        self.expect_complete("called `Step::unwrap_complete()` on a `Yielded` value")
    }

    #[inline]
    #[track_caller]
    pub fn unwrap_yielded(self) -> Y {
        self.expect_yielded("called `Step::unwrap_yielded()` on a `Complete` value")
    }
}
