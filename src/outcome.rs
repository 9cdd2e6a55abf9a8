//! Completion signatures and the outcome shape they deduce.
//!
//! An asynchronous operation declares how it reports completion by naming a
//! [`Signature`]:
//!
//! - [`Plain<V>`]: the completion passes only values `V`;
//! - [`WithCode<V>`]: an [`ErrorCode`] followed by values `V`;
//! - [`WithError<V>`]: an `Option<Error>` followed by values `V`.
//!
//! `V` is a tuple of the declared value types. The outcome a suspended body
//! reads back is deduced from its arity: nothing for `()`, the value itself
//! for `(T,)`, and the tuple unchanged for two or more values.
//!
//! ```rust
//! use await_context::{Arity, ErrorCode, Plain, Signature, Values, WithCode};
//!
//! assert_eq!(<() as Values>::ARITY, Arity::None);
//! assert_eq!(<(u8,) as Values>::ARITY, Arity::One);
//! assert_eq!(<(u8, String) as Values>::ARITY, Arity::Many(2));
//!
//! let (_, outcome) = WithCode::<(usize,)>::split((ErrorCode::success(), 5));
//! assert_eq!(outcome, 5);
//! let (_, pair) = Plain::<(u8, char)>::split((1, 'x'));
//! assert_eq!(pair, (1, 'x'));
//! ```

use std::marker::PhantomData;

use crate::error::{Error, ErrorCode};

/// Runtime view of an outcome shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    /// The completion carries no values; nothing is stored.
    None,
    /// A single value, stored as itself.
    One,
    /// Two or more values, stored as a tuple in declared order.
    Many(usize),
}

/// A tuple of completion values and the outcome it collapses to.
pub trait Values: Send + 'static {
    type Outcome: Send + 'static;
    const ARITY: Arity;

    fn into_outcome(self) -> Self::Outcome;
}

/// The leading argument of a completion, stripped before the values.
#[derive(Debug)]
pub enum Lead {
    None,
    Code(ErrorCode),
    Error(Option<Error>),
}

/// A completion signature: the arguments an operation passes to its
/// handler, and how they split into a lead and an outcome.
pub trait Signature: 'static {
    type Args: Send + 'static;
    type Outcome: Send + 'static;
    const ARITY: Arity;

    fn split(args: Self::Args) -> (Lead, Self::Outcome);
}

/// Completion passing only values.
pub struct Plain<V>(PhantomData<fn() -> V>);

/// Completion passing an [`ErrorCode`] first.
pub struct WithCode<V>(PhantomData<fn() -> V>);

/// Completion passing an optional [`Error`] first.
pub struct WithError<V>(PhantomData<fn() -> V>);

impl<V: Values> Signature for Plain<V> {
    type Args = V;
    type Outcome = V::Outcome;
    const ARITY: Arity = V::ARITY;

    fn split(args: V) -> (Lead, V::Outcome) {
        (Lead::None, args.into_outcome())
    }
}

impl Values for () {
    type Outcome = ();
    const ARITY: Arity = Arity::None;

    fn into_outcome(self) {}
}

impl<A: Send + 'static> Values for (A,) {
    type Outcome = A;
    const ARITY: Arity = Arity::One;

    fn into_outcome(self) -> A {
        self.0
    }
}

impl Signature for WithCode<()> {
    type Args = (ErrorCode,);
    type Outcome = ();
    const ARITY: Arity = Arity::None;

    fn split((code,): (ErrorCode,)) -> (Lead, ()) {
        (Lead::Code(code), ())
    }
}

impl Signature for WithError<()> {
    type Args = (Option<Error>,);
    type Outcome = ();
    const ARITY: Arity = Arity::None;

    fn split((err,): (Option<Error>,)) -> (Lead, ()) {
        (Lead::Error(err), ())
    }
}

impl<A: Send + 'static> Signature for WithCode<(A,)> {
    type Args = (ErrorCode, A);
    type Outcome = A;
    const ARITY: Arity = Arity::One;

    fn split((code, a): (ErrorCode, A)) -> (Lead, A) {
        (Lead::Code(code), a)
    }
}

impl<A: Send + 'static> Signature for WithError<(A,)> {
    type Args = (Option<Error>, A);
    type Outcome = A;
    const ARITY: Arity = Arity::One;

    fn split((err, a): (Option<Error>, A)) -> (Lead, A) {
        (Lead::Error(err), a)
    }
}

macro_rules! many_values {
    ($n:expr; $($t:ident),+) => {
        impl<$($t: Send + 'static),+> Values for ($($t,)+) {
            type Outcome = ($($t,)+);
            const ARITY: Arity = Arity::Many($n);

            fn into_outcome(self) -> Self::Outcome {
                self
            }
        }

        impl<$($t: Send + 'static),+> Signature for WithCode<($($t,)+)> {
            type Args = (ErrorCode, $($t,)+);
            type Outcome = ($($t,)+);
            const ARITY: Arity = Arity::Many($n);

            #[allow(non_snake_case)]
            fn split((code, $($t,)+): Self::Args) -> (Lead, Self::Outcome) {
                (Lead::Code(code), ($($t,)+))
            }
        }

        impl<$($t: Send + 'static),+> Signature for WithError<($($t,)+)> {
            type Args = (Option<Error>, $($t,)+);
            type Outcome = ($($t,)+);
            const ARITY: Arity = Arity::Many($n);

            #[allow(non_snake_case)]
            fn split((err, $($t,)+): Self::Args) -> (Lead, Self::Outcome) {
                (Lead::Error(err), ($($t,)+))
            }
        }
    };
}

many_values!(2; A, B);
many_values!(3; A, B, C);
many_values!(4; A, B, C, D);
many_values!(5; A, B, C, D, E);
many_values!(6; A, B, C, D, E, F);
many_values!(7; A, B, C, D, E, F, G);
many_values!(8; A, B, C, D, E, F, G, H);
