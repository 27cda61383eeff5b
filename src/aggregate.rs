//! Aggregation combinators: fan many futures into one.
//!
//! [`when_any`] settles with the first input to finish; [`when_all`]
//! collects every input's outcome in input order. The heterogeneous tuple
//! form ([`when_all2`] and friends, or the [`when_all!`](macro@crate::when_all)
//! macro) preserves per-position static types.
//!
//! Children that settle with failures appear as [`Outcome::Failure`] slots
//! in the aggregate; the aggregate itself always materializes. A child
//! whose handle is already spent or poisoned contributes a synthesized
//! failure slot the same way (and may win a `when_any`).

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::future::Future;
use crate::launch::ready;
use crate::outcome::Outcome;
use crate::promise::Promise;

/// Settles with `(index, outcome)` of the first input to finish.
///
/// Ties are broken by an atomic winner flag: exactly one pair is emitted
/// even under concurrent settlement of all inputs; losers are discarded.
/// An empty input yields a ready `(0, Outcome::Empty)` pair.
pub fn when_any<T, I>(futures: I) -> Future<(usize, Outcome<T>)>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    struct AnyContext<T> {
        done: AtomicBool,
        producer: Promise<(usize, Outcome<T>)>,
    }

    let futures: Vec<Future<T>> = futures.into_iter().collect();
    if futures.is_empty() {
        return ready((0, Outcome::Empty));
    }

    let ctx = Arc::new(AnyContext {
        done: AtomicBool::new(false),
        producer: Promise::new(),
    });
    let aggregate = ctx.producer.future();

    for (index, future) in futures.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        future.subscribe(move |outcome| {
            if !ctx.done.swap(true, Ordering::AcqRel) {
                ctx.producer.set_value((index, outcome));
            }
        });
    }
    aggregate
}

/// Settles with every input's outcome once all of them have finished.
///
/// The outcome at index `i` belongs to the `i`-th input regardless of
/// completion order. An empty input yields a ready empty vector.
///
/// ```
/// let first = settle::Promise::new();
/// let second = settle::Promise::new();
/// let all = settle::when_all([first.future(), second.future()]);
///
/// second.set_value(21);
/// first.set_value(42);
///
/// let outcomes = all.get().unwrap();
/// assert_eq!(outcomes[0].clone().unwrap(), 42);
/// assert_eq!(outcomes[1].clone().unwrap(), 21);
/// ```
pub fn when_all<T, I>(futures: I) -> Future<Vec<Outcome<T>>>
where
    T: Clone + Send + 'static,
    I: IntoIterator<Item = Future<T>>,
{
    struct AllContext<T> {
        slots: Mutex<AllSlots<T>>,
        producer: Promise<Vec<Outcome<T>>>,
    }
    struct AllSlots<T> {
        results: Vec<Outcome<T>>,
        remaining: usize,
    }

    let futures: Vec<Future<T>> = futures.into_iter().collect();
    if futures.is_empty() {
        return ready(Vec::new());
    }
    let total = futures.len();

    let ctx = Arc::new(AllContext {
        slots: Mutex::new(AllSlots {
            results: (0..total).map(|_| Outcome::Empty).collect(),
            remaining: total,
        }),
        producer: Promise::new(),
    });
    let aggregate = ctx.producer.future();

    for (index, future) in futures.into_iter().enumerate() {
        let ctx = Arc::clone(&ctx);
        future.subscribe(move |outcome| {
            let finished = {
                let mut slots = ctx.slots.lock().expect("aggregate mutex poisoned");
                slots.results[index] = outcome;
                slots.remaining -= 1;
                if slots.remaining == 0 {
                    Some(mem::take(&mut slots.results))
                } else {
                    None
                }
            };
            if let Some(results) = finished {
                ctx.producer.set_value(results);
            }
        });
    }
    aggregate
}

macro_rules! when_all_tuple {
    ($(#[$doc:meta])* $name:ident => $(($future:ident, $ty:ident, $idx:tt)),+) => {
        $(#[$doc])*
        pub fn $name<$($ty),+>($($future: Future<$ty>),+) -> Future<($(Outcome<$ty>,)+)>
        where
            $($ty: Clone + Send + 'static),+
        {
            struct Context<$($ty),+> {
                slots: Mutex<(($(Option<Outcome<$ty>>,)+), usize)>,
                producer: Promise<($(Outcome<$ty>,)+)>,
            }

            impl<$($ty),+> Context<$($ty),+> {
                fn complete(&self) {
                    let results = {
                        let mut slots = self.slots.lock().expect("aggregate mutex poisoned");
                        ($(slots.0.$idx.take().unwrap_or_default(),)+)
                    };
                    self.producer.set_value(results);
                }
            }

            let total = [$(stringify!($future)),+].len();
            let ctx = Arc::new(Context {
                slots: Mutex::new((($(Option::<Outcome<$ty>>::None,)+), 0)),
                producer: Promise::new(),
            });
            let aggregate = ctx.producer.future();

            $(
                {
                    let ctx = Arc::clone(&ctx);
                    $future.subscribe(move |outcome| {
                        let finished = {
                            let mut slots =
                                ctx.slots.lock().expect("aggregate mutex poisoned");
                            slots.0.$idx = Some(outcome);
                            slots.1 += 1;
                            slots.1 == total
                        };
                        if finished {
                            ctx.complete();
                        }
                    });
                }
            )+

            aggregate
        }
    };
}

when_all_tuple! {
    /// Single-input tuple form of [`when_all`].
    when_all1 => (f0, T0, 0)
}
when_all_tuple! {
    /// Two-input heterogeneous [`when_all`]: each position keeps its own
    /// value type, and position `i` carries the outcome of the `i`-th
    /// argument regardless of completion order.
    when_all2 => (f0, T0, 0), (f1, T1, 1)
}
when_all_tuple! {
    /// Three-input heterogeneous [`when_all`].
    when_all3 => (f0, T0, 0), (f1, T1, 1), (f2, T2, 2)
}
when_all_tuple! {
    /// Four-input heterogeneous [`when_all`].
    when_all4 => (f0, T0, 0), (f1, T1, 1), (f2, T2, 2), (f3, T3, 3)
}
when_all_tuple! {
    /// Five-input heterogeneous [`when_all`].
    when_all5 => (f0, T0, 0), (f1, T1, 1), (f2, T2, 2), (f3, T3, 3), (f4, T4, 4)
}

/// Variadic sugar over the `when_allN` family: `when_all!(a, b, c)` yields
/// a `Future<(Outcome<A>, Outcome<B>, Outcome<C>)>`.
#[macro_export]
macro_rules! when_all {
    ($f0:expr $(,)?) => {
        $crate::when_all1($f0)
    };
    ($f0:expr, $f1:expr $(,)?) => {
        $crate::when_all2($f0, $f1)
    };
    ($f0:expr, $f1:expr, $f2:expr $(,)?) => {
        $crate::when_all3($f0, $f1, $f2)
    };
    ($f0:expr, $f1:expr, $f2:expr, $f3:expr $(,)?) => {
        $crate::when_all4($f0, $f1, $f2, $f3)
    };
    ($f0:expr, $f1:expr, $f2:expr, $f3:expr, $f4:expr $(,)?) => {
        $crate::when_all5($f0, $f1, $f2, $f3, $f4)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Failure;
    use crate::launch::failed;

    #[test]
    fn when_all_preserves_input_order() {
        let first = Promise::new();
        let second = Promise::new();
        let all = when_all([first.future(), second.future()]);

        // Settle out of order.
        second.set_value(21);
        first.set_value(42);

        let outcomes = all.get().unwrap();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].clone().unwrap(), 42);
        assert_eq!(outcomes[1].clone().unwrap(), 21);
    }

    #[test]
    fn when_all_empty_is_ready() {
        let all = when_all(Vec::<Future<i32>>::new());
        assert!(all.get().unwrap().is_empty());
    }

    #[test]
    fn when_all_records_child_failures() {
        let ok = ready(1);
        let bad: Future<i32> = failed(Failure::new("boom"));
        let outcomes = when_all([ok, bad]).get().unwrap();
        assert!(outcomes[0].has_value());
        assert!(outcomes[1].has_failure());
    }

    #[test]
    fn when_all_over_spent_handle_records_failure() {
        let spent = ready(1);
        let _ = spent.get();
        let outcomes = when_all([spent]).get().unwrap();
        assert!(outcomes[0].has_failure());
    }

    #[test]
    fn when_any_picks_the_settled_input() {
        let pending: Promise<i32> = Promise::new();
        let any = when_any([pending.future(), ready(7)]);
        let (index, outcome) = any.get().unwrap();
        assert_eq!(index, 1);
        assert_eq!(outcome.unwrap(), 7);
        pending.set_value(0);
    }

    #[test]
    fn when_any_empty_is_ready_default() {
        let any = when_any(Vec::<Future<i32>>::new());
        let (index, outcome) = any.get().unwrap();
        assert_eq!(index, 0);
        assert!(outcome.is_empty());
    }

    #[test]
    fn when_any_emits_exactly_one_winner() {
        let any = when_any([ready(1), ready(2), ready(3)]);
        let (index, outcome) = any.get().unwrap();
        assert!(index < 3);
        assert_eq!(outcome.unwrap() as usize, index + 1);
    }

    #[test]
    fn tuple_form_keeps_per_position_types() {
        let number = Promise::new();
        let unit = Promise::new();
        let both = when_all2(number.future(), unit.future());

        number.set_value(42);
        unit.set_value(());

        let (first, second) = both.get().unwrap();
        assert_eq!(first.unwrap(), 42);
        assert!(second.has_value());
    }

    #[test]
    fn tuple_form_mixed_settlement_order() {
        let a = Promise::new();
        let b = Promise::new();
        let c = Promise::new();
        let all = when_all3(a.future(), b.future(), c.future());

        c.set_value("later");
        a.set_value(1);
        b.set_value(2.5);

        let (first, second, third) = all.get().unwrap();
        assert_eq!(first.unwrap(), 1);
        assert!((second.unwrap() - 2.5_f64).abs() < f64::EPSILON);
        assert_eq!(third.unwrap(), "later");
    }

    #[test]
    fn when_all_macro_dispatches_by_arity() {
        let pair = when_all!(ready(1), ready("two"));
        let (first, second) = pair.get().unwrap();
        assert_eq!(first.unwrap(), 1);
        assert_eq!(second.unwrap(), "two");

        let single = when_all!(ready(9));
        let (only,) = single.get().unwrap();
        assert_eq!(only.unwrap(), 9);
    }
}
