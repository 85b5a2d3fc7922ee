//! Size Estimator Module
//!
//! Approximates the memory footprint of a cached value for admission and eviction accounting.
//!
//! The figures are relative, not byte-exact: a value's size is its inline size
//! (`size_of::<Self>()`) plus whatever it owns on the heap, walked recursively.

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::hash::BuildHasher;
use std::mem::size_of;
use std::rc::Rc;
use std::sync::Arc;

/// Recursion depth past which nested values only count their inline size.
pub const MAX_DEPTH: usize = 64;

// == Size Context ==
/// Walk state for one estimation: shared allocations already counted, and current depth.
#[derive(Debug, Default)]
pub struct SizeContext {
    visited: HashSet<usize>,
    depth: usize,
}

impl SizeContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a shared allocation. Returns false if it was already counted.
    pub fn first_visit<T: ?Sized>(&mut self, ptr: *const T) -> bool {
        self.visited.insert(ptr as *const () as usize)
    }

    /// Runs `f` one level deeper, or returns 0 once `MAX_DEPTH` is reached.
    pub fn descend(&mut self, f: impl FnOnce(&mut Self) -> usize) -> usize {
        if self.depth >= MAX_DEPTH {
            return 0;
        }
        self.depth += 1;
        let size = f(self);
        self.depth -= 1;
        size
    }
}

// == Estimate Size ==
/// Approximate recursive size of a value.
///
/// Implementors only provide [`heap_size`](EstimateSize::heap_size); the inline
/// part comes from `size_of_val`. Record types can use [`impl_estimate_size!`](crate::impl_estimate_size).
pub trait EstimateSize {
    /// Bytes owned outside the value's inline representation.
    fn heap_size(&self, _ctx: &mut SizeContext) -> usize {
        0
    }

    /// Inline size plus owned heap size.
    fn deep_size(&self, ctx: &mut SizeContext) -> usize {
        std::mem::size_of_val(self) + self.heap_size(ctx)
    }

    /// Estimates the size of `self` with a fresh context.
    fn estimate_size(&self) -> usize {
        self.deep_size(&mut SizeContext::new())
    }
}

macro_rules! impl_inline_only {
    ($($t:ty),*) => {
        $(impl EstimateSize for $t {})*
    };
}

impl_inline_only!(
    (), bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64
);

impl EstimateSize for String {
    fn heap_size(&self, _ctx: &mut SizeContext) -> usize {
        self.capacity()
    }
}

impl<T: EstimateSize> EstimateSize for Option<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        match self {
            Some(value) => value.heap_size(ctx),
            None => 0,
        }
    }
}

impl<T: EstimateSize> EstimateSize for Box<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        ctx.descend(|ctx| (**self).deep_size(ctx))
    }
}

impl<T: EstimateSize> EstimateSize for Rc<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        if !ctx.first_visit(Rc::as_ptr(self)) {
            return 0;
        }
        // Strong and weak counters live next to the value
        2 * size_of::<usize>() + ctx.descend(|ctx| (**self).deep_size(ctx))
    }
}

impl<T: EstimateSize> EstimateSize for Arc<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        if !ctx.first_visit(Arc::as_ptr(self)) {
            return 0;
        }
        2 * size_of::<usize>() + ctx.descend(|ctx| (**self).deep_size(ctx))
    }
}

impl<T: EstimateSize> EstimateSize for RefCell<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        // A mutably borrowed cell is skipped rather than panicking
        match self.try_borrow() {
            Ok(value) => value.heap_size(ctx),
            Err(_) => 0,
        }
    }
}

impl<T: EstimateSize, const N: usize> EstimateSize for [T; N] {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        ctx.descend(|ctx| self.iter().map(|item| item.heap_size(ctx)).sum())
    }
}

impl<T: EstimateSize> EstimateSize for Vec<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.capacity() * size_of::<T>()
            + ctx.descend(|ctx| self.iter().map(|item| item.heap_size(ctx)).sum())
    }
}

impl<T: EstimateSize> EstimateSize for VecDeque<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.capacity() * size_of::<T>()
            + ctx.descend(|ctx| self.iter().map(|item| item.heap_size(ctx)).sum())
    }
}

impl<T: EstimateSize, S: BuildHasher> EstimateSize for HashSet<T, S> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.capacity() * size_of::<T>()
            + ctx.descend(|ctx| self.iter().map(|item| item.heap_size(ctx)).sum())
    }
}

impl<T: EstimateSize> EstimateSize for BTreeSet<T> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.len() * size_of::<T>()
            + ctx.descend(|ctx| self.iter().map(|item| item.heap_size(ctx)).sum())
    }
}

impl<K: EstimateSize, V: EstimateSize, S: BuildHasher> EstimateSize for HashMap<K, V, S> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.capacity() * (size_of::<K>() + size_of::<V>())
            + ctx.descend(|ctx| {
                self.iter()
                    .map(|(key, value)| key.heap_size(ctx) + value.heap_size(ctx))
                    .sum()
            })
    }
}

impl<K: EstimateSize, V: EstimateSize> EstimateSize for BTreeMap<K, V> {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.len() * (size_of::<K>() + size_of::<V>())
            + ctx.descend(|ctx| {
                self.iter()
                    .map(|(key, value)| key.heap_size(ctx) + value.heap_size(ctx))
                    .sum()
            })
    }
}

impl<A: EstimateSize, B: EstimateSize> EstimateSize for (A, B) {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.0.heap_size(ctx) + self.1.heap_size(ctx)
    }
}

impl<A: EstimateSize, B: EstimateSize, C: EstimateSize> EstimateSize for (A, B, C) {
    fn heap_size(&self, ctx: &mut SizeContext) -> usize {
        self.0.heap_size(ctx) + self.1.heap_size(ctx) + self.2.heap_size(ctx)
    }
}

/// Implements [`EstimateSize`](crate::cache::EstimateSize) for a struct by summing the
/// heap sizes of the listed fields.
///
/// ```
/// use timed_sized_cache::impl_estimate_size;
/// use timed_sized_cache::cache::EstimateSize;
///
/// struct Report {
///     title: String,
///     rows: Vec<u64>,
/// }
/// impl_estimate_size!(Report { title, rows });
///
/// let report = Report { title: String::new(), rows: Vec::new() };
/// assert_eq!(report.estimate_size(), std::mem::size_of::<Report>());
/// ```
#[macro_export]
macro_rules! impl_estimate_size {
    ($ty:ty {}) => {
        impl $crate::cache::EstimateSize for $ty {}
    };
    ($ty:ty { $($field:ident),+ $(,)? }) => {
        impl $crate::cache::EstimateSize for $ty {
            fn heap_size(&self, ctx: &mut $crate::cache::SizeContext) -> usize {
                0 $(+ $crate::cache::EstimateSize::heap_size(&self.$field, ctx))+
            }
        }
    };
}
