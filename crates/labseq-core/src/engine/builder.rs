//! Builder-style engine configuration for closure users.
//!
//! [`SequenceAnalyzerBuilder`] offers one registration method per hook
//! role; [`build`](SequenceAnalyzerBuilder::build) validates that every
//! required role is present and assembles the closures into a
//! [`QueueHooks`] implementation. Missing roles are reported together in a
//! single configuration error, before any row is processed.

use super::hooks::{ClearMode, QueueHooks};
use super::queue::SlidingQueue;
use super::SequenceAnalyzer;
use labseq_common::{Error, Result};
use std::fmt;
use std::hash::Hash;

/// Hook roles, used in missing-hook diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookRole {
    GroupKey,
    InitialState,
    PopPolicy,
    Admission,
    KeyExtraction,
}

impl fmt::Display for HookRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookRole::GroupKey => write!(f, "group key"),
            HookRole::InitialState => write!(f, "initial state"),
            HookRole::PopPolicy => write!(f, "pop policy"),
            HookRole::Admission => write!(f, "admission"),
            HookRole::KeyExtraction => write!(f, "key extraction"),
        }
    }
}

type GroupKeyFn<R, G> = Box<dyn Fn(&R) -> G>;
type InitStateFn<S> = Box<dyn Fn() -> S>;
type EvictFn<R> = Box<dyn Fn(u32, &R, &R) -> bool>;
type SentinelFn<R, S> = Box<dyn Fn(u32, &mut S, &R, &R)>;
type EmptiedFn<R, S> = Box<dyn Fn(u32, &mut S, &R)>;
type AdmitFn<R, S> = Box<dyn Fn(u32, &SlidingQueue<R>, &S, &R) -> bool>;
type ClearFn<R, S> = Box<dyn Fn(u32, &SlidingQueue<R>, &S, &R, bool) -> bool>;
type EmitFn<R, K, S> = Box<dyn Fn(u32, &SlidingQueue<R>, &S, bool) -> (K, u64)>;
type PostRowFn<R, S> = Box<dyn Fn(u32, &SlidingQueue<R>, &mut S, &R, bool)>;

/// Configuration phase for a closure-driven [`SequenceAnalyzer`].
pub struct SequenceAnalyzerBuilder<R, G, K, S> {
    group_key: Option<GroupKeyFn<R, G>>,
    init_state: Option<InitStateFn<S>>,
    evict: Option<EvictFn<R>>,
    on_sentinel: Option<SentinelFn<R, S>>,
    on_emptied: Option<EmptiedFn<R, S>>,
    admit: Option<AdmitFn<R, S>>,
    clear: Option<(ClearFn<R, S>, ClearMode)>,
    emit: Option<EmitFn<R, K, S>>,
    post_row: Vec<PostRowFn<R, S>>,
}

impl<R, G, K, S> Default for SequenceAnalyzerBuilder<R, G, K, S>
where
    R: Clone,
    G: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, G, K, S> SequenceAnalyzerBuilder<R, G, K, S>
where
    R: Clone,
    G: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        SequenceAnalyzerBuilder {
            group_key: None,
            init_state: None,
            evict: None,
            on_sentinel: None,
            on_emptied: None,
            admit: None,
            clear: None,
            emit: None,
            post_row: Vec::new(),
        }
    }

    /// Required: grouping key extraction.
    pub fn group_by(mut self, f: impl Fn(&R) -> G + 'static) -> Self {
        self.group_key = Some(Box::new(f));
        self
    }

    /// Required: state each (group, window) pass starts from.
    pub fn init_state(mut self, f: impl Fn() -> S + 'static) -> Self {
        self.init_state = Some(Box::new(f));
        self
    }

    /// Required: pop policy; heads are evicted while this returns true.
    pub fn evict_when(mut self, f: impl Fn(u32, &R, &R) -> bool + 'static) -> Self {
        self.evict = Some(Box::new(f));
        self
    }

    /// Optional: sentinel-only handler (bypasses the pop loop).
    pub fn on_sentinel(mut self, f: impl Fn(u32, &mut S, &R, &R) + 'static) -> Self {
        self.on_sentinel = Some(Box::new(f));
        self
    }

    /// Optional: handler run when eviction empties the queue.
    pub fn on_emptied(mut self, f: impl Fn(u32, &mut S, &R) + 'static) -> Self {
        self.on_emptied = Some(Box::new(f));
        self
    }

    /// Required: admission gate.
    pub fn admit_when(mut self, f: impl Fn(u32, &SlidingQueue<R>, &S, &R) -> bool + 'static) -> Self {
        self.admit = Some(Box::new(f));
        self
    }

    /// Optional: clearing condition and the mode applied when it holds.
    pub fn clear_when(
        mut self,
        f: impl Fn(u32, &SlidingQueue<R>, &S, &R, bool) -> bool + 'static,
        mode: ClearMode,
    ) -> Self {
        self.clear = Some((Box::new(f), mode));
        self
    }

    /// Required: keyed statistic extraction.
    pub fn emit_with(
        mut self,
        f: impl Fn(u32, &SlidingQueue<R>, &S, bool) -> (K, u64) + 'static,
    ) -> Self {
        self.emit = Some(Box::new(f));
        self
    }

    /// Optional, repeatable: post-row state mutation.
    pub fn post_row(mut self, f: impl Fn(u32, &SlidingQueue<R>, &mut S, &R, bool) + 'static) -> Self {
        self.post_row.push(Box::new(f));
        self
    }

    /// Finalize the configuration.
    ///
    /// Fails with [`Error::MissingHook`] naming every absent required
    /// role; no rows are processed on the failure path.
    pub fn build(self) -> Result<SequenceAnalyzer<FnHooks<R, G, K, S>>> {
        let mut missing: Vec<HookRole> = Vec::new();
        if self.group_key.is_none() {
            missing.push(HookRole::GroupKey);
        }
        if self.init_state.is_none() {
            missing.push(HookRole::InitialState);
        }
        if self.evict.is_none() {
            missing.push(HookRole::PopPolicy);
        }
        if self.admit.is_none() {
            missing.push(HookRole::Admission);
        }
        if self.emit.is_none() {
            missing.push(HookRole::KeyExtraction);
        }
        if !missing.is_empty() {
            let roles = missing
                .iter()
                .map(HookRole::to_string)
                .collect::<Vec<_>>()
                .join(", ");
            return Err(Error::MissingHook { roles });
        }

        Ok(SequenceAnalyzer::new(FnHooks {
            group_key: self.group_key.expect("validated above"),
            init_state: self.init_state.expect("validated above"),
            evict: self.evict.expect("validated above"),
            on_sentinel: self.on_sentinel,
            on_emptied: self.on_emptied,
            admit: self.admit.expect("validated above"),
            clear: self.clear,
            emit: self.emit.expect("validated above"),
            post_row: self.post_row,
        }))
    }
}

/// Closure-backed [`QueueHooks`] assembled by the builder.
///
/// Boxed closures carry no useful debug representation; formatting shows
/// which optional roles are present.
pub struct FnHooks<R, G, K, S> {
    group_key: GroupKeyFn<R, G>,
    init_state: InitStateFn<S>,
    evict: EvictFn<R>,
    on_sentinel: Option<SentinelFn<R, S>>,
    on_emptied: Option<EmptiedFn<R, S>>,
    admit: AdmitFn<R, S>,
    clear: Option<(ClearFn<R, S>, ClearMode)>,
    emit: EmitFn<R, K, S>,
    post_row: Vec<PostRowFn<R, S>>,
}

impl<R, G, K, S> fmt::Debug for FnHooks<R, G, K, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHooks")
            .field("on_sentinel", &self.on_sentinel.is_some())
            .field("on_emptied", &self.on_emptied.is_some())
            .field("clear", &self.clear.as_ref().map(|(_, mode)| *mode))
            .field("post_row", &self.post_row.len())
            .finish_non_exhaustive()
    }
}

impl<R, G, K, S> QueueHooks for FnHooks<R, G, K, S>
where
    R: Clone,
    G: Clone + Eq + Hash,
{
    type Row = R;
    type Group = G;
    type Key = K;
    type State = S;

    fn group_key(&self, row: &R) -> G {
        (self.group_key)(row)
    }

    fn initial_state(&self) -> S {
        (self.init_state)()
    }

    fn should_evict(&self, window: u32, head: &R, row: &R) -> bool {
        (self.evict)(window, head, row)
    }

    fn on_sentinel(&self, window: u32, state: &mut S, sentinel: &R, row: &R) {
        if let Some(f) = &self.on_sentinel {
            f(window, state, sentinel, row);
        }
    }

    fn on_emptied(&self, window: u32, state: &mut S, row: &R) {
        if let Some(f) = &self.on_emptied {
            f(window, state, row);
        }
    }

    fn admit(&self, window: u32, queue: &SlidingQueue<R>, state: &S, row: &R) -> bool {
        (self.admit)(window, queue, state, row)
    }

    fn clear_after(
        &self,
        window: u32,
        queue: &SlidingQueue<R>,
        state: &S,
        row: &R,
        row_added: bool,
    ) -> ClearMode {
        match &self.clear {
            Some((f, mode)) if f(window, queue, state, row, row_added) => *mode,
            _ => ClearMode::Keep,
        }
    }

    fn emit(&self, window: u32, queue: &SlidingQueue<R>, state: &S, row_added: bool) -> (K, u64) {
        (self.emit)(window, queue, state, row_added)
    }

    fn after_row(
        &self,
        window: u32,
        queue: &SlidingQueue<R>,
        state: &mut S,
        row: &R,
        row_added: bool,
    ) {
        for f in &self.post_row {
            f(window, queue, state, row, row_added);
        }
    }
}
