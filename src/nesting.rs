// src/nesting.rs

//! Depth tracking for one call chain.
//!
//! A single externally observed operation may re-enter the dispatch pipeline
//! (a composite operation issuing sub-operations). Only the outermost boundary
//! is admitted and counted; inner entries inherit its decision.

/// Per-call-chain nesting counter.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NestingTracker {
    depth: usize,
}

impl NestingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry. Returns `true` if this is the outermost one.
    pub fn enter(&mut self) -> bool {
        let outermost = self.depth == 0;
        self.depth += 1;
        outermost
    }

    /// Record an exit. Returns `true` if this closes the outermost entry.
    ///
    /// An exit without a matching entry leaves the tracker idle and returns `false`.
    pub fn exit(&mut self) -> bool {
        match self.depth {
            0 => false,
            depth => {
                self.depth = depth - 1;
                self.depth == 0
            }
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_idle(&self) -> bool {
        self.depth == 0
    }
}
