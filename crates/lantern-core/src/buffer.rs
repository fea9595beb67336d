//! Bounded, ordered token history retained for model attention, with
//! message-boundary bookkeeping so eviction can discard whole turns.
//!
//! The buffer itself is not thread-safe; the owning `Session` serializes
//! access behind its lock.

use lantern_abi::Token;

#[derive(Default, Debug, Clone)]
pub struct TokenBuffer {
    tokens: Vec<Token>,
    /// Start offsets of logical messages, oldest first. Offsets are always
    /// `<= tokens.len()`; duplicates are allowed (marking twice without an
    /// intervening append records the same offset twice).
    boundaries: Vec<usize>,
}

impl TokenBuffer {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[inline]
    pub fn boundary_count(&self) -> usize {
        self.boundaries.len()
    }

    /// All cached tokens (oldest → newest).
    #[inline]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    #[inline]
    pub fn boundaries(&self) -> &[usize] {
        &self.boundaries
    }

    /// Record the current length as the start of a new message.
    #[inline]
    pub fn mark_boundary(&mut self) {
        self.boundaries.push(self.tokens.len());
    }

    #[inline]
    pub fn append(&mut self, tokens: &[Token]) {
        self.tokens.extend_from_slice(tokens);
    }

    #[inline]
    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    /// Drop `count` tokens from the front. Boundaries at or past the cut
    /// survive re-based onto the remaining tail; the rest are dropped.
    pub fn trim(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let count = count.min(self.tokens.len());
        self.tokens.drain(..count);
        self.boundaries.retain_mut(|b| {
            if *b >= count {
                *b -= count;
                true
            } else {
                false
            }
        });
    }

    /// Remove all cached tokens and boundaries.
    pub fn clear(&mut self) {
        self.tokens.clear();
        self.boundaries.clear();
    }
}
