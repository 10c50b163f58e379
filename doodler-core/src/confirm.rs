//! Confirmation prompts for destructive actions.

/// A destructive action awaiting the user's go-ahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestructiveAction<'a> {
    /// Wipe the canvas to white.
    ClearCanvas,
    /// Drop every history entry.
    ClearHistory,
    /// Drop one history entry.
    DeleteHistoryItem(&'a str),
}

impl DestructiveAction<'_> {
    /// Message shown to the user.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::ClearCanvas => "Are you sure you want to clear the canvas?",
            Self::ClearHistory => "Are you sure you want to clear all history?",
            Self::DeleteHistoryItem(_) => "Are you sure you want to delete this item?",
        }
    }
}

/// Asks the user to approve a destructive action.
pub trait Confirm {
    /// Return `true` to proceed.
    fn confirm(&mut self, action: DestructiveAction<'_>) -> bool;
}

/// Approves everything. Used by non-interactive hosts.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _action: DestructiveAction<'_>) -> bool {
        true
    }
}

/// Declines everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, _action: DestructiveAction<'_>) -> bool {
        false
    }
}

impl<F> Confirm for F
where
    F: FnMut(DestructiveAction<'_>) -> bool,
{
    fn confirm(&mut self, action: DestructiveAction<'_>) -> bool {
        self(action)
    }
}
