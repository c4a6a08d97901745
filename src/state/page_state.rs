/// Page state definitions for tracking crawl progress
///
/// A URL waits in the frontier's queue, is held by one worker while it is
/// processed, and each attempt ends in one of these states:
///
/// ```text
/// (queued) -> (in flight) -> Recorded
///                         -> Unextractable
///                         -> Redirected
///                         -> Retrying -> (queued)
///                         -> GaveUp
/// ```
use std::fmt;

/// Outcome of one processing attempt for a URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageState {
    /// URL failed transiently and goes back to the queue after its cooldown
    Retrying,

    // ===== Terminal States =====
    /// Page was fetched (and recorded, unless it already was)
    Recorded,

    /// Page was fetched but yielded no usable content
    Unextractable,

    /// Server pointed elsewhere; the target was handed to the frontier
    Redirected,

    /// URL exhausted its retry budget, failed fatally or could not be stored
    GaveUp,
}

impl PageState {
    /// Returns true if no further processing happens for this URL in the run
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Retrying)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Retrying => "retrying",
            Self::Recorded => "recorded",
            Self::Unextractable => "unextractable",
            Self::Redirected => "redirected",
            Self::GaveUp => "gave_up",
        }
    }
}

impl fmt::Display for PageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
