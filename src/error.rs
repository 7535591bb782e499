// Error kinds surfaced by the crate (spec §7).
//
// `ParseError` is recoverable: the offending pattern is rejected and the
// `Matcher` remains usable. `RegistryConflict` and `ConfigurationError` are
// programming defects and are expected to propagate rather than be handled.

use thiserror::Error;

/// A pattern failed to parse or failed to compile into an NFA fragment.
///
/// Returned from [`crate::Matcher::add`]. The pattern is not registered and
/// previously registered patterns are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The pattern string is not valid regex syntax.
    #[error("invalid pattern `{pattern}`: {reason}")]
    Syntax { pattern: String, reason: String },

    /// The pattern uses a construct outside the supported subset
    /// (backreferences, lookaround, or anchors).
    #[error("pattern `{pattern}` uses an unsupported construct: {what}")]
    Unsupported { pattern: String, what: String },
}

/// An internal invariant was violated.
///
/// This always indicates a bug in the engine (a removal of a match that was
/// never registered) rather than a bad pattern or bad input. Per §7 these are
/// not recovered from. The regex-id lookup `Registry::get` is never exposed
/// to anything but trusted internal callers passing ids they themselves
/// allocated, so it indexes straight into its arena rather than returning a
/// `RegistryConflict` variant that would have no real way to be produced.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryConflict {
    #[error("match {0:?} was removed from the domination heap for regex {1:?} but was not present")]
    UnknownMatch(crate::domination::MatchId, crate::regexp::RegexpId),
}

/// The `Matcher` was constructed with an unrecognized engine or prefilter
/// selection (§6 Configuration).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown matching engine: {0}")]
    UnknownEngine(String),

    #[error("unknown prefilter selection: {0}")]
    UnknownPrefilter(String),

    #[error("prefilter.threshold must be nonzero")]
    ZeroThreshold,
}
