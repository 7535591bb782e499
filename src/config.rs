// Matcher configuration (spec §6 "Configuration (options enumerated)").
//
// There is no persisted state and no wire protocol; configuration is a plain
// value built up with a constructor-argument style, matching the teacher's
// `Program::new(engine, bytes, size_limit, re)` / `Executor::new` shape
// rather than a config-file format.

use crate::error::ConfigurationError;

/// Chooses whether the per-character hot loop uses the ASCII fast-lane and
/// thread-local scratch buffers, or the portable default path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Engine {
    /// The portable, always-correct path.
    Default,
    /// ASCII fast-lane with per-call scratch buffers reused across steps.
    Fastpath,
}

impl Engine {
    fn parse(s: &str) -> Result<Self, ConfigurationError> {
        match s {
            "default" => Ok(Engine::Default),
            "fastpath" => Ok(Engine::Fastpath),
            other => Err(ConfigurationError::UnknownEngine(other.to_string())),
        }
    }
}

/// Enables or disables the literal-prefix prefilter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prefilter {
    /// Never consult the prefilter; the Start Node is always tried.
    None,
    /// Consult an Aho-Corasick prefilter once the registered pattern count
    /// reaches `threshold`.
    Aho,
}

impl Prefilter {
    fn parse(s: &str) -> Result<Self, ConfigurationError> {
        match s {
            "none" => Ok(Prefilter::None),
            "aho" => Ok(Prefilter::Aho),
            other => Err(ConfigurationError::UnknownPrefilter(other.to_string())),
        }
    }
}

/// Default prefilter activation threshold: a Matcher with fewer registered
/// patterns than this bypasses the prefilter unconditionally even when
/// `prefilter` is `Aho` (see §4.3).
pub const DEFAULT_PREFILTER_THRESHOLD: u32 = 2_000;

/// Configuration for a [`crate::Matcher`] (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatcherConfig {
    pub(crate) engine: Engine,
    pub(crate) prefilter: Prefilter,
    pub(crate) prefilter_threshold: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        MatcherConfig {
            engine: Engine::Default,
            prefilter: Prefilter::Aho,
            prefilter_threshold: DEFAULT_PREFILTER_THRESHOLD,
        }
    }
}

impl MatcherConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    pub fn with_prefilter(mut self, prefilter: Prefilter) -> Self {
        self.prefilter = prefilter;
        self
    }

    pub fn with_prefilter_threshold(
        mut self,
        threshold: u32,
    ) -> Result<Self, ConfigurationError> {
        if threshold == 0 {
            return Err(ConfigurationError::ZeroThreshold);
        }
        self.prefilter_threshold = threshold;
        Ok(self)
    }

    /// Build a configuration from string selections, as a host driver reading
    /// options off a command line or environment would (§6).
    pub fn from_selections(
        engine: &str,
        prefilter: &str,
        prefilter_threshold: u32,
    ) -> Result<Self, ConfigurationError> {
        if prefilter_threshold == 0 {
            return Err(ConfigurationError::ZeroThreshold);
        }
        Ok(MatcherConfig {
            engine: Engine::parse(engine)?,
            prefilter: Prefilter::parse(prefilter)?,
            prefilter_threshold,
        })
    }
}
