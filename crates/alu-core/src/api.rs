//! Host-facing configuration and the narrow interfaces the core consumes.

use crate::jit::MicroOp;
use crate::{AluStats, Flags};

/// Default guest memory size (1 MiB).
pub const DEFAULT_MEMORY_BYTES: usize = 1 << 20;

/// How locked read-modify-write instructions reach memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum AtomicPolicy {
    /// Aligned accesses that fit a host atomic use a compare-and-swap loop;
    /// everything else falls back to the bus lock.
    #[default]
    Native,
    /// Every locked access takes the bus lock.
    BusLockOnly,
}

/// Top-level immutable configuration for a guest memory instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct CoreConfig {
    /// Guest memory size in bytes.
    pub memory_bytes: usize,
    /// Locked access policy.
    pub atomic_policy: AtomicPolicy,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            memory_bytes: DEFAULT_MEMORY_BYTES,
            atomic_policy: AtomicPolicy::Native,
        }
    }
}

/// Answers which status flags are read downstream before being overwritten.
///
/// Implementations may over-approximate (report a flag live that is in fact
/// dead) but must never report a consumed flag as dead.
pub trait FlagDependencies {
    /// Returns the subset of `candidates` still needed after the
    /// instruction at `ip`.
    fn needed_flags(&self, ip: u64, candidates: Flags) -> Flags;
}

/// Conservative analyzer that treats every flag as live.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllFlagsLive;

impl FlagDependencies for AllFlagsLive {
    fn needed_flags(&self, _ip: u64, candidates: Flags) -> Flags {
        candidates
    }
}

/// A fixed answer, intersected with the candidates.
impl FlagDependencies for Flags {
    fn needed_flags(&self, _ip: u64, candidates: Flags) -> Flags {
        *self & candidates
    }
}

/// Ingestion point of the trace compiler.
pub trait MicroOpSink {
    /// Appends one micro-operation in emission order.
    fn emit(&mut self, op: MicroOp);
}

/// State of an in-progress compiled path.
pub struct PathBuilder<'a> {
    /// Receives the emitted micro-operations.
    pub sink: &'a mut dyn MicroOpSink,
    /// Flag liveness for the region being compiled.
    pub flags: &'a dyn FlagDependencies,
}

impl<'a> PathBuilder<'a> {
    /// Bundles a sink and a flag analyzer.
    #[must_use]
    pub const fn new(sink: &'a mut dyn MicroOpSink, flags: &'a dyn FlagDependencies) -> Self {
        Self { sink, flags }
    }
}

impl std::fmt::Debug for PathBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathBuilder").finish_non_exhaustive()
    }
}

/// Optional collaborators for one instruction execution.
///
/// The default value interprets only: no path is built and nothing is
/// counted.
#[derive(Default)]
pub struct ExecHooks<'a> {
    /// Present while the surrounding engine is building a compiled path.
    pub path: Option<PathBuilder<'a>>,
    /// Counter sink.
    pub stats: Option<&'a dyn AluStats>,
}

impl<'a> ExecHooks<'a> {
    /// Hooks that only interpret.
    #[must_use]
    pub fn interpret() -> Self {
        Self::default()
    }

    /// Hooks that also emit into `path`.
    #[must_use]
    pub const fn building(path: PathBuilder<'a>) -> Self {
        Self {
            path: Some(path),
            stats: None,
        }
    }

    /// Adds a counter sink.
    #[must_use]
    pub const fn with_stats(mut self, stats: &'a dyn AluStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Returns `true` while a compiled path is being built.
    #[must_use]
    pub const fn is_building(&self) -> bool {
        self.path.is_some()
    }
}

impl std::fmt::Debug for ExecHooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecHooks")
            .field("building", &self.is_building())
            .field("stats", &self.stats.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::{
        AllFlagsLive, AtomicPolicy, CoreConfig, ExecHooks, FlagDependencies, PathBuilder,
        DEFAULT_MEMORY_BYTES,
    };
    use crate::{AluCounters, Flags, Trace};

    #[test]
    fn default_config_is_one_mebibyte_native() {
        let config = CoreConfig::default();
        assert_eq!(config.memory_bytes, DEFAULT_MEMORY_BYTES);
        assert_eq!(config.atomic_policy, AtomicPolicy::Native);
    }

    #[test]
    fn ready_made_analyzers_stay_within_candidates() {
        let candidates = Flags::CF | Flags::ZF | Flags::SF;
        assert_eq!(AllFlagsLive.needed_flags(0, candidates), candidates);
        assert_eq!(
            (Flags::CF | Flags::OF).needed_flags(0x1000, candidates),
            Flags::CF
        );
        assert!(Flags::empty().needed_flags(0, Flags::STATUS).is_empty());
    }

    #[test]
    fn hooks_report_their_collaborators() {
        assert!(!ExecHooks::interpret().is_building());

        let mut trace = Trace::new();
        let counters = AluCounters::new();
        let hooks =
            ExecHooks::building(PathBuilder::new(&mut trace, &AllFlagsLive)).with_stats(&counters);
        assert!(hooks.is_building());
        assert_eq!(
            format!("{hooks:?}"),
            "ExecHooks { building: true, stats: true }"
        );
    }
}
