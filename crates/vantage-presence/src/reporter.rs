//! Replica-side visibility reporter
//!
//! A two-state machine over the local visibility test: evaluate at an
//! own cadence, report to the authority only on change. The first
//! evaluation is delayed by a random phase offset so a session's worth
//! of replicas does not evaluate in the same instant and burst reports.

use std::fmt;
use std::time::{Duration, Instant};

use rand::Rng;

use vantage_core::PeerId;

/// Identity of the drawable under test, assigned by the hosting environment.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TargetId(pub u64);

impl TargetId {
    #[inline]
    pub fn new(id: u64) -> Self {
        TargetId(id)
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Target({:016x})", self.0)
    }
}

/// Which viewpoint and which drawable the local test should use.
///
/// `None` fields mean "the environment's default". Environments with
/// per-peer viewpoints inject both.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewBinding {
    pub viewpoint: Option<PeerId>,
    pub target: Option<TargetId>,
}

/// The external rendering/visibility test, out of scope here and
/// injected at the seam.
pub trait VisibilityProbe {
    fn is_visible(&self, binding: &ViewBinding) -> bool;
}

/// Local visibility state of this replica.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Visible,
}

impl Visibility {
    #[inline]
    pub fn is_visible(self) -> bool {
        matches!(self, Visibility::Visible)
    }
}

/// One-way report payload, replica to authority.
///
/// Sender identity travels in the transport's call-context metadata,
/// never in the payload, so it cannot be spoofed by the reporter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VisibilityReport {
    pub visible: bool,
}

/// Reporter configuration
#[derive(Clone, Debug)]
pub struct ReporterConfig {
    /// Cadence of local evaluations.
    pub eval_interval: Duration,
    /// Upper bound of the random phase offset applied to the first
    /// evaluation. Zero disables staggering (deterministic tests).
    pub max_phase_offset: Duration,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        ReporterConfig {
            eval_interval: Duration::from_millis(200),
            max_phase_offset: Duration::from_millis(200),
        }
    }
}

/// Per-replica visibility state machine.
pub struct VisibilityReporter {
    state: Visibility,
    binding: ViewBinding,
    config: ReporterConfig,
    next_eval: Option<Instant>,
    phase: Duration,
    active: bool,
}

impl VisibilityReporter {
    /// Create a reporter with a randomly drawn phase offset.
    pub fn new(config: ReporterConfig) -> Self {
        let phase = if config.max_phase_offset.is_zero() {
            Duration::ZERO
        } else {
            let max_us = config.max_phase_offset.as_micros() as u64;
            Duration::from_micros(rand::thread_rng().gen_range(0..max_us))
        };
        Self::with_phase(config, phase)
    }

    /// Create a reporter with a fixed phase offset.
    pub fn with_phase(config: ReporterConfig, phase: Duration) -> Self {
        VisibilityReporter {
            state: Visibility::Hidden,
            binding: ViewBinding::default(),
            config,
            next_eval: None,
            phase,
            active: true,
        }
    }

    pub fn state(&self) -> Visibility {
        self.state
    }

    pub fn binding(&self) -> ViewBinding {
        self.binding
    }

    /// Inject the viewpoint/drawable pair the local test should use.
    pub fn set_binding(&mut self, binding: ViewBinding) {
        self.binding = binding;
    }

    /// Run one evaluation cycle.
    ///
    /// Evaluates the probe at the configured cadence (first evaluation
    /// delayed by the phase offset) and returns a report only when the
    /// observed value differs from the current state.
    pub fn poll(
        &mut self,
        now: Instant,
        probe: &dyn VisibilityProbe,
    ) -> Option<VisibilityReport> {
        if !self.active {
            return None;
        }

        let next = *self.next_eval.get_or_insert(now + self.phase);
        if now < next {
            return None;
        }
        // Catch up rather than backlog after a stall
        let mut next = next + self.config.eval_interval;
        while next <= now {
            next += self.config.eval_interval;
        }
        self.next_eval = Some(next);

        let raw = if probe.is_visible(&self.binding) {
            Visibility::Visible
        } else {
            Visibility::Hidden
        };
        if raw == self.state {
            return None;
        }
        self.state = raw;
        Some(VisibilityReport {
            visible: raw.is_visible(),
        })
    }

    /// Local deactivation.
    ///
    /// Forces a transition to `Hidden` and returns the final report if
    /// the replica was visible, so the authority never holds a stuck
    /// visible entry for a peer that disappears. Idempotent.
    pub fn deactivate(&mut self) -> Option<VisibilityReport> {
        if !self.active {
            return None;
        }
        self.active = false;
        if self.state.is_visible() {
            self.state = Visibility::Hidden;
            return Some(VisibilityReport { visible: false });
        }
        None
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(bool);

    impl VisibilityProbe for FixedProbe {
        fn is_visible(&self, _binding: &ViewBinding) -> bool {
            self.0
        }
    }

    fn config() -> ReporterConfig {
        ReporterConfig {
            eval_interval: Duration::from_millis(100),
            max_phase_offset: Duration::ZERO,
        }
    }

    #[test]
    fn test_reports_only_on_change() {
        let mut reporter = VisibilityReporter::with_phase(config(), Duration::ZERO);
        let base = Instant::now();

        // First evaluation: hidden -> visible
        let report = reporter.poll(base, &FixedProbe(true));
        assert_eq!(report, Some(VisibilityReport { visible: true }));

        // Unchanged: nothing sent
        let report = reporter.poll(base + Duration::from_millis(100), &FixedProbe(true));
        assert_eq!(report, None);

        // Back to hidden
        let report = reporter.poll(base + Duration::from_millis(200), &FixedProbe(false));
        assert_eq!(report, Some(VisibilityReport { visible: false }));
    }

    #[test]
    fn test_cadence_limits_evaluations() {
        let mut reporter = VisibilityReporter::with_phase(config(), Duration::ZERO);
        let base = Instant::now();

        assert!(reporter.poll(base, &FixedProbe(true)).is_some());
        // Within the interval the probe is not even consulted
        assert!(reporter
            .poll(base + Duration::from_millis(50), &FixedProbe(false))
            .is_none());
        assert_eq!(reporter.state(), Visibility::Visible);
    }

    #[test]
    fn test_phase_delays_first_evaluation() {
        let mut reporter =
            VisibilityReporter::with_phase(config(), Duration::from_millis(70));
        let base = Instant::now();

        assert!(reporter.poll(base, &FixedProbe(true)).is_none());
        assert!(reporter
            .poll(base + Duration::from_millis(70), &FixedProbe(true))
            .is_some());
    }

    #[test]
    fn test_deactivate_while_visible_sends_final_report() {
        let mut reporter = VisibilityReporter::with_phase(config(), Duration::ZERO);
        let base = Instant::now();
        reporter.poll(base, &FixedProbe(true));

        assert_eq!(
            reporter.deactivate(),
            Some(VisibilityReport { visible: false })
        );
        assert_eq!(reporter.state(), Visibility::Hidden);

        // Idempotent, and a dead reporter stays quiet
        assert_eq!(reporter.deactivate(), None);
        assert!(reporter
            .poll(base + Duration::from_secs(1), &FixedProbe(true))
            .is_none());
    }

    #[test]
    fn test_deactivate_while_hidden_is_silent() {
        let mut reporter = VisibilityReporter::with_phase(config(), Duration::ZERO);
        assert_eq!(reporter.deactivate(), None);
    }

    #[test]
    fn test_binding_reaches_probe() {
        struct BindingProbe;
        impl VisibilityProbe for BindingProbe {
            fn is_visible(&self, binding: &ViewBinding) -> bool {
                binding.target == Some(TargetId::new(7))
            }
        }

        let mut reporter = VisibilityReporter::with_phase(config(), Duration::ZERO);
        reporter.set_binding(ViewBinding {
            viewpoint: Some(PeerId::new(1)),
            target: Some(TargetId::new(7)),
        });

        let report = reporter.poll(Instant::now(), &BindingProbe);
        assert_eq!(report, Some(VisibilityReport { visible: true }));
    }
}
