//! Strategy and regime-source seams.
//!
//! Both contracts are pull-based: the driver calls them once per bar with
//! the bar history so far. Strategies are purely advisory; every engagement
//! they emit still passes through the risk brain and the safety laws before
//! having any effect. Neither trait sees account or position state, which
//! keeps signal generation decoupled from risk by construction.

use crate::domain::{Bar, Engagement};
use crate::risk::Regime;

/// A signal source: given the bar history, optionally propose engagements.
pub trait Strategy {
    /// Called once per bar, after open positions have been advanced.
    /// `history[index]` is the current bar.
    fn on_bar(&mut self, history: &[Bar], index: usize) -> Vec<Engagement>;

    /// Name for event records and reports.
    fn name(&self) -> &str;
}

/// A regime classifier: given the bar history, label current conditions.
pub trait RegimeSource {
    fn classify(&mut self, history: &[Bar], index: usize) -> Regime;
}

/// Strategy that never proposes anything. Useful for exercising the engine
/// loop in isolation.
#[derive(Debug, Default, Clone)]
pub struct NullStrategy;

impl Strategy for NullStrategy {
    fn on_bar(&mut self, _history: &[Bar], _index: usize) -> Vec<Engagement> {
        Vec::new()
    }

    fn name(&self) -> &str {
        "null"
    }
}

/// Regime source that always reports the same label.
#[derive(Debug, Clone, Copy)]
pub struct ConstantRegime(pub Regime);

impl RegimeSource for ConstantRegime {
    fn classify(&mut self, _history: &[Bar], _index: usize) -> Regime {
        self.0
    }
}

/// Strategy that replays a scripted sequence of (bar index, engagement)
/// pairs. The deterministic workhorse for lifecycle and driver tests.
#[derive(Debug, Clone)]
pub struct ScriptedStrategy {
    script: Vec<(usize, Engagement)>,
}

impl ScriptedStrategy {
    pub fn new(script: Vec<(usize, Engagement)>) -> Self {
        Self { script }
    }
}

impl Strategy for ScriptedStrategy {
    fn on_bar(&mut self, _history: &[Bar], index: usize) -> Vec<Engagement> {
        self.script
            .iter()
            .filter(|(at, _)| *at == index)
            .map(|(_, e)| e.clone())
            .collect()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
