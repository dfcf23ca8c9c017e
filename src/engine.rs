//! Effect registry and the ordered effect chain.

use crate::audio::AudioSnapshot;
use crate::compositor::mix_into;
use crate::effect::{ControlOp, Effect, Flippy, GradientOverlay, Ki, KiAlt, Stutter};
use crate::frame::RgbFrame;
use crate::gradient::GradientPreset;

/// Every effect the player knows about, fixed at build time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum EffectKind {
    #[value(alias = "diamond")]
    Ki,
    #[value(name = "ki-alt", alias = "kialt", alias = "ki_alt", alias = "lattice")]
    KiAlt,
    #[value(name = "gradient", alias = "gradient-overlay")]
    GradientOverlay,
    #[value(alias = "trail")]
    Stutter,
    #[value(alias = "mirror")]
    Flippy,
}

impl EffectKind {
    pub const fn all() -> [Self; 5] {
        [
            Self::Ki,
            Self::KiAlt,
            Self::GradientOverlay,
            Self::Stutter,
            Self::Flippy,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ki => "Ki",
            Self::KiAlt => "KiAlt",
            Self::GradientOverlay => "GradientOverlay",
            Self::Stutter => "Stutter",
            Self::Flippy => "Flippy",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|k| k.label().to_ascii_lowercase() == s)
    }

    /// Build a fresh instance; gradient effects get their own preset copy.
    pub fn build(self, presets: &[GradientPreset]) -> Box<dyn Effect> {
        match self {
            Self::Ki => Box::new(Ki::new()),
            Self::KiAlt => Box::new(KiAlt::new(presets.to_vec())),
            Self::GradientOverlay => Box::new(GradientOverlay::new(presets.to_vec())),
            Self::Stutter => Box::new(Stutter::new()),
            Self::Flippy => Box::new(Flippy::new()),
        }
    }

    /// Selection order for the "next effect" key: none, then each kind.
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        let all = Self::all();
        match current {
            None => Some(all[0]),
            Some(kind) => {
                let idx = all.iter().position(|k| *k == kind).unwrap_or(0);
                all.get(idx + 1).copied()
            }
        }
    }
}

/// Applies its effects in order. A failing stage leaves the frame as it was
/// before that stage; the fault is logged and the chain continues.
pub struct EffectEngine {
    chain: Vec<Box<dyn Effect>>,
    selected: Option<EffectKind>,
    presets: Vec<GradientPreset>,
    mix: f32,
    scratch: RgbFrame,
    faults: u64,
}

impl EffectEngine {
    pub fn new(presets: Vec<GradientPreset>) -> Self {
        Self {
            chain: Vec::new(),
            selected: None,
            presets,
            mix: 1.0,
            scratch: RgbFrame::new(0, 0),
            faults: 0,
        }
    }

    pub fn with_mix(mut self, mix: f32) -> Self {
        self.set_mix(mix);
        self
    }

    pub fn mix(&self) -> f32 {
        self.mix
    }

    pub fn set_mix(&mut self, mix: f32) {
        self.mix = if mix.is_finite() { mix.clamp(0.0, 1.0) } else { 1.0 };
    }

    pub fn presets(&self) -> &[GradientPreset] {
        &self.presets
    }

    pub fn push(&mut self, effect: Box<dyn Effect>) {
        tracing::debug!(effect = effect.name(), "effect added to chain");
        self.chain.push(effect);
    }

    pub fn clear(&mut self) {
        self.chain.clear();
        self.selected = None;
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.chain.iter().map(|e| e.name()).collect()
    }

    pub fn selected(&self) -> Option<EffectKind> {
        self.selected
    }

    /// Replace the chain with a single fresh instance of `kind` (or nothing).
    pub fn select(&mut self, kind: Option<EffectKind>) {
        self.chain.clear();
        self.selected = kind;
        if let Some(kind) = kind {
            let effect = kind.build(&self.presets);
            tracing::info!(effect = kind.label(), "effect selected");
            self.chain.push(effect);
        } else {
            tracing::info!("effects off");
        }
    }

    pub fn cycle_effect(&mut self) -> Option<EffectKind> {
        let next = EffectKind::cycle(self.selected);
        self.select(next);
        next
    }

    /// The effect that receives control operations (the last in the chain).
    pub fn current(&self) -> Option<&dyn Effect> {
        self.chain.last().map(|e| e.as_ref())
    }

    pub fn current_mut(&mut self) -> Option<&mut (dyn Effect + 'static)> {
        self.chain.last_mut().map(|e| e.as_mut())
    }

    pub fn control(&mut self, op: ControlOp) -> bool {
        match self.current_mut() {
            Some(effect) => effect.control(op),
            None => false,
        }
    }

    /// Restore the controlled effect to its defaults.
    pub fn reset_current(&mut self) -> bool {
        match self.current_mut() {
            Some(effect) => {
                effect.reset();
                tracing::info!(effect = effect.name(), "effect reset");
                true
            }
            None => false,
        }
    }

    pub fn status(&self) -> String {
        self.current()
            .map(|e| e.status())
            .unwrap_or_else(|| "No effect (raw input)".to_string())
    }

    /// Number of stage faults swallowed so far.
    pub fn faults(&self) -> u64 {
        self.faults
    }

    pub fn process(&mut self, frame: &mut RgbFrame, audio: &AudioSnapshot) {
        for effect in &mut self.chain {
            if !effect.is_active() {
                continue;
            }
            self.scratch.copy_from(frame);
            if let Err(err) = effect.process(&mut self.scratch, audio) {
                self.faults += 1;
                tracing::warn!(effect = effect.name(), %err, "effect failed; frame passed through");
                continue;
            }
            if self.mix >= 1.0 {
                std::mem::swap(frame, &mut self.scratch);
            } else if let Err(err) = mix_into(frame, &self.scratch, self.mix) {
                self.faults += 1;
                tracing::warn!(effect = effect.name(), %err, "mix failed; frame passed through");
            }
        }
    }
}
