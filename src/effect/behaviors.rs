//! Data-driven behaviors
//!
//! Concrete [`EffectBehavior`] implementations selectable from effect config
//! files. These cover the common aura shapes:
//! - `StatModifier`: flat stat buff, applied/reverted with the application gate
//! - `PeriodicDamage`: damage-over-time with a tick interval
//! - `Stacking`: overlap-aware stat buff with a stack cap and refresh
//!
//! Custom behaviors implement [`EffectBehavior`] directly and are attached
//! with `EffectSystem::try_apply_effect_with`.

use serde::{Deserialize, Serialize};

use crate::effect::behavior::{EffectBehavior, EffectCtx, Inert, OverlapRequest};

/// Behavior selection in an effect definition file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum BehaviorConfig {
    /// No gameplay consequences; the effect is pure tag state.
    #[default]
    Inert,
    /// Adds `amount * (level + 1)` to a stat while applied.
    StatModifier { stat: String, amount: f32 },
    /// Subtracts `amount` from a stat every `interval` seconds while applied.
    /// A pending tick lands when the effect expires naturally.
    PeriodicDamage {
        stat: String,
        amount: f32,
        interval: f32,
    },
    /// Adds `bonus_per_stack` to a stat per stack; overlapping requests add a
    /// stack (up to `max_stacks`) and refresh the duration.
    Stacking {
        stat: String,
        bonus_per_stack: f32,
        max_stacks: u32,
    },
}

impl BehaviorConfig {
    pub fn validate(&self) -> Result<(), String> {
        match self {
            BehaviorConfig::Inert | BehaviorConfig::StatModifier { .. } => Ok(()),
            BehaviorConfig::PeriodicDamage { interval, .. } => {
                if *interval <= 0.0 {
                    Err(format!("PeriodicDamage interval must be > 0 (got {interval})"))
                } else {
                    Ok(())
                }
            }
            BehaviorConfig::Stacking { max_stacks, .. } => {
                if *max_stacks == 0 {
                    Err("Stacking max_stacks must be >= 1".to_string())
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Build a fresh behavior instance for a new effect spec.
    pub fn instantiate(&self) -> Box<dyn EffectBehavior> {
        match self {
            BehaviorConfig::Inert => Box::new(Inert),
            BehaviorConfig::StatModifier { stat, amount } => Box::new(StatModifier {
                stat: stat.clone(),
                amount: *amount,
            }),
            BehaviorConfig::PeriodicDamage {
                stat,
                amount,
                interval,
            } => Box::new(PeriodicDamage {
                stat: stat.clone(),
                amount: *amount,
                interval: *interval,
                time_until_next_tick: *interval,
            }),
            BehaviorConfig::Stacking {
                stat,
                bonus_per_stack,
                max_stacks,
            } => Box::new(Stacking {
                stat: stat.clone(),
                bonus_per_stack: *bonus_per_stack,
                max_stacks: *max_stacks,
                stacks: 1,
            }),
        }
    }
}

/// Flat stat modifier scaling with effect level.
pub struct StatModifier {
    stat: String,
    amount: f32,
}

impl StatModifier {
    fn effective(&self, level: u32) -> f32 {
        self.amount * (level as f32 + 1.0)
    }
}

impl EffectBehavior for StatModifier {
    fn on_apply(&mut self, ctx: &mut EffectCtx) {
        ctx.stats.add(&self.stat, self.effective(ctx.level));
    }

    fn on_ignore(&mut self, ctx: &mut EffectCtx) {
        ctx.stats.add(&self.stat, -self.effective(ctx.level));
    }

    fn on_level_changed(&mut self, new_level: u32, prev_level: u32, ctx: &mut EffectCtx) {
        // Rebase the live contribution; gates are not re-run on level change.
        if ctx.is_applied {
            ctx.stats
                .add(&self.stat, self.effective(new_level) - self.effective(prev_level));
        }
    }
}

/// Damage-over-time tick accumulator.
pub struct PeriodicDamage {
    stat: String,
    amount: f32,
    interval: f32,
    time_until_next_tick: f32,
}

impl EffectBehavior for PeriodicDamage {
    fn on_apply(&mut self, _ctx: &mut EffectCtx) {
        self.time_until_next_tick = self.interval;
    }

    fn on_tick(&mut self, dt: f32, ctx: &mut EffectCtx) {
        // A non-positive interval would never let the catch-up loop settle.
        // Config loading rejects it; hand-built definitions land here.
        if self.interval <= 0.0 {
            return;
        }
        self.time_until_next_tick -= dt;
        while self.time_until_next_tick <= 0.0 {
            ctx.stats.add(&self.stat, -self.amount);
            self.time_until_next_tick += self.interval;
        }
    }

    fn on_finish(&mut self, ctx: &mut EffectCtx) {
        // The expiry frame ends the effect before its tick hook runs, so a
        // pending tick lands here instead of being lost.
        if self.time_until_next_tick < self.interval {
            ctx.stats.add(&self.stat, -self.amount);
        }
    }
}

/// Stack-counting stat buff with duration refresh on overlap.
pub struct Stacking {
    stat: String,
    bonus_per_stack: f32,
    max_stacks: u32,
    stacks: u32,
}

impl EffectBehavior for Stacking {
    fn on_apply(&mut self, ctx: &mut EffectCtx) {
        ctx.stats
            .add(&self.stat, self.bonus_per_stack * self.stacks as f32);
    }

    fn on_ignore(&mut self, ctx: &mut EffectCtx) {
        ctx.stats
            .add(&self.stat, -self.bonus_per_stack * self.stacks as f32);
    }

    fn can_overlap(&self, _incoming: &OverlapRequest) -> bool {
        self.stacks < self.max_stacks
    }

    fn on_overlap(&mut self, _incoming: &OverlapRequest, ctx: &mut EffectCtx) {
        self.stacks += 1;
        *ctx.remaining_time = ctx.definition.duration;
        *ctx.elapsed_time = 0.0;
        if ctx.is_applied {
            ctx.stats.add(&self.stat, self.bonus_per_stack);
        }
    }
}
