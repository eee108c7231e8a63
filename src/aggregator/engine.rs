//! Interaction aggregation loop
//!
//! Owns the interaction counters of one session and drives them on a virtual
//! millisecond timeline. Two kinds of timers exist:
//!
//! - the **tick**, every `tick_period_ms`: score the counters, append the score
//!   to the bounded history, then decay each counter by `decay_step`;
//! - at most one **burst**, `steps` sub-steps every `period_ms`, each applying a
//!   batch delta to all counters. Starting a burst replaces any running one.
//!
//! Nothing fires on its own: callers move time forward with
//! [`InteractionAggregator::advance_to`], which fires every due timer in
//! deadline order. On equal deadlines the tick fires before the burst step.

use crate::aggregator::events::{BurstKind, InteractionEvent};
use crate::config::{AggregatorConfig, BurstSpec};
use crate::ivi::score::evaluate;
use crate::ivi::types::{InteractionCounters, IviReading, IviSample, IviSnapshot, IviState};
use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct ActiveBurst {
    kind: BurstKind,
    spec: BurstSpec,
    remaining: u32,
    next_at_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running,
    TornDown,
}

/// Single-owner state machine for counters, score history, and bursts
#[derive(Debug, Clone)]
pub struct InteractionAggregator {
    config: AggregatorConfig,
    session_id: String,
    started_at: DateTime<Utc>,
    counters: InteractionCounters,
    history: VecDeque<IviSample>,
    last: IviReading,
    ticks: u64,
    now_ms: u64,
    next_tick_ms: Option<u64>,
    burst: Option<ActiveBurst>,
    lifecycle: Lifecycle,
}

impl Default for InteractionAggregator {
    fn default() -> Self {
        Self::new(AggregatorConfig::default())
    }
}

impl InteractionAggregator {
    /// Create an idle aggregator; call [`start`](Self::start) to arm the tick.
    pub fn new(config: AggregatorConfig) -> Self {
        Self::with_session(config, Uuid::new_v4().to_string(), Utc::now())
    }

    /// Create an aggregator with a fixed session id and wall-clock origin
    ///
    /// Zero periods are raised to 1 ms so every timer moves forward.
    pub fn with_session(
        mut config: AggregatorConfig,
        session_id: String,
        started_at: DateTime<Utc>,
    ) -> Self {
        config.tick_period_ms = config.tick_period_ms.max(1);
        config.chaos_burst.period_ms = config.chaos_burst.period_ms.max(1);
        config.focus_burst.period_ms = config.focus_burst.period_ms.max(1);
        Self {
            history: VecDeque::new(),
            config,
            session_id,
            started_at,
            counters: InteractionCounters::default(),
            last: IviReading {
                score: 0,
                state: IviState::DeepFocus,
            },
            ticks: 0,
            now_ms: 0,
            next_tick_ms: None,
            burst: None,
            lifecycle: Lifecycle::Idle,
        }
    }

    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Arm the tick timer; the first tick fires one period after `now_ms`.
    pub fn start(&mut self, now_ms: u64) {
        if self.lifecycle != Lifecycle::Idle {
            return;
        }
        self.now_ms = now_ms;
        self.next_tick_ms = Some(now_ms + self.config.tick_period_ms);
        self.lifecycle = Lifecycle::Running;
        info!(session_id = %self.session_id, "aggregation loop started");
    }

    /// Tear down: cancel the tick and any burst. Every later call is a no-op.
    pub fn stop(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.next_tick_ms = None;
        self.burst = None;
        self.lifecycle = Lifecycle::TornDown;
        info!(session_id = %self.session_id, ticks = self.ticks, "aggregation loop stopped");
    }

    /// Zero counters and history and cancel any burst, keeping the tick armed.
    pub fn reset(&mut self) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.counters = InteractionCounters::default();
        self.history.clear();
        self.last = IviReading {
            score: 0,
            state: IviState::DeepFocus,
        };
        self.ticks = 0;
        self.burst = None;
        if self.lifecycle == Lifecycle::Running {
            self.next_tick_ms = Some(self.now_ms + self.config.tick_period_ms);
        }
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle == Lifecycle::Running
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifecycle == Lifecycle::TornDown
    }

    /// Current virtual time
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<u64> {
        let burst = self.burst.as_ref().map(|b| b.next_at_ms);
        match (self.next_tick_ms, burst) {
            (Some(t), Some(b)) => Some(t.min(b)),
            (t, b) => t.or(b),
        }
    }

    /// Move virtual time to `now_ms`, firing every timer due on the way.
    ///
    /// Returns the history samples produced by ticks fired during this call.
    /// Time never moves backwards; an earlier `now_ms` is ignored.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<IviSample> {
        let mut fired = Vec::new();
        if self.lifecycle != Lifecycle::Running {
            return fired;
        }

        while let Some(deadline) = self.next_deadline().filter(|d| *d <= now_ms) {
            self.now_ms = self.now_ms.max(deadline);
            if self.next_tick_ms == Some(deadline) {
                fired.push(self.fire_tick(deadline));
            } else {
                self.fire_burst_step(deadline);
            }
        }

        self.now_ms = self.now_ms.max(now_ms);
        fired
    }

    fn fire_tick(&mut self, at_ms: u64) -> IviSample {
        // Stage 1: score the counters as they stand
        let reading = evaluate(&self.counters);
        self.last = reading;
        self.ticks += 1;

        // Stage 2: append to history, evicting the oldest
        let sample = IviSample {
            seq: self.ticks,
            value: reading.score,
            at_ms,
            time: self.started_at + Duration::milliseconds(at_ms as i64),
        };
        self.history.push_back(sample.clone());
        while self.history.len() > self.config.history_capacity {
            self.history.pop_front();
        }

        // Stage 3: decay
        self.counters.decay(self.config.decay_step);

        self.next_tick_ms = Some(at_ms + self.config.tick_period_ms);
        debug!(seq = sample.seq, score = reading.score, state = %reading.state, "tick");
        sample
    }

    fn fire_burst_step(&mut self, at_ms: u64) {
        let Some(burst) = self.burst.as_mut() else {
            return;
        };
        self.counters.apply(burst.spec.delta);
        burst.remaining = burst.remaining.saturating_sub(1);
        if burst.remaining == 0 {
            debug!(kind = burst.kind.as_str(), "burst finished");
            self.burst = None;
        } else {
            burst.next_at_ms = at_ms + burst.spec.period_ms;
        }
    }

    /// Record one app switch of `amount` events
    pub fn increment_app_switch(&mut self, amount: u32) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.counters.app_switches = self.counters.app_switches.saturating_add(amount);
    }

    /// Record tab churn of `amount` events
    pub fn increment_tab_churn(&mut self, amount: u32) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.counters.tab_churn = self.counters.tab_churn.saturating_add(amount);
    }

    /// Record an oscillation with the given weight
    pub fn increment_oscillation(&mut self, weight: u32) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        self.counters.oscillations = self.counters.oscillations.saturating_add(weight);
    }

    /// Record an event using the configured per-event weights
    pub fn record(&mut self, event: InteractionEvent) {
        let weights = self.config.weights;
        match event {
            InteractionEvent::AppSwitch => self.increment_app_switch(weights.app_switch),
            InteractionEvent::TabChurn => self.increment_tab_churn(weights.tab_churn),
            InteractionEvent::Oscillation => self.increment_oscillation(weights.oscillation),
        }
    }

    pub fn start_chaos_burst(&mut self) {
        let spec = self.config.chaos_burst;
        self.start_burst(BurstKind::Chaos, spec);
    }

    pub fn start_focus_burst(&mut self) {
        let spec = self.config.focus_burst;
        self.start_burst(BurstKind::Focus, spec);
    }

    fn start_burst(&mut self, kind: BurstKind, spec: BurstSpec) {
        if self.lifecycle == Lifecycle::TornDown {
            return;
        }
        if let Some(previous) = self.burst.take() {
            info!(
                cancelled = previous.kind.as_str(),
                remaining = previous.remaining,
                started = kind.as_str(),
                "burst replaced"
            );
        }
        if spec.steps == 0 {
            return;
        }
        self.burst = Some(ActiveBurst {
            kind,
            spec,
            remaining: spec.steps,
            next_at_ms: self.now_ms + spec.period_ms,
        });
    }

    /// Kind of the burst with pending sub-steps, if any
    pub fn active_burst(&self) -> Option<BurstKind> {
        self.burst.as_ref().map(|b| b.kind)
    }

    pub fn counters(&self) -> InteractionCounters {
        self.counters
    }

    /// Reading published by the most recent tick
    pub fn reading(&self) -> IviReading {
        self.last
    }

    pub fn history(&self) -> impl Iterator<Item = &IviSample> {
        self.history.iter()
    }

    /// Immutable copy of the published state
    pub fn snapshot(&self) -> IviSnapshot {
        IviSnapshot {
            session_id: self.session_id.clone(),
            score: self.last.score,
            state: self.last.state,
            history: self.history.iter().cloned().collect(),
            counters: self.counters,
            ticks: self.ticks,
            burst_active: self.burst.is_some(),
        }
    }
}
