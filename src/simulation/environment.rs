//! Environment disruption injector.
//!
//! On each non-idle day the injector may draw one disruption (a sick
//! colleague, a broken build, a public holiday...) and attach it to a few of
//! the day's eligible tasks. Events are advisory: the injector never touches
//! task status. It keeps a history for aggregate statistics.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::record::timestamp_label;
use crate::core::{EnvironmentEvent, EventCategory, Severity, Task};

const EVENT_MINUTES: [u32; 4] = [0, 15, 30, 45];

/// Count and summed delay for one bucket of events.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct DelayStats {
    pub count: usize,
    pub total_delay: f64,
}

/// Aggregate statistics over a set of environment events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EnvironmentSummary {
    pub total_events: usize,
    pub total_delay: f64,
    pub average_delay: f64,
    pub by_category: BTreeMap<EventCategory, DelayStats>,
    pub by_severity: BTreeMap<Severity, DelayStats>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

impl EnvironmentSummary {
    pub fn from_events(events: &[EnvironmentEvent]) -> Self {
        if events.is_empty() {
            return Self::default();
        }

        let mut by_category: BTreeMap<EventCategory, DelayStats> = BTreeMap::new();
        let mut by_severity: BTreeMap<Severity, DelayStats> = BTreeMap::new();
        let mut total = 0.0;

        for event in events {
            total += event.delay_days;
            let cat = by_category.entry(event.category).or_default();
            cat.count += 1;
            cat.total_delay = round1(cat.total_delay + event.delay_days);
            let sev = by_severity.entry(event.severity).or_default();
            sev.count += 1;
            sev.total_delay = round1(sev.total_delay + event.delay_days);
        }

        Self {
            total_events: events.len(),
            total_delay: round1(total),
            average_delay: round1(total / events.len() as f64),
            by_category,
            by_severity,
        }
    }
}

/// Seeded source of environment disruptions.
#[derive(Debug)]
pub struct EnvironmentInjector {
    rng: ChaCha8Rng,
    history: Vec<EnvironmentEvent>,
}

impl EnvironmentInjector {
    /// Create an injector. With a seed the event sequence is reproducible.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            rng,
            history: Vec::new(),
        }
    }

    /// Possibly draw a disruption for `day`.
    ///
    /// Returns at most one event. An idle day (no eligible tasks) or an
    /// empty category list never produces one, whatever the probability.
    pub fn inject(
        &mut self,
        day: u32,
        eligible: &[&Task],
        probability: f64,
        enabled_categories: &[EventCategory],
    ) -> Vec<EnvironmentEvent> {
        if eligible.is_empty() || enabled_categories.is_empty() {
            return Vec::new();
        }

        let roll: f64 = self.rng.gen();
        if roll >= probability {
            return Vec::new();
        }

        let Some(&category) = enabled_categories.choose(&mut self.rng) else {
            return Vec::new();
        };
        let description = category
            .causes()
            .choose(&mut self.rng)
            .copied()
            .unwrap_or("Unexpected disruption");

        let (min_delay, max_delay) = category.delay_range();
        let delay_days = round1(self.rng.gen_range(min_delay..=max_delay));
        let severity = Severity::from_delay(delay_days);

        let affected_count = eligible.len().min(self.rng.gen_range(1..=3));
        let affected_task_ids = eligible
            .choose_multiple(&mut self.rng, affected_count)
            .map(|task| task.id.clone())
            .collect();

        let hour = self.rng.gen_range(9..=17);
        let minute = EVENT_MINUTES.choose(&mut self.rng).copied().unwrap_or(0);

        let event = EnvironmentEvent {
            id: format!("ENV-{}-{}", day, self.history.len() + 1),
            day,
            timestamp_label: timestamp_label(day, &format!("{:02}:{:02}", hour, minute)),
            category,
            description: description.to_string(),
            delay_days,
            severity,
            affected_task_ids,
        };

        crate::slog!(
            "day {}: environment event {} ({}, {} days, {})",
            day,
            event.id,
            event.category,
            event.delay_days,
            event.severity
        );

        self.history.push(event.clone());
        vec![event]
    }

    pub fn history(&self) -> &[EnvironmentEvent] {
        &self.history
    }

    /// Aggregate statistics over every event drawn so far.
    pub fn summary(&self) -> EnvironmentSummary {
        EnvironmentSummary::from_events(&self.history)
    }

    /// Forget events drawn on `day` or later (used when a day is aborted).
    pub fn discard_from(&mut self, day: u32) {
        self.history.retain(|e| e.day < day);
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}
