use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use time::OffsetDateTime;

use crate::domain::{Day, Hour, ScheduledProject, WeeklySchedule, EPSILON, FULL_ALLOCATION};
use crate::repository::ScheduleRepository;
use crate::store::KeyValueStore;

/// Identity of the synthetic free-time candidate. Generated project ids always
/// carry a hex suffix, so they never equal it.
pub const UNALLOCATED_ID: &str = "rest";
pub const UNALLOCATED_NAME: &str = "Unallocated";
pub const UNALLOCATED_COLOR: &str = "#6B7280";

pub const DEFAULT_REROLL_INTERVAL: Duration = Duration::from_secs(60);

/// Uniform draws in `[0, 1)`.
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        rand::rng().random::<f64>()
    }
}

pub struct SeededRandom(StdRng);

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl RandomSource for SeededRandom {
    fn next_unit(&mut self) -> f64 {
        self.0.random::<f64>()
    }
}

pub trait Clock {
    fn now(&self) -> (Day, Hour);
}

/// Local wall time, or UTC when the local offset cannot be determined.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> (Day, Hour) {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        (Day::from_weekday(now.weekday()), Hour::wrapping(now.hour()))
    }
}

/// Pins the selection to one slot, for `--day`/`--hour`.
pub struct FixedClock {
    pub day: Day,
    pub hour: Hour,
}

impl Clock for FixedClock {
    fn now(&self) -> (Day, Hour) {
        (self.day, self.hour)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "project", rename_all = "lowercase")]
pub enum CandidateKind {
    Scheduled(ScheduledProject),
    Unallocated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    pub entry: CandidateKind,
    pub weight: f64,
}

impl Candidate {
    pub fn id(&self) -> &str {
        match &self.entry {
            CandidateKind::Scheduled(project) => &project.id,
            CandidateKind::Unallocated => UNALLOCATED_ID,
        }
    }

    pub fn name(&self) -> &str {
        match &self.entry {
            CandidateKind::Scheduled(project) => &project.name,
            CandidateKind::Unallocated => UNALLOCATED_NAME,
        }
    }

    pub fn color(&self) -> &str {
        match &self.entry {
            CandidateKind::Scheduled(project) => &project.color,
            CandidateKind::Unallocated => UNALLOCATED_COLOR,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FocusOutcome {
    pub day: Day,
    pub hour: Hour,
    /// `None` means free time: either the slot is empty or the draw landed on
    /// the unallocated remainder.
    pub focus: Option<ScheduledProject>,
    pub candidates: Vec<Candidate>,
}

/// Weighted draw over the slot at (`day`, `hour`).
///
/// The candidates are the slot's entries in stored order, followed by an
/// unallocated candidate when more than [`EPSILON`] of the slot is free. One
/// draw over `[0, FULL_ALLOCATION)` is walked down the list; the first
/// candidate that brings the remainder to zero or below wins. Over-allocated
/// slots keep that range, so entries past the full allocation are reachable
/// only through overshoot.
pub fn select_focus(
    schedule: &WeeklySchedule,
    day: Day,
    hour: Hour,
    rng: &mut dyn RandomSource,
) -> FocusOutcome {
    let candidates = candidates_for(schedule.slot(day, hour));
    if candidates.is_empty() {
        return FocusOutcome {
            day,
            hour,
            focus: None,
            candidates,
        };
    }

    // Allocated weight plus the unclamped free remainder.
    let mut remainder = rng.next_unit() * FULL_ALLOCATION;
    let mut selected = candidates.len() - 1;
    for (index, candidate) in candidates.iter().enumerate() {
        remainder -= candidate.weight;
        if remainder <= 0.0 {
            selected = index;
            break;
        }
    }

    let focus = match &candidates[selected].entry {
        CandidateKind::Scheduled(project) => Some(project.clone()),
        CandidateKind::Unallocated => None,
    };
    tracing::debug!(%day, hour = hour.value(), selected = candidates[selected].id(), "rolled focus");
    FocusOutcome {
        day,
        hour,
        focus,
        candidates,
    }
}

fn candidates_for(entries: &[ScheduledProject]) -> Vec<Candidate> {
    let mut candidates: Vec<Candidate> = entries
        .iter()
        .map(|entry| Candidate {
            entry: CandidateKind::Scheduled(entry.clone()),
            weight: entry.probability,
        })
        .collect();
    if candidates.is_empty() {
        return candidates;
    }

    let allocated: f64 = candidates.iter().map(|candidate| candidate.weight).sum();
    let unallocated = (FULL_ALLOCATION - allocated).max(0.0);
    if unallocated > EPSILON {
        candidates.push(Candidate {
            entry: CandidateKind::Unallocated,
            weight: unallocated,
        });
    }
    candidates
}

/// Reloads the repository and rolls for the clock's current slot.
pub fn roll<S: KeyValueStore>(
    repo: &mut ScheduleRepository<S>,
    clock: &dyn Clock,
    rng: &mut dyn RandomSource,
) -> FocusOutcome {
    repo.reload();
    let (day, hour) = clock.now();
    select_focus(repo.schedule(), day, hour, rng)
}

/// Re-runs a callback once immediately and then on a fixed interval until
/// `max_ticks` is reached or the stop flag is raised.
pub struct FocusTicker {
    interval: Duration,
    max_ticks: Option<u64>,
    stop: Arc<AtomicBool>,
}

impl FocusTicker {
    const POLL_SLICE: Duration = Duration::from_millis(50);

    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_ticks: None,
            stop: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_max_ticks(mut self, max_ticks: Option<u64>) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    #[cfg(test)]
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Returns the number of ticks that ran.
    pub fn run<F>(&self, mut on_tick: F) -> u64
    where
        F: FnMut(u64),
    {
        let mut ticks = 0u64;
        loop {
            if self.stopped() {
                break;
            }
            on_tick(ticks);
            ticks += 1;
            if self.max_ticks.is_some_and(|max| ticks >= max) {
                break;
            }
            if !self.wait_interval() {
                break;
            }
        }
        tracing::debug!(ticks, "focus ticker stopped");
        ticks
    }

    fn stopped(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Sleeps for one interval in short slices; false if stopped meanwhile.
    fn wait_interval(&self) -> bool {
        let deadline = Instant::now() + self.interval;
        loop {
            if self.stopped() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(Self::POLL_SLICE.min(deadline - now));
        }
    }
}
