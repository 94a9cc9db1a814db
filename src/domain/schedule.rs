use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::calendar::{Day, Hour};
use super::project::ScheduledProject;

/// Probability mass of a fully allocated slot. Weights are fractions of 1.0.
pub const FULL_ALLOCATION: f64 = 1.0;
pub const EPSILON: f64 = 0.001;

pub type DaySchedule = BTreeMap<Hour, Vec<ScheduledProject>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeeklySchedule {
    days: BTreeMap<Day, DaySchedule>,
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn day(&self, day: Day) -> Option<&DaySchedule> {
        self.days.get(&day)
    }

    pub fn slot(&self, day: Day, hour: Hour) -> &[ScheduledProject] {
        self.days
            .get(&day)
            .and_then(|hours| hours.get(&hour))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[cfg(test)]
    pub fn days(&self) -> impl Iterator<Item = (Day, &DaySchedule)> {
        self.days.iter().map(|(day, hours)| (*day, hours))
    }

    pub fn entries(&self) -> impl Iterator<Item = (Day, Hour, &ScheduledProject)> {
        self.days.iter().flat_map(|(day, hours)| {
            hours
                .iter()
                .flat_map(move |(hour, entries)| entries.iter().map(move |entry| (*day, *hour, entry)))
        })
    }

    pub fn entries_mut(&mut self) -> impl Iterator<Item = &mut ScheduledProject> {
        self.days
            .values_mut()
            .flat_map(|hours| hours.values_mut())
            .flat_map(|entries| entries.iter_mut())
    }

    /// Replaces the whole slot. An empty list removes the slot and, if it was
    /// the last one, the day.
    pub fn set_slot(&mut self, day: Day, hour: Hour, entries: Vec<ScheduledProject>) {
        if entries.is_empty() {
            if let Some(hours) = self.days.get_mut(&day) {
                hours.remove(&hour);
                if hours.is_empty() {
                    self.days.remove(&day);
                }
            }
            return;
        }
        self.days.entry(day).or_default().insert(hour, entries);
    }

    /// Replaces an entry with the same id, otherwise appends it.
    pub fn upsert_entry(&mut self, day: Day, hour: Hour, entry: ScheduledProject) {
        let entries = self.days.entry(day).or_default().entry(hour).or_default();
        upsert_into(entries, entry);
    }

    pub fn remove_entry(&mut self, day: Day, hour: Hour, entry_id: &str) -> bool {
        let Some(entries) = self.days.get_mut(&day).and_then(|hours| hours.get_mut(&hour)) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != entry_id);
        let removed = entries.len() != before;
        self.prune_empty();
        removed
    }

    /// Drops every occurrence matching `predicate`; returns how many went.
    pub fn remove_where<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&ScheduledProject) -> bool,
    {
        let mut removed = 0usize;
        for hours in self.days.values_mut() {
            for entries in hours.values_mut() {
                let before = entries.len();
                entries.retain(|entry| !predicate(entry));
                removed += before - entries.len();
            }
        }
        self.prune_empty();
        removed
    }

    pub fn replace_day(&mut self, day: Day, hours: DaySchedule) {
        self.days.insert(day, hours);
        self.prune_empty();
    }

    pub fn prune_empty(&mut self) {
        for hours in self.days.values_mut() {
            prune_day(hours);
        }
        self.days.retain(|_, hours| !hours.is_empty());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayTemplate {
    pub id: String,
    pub name: String,
    pub schedule: DaySchedule,
}

impl DayTemplate {
    pub fn upsert_entry(&mut self, hour: Hour, entry: ScheduledProject) {
        upsert_into(self.schedule.entry(hour).or_default(), entry);
    }

    pub fn remove_entry(&mut self, hour: Hour, entry_id: &str) -> bool {
        let Some(entries) = self.schedule.get_mut(&hour) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|entry| entry.id != entry_id);
        let removed = entries.len() != before;
        prune_day(&mut self.schedule);
        removed
    }
}

fn upsert_into(entries: &mut Vec<ScheduledProject>, entry: ScheduledProject) {
    match entries.iter_mut().find(|existing| existing.id == entry.id) {
        Some(existing) => *existing = entry,
        None => entries.push(entry),
    }
}

pub fn prune_day(hours: &mut DaySchedule) {
    hours.retain(|_, entries| !entries.is_empty());
}

pub fn total_probability(entries: &[ScheduledProject]) -> f64 {
    entries.iter().map(|entry| entry.probability).sum()
}

/// Capacity left in a slot, ignoring the entry with `excluding_id` (the one
/// being edited). Never negative.
pub fn remaining_capacity(entries: &[ScheduledProject], excluding_id: Option<&str>) -> f64 {
    let used: f64 = entries
        .iter()
        .filter(|entry| Some(entry.id.as_str()) != excluding_id)
        .map(|entry| entry.probability)
        .sum();
    (FULL_ALLOCATION - used).max(0.0)
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CapacityError {
    #[error("probability must be greater than zero (got {0})")]
    NonPositive(f64),
    #[error("probability {requested:.3} exceeds the {available:.3} still free in this slot")]
    Exceeds { available: f64, requested: f64 },
}

/// Pre-check run by callers before saving `candidate` into a slot. The
/// repository itself stores whatever it is given.
pub fn check_slot_capacity(
    entries: &[ScheduledProject],
    candidate: &ScheduledProject,
) -> Result<(), CapacityError> {
    if !candidate.probability.is_finite() || candidate.probability <= 0.0 {
        return Err(CapacityError::NonPositive(candidate.probability));
    }
    let available = remaining_capacity(entries, Some(&candidate.id));
    if candidate.probability > available + EPSILON {
        return Err(CapacityError::Exceeds {
            available,
            requested: candidate.probability,
        });
    }
    Ok(())
}
