use crate::domain::{
    Day, DaySchedule, DayTemplate, Hour, MasterProject, ScheduledProject, WeeklySchedule,
};
use crate::ids::{new_occurrence_id, new_template_id};
use crate::persist::{
    LoadOutcome, Persisted, MASTER_PROJECTS_KEY, SCHEDULE_KEY, TEMPLATES_KEY,
};
use crate::store::KeyValueStore;
use crate::validate::{
    validate_day_template_array, validate_master_project_array, validate_weekly_schedule,
};

/// Owns the master project list, the weekly schedule and the day templates,
/// and writes each one back to the store after every change.
///
/// Mutations never fail. Unknown ids make them a no-op, reported through the
/// return value. Slot capacity is not checked here; callers run
/// [`crate::domain::schedule::check_slot_capacity`] first.
pub struct ScheduleRepository<S: KeyValueStore> {
    store: S,
    projects_slot: Persisted<Vec<MasterProject>>,
    schedule_slot: Persisted<WeeklySchedule>,
    templates_slot: Persisted<Vec<DayTemplate>>,
    master_projects: Vec<MasterProject>,
    schedule: WeeklySchedule,
    templates: Vec<DayTemplate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterDeletion {
    pub existed: bool,
    pub occurrences_removed: usize,
}

impl<S: KeyValueStore> ScheduleRepository<S> {
    pub fn open(store: S) -> Self {
        let mut repo = Self {
            store,
            projects_slot: Persisted::new(MASTER_PROJECTS_KEY, validate_master_project_array),
            schedule_slot: Persisted::new(SCHEDULE_KEY, validate_weekly_schedule),
            templates_slot: Persisted::new(TEMPLATES_KEY, validate_day_template_array),
            master_projects: Vec::new(),
            schedule: WeeklySchedule::new(),
            templates: Vec::new(),
        };
        repo.reload();
        repo
    }

    /// Re-reads all three collections from the store.
    pub fn reload(&mut self) {
        let (projects, outcome) = self
            .projects_slot
            .load_with_outcome(&self.store, Vec::new());
        log_outcome(self.projects_slot.key(), &outcome);

        let (mut schedule, outcome) = self
            .schedule_slot
            .load_with_outcome(&self.store, WeeklySchedule::new());
        log_outcome(self.schedule_slot.key(), &outcome);
        schedule.prune_empty();

        let (mut templates, outcome) = self
            .templates_slot
            .load_with_outcome(&self.store, Vec::new());
        log_outcome(self.templates_slot.key(), &outcome);
        for template in &mut templates {
            crate::domain::schedule::prune_day(&mut template.schedule);
        }

        self.master_projects = projects;
        self.schedule = schedule;
        self.templates = templates;
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn master_projects(&self) -> &[MasterProject] {
        &self.master_projects
    }

    pub fn master_project(&self, id: &str) -> Option<&MasterProject> {
        self.master_projects.iter().find(|project| project.id == id)
    }

    pub fn schedule(&self) -> &WeeklySchedule {
        &self.schedule
    }

    pub fn slot(&self, day: Day, hour: Hour) -> &[ScheduledProject] {
        self.schedule.slot(day, hour)
    }

    pub fn templates(&self) -> &[DayTemplate] {
        &self.templates
    }

    pub fn template(&self, id: &str) -> Option<&DayTemplate> {
        self.templates.iter().find(|template| template.id == id)
    }

    /// Number of weekly-schedule occurrences that point at `master_id`.
    pub fn master_project_usage(&self, master_id: &str) -> usize {
        self.schedule
            .entries()
            .filter(|(_, _, entry)| entry.master_id == master_id)
            .count()
    }

    /// Appends without checking for a duplicate id; keeping ids unique is up
    /// to the caller.
    pub fn add_master_project(&mut self, project: MasterProject) {
        tracing::debug!(id = %project.id, "adding master project");
        self.master_projects.push(project);
        self.persist_projects();
    }

    /// Replaces the master record and rewrites the name and color of every
    /// occurrence that references it, in the week and in templates.
    pub fn update_master_project(&mut self, project: MasterProject) -> bool {
        let Some(existing) = self
            .master_projects
            .iter_mut()
            .find(|candidate| candidate.id == project.id)
        else {
            return false;
        };
        *existing = project.clone();

        let mut refreshed = 0usize;
        for entry in self.schedule.entries_mut() {
            if entry.master_id == project.id {
                entry.refresh_from(&project);
                refreshed += 1;
            }
        }
        let mut templates_touched = false;
        for template in &mut self.templates {
            for entry in template.schedule.values_mut().flatten() {
                if entry.master_id == project.id {
                    entry.refresh_from(&project);
                    templates_touched = true;
                }
            }
        }
        tracing::debug!(id = %project.id, refreshed, "updated master project");

        self.persist_projects();
        if refreshed > 0 {
            self.persist_schedule();
        }
        if templates_touched {
            self.persist_templates();
        }
        true
    }

    /// Removes the master record and every occurrence that references it.
    /// Slots and days left empty are dropped.
    pub fn delete_master_project(&mut self, master_id: &str) -> MasterDeletion {
        let before = self.master_projects.len();
        self.master_projects
            .retain(|project| project.id != master_id);
        let existed = self.master_projects.len() != before;

        let occurrences_removed = self
            .schedule
            .remove_where(|entry| entry.master_id == master_id);

        let mut templates_touched = false;
        for template in &mut self.templates {
            for entries in template.schedule.values_mut() {
                let len = entries.len();
                entries.retain(|entry| entry.master_id != master_id);
                templates_touched |= entries.len() != len;
            }
            crate::domain::schedule::prune_day(&mut template.schedule);
        }

        tracing::debug!(id = master_id, existed, occurrences_removed, "deleted master project");
        if existed {
            self.persist_projects();
        }
        if occurrences_removed > 0 {
            self.persist_schedule();
        }
        if templates_touched {
            self.persist_templates();
        }
        MasterDeletion {
            existed,
            occurrences_removed,
        }
    }

    /// Replaces the entry with the same id in the slot, or appends it. The
    /// weight is stored exactly as given.
    pub fn save_slot_entry(&mut self, day: Day, hour: Hour, entry: ScheduledProject) {
        tracing::debug!(%day, hour = hour.value(), id = %entry.id, "saving slot entry");
        self.schedule.upsert_entry(day, hour, entry);
        self.persist_schedule();
    }

    pub fn delete_slot_entry(&mut self, day: Day, hour: Hour, entry_id: &str) -> bool {
        let removed = self.schedule.remove_entry(day, hour, entry_id);
        if removed {
            tracing::debug!(%day, hour = hour.value(), id = entry_id, "removed slot entry");
            self.persist_schedule();
        }
        removed
    }

    /// Replaces a whole slot; an empty list clears it.
    pub fn replace_slot(&mut self, day: Day, hour: Hour, entries: Vec<ScheduledProject>) {
        self.schedule.set_slot(day, hour, entries);
        self.persist_schedule();
    }

    /// Rewrites where one master project appears across the week: all its
    /// current occurrences go, and one fresh occurrence is created for each
    /// placement with a positive weight.
    pub fn set_project_week(&mut self, master_id: &str, placements: &[(Day, Hour, f64)]) -> bool {
        let Some(master) = self.master_project(master_id).cloned() else {
            return false;
        };

        self.schedule
            .remove_where(|entry| entry.master_id == master.id);
        for (day, hour, probability) in placements {
            if *probability > 0.0 {
                let entry =
                    ScheduledProject::from_master(&master, new_occurrence_id(), *probability);
                self.schedule.upsert_entry(*day, *hour, entry);
            }
        }
        tracing::debug!(id = %master.id, placements = placements.len(), "replaced project week");
        self.persist_schedule();
        true
    }

    pub fn add_template(&mut self, template: DayTemplate) {
        tracing::debug!(id = %template.id, "adding template");
        self.templates.push(template);
        self.persist_templates();
    }

    pub fn update_template(&mut self, template: DayTemplate) -> bool {
        let Some(existing) = self
            .templates
            .iter_mut()
            .find(|candidate| candidate.id == template.id)
        else {
            return false;
        };
        *existing = template;
        self.persist_templates();
        true
    }

    pub fn delete_template(&mut self, template_id: &str) -> bool {
        let before = self.templates.len();
        self.templates
            .retain(|template| template.id != template_id);
        let removed = self.templates.len() != before;
        if removed {
            self.persist_templates();
        }
        removed
    }

    /// Snapshots one day of the week into a new template.
    pub fn template_from_day(&mut self, name: &str, day: Day) -> DayTemplate {
        let schedule = self
            .schedule
            .day(day)
            .map(fresh_copy)
            .unwrap_or_default();
        let template = DayTemplate {
            id: new_template_id(),
            name: name.to_string(),
            schedule,
        };
        self.add_template(template.clone());
        template
    }

    /// Overwrites each target day with a copy of the template. Every copied
    /// occurrence gets a new id. An unknown template id changes nothing.
    pub fn apply_template(&mut self, template_id: &str, days: &[Day]) -> bool {
        let Some(template) = self.template(template_id) else {
            tracing::debug!(id = template_id, "apply skipped: unknown template");
            return false;
        };
        let pattern = template.schedule.clone();

        for day in days {
            self.schedule.replace_day(*day, fresh_copy(&pattern));
        }
        tracing::debug!(id = template_id, days = days.len(), "applied template");
        self.persist_schedule();
        true
    }

    /// Swaps in a complete new state, for demo seeding.
    pub fn replace_all(
        &mut self,
        master_projects: Vec<MasterProject>,
        mut schedule: WeeklySchedule,
        templates: Vec<DayTemplate>,
    ) {
        schedule.prune_empty();
        self.master_projects = master_projects;
        self.schedule = schedule;
        self.templates = templates;
        tracing::debug!(
            projects = self.master_projects.len(),
            templates = self.templates.len(),
            "replaced all collections"
        );
        self.persist_projects();
        self.persist_schedule();
        self.persist_templates();
    }

    fn persist_projects(&self) {
        self.projects_slot.save(&self.store, &self.master_projects);
    }

    fn persist_schedule(&self) {
        self.schedule_slot.save(&self.store, &self.schedule);
    }

    fn persist_templates(&self) {
        self.templates_slot.save(&self.store, &self.templates);
    }
}

fn fresh_copy(hours: &DaySchedule) -> DaySchedule {
    hours
        .iter()
        .map(|(hour, entries)| {
            let copies = entries
                .iter()
                .map(|entry| ScheduledProject {
                    id: new_occurrence_id(),
                    ..entry.clone()
                })
                .collect();
            (*hour, copies)
        })
        .collect()
}

fn log_outcome(key: &str, outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Absent => tracing::debug!(key, "no stored value"),
        LoadOutcome::Loaded => tracing::debug!(key, "loaded stored value"),
        LoadOutcome::Migrated { from_version } => {
            tracing::info!(key, from_version, "loaded and migrated stored value")
        }
        LoadOutcome::Discarded(reason) => {
            tracing::warn!(key, reason = %reason, "stored value discarded, using default")
        }
    }
}
