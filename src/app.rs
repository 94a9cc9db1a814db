use thiserror::Error;

use crate::cli::Placement;
use crate::config::ConfigError;
use crate::demo;
use crate::domain::project::next_color;
use crate::domain::schedule::{check_slot_capacity, CapacityError};
use crate::domain::{Day, DayTemplate, Hour, MasterProject, ScheduledProject};
use crate::focus::UNALLOCATED_ID;
use crate::ids::{generate_project_id, new_occurrence_id, new_template_id};
use crate::repository::{MasterDeletion, ScheduleRepository};
use crate::store::{KeyValueStore, SqliteStore, StoreError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Capacity(#[from] CapacityError),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
}

/// Command-level operations. Everything here checks its inputs and reports
/// problems as [`AppError`] before handing the change to the repository,
/// which itself never fails.
pub struct App<S: KeyValueStore> {
    repo: ScheduleRepository<S>,
}

impl App<SqliteStore> {
    pub fn open(db_path: &str) -> Result<Self, AppError> {
        let store = SqliteStore::open(db_path)?;
        Ok(Self::from_store(store))
    }
}

impl<S: KeyValueStore> App<S> {
    pub fn from_store(store: S) -> Self {
        Self {
            repo: ScheduleRepository::open(store),
        }
    }

    pub fn repo(&self) -> &ScheduleRepository<S> {
        &self.repo
    }

    pub fn repo_mut(&mut self) -> &mut ScheduleRepository<S> {
        &mut self.repo
    }

    pub fn add_project(
        &mut self,
        name: &str,
        color: Option<&str>,
        id: Option<&str>,
    ) -> Result<MasterProject, AppError> {
        let name = required_text(name, "project name")?;
        let color = match color {
            Some(raw) => normalize_color(raw)?,
            None => next_color(self.repo.master_projects()).to_string(),
        };
        let id = match id {
            Some(raw) => {
                let id = required_text(raw, "project id")?;
                if id == UNALLOCATED_ID {
                    return Err(AppError::InvalidArgument(format!(
                        "'{UNALLOCATED_ID}' is reserved for unallocated time"
                    )));
                }
                if self.repo.master_project(&id).is_some() {
                    return Err(AppError::Conflict(format!("project '{id}' already exists")));
                }
                id
            }
            None => generate_project_id(&name, |candidate| {
                self.repo.master_project(candidate).is_some()
            }),
        };

        let project = MasterProject { id, name, color };
        self.repo.add_master_project(project.clone());
        Ok(project)
    }

    pub fn edit_project(
        &mut self,
        id: &str,
        name: Option<&str>,
        color: Option<&str>,
    ) -> Result<MasterProject, AppError> {
        if name.is_none() && color.is_none() {
            return Err(AppError::InvalidArgument(
                "nothing to change; pass --name and/or --color".to_string(),
            ));
        }
        let mut project = self.require_project(id)?.clone();
        if let Some(name) = name {
            project.name = required_text(name, "project name")?;
        }
        if let Some(color) = color {
            project.color = normalize_color(color)?;
        }
        self.repo.update_master_project(project.clone());
        Ok(project)
    }

    /// Refuses while the project is still scheduled, unless `cascade`.
    pub fn remove_project(&mut self, id: &str, cascade: bool) -> Result<MasterDeletion, AppError> {
        self.require_project(id)?;
        let usage = self.repo.master_project_usage(id);
        if usage > 0 && !cascade {
            return Err(AppError::Conflict(format!(
                "project '{id}' is scheduled in {usage} slot entr{}; pass --cascade to remove it from all time slots",
                if usage == 1 { "y" } else { "ies" }
            )));
        }
        Ok(self.repo.delete_master_project(id))
    }

    pub fn set_slot_entry(
        &mut self,
        day: Day,
        hour: Hour,
        project_id: &str,
        probability: f64,
        entry_id: Option<&str>,
    ) -> Result<ScheduledProject, AppError> {
        let master = self.require_project(project_id)?.clone();
        let slot = self.repo.slot(day, hour);
        let id = match entry_id {
            Some(id) if slot.iter().any(|entry| entry.id == id) => id.to_string(),
            Some(id) => return Err(AppError::NotFound(format!("entry '{id}' in {day} {hour}"))),
            None => new_occurrence_id(),
        };
        let entry = ScheduledProject::from_master(&master, id, probability);
        check_slot_capacity(slot, &entry)?;
        self.repo.save_slot_entry(day, hour, entry.clone());
        Ok(entry)
    }

    pub fn remove_slot_entry(&mut self, day: Day, hour: Hour, entry_id: &str) -> Result<(), AppError> {
        if self.repo.delete_slot_entry(day, hour, entry_id) {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("entry '{entry_id}' in {day} {hour}")))
        }
    }

    pub fn clear_slot(&mut self, day: Day, hour: Hour) -> usize {
        let removed = self.repo.slot(day, hour).len();
        if removed > 0 {
            self.repo.replace_slot(day, hour, Vec::new());
        }
        removed
    }

    /// Replaces every placement of one project. Each target slot is checked
    /// with that project's current weight there left out.
    pub fn plan_project(&mut self, project_id: &str, placements: &[Placement]) -> Result<usize, AppError> {
        let master = self.require_project(project_id)?.clone();
        for (index, placement) in placements.iter().enumerate() {
            if placements[..index]
                .iter()
                .any(|earlier| earlier.day == placement.day && earlier.hour == placement.hour)
            {
                return Err(AppError::InvalidArgument(format!(
                    "{} {} is listed more than once",
                    placement.day, placement.hour
                )));
            }
            if placement.probability <= 0.0 {
                continue;
            }
            let others: Vec<ScheduledProject> = self
                .repo
                .slot(placement.day, placement.hour)
                .iter()
                .filter(|entry| entry.master_id != master.id)
                .cloned()
                .collect();
            let candidate =
                ScheduledProject::from_master(&master, new_occurrence_id(), placement.probability);
            check_slot_capacity(&others, &candidate)?;
        }

        let triples: Vec<(Day, Hour, f64)> = placements
            .iter()
            .map(|placement| (placement.day, placement.hour, placement.probability))
            .collect();
        self.repo.set_project_week(&master.id, &triples);
        Ok(self.repo.master_project_usage(&master.id))
    }

    /// Looks a template up by id, then by name (case-insensitive).
    pub fn resolve_template(&self, reference: &str) -> Result<DayTemplate, AppError> {
        let reference = reference.trim();
        if let Some(template) = self.repo.template(reference) {
            return Ok(template.clone());
        }
        let matches: Vec<&DayTemplate> = self
            .repo
            .templates()
            .iter()
            .filter(|template| template.name.eq_ignore_ascii_case(reference))
            .collect();
        match matches.as_slice() {
            [] => Err(AppError::NotFound(format!("template '{reference}'"))),
            [template] => Ok((*template).clone()),
            _ => Err(AppError::Conflict(format!(
                "{} templates are named '{reference}'; use the id",
                matches.len()
            ))),
        }
    }

    pub fn new_template(&mut self, name: &str, from_day: Option<Day>) -> Result<DayTemplate, AppError> {
        let name = required_text(name, "template name")?;
        let template = match from_day {
            Some(day) => self.repo.template_from_day(&name, day),
            None => {
                let template = DayTemplate {
                    id: new_template_id(),
                    name,
                    schedule: Default::default(),
                };
                self.repo.add_template(template.clone());
                template
            }
        };
        Ok(template)
    }

    pub fn set_template_entry(
        &mut self,
        reference: &str,
        hour: Hour,
        project_id: &str,
        probability: f64,
        entry_id: Option<&str>,
    ) -> Result<ScheduledProject, AppError> {
        let mut template = self.resolve_template(reference)?;
        let master = self.require_project(project_id)?.clone();
        let slot = template.schedule.get(&hour).map(Vec::as_slice).unwrap_or(&[]);
        let id = match entry_id {
            Some(id) if slot.iter().any(|entry| entry.id == id) => id.to_string(),
            Some(id) => {
                return Err(AppError::NotFound(format!(
                    "entry '{id}' at {hour} in template '{}'",
                    template.name
                )))
            }
            None => new_occurrence_id(),
        };
        let entry = ScheduledProject::from_master(&master, id, probability);
        check_slot_capacity(slot, &entry)?;
        template.upsert_entry(hour, entry.clone());
        self.repo.update_template(template);
        Ok(entry)
    }

    pub fn unset_template_entry(
        &mut self,
        reference: &str,
        hour: Hour,
        entry_id: &str,
    ) -> Result<(), AppError> {
        let mut template = self.resolve_template(reference)?;
        if !template.remove_entry(hour, entry_id) {
            return Err(AppError::NotFound(format!(
                "entry '{entry_id}' at {hour} in template '{}'",
                template.name
            )));
        }
        self.repo.update_template(template);
        Ok(())
    }

    pub fn rename_template(&mut self, reference: &str, name: &str) -> Result<DayTemplate, AppError> {
        let mut template = self.resolve_template(reference)?;
        template.name = required_text(name, "template name")?;
        self.repo.update_template(template.clone());
        Ok(template)
    }

    pub fn remove_template(&mut self, reference: &str) -> Result<DayTemplate, AppError> {
        let template = self.resolve_template(reference)?;
        self.repo.delete_template(&template.id);
        Ok(template)
    }

    pub fn apply_template(&mut self, reference: &str, days: &[Day]) -> Result<DayTemplate, AppError> {
        if days.is_empty() {
            return Err(AppError::InvalidArgument("no days given".to_string()));
        }
        let template = self.resolve_template(reference)?;
        self.repo.apply_template(&template.id, days);
        Ok(template)
    }

    pub fn seed_demo(&mut self, force: bool) -> bool {
        demo::seed(&mut self.repo, force)
    }

    fn require_project(&self, id: &str) -> Result<&MasterProject, AppError> {
        self.repo
            .master_project(id)
            .ok_or_else(|| AppError::NotFound(format!("project '{id}'")))
    }
}

fn required_text(raw: &str, what: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidArgument(format!("{what} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Accepts `#rgb` or `#rrggbb`, with or without the `#`; stores uppercase.
fn normalize_color(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    let valid = matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::InvalidArgument(format!(
            "invalid color '{raw}': expected #RGB or #RRGGBB"
        )));
    }
    Ok(format!("#{}", digits.to_ascii_uppercase()))
}
