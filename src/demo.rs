//! Canned sample data for `wkp demo`: four projects, a week that looks in
//! full use, and two day templates.

use crate::domain::{
    Day, DaySchedule, DayTemplate, Hour, MasterProject, ScheduledProject, WeeklySchedule,
};
use crate::ids::{new_occurrence_id, new_template_id};
use crate::repository::ScheduleRepository;
use crate::store::KeyValueStore;

const PROJECTS: [(&str, &str, &str); 4] = [
    ("deep-work-d301", "Deep Work", "#3B82F6"),
    ("learning-d302", "Learning", "#22C55E"),
    ("admin-emails-d303", "Admin & Emails", "#F97316"),
    ("fitness-d304", "Fitness", "#EF4444"),
];

const DEEP: usize = 0;
const LEARN: usize = 1;
const ADMIN: usize = 2;
const FIT: usize = 3;

type SlotRow = (u8, &'static [(usize, f64)]);

const WEEK: [(Day, &[SlotRow]); 7] = [
    (
        Day::Monday,
        &[
            (8, &[(ADMIN, 0.5)]),
            (9, &[(DEEP, 1.0)]),
            (10, &[(DEEP, 1.0)]),
            (13, &[(ADMIN, 0.5), (LEARN, 0.5)]),
            (17, &[(FIT, 1.0)]),
        ],
    ),
    (
        Day::Tuesday,
        &[(9, &[(LEARN, 0.7)]), (11, &[(DEEP, 0.5)]), (14, &[(ADMIN, 1.0)])],
    ),
    (
        Day::Wednesday,
        &[(9, &[(DEEP, 0.9)]), (14, &[(LEARN, 0.7)]), (18, &[(FIT, 1.0)])],
    ),
    (
        Day::Thursday,
        &[(10, &[(DEEP, 0.7)]), (11, &[(DEEP, 0.3), (ADMIN, 0.7)])],
    ),
    (
        Day::Friday,
        &[(9, &[(DEEP, 0.7)]), (16, &[(ADMIN, 1.0)]), (17, &[(FIT, 1.0)])],
    ),
    (Day::Saturday, &[(10, &[(LEARN, 0.6)]), (11, &[(FIT, 0.4)])]),
    (Day::Sunday, &[(14, &[(LEARN, 0.3)])]),
];

const TEMPLATES: [(&str, &[SlotRow]); 2] = [
    (
        "Productive Workday",
        &[
            (8, &[(ADMIN, 0.5)]),
            (9, &[(DEEP, 1.0)]),
            (10, &[(DEEP, 1.0)]),
            (11, &[(DEEP, 0.5), (ADMIN, 0.5)]),
            (13, &[(LEARN, 1.0)]),
            (14, &[(DEEP, 1.0)]),
            (17, &[(FIT, 1.0)]),
        ],
    ),
    (
        "Relaxed Weekend",
        &[(10, &[(LEARN, 0.8)]), (11, &[(FIT, 1.0)]), (14, &[(LEARN, 0.5)])],
    ),
];

#[derive(Debug, Clone, PartialEq)]
pub struct DemoData {
    pub master_projects: Vec<MasterProject>,
    pub schedule: WeeklySchedule,
    pub templates: Vec<DayTemplate>,
}

pub fn demo_data() -> DemoData {
    let master_projects: Vec<MasterProject> = PROJECTS
        .iter()
        .map(|(id, name, color)| MasterProject {
            id: id.to_string(),
            name: name.to_string(),
            color: color.to_string(),
        })
        .collect();

    let mut schedule = WeeklySchedule::new();
    for (day, rows) in WEEK {
        schedule.replace_day(day, build_day(&master_projects, rows));
    }

    let templates = TEMPLATES
        .iter()
        .map(|(name, rows)| DayTemplate {
            id: new_template_id(),
            name: name.to_string(),
            schedule: build_day(&master_projects, rows),
        })
        .collect();

    DemoData {
        master_projects,
        schedule,
        templates,
    }
}

fn build_day(projects: &[MasterProject], rows: &[SlotRow]) -> DaySchedule {
    rows.iter()
        .map(|(hour, entries)| {
            let occurrences = entries
                .iter()
                .map(|(index, probability)| {
                    ScheduledProject::from_master(
                        &projects[*index],
                        new_occurrence_id(),
                        *probability,
                    )
                })
                .collect();
            (Hour::wrapping(*hour), occurrences)
        })
        .collect()
}

/// Loads the demo data unless projects already exist. `force` replaces
/// whatever is there. Returns whether anything was written.
pub fn seed<S: KeyValueStore>(repo: &mut ScheduleRepository<S>, force: bool) -> bool {
    if !force && !repo.master_projects().is_empty() {
        tracing::info!("store already has projects, demo data not loaded");
        return false;
    }
    let data = demo_data();
    repo.replace_all(data.master_projects, data.schedule, data.templates);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::schedule::total_probability;
    use crate::store::memory::MemoryStore;

    #[test]
    fn demo_week_references_only_demo_projects() {
        let data = demo_data();
        assert_eq!(data.master_projects.len(), 4);
        for (_, _, entry) in data.schedule.entries() {
            let master = data
                .master_projects
                .iter()
                .find(|project| project.id == entry.master_id)
                .expect("occurrence points at a demo project");
            assert_eq!(entry.name, master.name);
            assert_eq!(entry.color, master.color);
        }
        assert_eq!(data.templates.len(), 2);
    }

    #[test]
    fn demo_slots_never_exceed_full_allocation() {
        let data = demo_data();
        for (_, hours) in data.schedule.days() {
            for entries in hours.values() {
                assert!(total_probability(entries) <= 1.0 + 1e-9);
            }
        }
        let monday = data.schedule.slot(Day::Monday, Hour::wrapping(13));
        assert_eq!(monday.len(), 2);
    }

    #[test]
    fn seed_skips_populated_store_unless_forced() {
        let mut repo = ScheduleRepository::open(MemoryStore::new());
        repo.add_master_project(MasterProject {
            id: "mine-0001".into(),
            name: "Mine".into(),
            color: "#000000".into(),
        });

        assert!(!seed(&mut repo, false));
        assert_eq!(repo.master_projects().len(), 1);

        assert!(seed(&mut repo, true));
        assert_eq!(repo.master_projects().len(), 4);
        assert!(repo.master_project("mine-0001").is_none());
        assert_eq!(repo.templates().len(), 2);
    }

    #[test]
    fn seed_fills_an_empty_store() {
        let mut repo = ScheduleRepository::open(MemoryStore::new());
        assert!(seed(&mut repo, false));
        assert_eq!(repo.master_project_usage("fitness-d304"), 4);
    }
}
