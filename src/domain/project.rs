use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterProject {
    pub id: String,
    pub name: String,
    pub color: String,
}

/// A weighted occurrence of a master project inside one slot.
///
/// `name` and `color` are snapshots of the master project and are rewritten
/// whenever the master changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledProject {
    pub id: String,
    #[serde(rename = "masterId")]
    pub master_id: String,
    pub name: String,
    pub color: String,
    pub probability: f64,
}

impl ScheduledProject {
    pub fn from_master(master: &MasterProject, id: String, probability: f64) -> Self {
        Self {
            id,
            master_id: master.id.clone(),
            name: master.name.clone(),
            color: master.color.clone(),
            probability,
        }
    }

    pub fn refresh_from(&mut self, master: &MasterProject) {
        self.name = master.name.clone();
        self.color = master.color.clone();
    }
}

pub const PROJECT_COLORS: [&str; 17] = [
    "#EF4444", "#F97316", "#F59E0B", "#EAB308", "#84CC16", "#22C55E", "#10B981", "#14B8A6",
    "#06B6D4", "#0EA5E9", "#3B82F6", "#6366F1", "#8B5CF6", "#A855F7", "#D946EF", "#EC4899",
    "#F43F5E",
];

/// Picks the first palette color not already used, cycling once exhausted.
pub fn next_color(existing: &[MasterProject]) -> &'static str {
    PROJECT_COLORS
        .iter()
        .copied()
        .find(|color| {
            !existing
                .iter()
                .any(|project| project.color.eq_ignore_ascii_case(color))
        })
        .unwrap_or(PROJECT_COLORS[existing.len() % PROJECT_COLORS.len()])
}
