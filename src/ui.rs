use std::io::{self, IsTerminal};

use crate::domain::schedule::total_probability;
use crate::domain::{Day, DayTemplate, Hour, MasterProject, ScheduledProject, WeeklySchedule};
use crate::domain::{EPSILON, FULL_ALLOCATION};
use crate::focus::{Candidate, FocusOutcome};

pub fn print_project_list(projects: &[MasterProject], usage: impl Fn(&str) -> usize) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Projects"));
    if projects.is_empty() {
        println!("{}", palette.dim("no projects defined"));
        return;
    }
    for project in projects {
        println!("{}", format_project_row(project, usage(&project.id), &palette));
    }
    println!("{}", palette.dim(&format!("{} project(s)", projects.len())));
}

fn format_project_row(project: &MasterProject, slots: usize, palette: &Palette) -> String {
    format!(
        "{} {} {} {}",
        palette.swatch(&project.color),
        palette.id(&project.id),
        project.name,
        palette.dim(&format!("({slots} slot(s))"))
    )
}

pub fn print_slot(day: Day, hour: Hour, entries: &[ScheduledProject]) {
    let palette = Palette::auto();
    println!("{}", palette.heading(&format!("{day} {hour}")));
    for line in format_slot_lines(entries, &palette) {
        println!("{line}");
    }
}

fn format_slot_lines(entries: &[ScheduledProject], palette: &Palette) -> Vec<String> {
    if entries.is_empty() {
        return vec![palette.dim("  empty")];
    }
    let mut lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            format!(
                "  {} {:>4} {} {}",
                palette.swatch(&entry.color),
                format_percent(entry.probability),
                entry.name,
                palette.dim(&entry.id)
            )
        })
        .collect();
    let total = total_probability(entries);
    lines.push(format!(
        "  {}",
        palette.allocation(total, &format!("allocated {}", format_percent(total)))
    ));
    lines
}

pub fn print_week(schedule: &WeeklySchedule, only: Option<Day>) {
    let palette = Palette::auto();
    let days: Vec<Day> = match only {
        Some(day) => vec![day],
        None => Day::ALL.to_vec(),
    };
    for day in days {
        println!("{}", palette.heading(day.as_str()));
        let Some(hours) = schedule.day(day) else {
            println!("{}", palette.dim("  nothing planned"));
            continue;
        };
        for (hour, entries) in hours {
            println!("  {}", format_week_slot(*hour, entries, &palette));
        }
    }
}

fn format_week_slot(hour: Hour, entries: &[ScheduledProject], palette: &Palette) -> String {
    let parts = entries
        .iter()
        .map(|entry| {
            format!(
                "{} {} {}",
                palette.swatch(&entry.color),
                entry.name,
                format_percent(entry.probability)
            )
        })
        .collect::<Vec<_>>();
    format!("{} {}", palette.dim(&hour.to_string()), parts.join("  "))
}

pub fn print_heatmap(schedule: &WeeklySchedule) {
    let palette = Palette::auto();
    for line in format_heatmap(schedule, &palette) {
        println!("{line}");
    }
}

/// One row per hour, one column per day, each cell the slot's total weight.
fn format_heatmap(schedule: &WeeklySchedule, palette: &Palette) -> Vec<String> {
    let header = Day::ALL
        .iter()
        .map(|day| format!("{:>5}", day.short()))
        .collect::<String>();
    let mut lines = vec![palette.heading(&format!("{:<6}{header}", ""))];
    for hour in Hour::all() {
        let mut row = palette.dim(&format!("{:<6}", hour.to_string()));
        for day in Day::ALL {
            let entries = schedule.slot(day, hour);
            if entries.is_empty() {
                row.push_str(&palette.dim(&format!("{:>5}", ".")));
            } else {
                let total = total_probability(entries);
                row.push_str(&palette.allocation(total, &format!("{:>5}", format_percent(total))));
            }
        }
        lines.push(row);
    }
    lines
}

pub fn print_template_list(templates: &[DayTemplate]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Templates"));
    if templates.is_empty() {
        println!("{}", palette.dim("no templates defined"));
        return;
    }
    for template in templates {
        let entries: usize = template.schedule.values().map(Vec::len).sum();
        println!(
            "{} {} {}",
            palette.id(&template.id),
            template.name,
            palette.dim(&format!(
                "({} slot(s), {} entr{})",
                template.schedule.len(),
                entries,
                if entries == 1 { "y" } else { "ies" }
            ))
        );
    }
}

pub fn print_template(template: &DayTemplate) {
    let palette = Palette::auto();
    println!(
        "{} {}",
        palette.heading(&template.name),
        palette.dim(&template.id)
    );
    if template.schedule.is_empty() {
        println!("{}", palette.dim("  empty (applying it clears a day)"));
    }
    for (hour, entries) in &template.schedule {
        println!("  {}", format_week_slot(*hour, entries, &palette));
    }
}

pub fn print_focus(outcome: &FocusOutcome) {
    let palette = Palette::auto();
    for line in format_focus(outcome, &palette) {
        println!("{line}");
    }
}

fn format_focus(outcome: &FocusOutcome, palette: &Palette) -> Vec<String> {
    let headline = match &outcome.focus {
        Some(project) => format!("{} {}", palette.swatch(&project.color), palette.heading(&project.name)),
        None => palette.heading("Free time"),
    };
    let mut lines = vec![format!(
        "{} {}",
        palette.dim(&format!("{} {}", outcome.day, outcome.hour)),
        headline
    )];
    if outcome.candidates.is_empty() {
        lines.push(palette.dim("  nothing planned for this hour"));
    }
    for candidate in &outcome.candidates {
        lines.push(format_candidate(candidate, outcome, palette));
    }
    lines
}

fn format_candidate(candidate: &Candidate, outcome: &FocusOutcome, palette: &Palette) -> String {
    let chosen = match &outcome.focus {
        Some(project) => project.id == candidate.id(),
        None => false,
    };
    let marker = if chosen { ">" } else { " " };
    format!(
        " {marker} {} {:>4} {}",
        palette.swatch(candidate.color()),
        format_percent(candidate.weight),
        candidate.name()
    )
}

pub fn format_percent(probability: f64) -> String {
    format!("{:.0}%", probability * 100.0)
}

pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    pub fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    pub fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    pub fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    pub fn warn(&self, text: &str) -> String {
        self.paint("33", text)
    }

    /// A block in the project's own colour, or `■` without colour support.
    fn swatch(&self, hex: &str) -> String {
        match (self.enabled, parse_hex_color(hex)) {
            (true, Some((r, g, b))) => self.paint(&format!("38;2;{r};{g};{b}"), "■"),
            _ => "■".to_string(),
        }
    }

    fn allocation(&self, total: f64, text: &str) -> String {
        self.paint(allocation_color_code(total), text)
    }
}

fn allocation_color_code(total: f64) -> &'static str {
    if total > FULL_ALLOCATION + EPSILON {
        "31"
    } else if total >= FULL_ALLOCATION - EPSILON {
        "32"
    } else {
        "33"
    }
}

fn parse_hex_color(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return None,
    };
    let channel = |range: std::ops::Range<usize>| {
        expanded
            .get(range)
            .and_then(|part| u8::from_str_radix(part, 16).ok())
    };
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

#[cfg(test)]
#[path = "ui_tests_ext.rs"]
mod tests_ext;
