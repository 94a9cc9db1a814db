use super::{
    allocation_color_code, format_focus, format_heatmap, format_percent, format_project_row,
    format_slot_lines, format_week_slot, parse_hex_color, Palette,
};
use crate::domain::{Day, Hour, MasterProject, ScheduledProject, WeeklySchedule};
use crate::focus::{Candidate, CandidateKind, FocusOutcome};

fn plain() -> Palette {
    Palette { enabled: false }
}

fn hour(value: u8) -> Hour {
    Hour::new(value).expect("valid hour")
}

fn entry(id: &str, name: &str, probability: f64) -> ScheduledProject {
    ScheduledProject {
        id: id.to_string(),
        master_id: format!("{id}-master"),
        name: name.to_string(),
        color: "#22C55E".to_string(),
        probability,
    }
}

#[test]
fn percent_rounds_to_whole_numbers() {
    assert_eq!(format_percent(0.3), "30%");
    assert_eq!(format_percent(1.0), "100%");
    assert_eq!(format_percent(1.0 / 3.0), "33%");
}

#[test]
fn hex_colors_parse_in_long_and_short_form() {
    assert_eq!(parse_hex_color("#3B82F6"), Some((0x3B, 0x82, 0xF6)));
    assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
    assert_eq!(parse_hex_color("3B82F6"), None);
    assert_eq!(parse_hex_color("#12345"), None);
    assert_eq!(parse_hex_color("#zzzzzz"), None);
}

#[test]
fn allocation_colors_track_fill_level() {
    assert_eq!(allocation_color_code(0.5), "33");
    assert_eq!(allocation_color_code(0.9995), "32");
    assert_eq!(allocation_color_code(1.2), "31");
}

#[test]
fn disabled_palette_emits_no_escape_codes() {
    let palette = plain();
    assert_eq!(palette.heading("x"), "x");
    assert_eq!(palette.swatch("#3B82F6"), "■");

    let enabled = Palette { enabled: true };
    assert!(enabled.swatch("#3B82F6").contains("38;2;59;130;246"));
    assert_eq!(enabled.dim("x"), "\x1b[2mx\x1b[0m");
}

#[test]
fn project_rows_show_usage() {
    let project = MasterProject {
        id: "deep-work-1a2b".into(),
        name: "Deep Work".into(),
        color: "#3B82F6".into(),
    };
    let row = format_project_row(&project, 3, &plain());
    assert_eq!(row, "■ deep-work-1a2b Deep Work (3 slot(s))");
}

#[test]
fn slot_lines_list_entries_and_total() {
    let lines = format_slot_lines(&[entry("a", "Deep", 0.3), entry("b", "Admin", 0.5)], &plain());
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains(" 30% Deep a"));
    assert_eq!(lines[2], "  allocated 80%");
    assert_eq!(format_slot_lines(&[], &plain()), vec!["  empty".to_string()]);
}

#[test]
fn week_slot_joins_entries() {
    let line = format_week_slot(hour(9), &[entry("a", "Deep", 1.0)], &plain());
    assert_eq!(line, "09:00 ■ Deep 100%");
}

#[test]
fn heatmap_has_a_row_per_hour_and_marks_empty_cells() {
    let mut week = WeeklySchedule::new();
    week.set_slot(Day::Monday, hour(9), vec![entry("a", "Deep", 0.5)]);
    let lines = format_heatmap(&week, &plain());
    assert_eq!(lines.len(), 25);
    assert!(lines[0].contains("Sun"));
    let nine = &lines[10];
    assert!(nine.starts_with("09:00"));
    assert!(nine.contains("50%"));
    assert!(lines[1].trim_start_matches("00:00").trim().chars().all(|c| c == '.' || c == ' '));
}

#[test]
fn focus_marks_the_chosen_candidate() {
    let chosen = entry("a", "Deep", 0.6);
    let outcome = FocusOutcome {
        day: Day::Tuesday,
        hour: hour(14),
        focus: Some(chosen.clone()),
        candidates: vec![
            Candidate {
                entry: CandidateKind::Scheduled(chosen),
                weight: 0.6,
            },
            Candidate {
                entry: CandidateKind::Unallocated,
                weight: 0.4,
            },
        ],
    };
    let lines = format_focus(&outcome, &plain());
    assert_eq!(lines[0], "Tuesday 14:00 ■ Deep");
    assert!(lines[1].starts_with(" > "));
    assert!(lines[2].contains("Unallocated"));
    assert!(lines[2].starts_with("   "));
}

#[test]
fn focus_on_empty_slot_reports_free_time() {
    let outcome = FocusOutcome {
        day: Day::Sunday,
        hour: hour(3),
        focus: None,
        candidates: Vec::new(),
    };
    let lines = format_focus(&outcome, &plain());
    assert_eq!(lines[0], "Sunday 03:00 Free time");
    assert_eq!(lines[1], "  nothing planned for this hour");
}
