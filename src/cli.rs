use std::path::PathBuf;
use std::str::FromStr;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand};
use thiserror::Error;

use crate::domain::{Day, Hour, FULL_ALLOCATION};

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "wkp")]
#[command(bin_name = "wkp")]
#[command(version)]
#[command(about = "Plan a probabilistic week and roll for what to focus on now")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'd',
        long,
        env = "WEEKPLAN_DB_PATH",
        help = "Path to the SQLite state file (default .weekplan/state.sqlite)."
    )]
    pub db: Option<String>,

    #[arg(
        short = 'c',
        long,
        env = "WEEKPLAN_CONFIG",
        help = "Path to a config TOML file."
    )]
    pub config: Option<PathBuf>,

    #[arg(short = 'v', long, global = true, help = "Log debug output to stderr.")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Manage master projects.")]
    Project(ProjectArgs),
    #[command(about = "Edit one hour slot of the week.")]
    Slot(SlotArgs),
    #[command(about = "Set every weekly placement of one project at once.")]
    Plan(PlanArgs),
    #[command(about = "Show the weekly schedule.")]
    Week(WeekArgs),
    #[command(about = "Show how full each slot of the week is.")]
    Heatmap,
    #[command(about = "Manage and apply day templates.")]
    Template(TemplateArgs),
    #[command(about = "Roll for the project to focus on right now.")]
    Focus(FocusArgs),
    #[command(about = "Load sample projects, schedule and templates.")]
    Demo(DemoArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct ProjectArgs {
    #[command(subcommand)]
    pub command: ProjectSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum ProjectSubcommands {
    #[command(about = "Create a master project.")]
    Add(ProjectAddArgs),
    #[command(about = "Rename or recolor a project everywhere it is scheduled.")]
    Edit(ProjectEditArgs),
    #[command(about = "Delete a project.")]
    Rm(ProjectRmArgs),
    #[command(about = "List projects.")]
    Ls(JsonArgs),
}

#[derive(Debug, Args)]
pub struct ProjectAddArgs {
    #[arg(help = "Project name.")]
    pub name: String,

    #[arg(long, help = "Hex color such as #3B82F6 (defaults to the next unused one).")]
    pub color: Option<String>,

    #[arg(long, help = "Explicit project id (generated from the name if omitted).")]
    pub id: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProjectEditArgs {
    #[arg(help = "Project id.")]
    pub id: String,

    #[arg(long, help = "New name.")]
    pub name: Option<String>,

    #[arg(long, help = "New hex color.")]
    pub color: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProjectRmArgs {
    #[arg(help = "Project id.")]
    pub id: String,

    #[arg(long, help = "Also remove every scheduled occurrence of the project.")]
    pub cascade: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(long, help = "Print JSON instead of text.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SlotArgs {
    #[command(subcommand)]
    pub command: SlotSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum SlotSubcommands {
    #[command(about = "Add a project to a slot, or change an existing entry.")]
    Set(SlotSetArgs),
    #[command(about = "Remove one entry from a slot.")]
    Rm(SlotRmArgs),
    #[command(about = "Remove every entry from a slot.")]
    Clear(SlotRefArgs),
    #[command(about = "Show the entries of a slot.")]
    Show(SlotShowArgs),
}

#[derive(Debug, Args)]
pub struct SlotSetArgs {
    #[arg(help = "Day name or abbreviation.")]
    pub day: Day,

    #[arg(help = "Hour 0-23 or HH:00.")]
    pub hour: Hour,

    #[arg(help = "Master project id.")]
    pub project: String,

    #[arg(value_parser = parse_probability, help = "Weight as a fraction (0.3) or percent (30%).")]
    pub probability: f64,

    #[arg(long, help = "Existing entry id to update instead of adding a new one.")]
    pub entry: Option<String>,
}

#[derive(Debug, Args)]
pub struct SlotRmArgs {
    #[arg(help = "Day name or abbreviation.")]
    pub day: Day,

    #[arg(help = "Hour 0-23 or HH:00.")]
    pub hour: Hour,

    #[arg(help = "Entry id.")]
    pub entry: String,
}

#[derive(Debug, Args)]
pub struct SlotRefArgs {
    #[arg(help = "Day name or abbreviation.")]
    pub day: Day,

    #[arg(help = "Hour 0-23 or HH:00.")]
    pub hour: Hour,
}

#[derive(Debug, Args)]
pub struct SlotShowArgs {
    #[arg(help = "Day name or abbreviation.")]
    pub day: Day,

    #[arg(help = "Hour 0-23 or HH:00.")]
    pub hour: Hour,

    #[arg(long, help = "Print JSON instead of text.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[arg(help = "Master project id.")]
    pub project: String,

    #[arg(help = "Placements as DAY:HOUR=WEIGHT, e.g. mon:9=50%. None clears the project.")]
    pub placements: Vec<Placement>,
}

#[derive(Debug, Args)]
pub struct WeekArgs {
    #[arg(long, help = "Show only this day.")]
    pub day: Option<Day>,

    #[arg(long, help = "Print JSON instead of text.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum TemplateSubcommands {
    #[command(about = "Create a template, empty or copied from a day of the week.")]
    New(TemplateNewArgs),
    #[command(about = "Add or change an entry in a template hour.")]
    Set(TemplateSetArgs),
    #[command(about = "Remove an entry from a template hour.")]
    Unset(TemplateUnsetArgs),
    #[command(about = "Rename a template.")]
    Rename(TemplateRenameArgs),
    #[command(about = "Delete a template.")]
    Rm(TemplateRefArgs),
    #[command(about = "List templates.")]
    Ls(JsonArgs),
    #[command(about = "Show one template.")]
    Show(TemplateShowArgs),
    #[command(about = "Overwrite days of the week with a template.")]
    Apply(TemplateApplyArgs),
}

#[derive(Debug, Args)]
pub struct TemplateNewArgs {
    #[arg(help = "Template name.")]
    pub name: String,

    #[arg(long, help = "Copy the current schedule of this day.")]
    pub from_day: Option<Day>,
}

#[derive(Debug, Args)]
pub struct TemplateSetArgs {
    #[arg(help = "Template id or name.")]
    pub template: String,

    #[arg(help = "Hour 0-23 or HH:00.")]
    pub hour: Hour,

    #[arg(help = "Master project id.")]
    pub project: String,

    #[arg(value_parser = parse_probability, help = "Weight as a fraction (0.3) or percent (30%).")]
    pub probability: f64,

    #[arg(long, help = "Existing entry id to update instead of adding a new one.")]
    pub entry: Option<String>,
}

#[derive(Debug, Args)]
pub struct TemplateUnsetArgs {
    #[arg(help = "Template id or name.")]
    pub template: String,

    #[arg(help = "Hour 0-23 or HH:00.")]
    pub hour: Hour,

    #[arg(help = "Entry id.")]
    pub entry: String,
}

#[derive(Debug, Args)]
pub struct TemplateRenameArgs {
    #[arg(help = "Template id or name.")]
    pub template: String,

    #[arg(help = "New name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct TemplateRefArgs {
    #[arg(help = "Template id or name.")]
    pub template: String,
}

#[derive(Debug, Args)]
pub struct TemplateShowArgs {
    #[arg(help = "Template id or name.")]
    pub template: String,

    #[arg(long, help = "Print JSON instead of text.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct TemplateApplyArgs {
    #[arg(help = "Template id or name.")]
    pub template: String,

    #[arg(required = true, num_args = 1.., help = "Days to overwrite.")]
    pub days: Vec<Day>,
}

#[derive(Debug, Args)]
pub struct FocusArgs {
    #[arg(long, help = "Roll for this day instead of today.")]
    pub day: Option<Day>,

    #[arg(long, help = "Roll for this hour instead of the current one.")]
    pub hour: Option<Hour>,

    #[arg(long, help = "Seed the random source for a reproducible roll.")]
    pub seed: Option<u64>,

    #[arg(short = 'w', long, help = "Keep re-rolling on an interval.")]
    pub watch: bool,

    #[arg(long, requires = "watch", help = "Stop after this many rolls.")]
    pub ticks: Option<u64>,

    #[arg(
        long,
        requires = "watch",
        help = "Seconds between rolls (defaults to the config value, 60)."
    )]
    pub interval: Option<u64>,

    #[arg(long, help = "Print JSON instead of text.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DemoArgs {
    #[arg(long, help = "Replace existing data with the demo set.")]
    pub force: bool,
}

#[derive(Debug, Args)]
#[command(about = "Generate or install shell completions.")]
pub struct CompletionsArgs {
    #[arg(help = "Shell name (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,

    #[arg(
        short = 'i',
        long = "install",
        help = "Write completions to the canonical path for the shell."
    )]
    pub install: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid weight '{value}': {reason}")]
pub struct ParseProbabilityError {
    value: String,
    reason: &'static str,
}

/// Accepts `0.3` or `30%`. Bare numbers above 1 are rejected so that `30`
/// is not silently read as thirty times a full slot.
pub fn parse_probability(raw: &str) -> Result<f64, ParseProbabilityError> {
    let fail = |reason| ParseProbabilityError {
        value: raw.to_string(),
        reason,
    };
    let trimmed = raw.trim();
    let (number, scale) = match trimmed.strip_suffix('%') {
        Some(percent) => (percent.trim(), 100.0),
        None => (trimmed, 1.0),
    };
    let value: f64 = number.parse().map_err(|_| fail("not a number"))?;
    if !value.is_finite() {
        return Err(fail("not a finite number"));
    }
    let probability = value / scale;
    if probability > FULL_ALLOCATION && scale == 1.0 {
        return Err(fail("fractions must be at most 1; use a % suffix for percentages"));
    }
    Ok(probability)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub day: Day,
    pub hour: Hour,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParsePlacementError {
    #[error("invalid placement '{0}': expected DAY:HOUR=WEIGHT")]
    Shape(String),
    #[error(transparent)]
    Day(#[from] crate::domain::ParseDayError),
    #[error(transparent)]
    Hour(#[from] crate::domain::ParseHourError),
    #[error(transparent)]
    Probability(#[from] ParseProbabilityError),
}

impl FromStr for Placement {
    type Err = ParsePlacementError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let shape = || ParsePlacementError::Shape(raw.to_string());
        let (slot, weight) = raw.split_once('=').ok_or_else(shape)?;
        let (day, hour) = slot.split_once(':').ok_or_else(shape)?;
        Ok(Self {
            day: day.parse()?,
            hour: hour.parse()?,
            probability: parse_probability(weight)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_accepts_fractions_and_percents() {
        assert_eq!(parse_probability("0.3"), Ok(0.3));
        assert_eq!(parse_probability("30%"), Ok(0.3));
        assert_eq!(parse_probability(" 100 % "), Ok(1.0));
        assert_eq!(parse_probability("1"), Ok(1.0));
    }

    #[test]
    fn probability_rejects_garbage_and_bare_percent_numbers() {
        assert!(parse_probability("abc").is_err());
        assert!(parse_probability("30").is_err());
        assert!(parse_probability("NaN").is_err());
        assert!(parse_probability("inf%").is_err());
    }

    #[test]
    fn placement_parses_day_hour_and_weight() {
        let placement: Placement = "mon:9=50%".parse().expect("placement parses");
        assert_eq!(
            placement,
            Placement {
                day: Day::Monday,
                hour: Hour::new(9).expect("hour"),
                probability: 0.5,
            }
        );
        let long: Placement = "Thursday:14:00=0.25".parse().expect("placement parses");
        assert_eq!(long.hour, Hour::new(14).expect("hour"));
    }

    #[test]
    fn placement_reports_shape_and_part_errors() {
        assert!(matches!(
            "mon9".parse::<Placement>(),
            Err(ParsePlacementError::Shape(_))
        ));
        assert!(matches!(
            "xyz:9=1".parse::<Placement>(),
            Err(ParsePlacementError::Day(_))
        ));
        assert!(matches!(
            "mon:24=1".parse::<Placement>(),
            Err(ParsePlacementError::Hour(_))
        ));
    }

    #[test]
    fn cli_parses_nested_commands() {
        let cli = Cli::try_parse_from(["wkp", "slot", "set", "tue", "14", "deep-1a2b", "40%"])
            .expect("slot set parses");
        match cli.command {
            Commands::Slot(SlotArgs {
                command: SlotSubcommands::Set(args),
            }) => {
                assert_eq!(args.day, Day::Tuesday);
                assert_eq!(args.probability, 0.4);
                assert!(args.entry.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["wkp", "template", "apply", "T-1"]).is_err());
        assert!(Cli::try_parse_from(["wkp", "focus", "--ticks", "2"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        styled_command().debug_assert();
    }
}
