mod app;
mod cli;
mod completions;
mod config;
mod demo;
mod domain;
mod focus;
mod ids;
mod logging;
mod migration;
mod persist;
mod repository;
mod store;
mod ui;
mod validate;

use std::time::Duration;

use app::{App, AppError};
use cli::{Commands, FocusArgs, ProjectSubcommands, SlotSubcommands, TemplateSubcommands};
use config::Config;
use focus::{
    Clock, FixedClock, FocusOutcome, FocusTicker, RandomSource, SeededRandom, SystemClock,
    ThreadRandom,
};
use store::KeyValueStore;

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), AppError> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    logging::init(cli.verbose, &config.log_filter);

    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref(), args.install);
    }

    let db_path = config.resolve_db_path(cli.db.as_deref());
    tracing::debug!(db = %db_path, "opening state");
    let mut app = App::open(&db_path)?;
    let palette = ui::Palette::auto();

    match cli.command {
        Commands::Project(args) => match args.command {
            ProjectSubcommands::Add(args) => {
                let project =
                    app.add_project(&args.name, args.color.as_deref(), args.id.as_deref())?;
                println!("created {} {}", palette.id(&project.id), project.name);
            }
            ProjectSubcommands::Edit(args) => {
                let project =
                    app.edit_project(&args.id, args.name.as_deref(), args.color.as_deref())?;
                println!(
                    "updated {} {} {}",
                    palette.id(&project.id),
                    project.name,
                    palette.dim(&project.color)
                );
            }
            ProjectSubcommands::Rm(args) => {
                let outcome = app.remove_project(&args.id, args.cascade)?;
                println!(
                    "removed {} {}",
                    palette.id(&args.id),
                    palette.dim(&format!(
                        "({} scheduled entr{} removed)",
                        outcome.occurrences_removed,
                        if outcome.occurrences_removed == 1 { "y" } else { "ies" }
                    ))
                );
            }
            ProjectSubcommands::Ls(args) => {
                let repo = app.repo();
                if args.json {
                    print_json(&repo.master_projects());
                } else {
                    ui::print_project_list(repo.master_projects(), |id| {
                        repo.master_project_usage(id)
                    });
                }
            }
        },
        Commands::Slot(args) => match args.command {
            SlotSubcommands::Set(args) => {
                let entry = app.set_slot_entry(
                    args.day,
                    args.hour,
                    &args.project,
                    args.probability,
                    args.entry.as_deref(),
                )?;
                println!(
                    "saved {} {} {} {} {}",
                    palette.id(&entry.id),
                    args.day,
                    args.hour,
                    entry.name,
                    ui::format_percent(entry.probability)
                );
            }
            SlotSubcommands::Rm(args) => {
                app.remove_slot_entry(args.day, args.hour, &args.entry)?;
                println!("removed {} from {} {}", palette.id(&args.entry), args.day, args.hour);
            }
            SlotSubcommands::Clear(args) => {
                let removed = app.clear_slot(args.day, args.hour);
                println!("cleared {} {} ({removed} removed)", args.day, args.hour);
            }
            SlotSubcommands::Show(args) => {
                let entries = app.repo().slot(args.day, args.hour);
                if args.json {
                    print_json(&entries);
                } else {
                    ui::print_slot(args.day, args.hour, entries);
                }
            }
        },
        Commands::Plan(args) => {
            let placed = app.plan_project(&args.project, &args.placements)?;
            println!("planned {} in {placed} slot(s)", palette.id(&args.project));
        }
        Commands::Week(args) => {
            let schedule = app.repo().schedule();
            match (args.json, args.day) {
                (true, Some(day)) => print_json(&schedule.day(day).cloned().unwrap_or_default()),
                (true, None) => print_json(schedule),
                (false, only) => ui::print_week(schedule, only),
            }
        }
        Commands::Heatmap => ui::print_heatmap(app.repo().schedule()),
        Commands::Template(args) => run_template(&mut app, args.command, &palette)?,
        Commands::Focus(args) => run_focus(&mut app, args, &config)?,
        Commands::Demo(args) => {
            if app.seed_demo(args.force) {
                println!("demo data loaded");
            } else {
                println!(
                    "{}",
                    palette.warn("projects already exist; pass --force to replace everything")
                );
            }
        }
        Commands::Completions(_) => {}
    }

    Ok(())
}

fn run_template<S: KeyValueStore>(
    app: &mut App<S>,
    command: TemplateSubcommands,
    palette: &ui::Palette,
) -> Result<(), AppError> {
    match command {
        TemplateSubcommands::New(args) => {
            let template = app.new_template(&args.name, args.from_day)?;
            println!("created {} {}", palette.id(&template.id), template.name);
        }
        TemplateSubcommands::Set(args) => {
            let entry = app.set_template_entry(
                &args.template,
                args.hour,
                &args.project,
                args.probability,
                args.entry.as_deref(),
            )?;
            println!(
                "saved {} {} {} {}",
                palette.id(&entry.id),
                args.hour,
                entry.name,
                ui::format_percent(entry.probability)
            );
        }
        TemplateSubcommands::Unset(args) => {
            app.unset_template_entry(&args.template, args.hour, &args.entry)?;
            println!("removed {} from {}", palette.id(&args.entry), args.hour);
        }
        TemplateSubcommands::Rename(args) => {
            let template = app.rename_template(&args.template, &args.name)?;
            println!("renamed {} to {}", palette.id(&template.id), template.name);
        }
        TemplateSubcommands::Rm(args) => {
            let template = app.remove_template(&args.template)?;
            println!("removed {} {}", palette.id(&template.id), template.name);
        }
        TemplateSubcommands::Ls(args) => {
            if args.json {
                print_json(&app.repo().templates());
            } else {
                ui::print_template_list(app.repo().templates());
            }
        }
        TemplateSubcommands::Show(args) => {
            let template = app.resolve_template(&args.template)?;
            if args.json {
                print_json(&template);
            } else {
                ui::print_template(&template);
            }
        }
        TemplateSubcommands::Apply(args) => {
            let template = app.apply_template(&args.template, &args.days)?;
            let days = args
                .days
                .iter()
                .map(|day| day.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            println!("applied {} to {days}", template.name);
        }
    }
    Ok(())
}

fn run_focus<S: KeyValueStore>(
    app: &mut App<S>,
    args: FocusArgs,
    config: &Config,
) -> Result<(), AppError> {
    let mut rng: Box<dyn RandomSource> = match args.seed {
        Some(seed) => Box::new(SeededRandom::new(seed)),
        None => Box::new(ThreadRandom),
    };
    let clock: Box<dyn Clock> = if args.day.is_some() || args.hour.is_some() {
        let (today, this_hour) = SystemClock.now();
        Box::new(FixedClock {
            day: args.day.unwrap_or(today),
            hour: args.hour.unwrap_or(this_hour),
        })
    } else {
        Box::new(SystemClock)
    };
    let emit = |outcome: &FocusOutcome| {
        if args.json {
            print_json(outcome);
        } else {
            ui::print_focus(outcome);
        }
    };

    if !args.watch {
        emit(&focus::roll(app.repo_mut(), clock.as_ref(), rng.as_mut()));
        return Ok(());
    }

    let interval = match args.interval {
        Some(0) => {
            return Err(AppError::InvalidArgument(
                "--interval must be greater than zero".to_string(),
            ))
        }
        Some(secs) => Duration::from_secs(secs),
        None => config.reroll_interval,
    };
    let ticker = FocusTicker::new(interval).with_max_ticks(args.ticks);
    ticker.run(|_| emit(&focus::roll(app.repo_mut(), clock.as_ref(), rng.as_mut())));
    Ok(())
}
