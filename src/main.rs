mod app;
mod cli;
mod db;
mod entities;
mod error;
mod model;
mod util;

use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use clap::Parser;

use crate::app::{App, DATE_KEY_FORMAT};
use crate::cli::{
    Cli, Command, FocusCommand, FocusTarget, FocusText, PickCommand, PickMove, PickToggle,
    RankArg, RankChoice, Show, TaskAdd, TaskCommand, TaskMove, TaskRemove, TaskUpdate,
};
use crate::error::AppError;
use crate::model::{PlanRecord, Rank, Step, MAX_PICKS, MAX_TASKS};
use crate::util::{format_history, format_record, format_task_list};

const HOME_ENV: &str = "SATISFY_HOME";
const DATE_FLAG: &str = "--date";

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let Cli {
        home,
        date,
        command,
    } = Cli::parse();

    let today = resolve_date(date)?;
    let home = resolve_home(home)?;
    let db_path = db::resolve_db_path(&home);
    db::ensure_parent_dir(&db_path)?;
    let mut lock = db::open_lock(&db_path)?;
    let _guard = lock.write()?;

    let db = db::connect(&db_path).await?;
    db::ensure_schema(&db).await?;
    let app = App::new(db, today);

    match command {
        Command::Task(command) => handle_task(&app, command).await,
        Command::Pick(command) => handle_pick(&app, command).await,
        Command::Next => handle_next(&app).await,
        Command::Back => handle_back(&app).await,
        Command::Rank(args) => handle_rank(&app, args).await,
        Command::Focus(command) => handle_focus(&app, command).await,
        Command::Show(args) => handle_show(&app, args).await,
        Command::Restart => handle_restart(&app).await,
        Command::History => handle_history(&app).await,
    }
}

async fn handle_task(app: &App, command: TaskCommand) -> Result<(), AppError> {
    match command {
        TaskCommand::Add(args) => handle_task_add(app, args).await,
        TaskCommand::Remove(args) => handle_task_remove(app, args).await,
        TaskCommand::Update(args) => handle_task_update(app, args).await,
        TaskCommand::Move(args) => handle_task_move(app, args).await,
        TaskCommand::List => handle_task_list(app).await,
    }
}

async fn handle_pick(app: &App, command: PickCommand) -> Result<(), AppError> {
    match command {
        PickCommand::Toggle(args) => handle_pick_toggle(app, args).await,
        PickCommand::Move(args) => handle_pick_move(app, args).await,
    }
}

async fn handle_task_add(app: &App, args: TaskAdd) -> Result<(), AppError> {
    let (record, changed) = app.add_task(&args.text).await?;
    if changed {
        println!("Added task {}: {}", record.tasks.len(), args.text);
    } else if record.step != Step::Edit {
        println!("Tasks can only be edited in the edit step.");
    } else {
        println!("Task list already holds {MAX_TASKS} entries; nothing added.");
    }
    Ok(())
}

async fn handle_task_remove(app: &App, args: TaskRemove) -> Result<(), AppError> {
    let index = position_to_index(args.position)?;
    let (record, changed) = app.remove_task(index).await?;
    if changed {
        println!("Removed task {}.", args.position);
    } else if record.step != Step::Edit {
        println!("Tasks can only be edited in the edit step.");
    } else if index >= record.tasks.len() {
        println!("No task at position {}.", args.position);
    } else {
        println!("The last task cannot be removed.");
    }
    Ok(())
}

async fn handle_task_update(app: &App, args: TaskUpdate) -> Result<(), AppError> {
    let index = position_to_index(args.position)?;
    let (record, changed) = app.update_task(index, &args.text).await?;
    if changed {
        println!("Updated task {}.", args.position);
    } else if !matches!(record.step, Step::Edit | Step::Select) {
        println!("Tasks are read-only after the select step.");
    } else {
        println!("No task at position {}.", args.position);
    }
    Ok(())
}

async fn handle_task_move(app: &App, args: TaskMove) -> Result<(), AppError> {
    let from = position_to_index(args.from)?;
    let to = position_to_index(args.to)?;
    let (record, changed) = app.move_task(from, to).await?;
    if changed {
        println!("Moved task {} to position {}.", args.from, args.to);
    } else if record.step != Step::Edit {
        println!("Tasks can only be edited in the edit step.");
    } else if from == to {
        println!("Task {} is already at that position.", args.from);
    } else {
        println!("Positions must be within the task list.");
    }
    Ok(())
}

async fn handle_task_list(app: &App) -> Result<(), AppError> {
    let record = app.load_today().await?;
    println!("{}", format_task_list(&record).trim_end());
    Ok(())
}

async fn handle_pick_toggle(app: &App, args: PickToggle) -> Result<(), AppError> {
    let index = position_to_index(args.position)?;
    let (record, changed) = app.toggle_pick(index).await?;
    if changed {
        if record.selected.contains(&index) {
            println!(
                "Picked task {} ({}/{}).",
                args.position,
                record.selected.len(),
                MAX_PICKS
            );
        } else {
            println!(
                "Unpicked task {} ({}/{}).",
                args.position,
                record.selected.len(),
                MAX_PICKS
            );
        }
    } else if record.step != Step::Select {
        println!("Picks can only change in the select step.");
    } else if record.selected.len() >= MAX_PICKS {
        println!("Already picked {MAX_PICKS} tasks; unpick one first.");
    } else if index >= record.tasks.len() {
        println!("No task at position {}.", args.position);
    } else {
        println!("Task {} is empty; it cannot be picked.", args.position);
    }
    Ok(())
}

async fn handle_pick_move(app: &App, args: PickMove) -> Result<(), AppError> {
    let from = position_to_index(args.from)?;
    let to = position_to_index(args.to)?;
    let (record, changed) = app.move_pick(from, to).await?;
    if changed {
        println!("Moved pick {} to position {}.", args.from, args.to);
    } else if record.step != Step::Plan {
        println!("Picks can only be reordered once the plan is set.");
    } else if from == to {
        println!("Pick {} is already at that position.", args.from);
    } else {
        println!("Positions must be within the picked tasks.");
    }
    Ok(())
}

async fn handle_next(app: &App) -> Result<(), AppError> {
    let (record, changed) = app.advance().await?;
    if changed {
        match record.step {
            Step::Select => {
                println!("Now select: pick up to {MAX_PICKS} of today's tasks.");
            }
            Step::Rank => {
                println!("Now rank: choose the satisfaction rank for finishing the plan.");
            }
            Step::Edit | Step::Plan => {}
        }
    } else {
        match record.step {
            Step::Edit => println!("Fill in at least one task first."),
            Step::Select => println!("Pick at least one task first."),
            Step::Rank => println!("Choose a rank to finish, or 'back' to revisit the picks."),
            Step::Plan => println!("The plan is already set; use 'restart' to start over."),
        }
    }
    Ok(())
}

async fn handle_back(app: &App) -> Result<(), AppError> {
    let (record, changed) = app.go_back().await?;
    if changed {
        println!("Returned to the {} step.", record.step.as_str());
    } else if record.step == Step::Plan {
        println!("The plan is set; use 'restart' to edit tasks again.");
    } else {
        println!("Already at the first step.");
    }
    Ok(())
}

async fn handle_rank(app: &App, args: RankChoice) -> Result<(), AppError> {
    let rank = rank_from_arg(args.rank);
    let (record, changed) = app.choose_rank(rank).await?;
    if changed {
        println!("Goal set: {} rank.", rank.as_str());
        println!();
        println!("{}", format_record(app.today(), &record));
    } else {
        println!("Ranking happens after tasks are picked; run 'next' first.");
    }
    Ok(())
}

async fn handle_focus(app: &App, command: FocusCommand) -> Result<(), AppError> {
    match command {
        FocusCommand::Open(args) => handle_focus_open(app, args, true).await,
        FocusCommand::Close(args) => handle_focus_open(app, args, false).await,
        FocusCommand::FirstStep(args) => handle_focus_first_step(app, args).await,
        FocusCommand::Trick(args) => handle_focus_trick(app, args).await,
    }
}

async fn handle_focus_open(app: &App, args: FocusTarget, open: bool) -> Result<(), AppError> {
    let index = position_to_index(args.position)?;
    let (record, changed) = app.set_expanded(index, open).await?;
    if changed {
        if open {
            println!("Opened notes for task {}.", args.position);
        } else {
            println!("Closed notes for task {}.", args.position);
        }
    } else if !in_plan(&record, index) {
        println!("Task {} is not part of today's committed plan.", args.position);
    } else if open {
        println!("Notes for task {} are already open.", args.position);
    } else {
        println!("Notes for task {} are already closed.", args.position);
    }
    Ok(())
}

async fn handle_focus_first_step(app: &App, args: FocusText) -> Result<(), AppError> {
    let index = position_to_index(args.position)?;
    let (record, changed) = app.set_first_step(index, &args.text).await?;
    if changed {
        if args.text.trim().is_empty() {
            println!("Cleared the first step for task {}.", args.position);
        } else {
            println!("First step for task {}: {}", args.position, args.text);
        }
    } else if !in_plan(&record, index) {
        println!("Task {} is not part of today's committed plan.", args.position);
    } else {
        println!("No first step recorded for task {}.", args.position);
    }
    Ok(())
}

async fn handle_focus_trick(app: &App, args: FocusText) -> Result<(), AppError> {
    let index = position_to_index(args.position)?;
    let (record, changed) = app.set_trick(index, &args.text).await?;
    if changed {
        if args.text.trim().is_empty() {
            println!("Cleared the trick for task {}.", args.position);
        } else {
            println!("Trick for task {}: {}", args.position, args.text);
        }
    } else if !in_plan(&record, index) {
        println!("Task {} is not part of today's committed plan.", args.position);
    } else {
        println!("No trick recorded for task {}.", args.position);
    }
    Ok(())
}

async fn handle_show(app: &App, args: Show) -> Result<(), AppError> {
    let record = app.load_today().await?;
    if args.json {
        println!("{}", serde_json::to_string(&record)?);
    } else {
        println!("{}", format_record(app.today(), &record));
    }
    Ok(())
}

async fn handle_restart(app: &App) -> Result<(), AppError> {
    let (_, changed) = app.restart().await?;
    if changed {
        println!("Back to editing; picks, rank, and notes were cleared.");
    } else {
        println!("No committed plan to restart.");
    }
    Ok(())
}

async fn handle_history(app: &App) -> Result<(), AppError> {
    let entries = app.load_history().await?;
    println!("{}", format_history(&entries));
    Ok(())
}

fn in_plan(record: &PlanRecord, index: usize) -> bool {
    record.step == Step::Plan && record.selected.contains(&index)
}

fn resolve_home(home: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(home) = home {
        return Ok(home);
    }

    if let Ok(value) = std::env::var(HOME_ENV) {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        return Ok(PathBuf::from(home).join(".satisfy"));
    }

    Err(AppError::InvalidInput(
        "unable to resolve data directory; pass --home or set SATISFY_HOME".to_string(),
    ))
}

fn resolve_date(date: Option<String>) -> Result<NaiveDate, AppError> {
    match date {
        Some(value) => NaiveDate::parse_from_str(value.trim(), DATE_KEY_FORMAT).map_err(|_| {
            AppError::InvalidInput(format!("{DATE_FLAG} expects YYYY-MM-DD, got '{value}'"))
        }),
        None => Ok(Local::now().date_naive()),
    }
}

fn position_to_index(position: usize) -> Result<usize, AppError> {
    if position == 0 {
        return Err(AppError::InvalidInput("position starts at 1".to_string()));
    }
    Ok(position - 1)
}

fn rank_from_arg(arg: RankArg) -> Rank {
    match arg {
        RankArg::Ss => Rank::Ss,
        RankArg::SPlusPlus => Rank::SPlusPlus,
        RankArg::SPlus => Rank::SPlus,
        RankArg::S => Rank::S,
    }
}
