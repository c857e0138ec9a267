use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "satisfy",
    version,
    about = "Plan today's three tasks and the satisfaction rank for finishing them"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Data directory (defaults to SATISFY_HOME, then ~/.satisfy)"
    )]
    pub home: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "YYYY-MM-DD",
        help = "Session date (defaults to today)"
    )]
    pub date: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Task(TaskCommand),
    #[command(subcommand)]
    Pick(PickCommand),
    Next,
    Back,
    Rank(RankChoice),
    #[command(subcommand)]
    Focus(FocusCommand),
    Show(Show),
    Restart,
    History,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    Add(TaskAdd),
    Remove(TaskRemove),
    Update(TaskUpdate),
    Move(TaskMove),
    List,
}

#[derive(Subcommand, Debug)]
pub enum PickCommand {
    Toggle(PickToggle),
    Move(PickMove),
}

#[derive(Subcommand, Debug)]
pub enum FocusCommand {
    Open(FocusTarget),
    Close(FocusTarget),
    #[command(name = "first-step")]
    FirstStep(FocusText),
    Trick(FocusText),
}

#[derive(Args, Debug)]
pub struct TaskAdd {
    pub text: String,
}

#[derive(Args, Debug)]
pub struct TaskRemove {
    #[arg(value_name = "POSITION")]
    pub position: usize,
}

#[derive(Args, Debug)]
pub struct TaskUpdate {
    #[arg(value_name = "POSITION")]
    pub position: usize,
    pub text: String,
}

#[derive(Args, Debug)]
pub struct TaskMove {
    #[arg(value_name = "FROM")]
    pub from: usize,
    #[arg(value_name = "TO")]
    pub to: usize,
}

#[derive(Args, Debug)]
pub struct PickToggle {
    #[arg(value_name = "POSITION")]
    pub position: usize,
}

#[derive(Args, Debug)]
pub struct PickMove {
    #[arg(value_name = "FROM")]
    pub from: usize,
    #[arg(value_name = "TO")]
    pub to: usize,
}

#[derive(Args, Debug)]
pub struct RankChoice {
    #[arg(value_enum)]
    pub rank: RankArg,
}

#[derive(Args, Debug)]
pub struct FocusTarget {
    #[arg(value_name = "POSITION")]
    pub position: usize,
}

#[derive(Args, Debug)]
pub struct FocusText {
    #[arg(value_name = "POSITION")]
    pub position: usize,
    pub text: String,
}

#[derive(Args, Debug)]
pub struct Show {
    #[arg(long, help = "Print the raw stored record as JSON")]
    pub json: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RankArg {
    #[value(name = "SS", alias = "ss")]
    Ss,
    #[value(name = "S++", alias = "s++")]
    SPlusPlus,
    #[value(name = "S+", alias = "s+")]
    SPlus,
    #[value(name = "S", alias = "s")]
    S,
}
