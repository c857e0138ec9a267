use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

use sea_orm::{ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, Statement};
use serde_json::Value;
use tempfile::TempDir;
use url::Url;

const TODAY: &str = "2024-05-20";

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_satisfy"))
}

fn run_on(dir: &TempDir, date: &str, args: &[&str]) -> Output {
    let mut cmd = Command::new(bin_path());
    cmd.arg("--home").arg(dir.path());
    cmd.arg("--date").arg(date);
    cmd.args(args);
    cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    cmd.spawn()
        .expect("spawn command")
        .wait_with_output()
        .expect("wait output")
}

fn run_cmd(dir: &TempDir, args: &[&str]) -> Output {
    run_on(dir, TODAY, args)
}

fn output_stdout(output: Output) -> String {
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8(output.stdout).expect("stdout utf8")
}

fn show_json(dir: &TempDir, date: &str) -> Value {
    let stdout = output_stdout(run_on(dir, date, &["show", "--json"]));
    serde_json::from_str(&stdout).expect("record json")
}

fn seed_tasks(dir: &TempDir, tasks: &[&str]) {
    for (slot, text) in tasks.iter().enumerate().take(3) {
        let position = (slot + 1).to_string();
        output_stdout(run_cmd(dir, &["task", "update", &position, text]));
    }
    for text in tasks.iter().skip(3) {
        output_stdout(run_cmd(dir, &["task", "add", text]));
    }
}

async fn connect_db(dir: &TempDir) -> DatabaseConnection {
    let db_path = dir.path().join("satisfy.db");
    let mut url = Url::from_file_path(&db_path).expect("db path");
    url.set_query(Some("mode=rwc"));
    let sqlite_url = url.as_str().replacen("file://", "sqlite://", 1);
    Database::connect(&sqlite_url).await.expect("connect db")
}

#[test]
fn fresh_home_shows_the_default_record() {
    let dir = TempDir::new().expect("temp dir");
    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 1);
    assert_eq!(record["tasks"], serde_json::json!(["", "", ""]));
    assert_eq!(record["selected"], serde_json::json!([]));
    assert_eq!(record["rank"], Value::Null);
}

#[test]
fn shortcut_flow_commits_a_plan() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["buy milk"]);

    let stdout = output_stdout(run_cmd(&dir, &["next"]));
    assert!(stdout.contains("Now rank"), "stdout: {stdout}");

    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 3);
    assert_eq!(record["selected"], serde_json::json!([0]));

    let stdout = output_stdout(run_cmd(&dir, &["rank", "S+"]));
    assert!(stdout.contains("Goal set: S+ rank."), "stdout: {stdout}");
    assert!(stdout.contains("Today's plan:"), "stdout: {stdout}");

    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 4);
    assert_eq!(record["rank"], "S+");

    let stdout = output_stdout(run_cmd(&dir, &["show"]));
    assert!(stdout.contains("1. buy milk"), "stdout: {stdout}");
    assert!(stdout.contains("Goal: S+ rank"), "stdout: {stdout}");
}

#[test]
fn five_tasks_take_the_select_path() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a", "b", "c", "d", "e"]);

    let stdout = output_stdout(run_cmd(&dir, &["next"]));
    assert!(stdout.contains("Now select"), "stdout: {stdout}");

    let stdout = output_stdout(run_cmd(&dir, &["next"]));
    assert!(stdout.contains("Pick at least one task first."), "stdout: {stdout}");

    output_stdout(run_cmd(&dir, &["pick", "toggle", "1"]));
    output_stdout(run_cmd(&dir, &["pick", "toggle", "2"]));
    let stdout = output_stdout(run_cmd(&dir, &["pick", "toggle", "3"]));
    assert!(stdout.contains("Picked task 3 (3/3)."), "stdout: {stdout}");

    let stdout = output_stdout(run_cmd(&dir, &["pick", "toggle", "4"]));
    assert!(stdout.contains("Already picked 3 tasks"), "stdout: {stdout}");

    output_stdout(run_cmd(&dir, &["next"]));
    output_stdout(run_cmd(&dir, &["rank", "SS"]));

    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 4);
    assert_eq!(record["selected"], serde_json::json!([0, 1, 2]));
    assert_eq!(record["rank"], "SS");
}

#[test]
fn advance_refused_with_no_filled_tasks() {
    let dir = TempDir::new().expect("temp dir");
    let stdout = output_stdout(run_cmd(&dir, &["next"]));
    assert!(stdout.contains("Fill in at least one task first."), "stdout: {stdout}");
    assert_eq!(show_json(&dir, TODAY)["step"], 1);
}

#[test]
fn removing_a_task_remaps_the_preserved_selection() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a", "b", "c"]);
    output_stdout(run_cmd(&dir, &["next"]));
    // Back from the rank step keeps the auto-selected picks.
    output_stdout(run_cmd(&dir, &["back"]));

    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 1);
    assert_eq!(record["selected"], serde_json::json!([0, 1, 2]));

    output_stdout(run_cmd(&dir, &["task", "remove", "2"]));
    let record = show_json(&dir, TODAY);
    assert_eq!(record["tasks"], serde_json::json!(["a", "c"]));
    assert_eq!(record["selected"], serde_json::json!([0, 1]));
}

#[test]
fn moving_a_task_remaps_the_preserved_selection() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a", "b", "c"]);
    output_stdout(run_cmd(&dir, &["next"]));
    output_stdout(run_cmd(&dir, &["back"]));

    output_stdout(run_cmd(&dir, &["task", "move", "1", "3"]));
    let record = show_json(&dir, TODAY);
    assert_eq!(record["tasks"], serde_json::json!(["b", "c", "a"]));
    assert_eq!(record["selected"], serde_json::json!([2, 0, 1]));
}

#[test]
fn pick_reordering_keeps_annex_entries_on_their_tasks() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a", "b", "c"]);
    output_stdout(run_cmd(&dir, &["next"]));
    output_stdout(run_cmd(&dir, &["rank", "S"]));
    output_stdout(run_cmd(&dir, &["focus", "first-step", "3", "outline it"]));

    output_stdout(run_cmd(&dir, &["pick", "move", "3", "1"]));
    let record = show_json(&dir, TODAY);
    assert_eq!(record["selected"], serde_json::json!([2, 0, 1]));
    assert_eq!(record["firstStep"]["2"], "outline it");
}

#[test]
fn focus_requires_a_committed_plan() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a"]);
    let stdout = output_stdout(run_cmd(&dir, &["focus", "first-step", "1", "open the file"]));
    assert!(
        stdout.contains("not part of today's committed plan"),
        "stdout: {stdout}"
    );
}

#[test]
fn focus_edits_show_up_in_the_plan_view() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["write report"]);
    output_stdout(run_cmd(&dir, &["next"]));
    output_stdout(run_cmd(&dir, &["rank", "S++"]));

    output_stdout(run_cmd(&dir, &["focus", "open", "1"]));
    output_stdout(run_cmd(&dir, &["focus", "first-step", "1", "open the file"]));
    output_stdout(run_cmd(&dir, &["focus", "trick", "1", "cafe at ten"]));

    let stdout = output_stdout(run_cmd(&dir, &["show"]));
    assert!(stdout.contains("First step: open the file"), "stdout: {stdout}");
    assert!(stdout.contains("Trick: cafe at ten"), "stdout: {stdout}");
    assert!(stdout.contains("Goal: S++ rank"), "stdout: {stdout}");

    let record = show_json(&dir, TODAY);
    assert_eq!(record["expanded"]["0"], true);
    assert_eq!(record["firstStep"]["0"], "open the file");
    assert_eq!(record["trick"]["0"], "cafe at ten");
}

#[test]
fn restart_clears_the_plan_but_keeps_tasks() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a", "b"]);
    output_stdout(run_cmd(&dir, &["next"]));
    output_stdout(run_cmd(&dir, &["rank", "SS"]));
    output_stdout(run_cmd(&dir, &["focus", "first-step", "1", "start"]));

    let stdout = output_stdout(run_cmd(&dir, &["restart"]));
    assert!(stdout.contains("Back to editing"), "stdout: {stdout}");

    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 1);
    assert_eq!(record["tasks"], serde_json::json!(["a", "b", ""]));
    assert_eq!(record["selected"], serde_json::json!([]));
    assert_eq!(record["rank"], Value::Null);
    assert_eq!(record["firstStep"], serde_json::json!({}));
}

#[test]
fn saved_record_round_trips_across_invocations() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["write report", "call bank"]);
    output_stdout(run_cmd(&dir, &["next"]));
    output_stdout(run_cmd(&dir, &["rank", "S+"]));
    output_stdout(run_cmd(&dir, &["focus", "open", "2"]));
    output_stdout(run_cmd(&dir, &["focus", "trick", "2", "timer on"]));

    let first = output_stdout(run_cmd(&dir, &["show", "--json"]));
    let second = output_stdout(run_cmd(&dir, &["show", "--json"]));
    assert_eq!(first, second);

    let record: Value = serde_json::from_str(&first).expect("record json");
    assert_eq!(record["step"], 4);
    assert_eq!(record["tasks"], serde_json::json!(["write report", "call bank", ""]));
    assert_eq!(record["selected"], serde_json::json!([0, 1]));
    assert_eq!(record["rank"], "S+");
    assert_eq!(record["expanded"]["1"], true);
    assert_eq!(record["trick"]["1"], "timer on");
}

#[tokio::test]
async fn corrupt_today_record_falls_back_to_the_default() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a"]);
    assert_eq!(show_json(&dir, TODAY)["tasks"][0], "a");

    let db = connect_db(&dir).await;
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        format!("UPDATE records SET data = 'not valid json' WHERE date = '{TODAY}';"),
    ))
    .await
    .expect("corrupt record");
    drop(db);

    let record = show_json(&dir, TODAY);
    assert_eq!(record["step"], 1);
    assert_eq!(record["tasks"], serde_json::json!(["", "", ""]));
}

#[tokio::test]
async fn history_caps_at_fourteen_and_skips_corrupt_entries() {
    let dir = TempDir::new().expect("temp dir");
    for day in 1..=20 {
        let date = format!("2024-04-{day:02}");
        let task = format!("task for day {day}");
        output_stdout(run_on(&dir, &date, &["task", "update", "1", &task]));
        output_stdout(run_on(&dir, &date, &["next"]));
        output_stdout(run_on(&dir, &date, &["rank", "S"]));
    }
    seed_tasks(&dir, &["today's task"]);

    let db = connect_db(&dir).await;
    db.execute(Statement::from_string(
        DatabaseBackend::Sqlite,
        "UPDATE records SET data = '{broken' WHERE date = '2024-04-10';".to_string(),
    ))
    .await
    .expect("corrupt record");
    drop(db);

    let stdout = output_stdout(run_cmd(&dir, &["history"]));
    let day_lines: Vec<&str> = stdout
        .lines()
        .filter(|line| line.starts_with("04/"))
        .collect();
    assert_eq!(day_lines.len(), 14, "stdout: {stdout}");
    assert!(day_lines[0].starts_with("04/20"), "stdout: {stdout}");
    assert!(day_lines.last().expect("entries").starts_with("04/06"));
    assert!(!stdout.contains("04/10"), "stdout: {stdout}");
    assert!(!stdout.contains("04/05"), "stdout: {stdout}");
    assert!(!stdout.contains("today's task"), "stdout: {stdout}");
    assert!(stdout.contains("task for day 20"), "stdout: {stdout}");
}

#[test]
fn history_is_empty_on_a_fresh_home() {
    let dir = TempDir::new().expect("temp dir");
    let stdout = output_stdout(run_cmd(&dir, &["history"]));
    assert_eq!(stdout.trim(), "No history yet.");
}

#[test]
fn guard_refusals_exit_zero() {
    let dir = TempDir::new().expect("temp dir");
    let stdout = output_stdout(run_cmd(&dir, &["rank", "S"]));
    assert!(
        stdout.contains("Ranking happens after tasks are picked"),
        "stdout: {stdout}"
    );
    let stdout = output_stdout(run_cmd(&dir, &["back"]));
    assert!(stdout.contains("Already at the first step."), "stdout: {stdout}");
    let stdout = output_stdout(run_cmd(&dir, &["restart"]));
    assert!(stdout.contains("No committed plan to restart."), "stdout: {stdout}");
}

#[test]
fn zero_position_is_an_input_error() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_cmd(&dir, &["task", "remove", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("position starts at 1"), "stderr: {stderr}");
}

#[test]
fn malformed_date_flag_errors() {
    let dir = TempDir::new().expect("temp dir");
    let output = run_on(&dir, "2024-13-99", &["show"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--date expects YYYY-MM-DD"), "stderr: {stderr}");
}

#[test]
fn task_list_is_capped_at_seven() {
    let dir = TempDir::new().expect("temp dir");
    seed_tasks(&dir, &["a", "b", "c", "d", "e", "f", "g"]);
    let stdout = output_stdout(run_cmd(&dir, &["task", "add", "h"]));
    assert!(stdout.contains("nothing added"), "stdout: {stdout}");
    let record = show_json(&dir, TODAY);
    assert_eq!(record["tasks"].as_array().expect("tasks").len(), 7);
}
