use chrono::NaiveDate;

use crate::app::HistoryEntry;
use crate::model::{PlanRecord, Rank, Step, MAX_PICKS};

pub fn format_date_heading(date: NaiveDate) -> String {
    date.format("%Y-%m-%d (%a)").to_string()
}

pub fn format_task_list(record: &PlanRecord) -> String {
    let mut output = String::new();
    output.push_str("Tasks:\n");
    for (index, text) in record.tasks.iter().enumerate() {
        let marker = if record.selected.contains(&index) {
            "x"
        } else {
            " "
        };
        if text.trim().is_empty() {
            output.push_str(&format!("{}. [{marker}] (empty)\n", index + 1));
        } else {
            output.push_str(&format!("{}. [{marker}] {text}\n", index + 1));
        }
    }
    output
}

pub fn format_record(date: NaiveDate, record: &PlanRecord) -> String {
    let mut output = String::new();
    output.push_str(&format!("Date: {}\n", format_date_heading(date)));
    output.push_str(&format!(
        "Step: {} ({})\n",
        record.step.as_str(),
        record.step.number()
    ));
    output.push('\n');
    output.push_str(&format_task_list(record));
    output.push('\n');
    match record.step {
        Step::Edit => {
            output.push_str(&format!(
                "Filled: {}/{}\n",
                record.count_filled(),
                record.tasks.len()
            ));
        }
        Step::Select => {
            output.push_str(&format!(
                "Picked: {}/{}\n",
                record.selected.len(),
                MAX_PICKS
            ));
        }
        Step::Rank => {
            let ranks: Vec<&str> = Rank::ALL.iter().map(|rank| rank.as_str()).collect();
            output.push_str(&format!("Choose a rank: {}\n", ranks.join(", ")));
        }
        Step::Plan => {
            output.push_str(&format_plan(record));
        }
    }
    output.trim_end().to_string()
}

fn format_plan(record: &PlanRecord) -> String {
    let mut output = String::new();
    output.push_str("Today's plan:\n");
    for (position, &index) in record.selected.iter().enumerate() {
        let text = record.tasks.get(index).map(String::as_str).unwrap_or("");
        output.push_str(&format!("{}. {}\n", position + 1, text));
        let open = record.expanded.get(&index).copied().unwrap_or(false);
        let first_step = record.first_step.get(&index);
        let trick = record.trick.get(&index);
        if open || first_step.is_some() || trick.is_some() {
            output.push_str(&format!(
                "   First step: {}\n",
                first_step.map(String::as_str).unwrap_or("(none)")
            ));
            output.push_str(&format!(
                "   Trick: {}\n",
                trick.map(String::as_str).unwrap_or("(none)")
            ));
        }
    }
    if let Some(rank) = record.rank {
        output.push_str(&format!("Goal: {} rank\n", rank.as_str()));
    }
    output
}

pub fn format_history(entries: &[HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No history yet.".to_string();
    }
    let mut output = String::new();
    output.push_str("History:\n");
    for entry in entries {
        let rank = entry
            .record
            .rank
            .map(|rank| rank.as_str())
            .unwrap_or("-");
        output.push_str(&format!("{}  [{}]\n", short_date(&entry.date), rank));
        for &index in &entry.record.selected {
            if let Some(text) = entry.record.tasks.get(index) {
                output.push_str(&format!("  - {text}\n"));
            }
        }
    }
    output.trim_end().to_string()
}

fn short_date(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() == 3 {
        format!("{}/{}", parts[1], parts[2])
    } else {
        date.to_string()
    }
}
