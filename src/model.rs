use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const MAX_TASKS: usize = 7;
pub const MAX_PICKS: usize = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Step {
    Edit,
    Select,
    Rank,
    Plan,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Edit => "edit",
            Self::Select => "select",
            Self::Rank => "rank",
            Self::Plan => "plan",
        }
    }

    pub fn number(&self) -> u8 {
        u8::from(*self)
    }
}

impl Default for Step {
    fn default() -> Self {
        Self::Edit
    }
}

impl From<Step> for u8 {
    fn from(value: Step) -> Self {
        match value {
            Step::Edit => 1,
            Step::Select => 2,
            Step::Rank => 3,
            Step::Plan => 4,
        }
    }
}

impl TryFrom<u8> for Step {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Edit),
            2 => Ok(Self::Select),
            3 => Ok(Self::Rank),
            4 => Ok(Self::Plan),
            other => Err(format!("invalid step number {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Rank {
    #[serde(rename = "SS")]
    Ss,
    #[serde(rename = "S++")]
    SPlusPlus,
    #[serde(rename = "S+")]
    SPlus,
    #[serde(rename = "S")]
    S,
}

impl Rank {
    pub const ALL: [Rank; 4] = [Rank::Ss, Rank::SPlusPlus, Rank::SPlus, Rank::S];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ss => "SS",
            Self::SPlusPlus => "S++",
            Self::SPlus => "S+",
            Self::S => "S",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanRecord {
    #[serde(default)]
    pub step: Step,
    #[serde(default = "default_tasks")]
    pub tasks: Vec<String>,
    #[serde(default)]
    pub selected: Vec<usize>,
    #[serde(default)]
    pub rank: Option<Rank>,
    #[serde(default)]
    pub expanded: BTreeMap<usize, bool>,
    #[serde(default, rename = "firstStep")]
    pub first_step: BTreeMap<usize, String>,
    #[serde(default)]
    pub trick: BTreeMap<usize, String>,
}

impl Default for PlanRecord {
    fn default() -> Self {
        Self {
            step: Step::Edit,
            tasks: default_tasks(),
            selected: Vec::new(),
            rank: None,
            expanded: BTreeMap::new(),
            first_step: BTreeMap::new(),
            trick: BTreeMap::new(),
        }
    }
}

fn default_tasks() -> Vec<String> {
    vec![String::new(); 3]
}

// Splice semantics: the element leaves `from` and re-enters at `to`, so
// every index between them shifts by one toward the vacated slot.
fn splice_remap(k: usize, from: usize, to: usize) -> usize {
    if k == from {
        to
    } else if from < to && k > from && k <= to {
        k - 1
    } else if from > to && k >= to && k < from {
        k + 1
    } else {
        k
    }
}

fn shift_for_removal(k: usize, removed: usize) -> Option<usize> {
    match k.cmp(&removed) {
        Ordering::Less => Some(k),
        Ordering::Equal => None,
        Ordering::Greater => Some(k - 1),
    }
}

fn set_annex_text(map: &mut BTreeMap<usize, String>, index: usize, text: &str) -> bool {
    if text.trim().is_empty() {
        map.remove(&index).is_some()
    } else {
        map.insert(index, text.to_string());
        true
    }
}

impl PlanRecord {
    pub fn filled_indices(&self) -> Vec<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, text)| !text.trim().is_empty())
            .map(|(index, _)| index)
            .collect()
    }

    pub fn count_filled(&self) -> usize {
        self.filled_indices().len()
    }

    pub fn add_task(&mut self, text: &str) -> bool {
        if self.step != Step::Edit || self.tasks.len() >= MAX_TASKS {
            return false;
        }
        self.tasks.push(text.to_string());
        true
    }

    pub fn remove_task(&mut self, index: usize) -> bool {
        if self.step != Step::Edit || self.tasks.len() <= 1 || index >= self.tasks.len() {
            return false;
        }
        self.tasks.remove(index);
        self.remap_references(|k| shift_for_removal(k, index));
        true
    }

    pub fn update_task(&mut self, index: usize, text: &str) -> bool {
        if !matches!(self.step, Step::Edit | Step::Select) || index >= self.tasks.len() {
            return false;
        }
        self.tasks[index] = text.to_string();
        if text.trim().is_empty() {
            // A blanked task no longer counts as filled and may not stay picked.
            self.selected.retain(|&k| k != index);
        }
        true
    }

    pub fn move_task(&mut self, from: usize, to: usize) -> bool {
        if self.step != Step::Edit
            || from >= self.tasks.len()
            || to >= self.tasks.len()
            || from == to
        {
            return false;
        }
        let task = self.tasks.remove(from);
        self.tasks.insert(to, task);
        self.remap_references(|k| Some(splice_remap(k, from, to)));
        true
    }

    pub fn toggle_pick(&mut self, index: usize) -> bool {
        if self.step != Step::Select {
            return false;
        }
        if let Some(position) = self.selected.iter().position(|&k| k == index) {
            self.selected.remove(position);
            return true;
        }
        if self.selected.len() >= MAX_PICKS
            || index >= self.tasks.len()
            || self.tasks[index].trim().is_empty()
        {
            return false;
        }
        self.selected.push(index);
        true
    }

    pub fn move_pick(&mut self, from: usize, to: usize) -> bool {
        if self.step != Step::Plan
            || from >= self.selected.len()
            || to >= self.selected.len()
            || from == to
        {
            return false;
        }
        // Positions inside the selection move; the task indices it holds do
        // not, so the annex maps stay valid untouched.
        let pick = self.selected.remove(from);
        self.selected.insert(to, pick);
        true
    }

    pub fn advance(&mut self) -> bool {
        match self.step {
            Step::Edit => {
                let filled = self.filled_indices();
                if filled.is_empty() {
                    return false;
                }
                if filled.len() <= MAX_PICKS {
                    self.selected = filled;
                    self.step = Step::Rank;
                } else {
                    self.selected.clear();
                    self.step = Step::Select;
                }
                true
            }
            Step::Select => {
                if self.selected.is_empty() {
                    return false;
                }
                self.step = Step::Rank;
                true
            }
            Step::Rank | Step::Plan => false,
        }
    }

    pub fn go_back(&mut self) -> bool {
        match self.step {
            Step::Select => {
                self.selected.clear();
                self.step = Step::Edit;
                true
            }
            Step::Rank => {
                self.step = if self.count_filled() <= MAX_PICKS {
                    Step::Edit
                } else {
                    Step::Select
                };
                true
            }
            Step::Edit | Step::Plan => false,
        }
    }

    pub fn choose_rank(&mut self, rank: Rank) -> bool {
        match self.step {
            Step::Rank => {
                self.rank = Some(rank);
                self.step = Step::Plan;
                true
            }
            Step::Plan => {
                self.rank = Some(rank);
                true
            }
            Step::Edit | Step::Select => false,
        }
    }

    pub fn restart(&mut self) -> bool {
        if self.step != Step::Plan {
            return false;
        }
        self.step = Step::Edit;
        self.selected.clear();
        self.rank = None;
        self.expanded.clear();
        self.first_step.clear();
        self.trick.clear();
        true
    }

    pub fn set_expanded(&mut self, index: usize, open: bool) -> bool {
        if !self.annex_target(index) {
            return false;
        }
        if open {
            self.expanded.insert(index, true) != Some(true)
        } else {
            self.expanded.remove(&index).is_some()
        }
    }

    pub fn set_first_step(&mut self, index: usize, text: &str) -> bool {
        if !self.annex_target(index) {
            return false;
        }
        set_annex_text(&mut self.first_step, index, text)
    }

    pub fn set_trick(&mut self, index: usize, text: &str) -> bool {
        if !self.annex_target(index) {
            return false;
        }
        set_annex_text(&mut self.trick, index, text)
    }

    fn annex_target(&self, index: usize) -> bool {
        self.step == Step::Plan && self.selected.contains(&index)
    }

    fn remap_references(&mut self, remap: impl Fn(usize) -> Option<usize>) {
        self.selected = self.selected.iter().filter_map(|&k| remap(k)).collect();
        self.expanded = std::mem::take(&mut self.expanded)
            .into_iter()
            .filter_map(|(k, v)| remap(k).map(|k| (k, v)))
            .collect();
        self.first_step = std::mem::take(&mut self.first_step)
            .into_iter()
            .filter_map(|(k, v)| remap(k).map(|k| (k, v)))
            .collect();
        self.trick = std::mem::take(&mut self.trick)
            .into_iter()
            .filter_map(|(k, v)| remap(k).map(|k| (k, v)))
            .collect();
    }
}
