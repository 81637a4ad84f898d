//! Resuscitation and post-ROSC checklists.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub checked: bool,
}

impl ChecklistItem {
    fn new(id: &str, text: &str) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            checked: false,
        }
    }
}

/// Which of the two lists is on screen
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistMode {
    #[default]
    During,
    Post,
}

impl ChecklistMode {
    pub fn label(&self) -> &'static str {
        match self {
            ChecklistMode::During => "During resuscitation",
            ChecklistMode::Post => "Post-ROSC care",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Checklist {
    pub during: Vec<ChecklistItem>,
    pub post: Vec<ChecklistItem>,
    pub mode: ChecklistMode,
}

impl Default for Checklist {
    fn default() -> Self {
        Self::new()
    }
}

impl Checklist {
    pub fn new() -> Self {
        Self {
            during: vec![
                ChecklistItem::new("d1", "Assign a team leader"),
                ChecklistItem::new("d2", "Attach the monitor and defibrillation pads"),
                ChecklistItem::new("d3", "Establish IV or IO access"),
                ChecklistItem::new("d4", "Prepare epinephrine and confirm the dose"),
                ChecklistItem::new("d5", "Assess reversible causes (H's & T's)"),
                ChecklistItem::new("d6", "Confirm CPR quality: depth, rate, full recoil"),
                ChecklistItem::new("d7", "With an advanced airway: confirm the ETCO2 waveform"),
            ],
            post: vec![
                ChecklistItem::new("p1", "Breathing: SpO2 94%-99%, PaCO2 35-45 mmHg"),
                ChecklistItem::new("p2", "Circulation: keep systolic/diastolic pressure on target"),
                ChecklistItem::new("p3", "Neuro: assess consciousness, avoid fever (>37.5 °C)"),
                ChecklistItem::new("p4", "Metabolic: monitor glucose and electrolytes"),
                ChecklistItem::new("p5", "Imaging: 12-lead ECG and chest X-ray"),
                ChecklistItem::new("p6", "Transfer: contact PICU for ongoing TTM"),
            ],
            mode: ChecklistMode::During,
        }
    }

    /// Flip the item with this id; returns its new state, `None` if unknown
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let item = self
            .during
            .iter_mut()
            .chain(self.post.iter_mut())
            .find(|item| item.id == id);

        match item {
            Some(item) => {
                item.checked = !item.checked;
                Some(item.checked)
            }
            None => {
                tracing::debug!("Ignoring unknown checklist item '{}'", id);
                None
            }
        }
    }

    /// Uncheck every item in both lists
    pub fn reset(&mut self) {
        for item in self.during.iter_mut().chain(self.post.iter_mut()) {
            item.checked = false;
        }
    }

    pub fn set_mode(&mut self, mode: ChecklistMode) {
        self.mode = mode;
    }

    pub fn items(&self, mode: ChecklistMode) -> &[ChecklistItem] {
        match mode {
            ChecklistMode::During => &self.during,
            ChecklistMode::Post => &self.post,
        }
    }

    pub fn active_items(&self) -> &[ChecklistItem] {
        self.items(self.mode)
    }

    /// `(checked, total)` for one list
    pub fn progress(&self, mode: ChecklistMode) -> (usize, usize) {
        let items = self.items(mode);
        (items.iter().filter(|i| i.checked).count(), items.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_ids(checklist: &Checklist) -> Vec<&str> {
        checklist
            .during
            .iter()
            .chain(checklist.post.iter())
            .filter(|i| i.checked)
            .map(|i| i.id.as_str())
            .collect()
    }

    #[test]
    fn test_initial_lists() {
        let checklist = Checklist::new();
        assert_eq!(checklist.progress(ChecklistMode::During), (0, 7));
        assert_eq!(checklist.progress(ChecklistMode::Post), (0, 6));
        assert_eq!(checklist.mode, ChecklistMode::During);
    }

    #[test]
    fn test_toggle_twice_restores() {
        let mut checklist = Checklist::new();
        assert_eq!(checklist.toggle("d3"), Some(true));
        assert_eq!(checked_ids(&checklist), vec!["d3"]);
        assert_eq!(checklist.toggle("d3"), Some(false));
        assert!(checked_ids(&checklist).is_empty());
    }

    #[test]
    fn test_toggle_touches_only_target() {
        let mut checklist = Checklist::new();
        checklist.toggle("d1");
        checklist.toggle("p4");
        assert_eq!(checked_ids(&checklist), vec!["d1", "p4"]);
        assert_eq!(checklist.progress(ChecklistMode::During), (1, 7));
        assert_eq!(checklist.progress(ChecklistMode::Post), (1, 6));
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut checklist = Checklist::new();
        let before = checklist.clone();
        assert_eq!(checklist.toggle("x9"), None);
        assert_eq!(checklist, before);
    }

    #[test]
    fn test_reset_clears_both_lists() {
        let mut checklist = Checklist::new();
        for id in ["d1", "d5", "d7", "p1", "p6"] {
            checklist.toggle(id);
        }
        checklist.set_mode(ChecklistMode::Post);
        checklist.reset();
        assert!(checked_ids(&checklist).is_empty());
        assert_eq!(checklist.mode, ChecklistMode::Post);
    }

    #[test]
    fn test_active_items_follow_mode() {
        let mut checklist = Checklist::new();
        assert_eq!(checklist.active_items()[0].id, "d1");
        checklist.set_mode(ChecklistMode::Post);
        assert_eq!(checklist.active_items()[0].id, "p1");
    }
}
