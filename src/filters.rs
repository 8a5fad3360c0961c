//! Slot filters applied after parsing and before aggregation.

use crate::model::{Slot, TaskPath};
use crate::window::Window;

#[derive(Debug, Clone, Default)]
pub struct SlotFilter {
  pub window: Window,
  pub task: Option<TaskPath>,
}

impl SlotFilter {
  pub fn keeps(&self, slot: &Slot) -> bool {
    self.window.contains(slot.start) && self.task.as_ref().map_or(true, |prefix| slot.task.starts_with(prefix))
  }

  pub fn is_noop(&self) -> bool {
    self.window.is_unbounded() && self.task.is_none()
  }

  pub fn apply(&self, slots: Vec<Slot>) -> Vec<Slot> {
    if self.is_noop() {
      return slots;
    }
    slots.into_iter().filter(|s| self.keeps(s)).collect()
  }
}
