//! Selected vehicle, tracked by id across refreshes.

use crate::fleet::TrackedEntity;

/// Which entity the user selected, if any.
///
/// Stores the id only; each refresh delivers new snapshots and the
/// selection is looked up again by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionState {
    selected_id: Option<String>,
}

impl SelectionState {
    pub fn selected_id(&self) -> Option<&str> {
        self.selected_id.as_deref()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected_id.as_deref() == Some(id)
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.selected_id = Some(id.into());
    }

    pub fn clear(&mut self) {
        self.selected_id = None;
    }

    /// Current snapshot of the selected entity.
    pub fn resolve<'a>(&self, entities: &'a [TrackedEntity]) -> Option<&'a TrackedEntity> {
        let id = self.selected_id.as_deref()?;
        entities.iter().find(|e| e.id == id)
    }

    /// Clears the selection when its id is missing from a new entity set.
    /// Returns true if the selection was dropped.
    pub fn reconcile(&mut self, entities: &[TrackedEntity]) -> bool {
        if self.selected_id.is_some() && self.resolve(entities).is_none() {
            log::debug!(
                "Selected entity {:?} left the fleet, clearing selection",
                self.selected_id
            );
            self.selected_id = None;
            return true;
        }
        false
    }
}
