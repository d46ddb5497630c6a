//! Operation change detection

use std::collections::HashMap;

use arm_models::Operation;

/// Last seen state of every operation observed during one poll session.
///
/// Entries are never evicted; a session is bounded by the operation count of
/// a single deployment tree.
#[derive(Debug, Clone, Default)]
pub struct OperationSnapshot {
    seen: HashMap<String, Operation>,
}

impl OperationSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Operation> {
        self.seen.get(id)
    }

    /// Record a freshly fetched operation list and return the operations
    /// that are new or whose provisioning state or status code changed.
    ///
    /// The list is stably sorted by timestamp first so that changes come out
    /// in the order they happened.
    pub fn diff(&mut self, mut current: Vec<Operation>) -> Vec<Operation> {
        current.sort_by(|a, b| a.properties.timestamp.cmp(&b.properties.timestamp));

        let mut changed = Vec::new();
        for op in current {
            if self.has_changed(&op) {
                changed.push(op.clone());
            }
            self.seen.insert(op.id.clone(), op);
        }
        changed
    }

    fn has_changed(&self, op: &Operation) -> bool {
        match self.seen.get(&op.id) {
            None => true,
            Some(previous) => {
                previous.properties.provisioning_state != op.properties.provisioning_state
                    || previous.properties.status_code != op.properties.status_code
            }
        }
    }
}
