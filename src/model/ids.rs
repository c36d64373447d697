//! Unique id generation for new groups and duplicated layers

use uuid::Uuid;

use super::layer::{GroupId, LayerId};

/// Source of ids unique across the document's lifetime
pub trait IdGenerator {
    fn next_id(&mut self) -> String;

    fn next_layer_id(&mut self) -> LayerId {
        LayerId(self.next_id())
    }

    fn next_group_id(&mut self) -> GroupId {
        GroupId(self.next_id())
    }
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic `prefix-N` ids, counting from 1
#[derive(Debug, Clone)]
pub struct SequentialIds {
    prefix: String,
    next: u64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl Default for SequentialIds {
    fn default() -> Self {
        Self::new("id")
    }
}

impl IdGenerator for SequentialIds {
    fn next_id(&mut self) -> String {
        let id = format!("{}-{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let mut ids = SequentialIds::new("copy");
        assert_eq!(ids.next_id(), "copy-1");
        assert_eq!(ids.next_layer_id(), LayerId::from("copy-2"));
        assert_eq!(ids.next_group_id(), GroupId::from("copy-3"));
    }

    #[test]
    fn test_random_ids_are_distinct() {
        let mut ids = RandomIds;
        assert_ne!(ids.next_id(), ids.next_id());
    }
}
