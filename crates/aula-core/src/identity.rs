//! Identity resolution consumed by the workflow.
//!
//! Credential storage and login tracking live outside this crate; the
//! engine only needs to turn an account id into a display name and a staff
//! flag.

use std::collections::HashMap;

pub trait Directory: Send + Sync {
    /// Resolve an account id to its display name.
    fn display_name(&self, id: &str) -> Option<String>;

    /// Whether the account may approve, reject, or cancel other users'
    /// reservations.
    fn is_staff(&self, id: &str) -> bool;
}

/// Directory backed by a static name map, keeping the historical role
/// scheme: account ids starting with `P` (professor) or `A` (assistant)
/// are staff.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    names: HashMap<String, String>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, id: &str, name: &str) -> Self {
        self.names.insert(id.to_owned(), name.to_owned());
        self
    }

    pub fn insert(&mut self, id: &str, name: &str) {
        self.names.insert(id.to_owned(), name.to_owned());
    }
}

impl Directory for StaticDirectory {
    fn display_name(&self, id: &str) -> Option<String> {
        self.names.get(id).cloned()
    }

    fn is_staff(&self, id: &str) -> bool {
        matches!(id.chars().next(), Some('P' | 'A'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_by_id_prefix() {
        let dir = StaticDirectory::new();
        assert!(dir.is_staff("P1001"));
        assert!(dir.is_staff("A42"));
        assert!(!dir.is_staff("S20231234"));
        assert!(!dir.is_staff(""));
    }

    #[test]
    fn display_name_lookup() {
        let dir = StaticDirectory::new().with_name("S100", "alice");
        assert_eq!(dir.display_name("S100").as_deref(), Some("alice"));
        assert_eq!(dir.display_name("S999"), None);
    }
}
