use std::collections::BTreeSet;

/// Ids of expanded pages, independent of where those pages sit in the tree.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct ExpansionState {
    ids: BTreeSet<String>,
}

impl ExpansionState {
    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: ids.into_iter().filter(|id| !id.trim().is_empty()).collect(),
        }
    }

    /// Returns the new membership of `id`.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.ids.remove(id) {
            false
        } else {
            self.ids.insert(id.to_string());
            true
        }
    }

    pub fn expand(&mut self, id: &str) {
        self.ids.insert(id.to_string());
    }

    pub fn collapse(&mut self, id: &str) {
        self.ids.remove(id);
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn ids(&self) -> Vec<String> {
        self.ids.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_twice_restores_membership() {
        let mut s = ExpansionState::from_ids(["a".to_string(), "b".to_string()]);
        let before = s.clone();

        assert!(!s.toggle("a"));
        assert!(s.toggle("a"));
        assert_eq!(s, before);

        assert!(s.toggle("x"));
        assert!(!s.toggle("x"));
        assert_eq!(s, before);
    }

    #[test]
    fn test_stale_ids_are_harmless() {
        let mut s = ExpansionState::default();
        s.expand("gone");
        assert!(s.is_expanded("gone"));
        assert!(!s.is_expanded("never-seen"));
        s.collapse("never-seen");
        assert_eq!(s.ids(), vec!["gone".to_string()]);
    }

    #[test]
    fn test_from_ids_drops_blank_entries() {
        let s = ExpansionState::from_ids(["".to_string(), "  ".to_string(), "p1".to_string()]);
        assert_eq!(s.ids(), vec!["p1".to_string()]);
    }
}
