//! De-duplicated collection of resolved projects.

use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::collections::{BTreeSet, HashSet};

use crate::hub::ProjectDetail;

/// Projects resolved under a group, unique by id, in discovery order.
///
/// The count is always the number of items; there is no way to build a set
/// whose declared total disagrees with its contents. Serializes as
/// `{"totalCount": n, "items": [...]}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectSet {
    items: Vec<ProjectDetail>,
    ids: HashSet<String>,
}

impl ProjectSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `project` unless a project with the same id is already present.
    ///
    /// Returns whether the project was added.
    pub fn insert(&mut self, project: ProjectDetail) -> bool {
        if !self.ids.insert(project.id.clone()) {
            return false;
        }
        self.items.push(project);
        true
    }

    /// Whether a project with `id` is present.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of projects.
    pub fn total_count(&self) -> usize {
        self.items.len()
    }

    /// Alias of [`ProjectSet::total_count`].
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ProjectDetail] {
        &self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ProjectDetail> {
        self.items.iter()
    }

    /// Distinct project names, sorted.
    pub fn names(&self) -> BTreeSet<String> {
        self.items.iter().map(|p| p.name.clone()).collect()
    }

    pub fn into_items(self) -> Vec<ProjectDetail> {
        self.items
    }
}

impl FromIterator<ProjectDetail> for ProjectSet {
    fn from_iter<I: IntoIterator<Item = ProjectDetail>>(iter: I) -> Self {
        let mut set = Self::new();
        for project in iter {
            set.insert(project);
        }
        set
    }
}

impl<'a> IntoIterator for &'a ProjectSet {
    type Item = &'a ProjectDetail;
    type IntoIter = std::slice::Iter<'a, ProjectDetail>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl Serialize for ProjectSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ProjectSet", 2)?;
        state.serialize_field("totalCount", &self.total_count())?;
        state.serialize_field("items", &self.items)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{project_doc, project_url};

    fn detail(id: &str, name: &str) -> ProjectDetail {
        ProjectDetail::from_document(&project_url(id), project_doc(id, name)).unwrap()
    }

    #[test]
    fn test_insert_dedups_by_id() {
        let mut set = ProjectSet::new();
        assert!(set.insert(detail("p1", "billing")));
        assert!(set.insert(detail("p2", "ledger")));
        assert!(!set.insert(detail("p1", "billing-renamed")));

        assert_eq!(set.total_count(), 2);
        assert_eq!(set.items()[0].name, "billing");
        assert!(set.contains("p2"));
        assert!(!set.contains("p3"));
    }

    #[test]
    fn test_names_collapse_duplicates() {
        let set: ProjectSet = [detail("p1", "shared"), detail("p2", "shared"), detail("p3", "api")]
            .into_iter()
            .collect();
        assert_eq!(set.total_count(), 3);
        assert_eq!(set.names().into_iter().collect::<Vec<_>>(), vec!["api", "shared"]);
    }

    #[test]
    fn test_serializes_with_total_count() {
        let set: ProjectSet = [detail("p1", "billing")].into_iter().collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["items"][0]["name"], "billing");
        assert_eq!(json["items"][0]["_meta"]["href"], project_url("p1"));

        let empty = serde_json::to_value(ProjectSet::new()).unwrap();
        assert_eq!(empty, serde_json::json!({ "totalCount": 0, "items": [] }));
    }
}
