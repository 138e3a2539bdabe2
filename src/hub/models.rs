//! Wire shapes of the hub API, reduced to what group traversal needs.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::core::HubError;

/// One link in a resource's `_meta.links` list.
#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    /// Relation name, e.g. `children`
    pub rel: String,
    /// Absolute URL
    pub href: String,
}

/// The `_meta` block every hub resource carries.
#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    /// Self link of the resource
    pub href: String,
    /// Related resources
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Meta {
    /// The href of the first link with relation `rel`.
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links.iter().find(|l| l.rel == rel).map(|l| l.href.as_str())
    }
}

/// Identity of a hub resource: the last path segment of its self link.
///
/// Falls back to the whole link when it has no usable segment.
pub fn id_from_href(href: &str) -> String {
    href.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(href)
        .to_string()
}

#[derive(Deserialize)]
struct RawNode {
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "isProject", default)]
    is_project: Option<bool>,
    #[serde(rename = "_meta")]
    meta: Meta,
}

/// One entry of a group search or children listing.
///
/// Entries without an `isProject` flag are treated as project references.
/// Roots returned by the group search never carry the flag; the resolver
/// expands them as groups regardless.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawNode")]
pub struct GroupNode {
    /// Identity derived from the self link
    pub id: String,
    /// Display name, when the listing includes it
    pub name: Option<String>,
    /// Self link (`_meta.href`)
    pub self_link: String,
    /// Children listing of a group
    pub children_link: String,
    /// Whether this entry references a project rather than a sub-group
    pub is_project: bool,
}

impl From<RawNode> for GroupNode {
    fn from(raw: RawNode) -> Self {
        let self_link = raw.meta.href.trim_end_matches('/').to_string();
        let children_link = raw
            .meta
            .link("children")
            .map_or_else(|| format!("{self_link}/children"), str::to_string);

        Self {
            id: id_from_href(&self_link),
            name: raw.name,
            children_link,
            is_project: raw.is_project.unwrap_or(true),
            self_link,
        }
    }
}

/// The full detail document of one project.
///
/// Serializes as the unmodified document the hub returned.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDetail {
    /// Identity derived from the self link
    pub id: String,
    /// Project name, the key consumed by membership filtering
    pub name: String,
    /// Self link (`_meta.href`, or the URL it was fetched from)
    pub self_link: String,
    /// The complete document
    pub raw_attributes: Map<String, Value>,
}

impl ProjectDetail {
    /// Build a detail from the document fetched at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Parse`] if the document is not a JSON object or
    /// lacks a string `name`.
    pub fn from_document(url: &str, document: Value) -> Result<Self, HubError> {
        let Value::Object(raw_attributes) = document else {
            return Err(HubError::Parse {
                url: url.to_string(),
                message: "project document is not a JSON object".to_string(),
            });
        };

        let name = raw_attributes
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| HubError::Parse {
                url: url.to_string(),
                message: "project document has no name".to_string(),
            })?
            .to_string();

        let self_link = raw_attributes
            .get("_meta")
            .and_then(|m| m.get("href"))
            .and_then(Value::as_str)
            .unwrap_or(url)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            id: id_from_href(&self_link),
            name,
            self_link,
            raw_attributes,
        })
    }
}

impl Serialize for ProjectDetail {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw_attributes.serialize(serializer)
    }
}

/// One page of a `{totalCount, items}` listing.
///
/// `offset` and `limit` are not part of the body; the cursor fills them in
/// from the request that produced the page.
#[derive(Debug, Deserialize)]
pub struct Page<T> {
    /// Offset the page was requested at
    #[serde(skip)]
    pub offset: usize,
    /// Page size the page was requested with
    #[serde(skip)]
    pub limit: usize,
    /// Total number of items across all pages
    #[serde(rename = "totalCount", default)]
    pub total_count: usize,
    /// Items of this page
    #[serde(default = "Vec::new")]
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_id_from_href() {
        assert_eq!(id_from_href("https://hub/api/projects/abc-123"), "abc-123");
        assert_eq!(id_from_href("https://hub/api/projects/abc-123/"), "abc-123");
        assert_eq!(id_from_href("plain"), "plain");
    }

    #[test]
    fn test_group_node_defaults_children_link() {
        let node: GroupNode = serde_json::from_value(json!({
            "name": "Platform",
            "isProject": false,
            "_meta": { "href": "https://hub/api/project-groups/g1" }
        }))
        .unwrap();

        assert_eq!(node.id, "g1");
        assert!(!node.is_project);
        assert_eq!(node.children_link, "https://hub/api/project-groups/g1/children");
        assert_eq!(node.name.as_deref(), Some("Platform"));
    }

    #[test]
    fn test_group_node_prefers_children_relation() {
        let node: GroupNode = serde_json::from_value(json!({
            "isProject": false,
            "_meta": {
                "href": "https://hub/api/project-groups/g1",
                "links": [
                    { "rel": "parent", "href": "https://hub/api/project-groups/root" },
                    { "rel": "children", "href": "https://hub/api/project-groups/g1/members" }
                ]
            }
        }))
        .unwrap();

        assert_eq!(node.children_link, "https://hub/api/project-groups/g1/members");
    }

    #[test]
    fn test_missing_is_project_means_project() {
        let node: GroupNode =
            serde_json::from_value(json!({ "_meta": { "href": "https://hub/api/projects/p1" } }))
                .unwrap();
        assert!(node.is_project);
    }

    #[test]
    fn test_project_detail_from_document() {
        let doc = json!({
            "name": "billing-service",
            "description": "Payments",
            "_meta": { "href": "https://hub/api/projects/p-42" }
        });
        let detail =
            ProjectDetail::from_document("https://hub/api/projects/p-42", doc.clone()).unwrap();

        assert_eq!(detail.id, "p-42");
        assert_eq!(detail.name, "billing-service");
        assert_eq!(serde_json::to_value(&detail).unwrap(), doc);
    }

    #[test]
    fn test_project_detail_without_meta_uses_request_url() {
        let detail =
            ProjectDetail::from_document("https://hub/api/projects/p-7", json!({ "name": "x" }))
                .unwrap();
        assert_eq!(detail.id, "p-7");
        assert_eq!(detail.self_link, "https://hub/api/projects/p-7");
    }

    #[test]
    fn test_project_detail_requires_name() {
        let err = ProjectDetail::from_document("u", json!({ "description": "nameless" }))
            .unwrap_err();
        assert!(matches!(err, HubError::Parse { .. }));

        let err = ProjectDetail::from_document("u", json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, HubError::Parse { .. }));
    }

    #[test]
    fn test_page_defaults() {
        let page: Page<GroupNode> = serde_json::from_value(json!({})).unwrap();
        assert_eq!(page.total_count, 0);
        assert!(page.items.is_empty());
    }
}
