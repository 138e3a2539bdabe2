//! Project group resolution.
//!
//! Expands a named project group into the de-duplicated set of every project
//! beneath it, however deeply the groups are nested.
//!
//! # Algorithm
//!
//! 1. **Group search**: `GET {base}/api/project-groups?q=name:<group>`, paginated.
//!    The server matches by substring, so only entries whose name equals the
//!    query exactly are kept. No match yields an empty [`ProjectSet`], not an
//!    error.
//! 2. **Depth-first walk**: every matched root is expanded in pre-order using
//!    an explicit work stack. A group's children are fetched through
//!    [`PageCursor`]; sub-groups are pushed back on the stack and project
//!    references have their detail document fetched.
//! 3. **Guards**: a group id is expanded at most once, which also breaks
//!    cycles, and groups deeper than [`ResolveOptions::max_depth`] are
//!    reported as failed subtrees unless another path reaches them within
//!    the limit. A project id already fetched is not
//!    fetched again.
//!
//! # Failure handling
//!
//! Failures of a children listing skip that subtree; failures of a detail
//! document skip that project. With [`ErrorPolicy::Lenient`] both are logged,
//! recorded as [`TraversalFailure`]s and the walk continues, producing
//! [`Resolution::Partial`]. With [`ErrorPolicy::Strict`] the first one aborts
//! with [`HubError::Traversal`]. Authentication failures and cancellation
//! always abort.
//!
//! # Example
//!
//! ```rust,no_run
//! use bdmetrics::config::HubConfig;
//! use bdmetrics::resolver::resolve_group;
//!
//! # async fn example(config: HubConfig) -> Result<(), bdmetrics::core::HubError> {
//! let report = resolve_group(&config, "Platform", None).await?;
//! for project in report.projects() {
//!     println!("{}", project.name);
//! }
//! println!("{}", report.summary);
//! # Ok(())
//! # }
//! ```

use serde::{Deserialize, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::future::Future;
use tracing::{debug, info, warn};

use crate::config::HubConfig;
use crate::constants::{DEFAULT_MAX_DEPTH, MAX_PAGE_SIZE, PROJECT_GROUPS_PATH};
use crate::core::HubError;
use crate::hub::{GroupNode, HubTransport, PageCursor, ProjectDetail, Session};

mod cancel;
mod project_set;

pub use cancel::CancelToken;
pub use project_set::ProjectSet;

/// What the walk does when a subtree or project fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Record the failure, skip the affected subtree or project, continue.
    #[default]
    Lenient,
    /// Abort on the first failure.
    Strict,
}

/// Tuning for a [`HierarchyResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Items per listing page, clamped to `1..=1000`
    pub page_size: usize,
    /// Deepest group level expanded; the matched group is level 0
    pub max_depth: usize,
    /// Failure handling
    pub policy: ErrorPolicy,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            page_size: MAX_PAGE_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            policy: ErrorPolicy::Lenient,
        }
    }
}

/// Whether a failure cost a whole subtree or a single project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// A group's children could not be listed
    Subtree,
    /// A project's detail document could not be loaded
    Project,
}

/// A part of the tree that was skipped under [`ErrorPolicy::Lenient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraversalFailure {
    pub kind: FailureKind,
    /// Self link of the group or project
    pub link: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: HubError,
}

fn serialize_display<S: Serializer>(error: &HubError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

/// Counters describing one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveSummary {
    /// Groups whose name matched the query exactly
    pub groups_matched: usize,
    /// Groups whose children were listed successfully
    pub groups_visited: usize,
    /// Projects in the resulting set
    pub projects_resolved: usize,
    /// Groups whose children could not be listed
    pub subtrees_skipped: usize,
    /// Project references whose detail could not be loaded
    pub projects_skipped: usize,
    /// Project references already resolved through another group
    pub duplicates_ignored: usize,
    /// Distinct projects sharing a display name with an earlier one
    pub name_collisions: usize,
}

impl fmt::Display for ResolveSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} project(s) from {} group(s) ({} matched, {} duplicate reference(s) ignored",
            self.projects_resolved, self.groups_visited, self.groups_matched, self.duplicates_ignored
        )?;
        if self.subtrees_skipped > 0 || self.projects_skipped > 0 {
            write!(
                f,
                ", {} subtree(s) and {} project(s) skipped",
                self.subtrees_skipped, self.projects_skipped
            )?;
        }
        if self.name_collisions > 0 {
            write!(f, ", {} name collision(s)", self.name_collisions)?;
        }
        f.write_str(")")
    }
}

/// Outcome of a resolution that was not aborted.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Every reachable group and project loaded.
    Complete(ProjectSet),
    /// Some subtrees or projects were skipped.
    Partial {
        projects: ProjectSet,
        failures: Vec<TraversalFailure>,
    },
}

/// Result of [`HierarchyResolver::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResolveReport {
    /// The group name that was resolved
    pub group: String,
    pub resolution: Resolution,
    pub summary: ResolveSummary,
}

impl ResolveReport {
    /// Resolved projects, whether or not the walk was complete.
    pub fn projects(&self) -> &ProjectSet {
        match &self.resolution {
            Resolution::Complete(projects)
            | Resolution::Partial {
                projects,
                ..
            } => projects,
        }
    }

    /// Skipped parts of the tree; empty for a complete resolution.
    pub fn failures(&self) -> &[TraversalFailure] {
        match &self.resolution {
            Resolution::Complete(_) => &[],
            Resolution::Partial {
                failures,
                ..
            } => failures,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self.resolution, Resolution::Complete(_))
    }

    /// Whether any group matched the requested name.
    pub fn group_found(&self) -> bool {
        self.summary.groups_matched > 0
    }

    pub fn into_projects(self) -> ProjectSet {
        match self.resolution {
            Resolution::Complete(projects)
            | Resolution::Partial {
                projects,
                ..
            } => projects,
        }
    }
}

/// Work item of the depth-first walk.
enum Pending {
    Group {
        node: GroupNode,
        depth: usize,
    },
    Project(GroupNode),
}

/// Mutable state of one walk.
#[derive(Default)]
struct Walk {
    projects: ProjectSet,
    failures: Vec<TraversalFailure>,
    summary: ResolveSummary,
    visited_groups: HashSet<String>,
    /// Groups so far only reached below the depth limit
    too_deep: HashSet<String>,
    seen_projects: HashSet<String>,
    names: HashMap<String, String>,
}

/// Walks a project group tree through a [`HubTransport`].
///
/// Requests are issued one at a time; sibling subtrees are not fetched
/// concurrently.
pub struct HierarchyResolver<'a, T> {
    transport: &'a T,
    options: ResolveOptions,
    cancel: Option<CancelToken>,
}

impl<'a, T: HubTransport> HierarchyResolver<'a, T> {
    pub fn new(transport: &'a T, options: ResolveOptions) -> Self {
        Self {
            transport,
            options,
            cancel: None,
        }
    }

    /// Stop at the next request once `token` is cancelled.
    #[must_use]
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Resolve every project beneath the groups named exactly `group_name`.
    ///
    /// # Errors
    ///
    /// - the group search failing, with its own error
    /// - [`HubError::Auth`] or [`HubError::Cancelled`] at any point
    /// - [`HubError::Traversal`] for the first skipped subtree or project
    ///   under [`ErrorPolicy::Strict`]
    pub async fn resolve(&self, group_name: &str) -> Result<ResolveReport, HubError> {
        let cursor = PageCursor::new(self.transport, self.options.page_size);
        let search_url = format!("{}{}", self.transport.base_url(), PROJECT_GROUPS_PATH);
        let query = [("q", format!("name:{group_name}"))];

        let candidates: Vec<GroupNode> =
            self.guarded(cursor.fetch_all(&search_url, &query)).await?;
        let roots: Vec<GroupNode> = candidates
            .into_iter()
            .filter(|node| node.name.as_deref() == Some(group_name))
            .collect();

        let mut walk = Walk::default();
        walk.summary.groups_matched = roots.len();
        if roots.is_empty() {
            info!("No project group named '{}'", group_name);
        } else {
            info!("Resolving {} group(s) named '{}'", roots.len(), group_name);
        }

        let mut stack: Vec<Pending> = roots
            .into_iter()
            .rev()
            .map(|node| Pending::Group {
                node,
                depth: 0,
            })
            .collect();

        while let Some(pending) = stack.pop() {
            match pending {
                Pending::Group {
                    node,
                    depth,
                } => self.expand_group(&cursor, node, depth, &mut walk, &mut stack).await?,
                Pending::Project(node) => self.load_project(node, &mut walk).await?,
            }
        }

        walk.summary.projects_resolved = walk.projects.total_count();
        info!("Resolved '{}': {}", group_name, walk.summary);

        let resolution = if walk.failures.is_empty() {
            Resolution::Complete(walk.projects)
        } else {
            Resolution::Partial {
                projects: walk.projects,
                failures: walk.failures,
            }
        };

        Ok(ResolveReport {
            group: group_name.to_string(),
            resolution,
            summary: walk.summary,
        })
    }

    async fn expand_group(
        &self,
        cursor: &PageCursor<'_, T>,
        node: GroupNode,
        depth: usize,
        walk: &mut Walk,
        stack: &mut Vec<Pending>,
    ) -> Result<(), HubError> {
        if walk.visited_groups.contains(&node.id) {
            debug!("Group {} already expanded, skipping", node.self_link);
            return Ok(());
        }

        // Not marked visited: the same group may still be reached on a shorter path
        if depth > self.options.max_depth {
            if !walk.too_deep.insert(node.id.clone()) {
                return Ok(());
            }
            let error = HubError::DepthExceeded {
                link: node.self_link.clone(),
                max_depth: self.options.max_depth,
            };
            return self.record_failure(FailureKind::Subtree, &node.self_link, error, walk);
        }

        walk.visited_groups.insert(node.id.clone());
        if walk.too_deep.remove(&node.id) {
            let before = walk.failures.len();
            walk.failures.retain(|failure| {
                !(failure.link == node.self_link
                    && matches!(failure.error, HubError::DepthExceeded { .. }))
            });
            let cleared = before - walk.failures.len();
            walk.summary.subtrees_skipped = walk.summary.subtrees_skipped.saturating_sub(cleared);
            debug!("Group {} is within the depth limit on another path", node.self_link);
        }

        let children: Vec<GroupNode> =
            match self.guarded(cursor.fetch_all(&node.children_link, &[])).await {
                Ok(children) => children,
                Err(error) => {
                    return self.record_failure(FailureKind::Subtree, &node.self_link, error, walk);
                }
            };

        walk.summary.groups_visited += 1;
        debug!(
            "Group {} (depth {}) has {} children",
            node.name.as_deref().unwrap_or(&node.id),
            depth,
            children.len()
        );

        // Reverse so the first child is popped first
        stack.extend(children.into_iter().rev().map(|child| {
            if child.is_project {
                Pending::Project(child)
            } else {
                Pending::Group {
                    node: child,
                    depth: depth + 1,
                }
            }
        }));
        Ok(())
    }

    async fn load_project(&self, node: GroupNode, walk: &mut Walk) -> Result<(), HubError> {
        if !walk.seen_projects.insert(node.id.clone()) {
            walk.summary.duplicates_ignored += 1;
            debug!("Project {} already resolved", node.self_link);
            return Ok(());
        }

        let detail = match self.guarded(self.transport.get_json(&node.self_link, &[])).await {
            Ok(document) => ProjectDetail::from_document(&node.self_link, document),
            Err(error) => Err(error),
        };
        let detail = match detail {
            Ok(detail) => detail,
            Err(error) => {
                return self.record_failure(FailureKind::Project, &node.self_link, error, walk);
            }
        };

        if let Some(other) = walk.names.get(&detail.name) {
            if *other != detail.id {
                walk.summary.name_collisions += 1;
                warn!(
                    "Projects {} and {} are both named '{}'; name-based filtering cannot tell them apart",
                    other, detail.id, detail.name
                );
            }
        } else {
            walk.names.insert(detail.name.clone(), detail.id.clone());
        }

        if !walk.projects.insert(detail) {
            walk.summary.duplicates_ignored += 1;
        }
        Ok(())
    }

    fn record_failure(
        &self,
        kind: FailureKind,
        link: &str,
        error: HubError,
        walk: &mut Walk,
    ) -> Result<(), HubError> {
        if error.is_fatal() {
            return Err(error);
        }

        match self.options.policy {
            ErrorPolicy::Strict => Err(HubError::Traversal {
                link: link.to_string(),
                source: Box::new(error),
            }),
            ErrorPolicy::Lenient => {
                match kind {
                    FailureKind::Subtree => {
                        walk.summary.subtrees_skipped += 1;
                        warn!("Skipping group {}: {}", link, error);
                    }
                    FailureKind::Project => {
                        walk.summary.projects_skipped += 1;
                        warn!("Skipping project {}: {}", link, error);
                    }
                }
                walk.failures.push(TraversalFailure {
                    kind,
                    link: link.to_string(),
                    error,
                });
                Ok(())
            }
        }
    }

    /// Run one request unless cancelled, abandoning it if cancelled meanwhile.
    async fn guarded<R, F>(&self, request: F) -> Result<R, HubError>
    where
        F: Future<Output = Result<R, HubError>>,
    {
        let Some(token) = &self.cancel else {
            return request.await;
        };
        if token.is_cancelled() {
            return Err(HubError::Cancelled);
        }

        tokio::select! {
            biased;
            () = token.cancelled() => Err(HubError::Cancelled),
            result = request => result,
        }
    }
}

/// Open a [`Session`] for `config`, resolve `group_name`, and close the session.
///
/// # Errors
///
/// Session errors from [`Session::open`] and every error of
/// [`HierarchyResolver::resolve`].
pub async fn resolve_group(
    config: &HubConfig,
    group_name: &str,
    cancel: Option<CancelToken>,
) -> Result<ResolveReport, HubError> {
    let mut session = Session::open(config).await?;

    let result = {
        let mut resolver = HierarchyResolver::new(&session, config.resolve_options());
        if let Some(token) = cancel {
            resolver = resolver.with_cancel(token);
        }
        resolver.resolve(group_name).await
    };

    session.close();
    result
}
