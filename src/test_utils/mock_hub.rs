//! In-memory hub serving canned listings and documents.

use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::constants::PROJECT_GROUPS_PATH;
use crate::core::HubError;
use crate::hub::HubTransport;
use crate::resolver::CancelToken;

/// Base URL of every [`MockHub`] and of the JSON builders in this module.
pub const MOCK_BASE: &str = "https://hub.test";

/// Self link of group `id`.
pub fn group_url(id: &str) -> String {
    format!("{MOCK_BASE}{PROJECT_GROUPS_PATH}/{id}")
}

/// Self link of project `id`.
pub fn project_url(id: &str) -> String {
    format!("{MOCK_BASE}/api/projects/{id}")
}

/// Listing entry for sub-group `id` (named after its id).
pub fn group_ref(id: &str) -> Value {
    named_group_ref(id, id)
}

/// Listing entry for sub-group `id` with a display name.
pub fn named_group_ref(id: &str, name: &str) -> Value {
    json!({
        "name": name,
        "isProject": false,
        "_meta": { "href": group_url(id) }
    })
}

/// Listing entry referencing project `id`.
pub fn project_ref(id: &str) -> Value {
    json!({
        "name": id,
        "isProject": true,
        "_meta": { "href": project_url(id) }
    })
}

/// Detail document of project `id`.
pub fn project_doc(id: &str, name: &str) -> Value {
    json!({
        "name": name,
        "description": format!("{name} service"),
        "_meta": { "href": project_url(id) }
    })
}

enum Route {
    Listing {
        declared: usize,
        items: Vec<Value>,
    },
    Search(Vec<Value>),
    Document(Value),
    Status(u16),
    Unreachable,
}

/// One request received by a [`MockHub`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// Requested URL without query
    pub url: String,
    /// Query parameters in request order
    pub query: Vec<(String, String)>,
}

impl RecordedRequest {
    /// Value of query parameter `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    routes: HashMap<String, Route>,
    page_failures: HashMap<(String, usize), u16>,
    requests: Vec<RecordedRequest>,
    cancel_after: Option<(usize, CancelToken)>,
}

/// Hub double implementing [`HubTransport`].
///
/// Listings honour `offset`/`limit` like the real server; unknown URLs
/// answer 404. Every request is recorded for assertions.
pub struct MockHub {
    base_url: String,
    state: Mutex<State>,
}

impl Default for MockHub {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHub {
    /// Empty hub at [`MOCK_BASE`].
    pub fn new() -> Self {
        Self {
            base_url: MOCK_BASE.to_string(),
            state: Mutex::new(State::default()),
        }
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        let mut state = self.state.lock().expect("mock hub state poisoned");
        f(&mut state)
    }

    fn route(&self, url: impl Into<String>, route: Route) {
        self.with_state(|s| {
            s.routes.insert(url.into(), route);
        });
    }

    /// Make group `id` named `name` a result of the group search.
    pub fn root_group(&self, id: &str, name: &str) {
        let search = format!("{MOCK_BASE}{PROJECT_GROUPS_PATH}");
        self.with_state(|s| {
            let entry = s.routes.entry(search).or_insert_with(|| Route::Search(Vec::new()));
            if let Route::Search(items) = entry {
                items.push(json!({ "name": name, "_meta": { "href": group_url(id) } }));
            }
        });
    }

    /// Serve `children` as the children listing of group `id`.
    pub fn group(&self, id: &str, children: Vec<Value>) {
        self.listing(format!("{}/children", group_url(id)), children);
    }

    /// Serve the detail document of project `id`.
    pub fn project(&self, id: &str, name: &str) {
        self.document(project_url(id), project_doc(id, name));
    }

    /// Serve a paginated listing at `url`.
    pub fn listing(&self, url: impl Into<String>, items: Vec<Value>) {
        let declared = items.len();
        self.route(
            url,
            Route::Listing {
                declared,
                items,
            },
        );
    }

    /// Serve a listing whose `totalCount` disagrees with its items.
    pub fn raw_listing(&self, url: impl Into<String>, declared: usize, items: Vec<Value>) {
        self.route(
            url,
            Route::Listing {
                declared,
                items,
            },
        );
    }

    /// Serve `body` at `url` regardless of query.
    pub fn document(&self, url: impl Into<String>, body: Value) {
        self.route(url, Route::Document(body));
    }

    /// Answer every request to `url` with HTTP `status`.
    pub fn fail(&self, url: impl Into<String>, status: u16) {
        self.route(url, Route::Status(status));
    }

    /// Answer only the page of `url` at `offset` with HTTP `status`.
    pub fn fail_page(&self, url: impl Into<String>, offset: usize, status: u16) {
        let url = url.into();
        self.with_state(|s| {
            s.page_failures.insert((url, offset), status);
        });
    }

    /// Make `url` behave like an unreachable host.
    pub fn unreachable(&self, url: impl Into<String>) {
        self.route(url, Route::Unreachable);
    }

    /// Cancel `token` once `requests` requests have been served.
    pub fn cancel_after(&self, requests: usize, token: CancelToken) {
        self.with_state(|s| s.cancel_after = Some((requests, token)));
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.with_state(|s| s.requests.clone())
    }

    /// Number of requests received for `url`.
    pub fn hits(&self, url: &str) -> usize {
        self.with_state(|s| s.requests.iter().filter(|r| r.url == url).count())
    }

    /// `offset` values requested for `url`, in order.
    pub fn offsets_for(&self, url: &str) -> Vec<usize> {
        self.with_state(|s| {
            s.requests
                .iter()
                .filter(|r| r.url == url)
                .filter_map(|r| r.param("offset").and_then(|o| o.parse().ok()))
                .collect()
        })
    }

    fn respond(&self, url: &str, query: &[(&str, String)]) -> Result<Value, HubError> {
        self.with_state(|s| {
            let request = RecordedRequest {
                url: url.to_string(),
                query: query.iter().map(|(k, v)| ((*k).to_string(), v.clone())).collect(),
            };
            let offset = request.param("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
            let limit = request.param("limit").and_then(|l| l.parse().ok()).unwrap_or(usize::MAX);
            let name_filter = request
                .param("q")
                .and_then(|q| q.strip_prefix("name:"))
                .map(str::to_lowercase);
            s.requests.push(request);

            if let Some((after, token)) = &s.cancel_after {
                if s.requests.len() >= *after {
                    token.cancel();
                }
            }

            if let Some(status) = s.page_failures.get(&(url.to_string(), offset)) {
                return Err(status_error(url, *status));
            }

            match s.routes.get(url) {
                None => Err(status_error(url, 404)),
                Some(Route::Status(status)) => Err(status_error(url, *status)),
                Some(Route::Unreachable) => Err(HubError::Transport {
                    url: url.to_string(),
                    message: "connection refused".to_string(),
                }),
                Some(Route::Document(body)) => Ok(body.clone()),
                Some(Route::Listing {
                    declared,
                    items,
                }) => Ok(page(*declared, items.iter(), offset, limit)),
                Some(Route::Search(items)) => {
                    // The real server matches names by case-insensitive substring
                    let matching: Vec<&Value> = items
                        .iter()
                        .filter(|item| match &name_filter {
                            Some(needle) => item["name"]
                                .as_str()
                                .is_some_and(|n| n.to_lowercase().contains(needle.as_str())),
                            None => true,
                        })
                        .collect();
                    Ok(page(matching.len(), matching.into_iter(), offset, limit))
                }
            }
        })
    }
}

fn page<'a>(
    declared: usize,
    items: impl Iterator<Item = &'a Value>,
    offset: usize,
    limit: usize,
) -> Value {
    let items: Vec<Value> = items.skip(offset).take(limit).cloned().collect();
    json!({ "totalCount": declared, "items": items })
}

fn status_error(url: &str, status: u16) -> HubError {
    if status == 401 {
        HubError::Auth {
            reason: format!("server rejected the session credentials for {url}"),
        }
    } else {
        HubError::Api {
            status,
            url: url.to_string(),
        }
    }
}

impl HubTransport for MockHub {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<Value, HubError> {
        self.respond(url, query)
    }
}
