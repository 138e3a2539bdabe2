//! Page traversal of large listings through the public API.

use bdmetrics::hub::{GroupNode, PageCursor};
use bdmetrics::resolver::{HierarchyResolver, ResolveOptions};
use bdmetrics::test_utils::{MockHub, group_url, project_ref};

#[tokio::test]
async fn test_large_group_is_fetched_in_pages() {
    let hub = MockHub::new();
    hub.root_group("big", "Big");
    let children: Vec<_> = (0..2345).map(|i| project_ref(&format!("p{i}"))).collect();
    hub.group("big", children);
    for i in 0..2345 {
        hub.project(&format!("p{i}"), &format!("project-{i}"));
    }

    let report = HierarchyResolver::new(&hub, ResolveOptions::default())
        .resolve("Big")
        .await
        .unwrap();

    assert_eq!(report.projects().total_count(), 2345);
    let listing = format!("{}/children", group_url("big"));
    assert_eq!(hub.offsets_for(&listing), vec![0, 1000, 2000]);
    assert!(hub.requests().iter().filter(|r| r.url == listing).all(|r| r.param("limit") == Some("1000")));
}

#[tokio::test]
async fn test_small_pages_preserve_order() {
    let hub = MockHub::new();
    let listing = format!("{}/children", group_url("g"));
    hub.listing(&listing, (0..7).map(|i| project_ref(&format!("p{i}"))).collect());

    let items: Vec<GroupNode> = PageCursor::new(&hub, 3).fetch_all(&listing, &[]).await.unwrap();

    let ids: Vec<&str> = items.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, ["p0", "p1", "p2", "p3", "p4", "p5", "p6"]);
    assert_eq!(hub.offsets_for(&listing), vec![0, 3, 6]);
}
