use portfolio_dashboard::{
    ApiClient, ApiError, AppConfig, BackendState, Dashboard, ListScope, MockBackend, Notice,
    Notifier, Outcome, ResourcePanel,
    backend::Method,
    models::{
        Blog, CreateBlogRequest, CreateMessageRequest, Message, UpdateBlogRequest, User,
        UserStatus,
    },
};
use serde_json::{Value, json};
use std::ops::Range;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

const BLOGS: &str = "/blog/all-blogs";

// --- Test Utilities ---

fn blog_json(id: i64, title: &str) -> Value {
    json!({ "id": id, "title": title, "content": format!("body of {id}") })
}

fn blogs_page(ids: Range<i64>, total: u64) -> Value {
    let data: Vec<Value> = ids.map(|id| blog_json(id, &format!("Post {id}"))).collect();
    json!({ "data": data, "total": total })
}

fn blog_panel(
    scope: ListScope,
    limit: u32,
) -> (Arc<MockBackend>, ResourcePanel<Blog>, UnboundedReceiver<Notice>) {
    let backend = Arc::new(MockBackend::new());
    let (notifier, notices) = Notifier::channel();
    let api = ApiClient::new(backend.clone() as BackendState);
    (backend, ResourcePanel::new(api, scope, limit, notifier), notices)
}

fn drain(notices: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut seen = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        seen.push(notice);
    }
    seen
}

fn ids(panel: &ResourcePanel<Blog>) -> Vec<i64> {
    panel.items().iter().map(|blog| blog.id).collect()
}

/// Yields until the mock has recorded `count` requests.
async fn wait_for_calls(backend: &MockBackend, count: usize) {
    while backend.calls().len() < count {
        tokio::task::yield_now().await;
    }
}

// --- Listing & Pagination ---

#[tokio::test]
async fn test_twelve_items_at_five_per_page_walk_three_pages() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..6, 12));
    backend.respond(Method::Get, BLOGS, blogs_page(6..11, 12));
    backend.respond(Method::Get, BLOGS, blogs_page(11..13, 12));

    assert_eq!(panel.list(1).await, Ok(Outcome::Applied));
    assert_eq!(panel.pagination().total_pages, 3);
    assert_eq!(panel.pagination().page, 1);
    assert!(!panel.pagination().has_prev());

    assert_eq!(panel.next().await, Ok(Outcome::Applied));
    assert_eq!(panel.pagination().page, 2);
    assert_eq!(ids(&panel), vec![6, 7, 8, 9, 10]);

    assert_eq!(panel.next().await, Ok(Outcome::Applied));
    assert_eq!(panel.pagination().page, 3);
    assert_eq!(ids(&panel), vec![11, 12]);

    assert_eq!(panel.next().await, Ok(Outcome::Unchanged));
    assert_eq!(panel.pagination().page, 3);
    assert_eq!(backend.calls_to(Method::Get, BLOGS), 3);

    let pages: Vec<_> = backend
        .calls()
        .iter()
        .map(|call| call.query_value("page").unwrap_or_default().to_string())
        .collect();
    assert_eq!(pages, vec!["1", "2", "3"]);
    assert_eq!(backend.calls()[0].query_value("limit"), Some("5"));
}

#[tokio::test]
async fn test_prev_on_first_page_sends_nothing() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..6, 12));
    panel.list(1).await.unwrap();

    assert_eq!(panel.prev().await, Ok(Outcome::Unchanged));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_page_is_clamped_to_last_page() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(11..13, 12));

    panel.list(9).await.unwrap();

    assert_eq!(panel.pagination().page, 3);
    assert_eq!(panel.pagination().total_pages, 3);
}

#[tokio::test]
async fn test_empty_collection_has_zero_pages() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, json!({ "data": [], "total": 0 }));

    panel.list(1).await.unwrap();

    assert!(panel.items().is_empty());
    assert_eq!(panel.pagination().total_pages, 0);
    assert_eq!(panel.pagination().page, 1);
    assert!(!panel.pagination().has_next());
}

#[tokio::test]
async fn test_mine_scope_lists_unpaginated_endpoint() {
    let (backend, panel, _notices) = blog_panel(ListScope::Mine, 5);
    backend.respond(
        Method::Get,
        "/blog/my-blogs",
        json!({ "data": [blog_json(1, "a"), blog_json(2, "b"), blog_json(3, "c")] }),
    );

    panel.list(1).await.unwrap();

    assert_eq!(ids(&panel), vec![1, 2, 3]);
    assert_eq!(panel.pagination().total_pages, 1);
    assert!(backend.calls()[0].query.is_empty());
}

#[tokio::test]
async fn test_failed_list_leaves_state_untouched() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..6, 12));
    panel.list(1).await.unwrap();
    let before = (panel.items(), panel.pagination());
    backend.fail(Method::Get, BLOGS, ApiError::Transport("reset".into()));

    let result = panel.next().await;

    assert!(result.is_err());
    assert_eq!((panel.items(), panel.pagination()), before);
    assert!(!panel.is_loading());
    assert_eq!(drain(&mut notices), vec![Notice::error("Failed to fetch blogs")]);
}

#[tokio::test]
async fn test_failed_list_shows_server_message() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.fail(
        Method::Get,
        BLOGS,
        ApiError::Server {
            status: 500,
            message: Some("Database unavailable".into()),
        },
    );

    let _ = panel.list(1).await;

    assert_eq!(
        drain(&mut notices),
        vec![Notice::error("Database unavailable")]
    );
}

#[tokio::test]
async fn test_stale_list_response_is_discarded() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    let gate = backend.respond_gated(Method::Get, BLOGS, blogs_page(1..6, 12));
    backend.respond(Method::Get, BLOGS, blogs_page(6..11, 12));

    let slow = tokio::spawn({
        let panel = panel.clone();
        async move { panel.list(1).await }
    });
    wait_for_calls(&backend, 1).await;

    assert_eq!(panel.list(2).await, Ok(Outcome::Applied));
    gate.send(()).unwrap();

    assert_eq!(slow.await.unwrap(), Ok(Outcome::Discarded));
    assert_eq!(ids(&panel), vec![6, 7, 8, 9, 10]);
    assert_eq!(panel.pagination().page, 2);
}

// --- Mutations ---

#[tokio::test]
async fn test_create_prepends_server_item() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();
    backend.respond(
        Method::Post,
        "/blog/create",
        json!({ "data": blog_json(99, "Fresh") }),
    );

    let created = panel
        .create(CreateBlogRequest {
            title: "Fresh".into(),
            content: "Hello".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(created.id, 99);
    assert_eq!(ids(&panel), vec![99, 1, 2, 3]);
    assert_eq!(
        backend.calls().last().unwrap().body,
        Some(json!({ "title": "Fresh", "content": "Hello", "published": false }))
    );
    assert_eq!(
        drain(&mut notices),
        vec![Notice::success("Blog created successfully")]
    );
}

#[tokio::test]
async fn test_create_failure_leaves_list_unchanged() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();
    backend.fail(
        Method::Post,
        "/blog/create",
        ApiError::Server {
            status: 500,
            message: None,
        },
    );

    let result = panel
        .create(CreateBlogRequest {
            title: "Fresh".into(),
            content: "Hello".into(),
            ..Default::default()
        })
        .await;

    assert!(result.is_err());
    assert_eq!(ids(&panel), vec![1, 2, 3]);
    assert_eq!(drain(&mut notices), vec![Notice::error("Failed to create blog")]);
}

#[tokio::test]
async fn test_create_with_missing_title_is_rejected_locally() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);

    let result = panel
        .create(CreateBlogRequest {
            content: "Hello".into(),
            ..Default::default()
        })
        .await;

    assert_eq!(
        result.unwrap_err(),
        ApiError::Validation("Title is required".into())
    );
    assert!(backend.calls().is_empty());
    assert_eq!(drain(&mut notices), vec![Notice::error("Title is required")]);
}

#[tokio::test]
async fn test_update_replaces_item_in_place() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(6..9, 3));
    panel.list(1).await.unwrap();
    backend.respond(
        Method::Patch,
        "/blog/update/7",
        json!({ "data": blog_json(7, "X") }),
    );

    let outcome = panel
        .update(
            &7,
            UpdateBlogRequest {
                title: Some("X".into()),
                ..Default::default()
            },
        )
        .await;

    assert_eq!(outcome, Ok(Outcome::Applied));
    let items = panel.items();
    assert_eq!(ids(&panel), vec![6, 7, 8]);
    assert_eq!(items[1].title, "X");
    assert_eq!(items[0].title, "Post 6");
    assert_eq!(items[2].title, "Post 8");
    assert_eq!(
        backend.calls().last().unwrap().body,
        Some(json!({ "title": "X" }))
    );
}

#[tokio::test]
async fn test_update_failure_keeps_old_item() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(6..9, 3));
    panel.list(1).await.unwrap();
    backend.fail(
        Method::Patch,
        "/blog/update/7",
        ApiError::Transport("down".into()),
    );

    let result = panel
        .update(
            &7,
            UpdateBlogRequest {
                title: Some("X".into()),
                ..Default::default()
            },
        )
        .await;

    assert!(result.is_err());
    assert_eq!(panel.items()[1].title, "Post 7");
}

#[tokio::test]
async fn test_confirmed_delete_removes_item() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();
    backend.respond(Method::Delete, "/blog/delete/2", Value::Null);

    let mut prompt = String::new();
    let outcome = panel
        .delete(&2, |text| {
            prompt = text.to_string();
            true
        })
        .await;

    assert_eq!(outcome, Ok(Outcome::Applied));
    assert_eq!(prompt, "Are you sure you want to delete this blog?");
    assert_eq!(ids(&panel), vec![1, 3]);
    assert_eq!(
        drain(&mut notices),
        vec![Notice::success("Blog deleted successfully")]
    );
}

#[tokio::test]
async fn test_declined_delete_sends_nothing() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();

    let outcome = panel.delete(&2, |_| false).await;

    assert_eq!(outcome, Ok(Outcome::Declined));
    assert_eq!(backend.calls_to(Method::Delete, "/blog/delete/2"), 0);
    assert_eq!(ids(&panel), vec![1, 2, 3]);
}

#[tokio::test]
async fn test_failed_delete_keeps_item() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();
    backend.fail(
        Method::Delete,
        "/blog/delete/2",
        ApiError::Server {
            status: 403,
            message: Some("Forbidden".into()),
        },
    );

    let result = panel.delete(&2, |_| true).await;

    assert!(result.is_err());
    assert_eq!(ids(&panel), vec![1, 2, 3]);
    assert_eq!(drain(&mut notices), vec![Notice::error("Forbidden")]);
}

#[tokio::test]
async fn test_duplicate_delete_is_ignored_while_in_flight() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();
    let gate = backend.respond_gated(Method::Delete, "/blog/delete/2", Value::Null);

    let first = tokio::spawn({
        let panel = panel.clone();
        async move { panel.delete(&2, |_| true).await }
    });
    wait_for_calls(&backend, 2).await;

    assert_eq!(panel.delete(&2, |_| true).await, Ok(Outcome::Duplicate));
    gate.send(()).unwrap();

    assert_eq!(first.await.unwrap(), Ok(Outcome::Applied));
    assert_eq!(backend.calls_to(Method::Delete, "/blog/delete/2"), 1);
    assert_eq!(ids(&panel), vec![1, 3]);
}

#[tokio::test]
async fn test_duplicate_update_is_ignored_while_in_flight() {
    let (backend, panel, _notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(6..9, 3));
    panel.list(1).await.unwrap();
    let gate = backend.respond_gated(
        Method::Patch,
        "/blog/update/7",
        json!({ "data": blog_json(7, "First") }),
    );

    let first = tokio::spawn({
        let panel = panel.clone();
        async move {
            panel
                .update(
                    &7,
                    UpdateBlogRequest {
                        title: Some("First".into()),
                        ..Default::default()
                    },
                )
                .await
        }
    });
    wait_for_calls(&backend, 2).await;

    let second = panel
        .update(
            &7,
            UpdateBlogRequest {
                title: Some("Second".into()),
                ..Default::default()
            },
        )
        .await;
    assert_eq!(second, Ok(Outcome::Duplicate));
    gate.send(()).unwrap();

    assert_eq!(first.await.unwrap(), Ok(Outcome::Applied));
    assert_eq!(backend.calls_to(Method::Patch, "/blog/update/7"), 1);
    assert_eq!(panel.items()[1].title, "First");
}

// --- Teardown ---

#[tokio::test]
async fn test_close_cancels_in_flight_list() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    let _gate = backend.respond_gated(Method::Get, BLOGS, blogs_page(1..6, 12));

    let pending = tokio::spawn({
        let panel = panel.clone();
        async move { panel.list(1).await }
    });
    wait_for_calls(&backend, 1).await;
    panel.close();

    assert_eq!(pending.await.unwrap(), Err(ApiError::Cancelled));
    assert!(panel.items().is_empty());
    assert!(drain(&mut notices).is_empty());
    assert_eq!(panel.list(1).await, Err(ApiError::Cancelled));
    assert_eq!(backend.calls().len(), 1);
}

#[tokio::test]
async fn test_close_during_create_keeps_list_unchanged() {
    let (backend, panel, mut notices) = blog_panel(ListScope::All, 5);
    backend.respond(Method::Get, BLOGS, blogs_page(1..4, 3));
    panel.list(1).await.unwrap();
    let _gate = backend.respond_gated(
        Method::Post,
        "/blog/create",
        json!({ "data": blog_json(99, "Late") }),
    );

    let pending = tokio::spawn({
        let panel = panel.clone();
        async move {
            panel
                .create(CreateBlogRequest {
                    title: "Late".into(),
                    content: "Hello".into(),
                    ..Default::default()
                })
                .await
        }
    });
    wait_for_calls(&backend, 2).await;
    panel.close();

    assert_eq!(pending.await.unwrap(), Err(ApiError::Cancelled));
    assert_eq!(ids(&panel), vec![1, 2, 3]);
    assert!(drain(&mut notices).is_empty());
}

#[tokio::test]
async fn test_dashboard_shutdown_closes_its_panels() {
    let backend = Arc::new(MockBackend::new());
    let dashboard = Dashboard::new(
        AppConfig::default(),
        backend.clone() as BackendState,
        Notifier::silent(),
    );
    let blogs = dashboard.panel::<Blog>(ListScope::All);
    let users = dashboard.panel::<User>(ListScope::All);

    assert_eq!(blogs.pagination().limit, 5);
    assert_eq!(users.pagination().limit, 10);
    assert!(!blogs.is_closed());

    dashboard.shutdown();

    assert!(blogs.is_closed() && users.is_closed());
    assert_eq!(blogs.list(1).await, Err(ApiError::Cancelled));
    assert!(backend.calls().is_empty());
}

// --- Users Panel ---

#[tokio::test]
async fn test_toggle_status_flips_listed_user() {
    let backend = Arc::new(MockBackend::new());
    let api = ApiClient::new(backend.clone() as BackendState);
    let panel: ResourcePanel<User> =
        ResourcePanel::new(api, ListScope::All, 10, Notifier::silent());
    backend.respond(
        Method::Get,
        "/user/all",
        json!({
            "data": [{ "id": "u1", "name": "Ada", "email": "ada@example.com", "role": "User", "status": "ACTIVE" }],
            "total": 1
        }),
    );
    backend.respond(
        Method::Patch,
        "/user/update-user/u1",
        json!({ "data": { "id": "u1", "name": "Ada", "email": "ada@example.com", "role": "User", "status": "INACTIVE" } }),
    );
    panel.list(1).await.unwrap();

    let outcome = panel.toggle_status("u1").await;

    assert_eq!(outcome, Ok(Outcome::Applied));
    assert_eq!(panel.items()[0].status, UserStatus::Inactive);
    assert_eq!(
        backend.calls().last().unwrap().body,
        Some(json!({ "status": "INACTIVE" }))
    );
}

#[tokio::test]
async fn test_toggle_status_of_unknown_user_is_rejected() {
    let backend = Arc::new(MockBackend::new());
    let api = ApiClient::new(backend.clone() as BackendState);
    let panel: ResourcePanel<User> =
        ResourcePanel::new(api, ListScope::All, 10, Notifier::silent());

    let result = panel.toggle_status("ghost").await;

    assert!(matches!(result, Err(ApiError::Validation(_))));
    assert!(backend.calls().is_empty());
}

// --- Messages Inbox ---

#[tokio::test]
async fn test_contact_message_reaches_inbox_after_reload() {
    let backend = Arc::new(MockBackend::new());
    let api = ApiClient::new(backend.clone() as BackendState);
    let (notifier, mut notices) = Notifier::channel();
    let inbox: ResourcePanel<Message> =
        ResourcePanel::new(api.clone(), ListScope::All, 10, notifier);
    backend.respond(Method::Get, "/message/get", json!({ "data": [] }));
    inbox.list(1).await.unwrap();

    // The contact endpoint only acknowledges with a bare 200.
    backend.respond(Method::Post, "/message/create", Value::Null);
    let sent = api
        .send_message(&CreateMessageRequest {
            name: "Visitor".into(),
            email: "v@example.com".into(),
            content: "Hello there".into(),
        })
        .await;
    assert_eq!(sent, Ok(()));

    backend.respond(
        Method::Get,
        "/message/get",
        json!({ "data": [{
            "id": 1,
            "name": "Visitor",
            "email": "v@example.com",
            "content": "Hello there",
            "createdAt": "2025-03-01T10:00:00Z"
        }] }),
    );
    assert_eq!(inbox.reload().await, Ok(Outcome::Applied));

    assert_eq!(inbox.items().len(), 1);
    assert_eq!(inbox.items()[0].content, "Hello there");
    assert_eq!(inbox.pagination().total_pages, 1);
    assert!(drain(&mut notices).is_empty());
}

#[tokio::test]
async fn test_inbox_delete_removes_message() {
    let backend = Arc::new(MockBackend::new());
    let api = ApiClient::new(backend.clone() as BackendState);
    let inbox: ResourcePanel<Message> =
        ResourcePanel::new(api, ListScope::All, 10, Notifier::silent());
    backend.respond(
        Method::Get,
        "/message/get",
        json!({ "data": [
            { "id": 1, "name": "A", "email": "a@example.com", "content": "x", "createdAt": "2025-03-01T10:00:00Z" },
            { "id": 2, "name": "B", "email": "b@example.com", "content": "y", "createdAt": "2025-03-02T10:00:00Z" }
        ] }),
    );
    inbox.list(1).await.unwrap();
    backend.respond(Method::Delete, "/message/delete/1", Value::Null);

    assert_eq!(inbox.delete(&1, |_| true).await, Ok(Outcome::Applied));

    let remaining: Vec<i64> = inbox.items().iter().map(|message| message.id).collect();
    assert_eq!(remaining, vec![2]);
}
