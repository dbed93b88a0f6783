use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request};
use serde_json::Value;

use crate::auth::Role;
use crate::notifications::{NotificationDispatcher, NotificationSink};
use crate::selection::{selection_router, SelectionEngine};
pub(super) use crate::test_support::{
    admin_config, read_json_body, token, verifier, MemoryAcceptances, MemoryDirectory,
    RecordingSink, UnavailableAcceptances,
};

pub(super) type MemoryEngine = SelectionEngine<MemoryDirectory, MemoryAcceptances>;

pub(super) struct Harness {
    pub(super) engine: Arc<MemoryEngine>,
    pub(super) directory: MemoryDirectory,
    pub(super) acceptances: MemoryAcceptances,
    pub(super) sink: Arc<RecordingSink>,
    pub(super) dispatcher: NotificationDispatcher,
}

impl Harness {
    pub(super) fn router(&self) -> axum::Router {
        selection_router(self.engine.clone(), verifier())
    }
}

/// Engine over the seeded demo directory with a recording sink. Needs a tokio runtime.
pub(super) fn harness() -> Harness {
    let sink = Arc::new(RecordingSink::default());
    harness_with_sink(sink.clone(), sink)
}

pub(super) fn harness_with_sink<S>(sink: Arc<S>, recorder: Arc<RecordingSink>) -> Harness
where
    S: NotificationSink + 'static,
{
    let directory = MemoryDirectory::seeded();
    let acceptances = MemoryAcceptances::default();
    let dispatcher = NotificationDispatcher::spawn(sink);
    let engine = SelectionEngine::new(
        Arc::new(directory.clone()),
        Arc::new(acceptances.clone()),
        dispatcher.clone(),
        admin_config(),
    );
    Harness {
        engine: Arc::new(engine),
        directory,
        acceptances,
        sink: recorder,
        dispatcher,
    }
}

pub(super) fn unavailable_engine() -> SelectionEngine<MemoryDirectory, UnavailableAcceptances> {
    SelectionEngine::new(
        Arc::new(MemoryDirectory::seeded()),
        Arc::new(UnavailableAcceptances),
        NotificationDispatcher::spawn(Arc::new(RecordingSink::default())),
        admin_config(),
    )
}

pub(super) fn authed(
    method: Method,
    uri: &str,
    user: &str,
    role: Role,
    body: Option<Value>,
) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token(user, role)));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body).expect("json body")))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}
