//! Video catalog: at most one demo video per (teacher, specialty).

pub mod repository;
pub mod router;
pub mod service;

pub use repository::{VideoCatalog, VideoRecord, VideoUpsert};
pub use router::video_router;
pub use service::{CatalogError, VideoCatalogService, VideoRegistration};

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use super::*;
    use crate::auth::{Requester, Role};
    use crate::directory::{DirectoryRepository, TeacherId};
    use crate::test_support::{read_json_body, token, verifier, MemoryCatalog, MemoryDirectory};

    fn service() -> (
        VideoCatalogService<MemoryDirectory, MemoryCatalog>,
        MemoryDirectory,
    ) {
        let directory = MemoryDirectory::seeded();
        let service =
            VideoCatalogService::new(Arc::new(directory.clone()), Arc::new(MemoryCatalog::default()));
        (service, directory)
    }

    fn registration(specialty: &str, url: &str) -> VideoRegistration {
        VideoRegistration {
            specialty_id: Some(specialty.to_string()),
            title: None,
            video_url: Some(url.to_string()),
        }
    }

    #[test]
    fn register_attaches_video_and_defaults_title() {
        let (service, directory) = service();

        let outcome = service
            .register(
                &Requester::teacher("t1"),
                registration("math", "https://cdn.example/t1-math.mp4"),
            )
            .expect("registered");

        let record = match outcome {
            VideoUpsert::Created(record) => record,
            other => panic!("expected a new video, got {other:?}"),
        };
        assert_eq!(record.title, "الرياضيات - Aisha Al-Balushi");
        let teacher = directory
            .teacher(&TeacherId("t1".to_string()))
            .expect("lookup")
            .expect("teacher exists");
        assert_eq!(teacher.videos, vec![record.id]);
    }

    #[test]
    fn second_upload_for_same_specialty_replaces_in_place() {
        let (service, directory) = service();
        let teacher = Requester::teacher("t1");

        let first = service
            .register(&teacher, registration("math", "https://cdn.example/v1.mp4"))
            .expect("first upload");
        let second = service
            .register(&teacher, registration("math", "https://cdn.example/v2.mp4"))
            .expect("second upload");

        assert!(matches!(second, VideoUpsert::Replaced(_)));
        assert_eq!(second.record().id, first.record().id);
        assert_eq!(second.record().video_url, "https://cdn.example/v2.mp4");

        let videos = service
            .teacher_videos(&TeacherId("t1".to_string()))
            .expect("listing");
        assert_eq!(videos.len(), 1);
        let stored = directory
            .teacher(&TeacherId("t1".to_string()))
            .expect("lookup")
            .expect("teacher exists");
        assert_eq!(stored.videos.len(), 1);
    }

    #[test]
    fn unregistered_specialty_is_forbidden() {
        let (service, _) = service();

        match service.register(
            &Requester::teacher("t1"),
            registration("physics", "https://cdn.example/p.mp4"),
        ) {
            Err(CatalogError::Forbidden(message)) => {
                assert_eq!(
                    message,
                    "You can only upload videos for your registered specialties"
                );
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
    }

    #[test]
    fn register_validates_role_fields_and_specialty() {
        let (service, _) = service();
        let teacher = Requester::teacher("t1");

        assert!(matches!(
            service.register(&Requester::school("s1"), registration("math", "u")),
            Err(CatalogError::Forbidden(_))
        ));
        assert!(matches!(
            service.register(&teacher, VideoRegistration::default()),
            Err(CatalogError::MissingField("Specialty"))
        ));
        assert!(matches!(
            service.register(&teacher, registration("chemistry", "u")),
            Err(CatalogError::NotFound("Specialty not found"))
        ));
        assert!(matches!(
            service.register(&Requester::teacher("t9"), registration("math", "u")),
            Err(CatalogError::NotFound("Teacher not found"))
        ));
    }

    #[tokio::test]
    async fn upload_route_reports_created_then_replaced() {
        let (service, _) = service();
        let router = video_router(Arc::new(service), verifier());
        let request = || {
            Request::post("/api/videos")
                .header(header::AUTHORIZATION, format!("Bearer {}", token("t2", Role::Teacher)))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"specialtyId": "physics", "videoUrl": "https://cdn.example/p.mp4"})
                        .to_string(),
                ))
                .expect("request builds")
        };

        let created = router.clone().oneshot(request()).await.expect("create");
        assert_eq!(created.status(), StatusCode::CREATED);
        let payload = read_json_body(created).await;
        assert_eq!(payload["message"], "Video uploaded successfully");
        assert_eq!(payload["data"]["specialty"], "physics");

        let replaced = router.clone().oneshot(request()).await.expect("replace");
        assert_eq!(replaced.status(), StatusCode::OK);

        let listing = router
            .oneshot(
                Request::get("/api/videos/teacher/t2")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token("s1", Role::School)))
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("list");
        assert_eq!(listing.status(), StatusCode::OK);
        let payload = read_json_body(listing).await;
        assert_eq!(payload["data"].as_array().map(Vec::len), Some(1));
    }
}
