use crate::common::{
    self, auth, create_course, send, upload, upload_body, FailingExtractor, PanickingExtractor,
    StaticExtractor,
};
use actix_http::StatusCode;
use actix_web::test;
use eduvoice::db::models::course;
use eduvoice::db::models::document;
use eduvoice::db::models::user::Role;
use serde_json::{json, Value};

fn ids(page: &Value) -> Vec<i64> {
    page["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|document| document["id"].as_i64().unwrap())
        .collect()
}

#[actix_web::test]
async fn test_upload_text_document_expect_ready_with_text() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    let body = upload(
        &app,
        &grace,
        upload_body("Cells", "cells.txt", b"Mitochondria make energy.", json!({"subject": "Biology"})),
    )
    .await;
    assert_eq!(body["status"], "READY");
    assert_eq!(body["file_type"], "txt");
    assert_eq!(body["extracted_text"], "Mitochondria make energy.");
    assert_eq!(body["uploaded_by"], grace.id);
    assert_eq!(body["file_size"], 25);
    assert_eq!(body["is_public"], false);
    assert_eq!(body["course"], Value::Null);

    let stored = env.state.config.media_root.join(body["file"].as_str().unwrap());
    assert!(body["file"].as_str().unwrap().starts_with("documents/"));
    assert_eq!(std::fs::read(stored).unwrap(), b"Mitochondria make energy.");
}

#[actix_web::test]
async fn test_upload_html_document_expect_visible_text_only() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    let html = b"<html><head><script>var x = 1;</script></head><body><h1>Photosynthesis</h1><p>Light becomes sugar.</p></body></html>";
    let body = upload(&app, &grace, upload_body("Plants", "plants.html", html, json!({}))).await;
    assert_eq!(body["status"], "READY");
    let text = body["extracted_text"].as_str().unwrap();
    assert!(text.contains("Photosynthesis"));
    assert!(text.contains("Light becomes sugar."));
    assert!(!text.contains("var x"));
}

#[actix_web::test]
async fn test_upload_when_extraction_fails_expect_created_with_error_status() {
    for env in [
        common::builder().extractor(FailingExtractor).build().await,
        common::builder().extractor(PanickingExtractor).build().await,
        common::builder()
            .extractor(StaticExtractor(" \n\t ".into()))
            .build()
            .await,
    ] {
        let grace = env.user("grace", Role::Teacher).await;
        let app = env.app().await;
        let body = upload(&app, &grace, upload_body("Broken", "broken.pdf", b"%PDF-1.4", json!({}))).await;
        assert_eq!(body["status"], "ERROR");
        assert_eq!(body["extracted_text"], Value::Null);
    }
}

#[actix_web::test]
async fn test_upload_when_outcome_write_fails_expect_error_status() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    sqlx::query(
        "CREATE TRIGGER reject_ready BEFORE UPDATE OF status ON document
         WHEN NEW.status = 'READY'
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .execute(&env.state.db.pool)
    .await
    .unwrap();

    let body = upload(&app, &grace, upload_body("Cells", "cells.txt", b"Mitochondria", json!({}))).await;
    assert_eq!(body["status"], "ERROR");
    let id = body["id"].as_i64().unwrap();
    let stored = document::Manager::find_by_id(&env.state.db, id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status.as_str(), "ERROR");
}

#[actix_web::test]
async fn test_upload_when_insert_fails_expect_no_stored_file() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    sqlx::query(
        "CREATE TRIGGER reject_insert BEFORE INSERT ON document
         BEGIN SELECT RAISE(ABORT, 'disk full'); END;",
    )
    .execute(&env.state.db.pool)
    .await
    .unwrap();

    let req = test::TestRequest::post()
        .uri("/api/documents")
        .insert_header(auth(&grace))
        .set_json(upload_body("Cells", "cells.txt", b"Mitochondria", json!({})))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let leftover = std::fs::read_dir(env.state.config.documents_dir())
        .unwrap()
        .count();
    assert_eq!(leftover, 0);
}

#[actix_web::test]
async fn test_upload_with_invalid_payload_expect_bad_request() {
    let env = common::builder().max_upload_bytes(8).build().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    let cases = [
        upload_body("Slides", "slides.pptx", b"data", json!({})),
        upload_body("Empty", "empty.txt", b"", json!({})),
        upload_body("Large", "large.txt", b"more than eight bytes", json!({})),
        upload_body("Orphan", "orphan.txt", b"text", json!({"course": 999})),
        upload_body("  ", "blank.txt", b"text", json!({})),
        json!({"title": "Garbled", "file_name": "garbled.txt", "file_content": "%%%"}),
    ];
    for body in cases {
        let req = test::TestRequest::post()
            .uri("/api/documents")
            .insert_header(auth(&grace))
            .set_json(body)
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert!(body["error"].is_string());
    }
    let req = test::TestRequest::get()
        .uri("/api/documents")
        .insert_header(auth(&grace))
        .to_request();
    let (_, page) = send(&app, req).await;
    assert_eq!(page["count"], 0);
}

#[actix_web::test]
async fn test_document_visibility_per_role() {
    let env = common::setup().await;
    let admin = env.user("root", Role::Admin).await;
    let grace = env.user("grace", Role::Teacher).await;
    let alan = env.user("alan", Role::Teacher).await;
    let ada = env.user("ada", Role::Student).await;
    let app = env.app().await;
    let course_id = create_course(&app, &grace, "BIO101", false).await;
    course::Manager::enroll(&env.state.db, course_id, ada.id).await.unwrap();

    let private = upload(&app, &grace, upload_body("Private", "a.txt", b"a", json!({}))).await;
    let public = upload(&app, &grace, upload_body("Public", "b.txt", b"b", json!({"is_public": true}))).await;
    let coursework = upload(&app, &grace, upload_body("Course", "c.txt", b"c", json!({"course": course_id}))).await;
    let own = upload(&app, &ada, upload_body("Mine", "d.txt", b"d", json!({}))).await;
    let [private, public, coursework, own] =
        [&private, &public, &coursework, &own].map(|doc| doc["id"].as_i64().unwrap());

    let list = |user: &eduvoice::db::models::user::User| {
        test::TestRequest::get()
            .uri("/api/documents")
            .insert_header(auth(user))
            .to_request()
    };
    let all_ids = |page: &Value| {
        let mut found = ids(page);
        found.sort_unstable();
        (page["count"].as_i64().unwrap(), found)
    };

    let (_, page) = send(&app, list(&admin)).await;
    assert_eq!(page["count"], 4);

    let (_, page) = send(&app, list(&alan)).await;
    assert_eq!(all_ids(&page), (1, vec![public]));

    let (_, page) = send(&app, list(&grace)).await;
    assert_eq!(page["count"], 3);

    let (_, first) = send(&app, list(&ada)).await;
    assert_eq!(first["count"], 3);
    let next = first["next"].as_str().unwrap().to_owned();
    let req = test::TestRequest::get()
        .uri(&next[next.find("/api").unwrap()..])
        .insert_header(auth(&ada))
        .to_request();
    let (_, second) = send(&app, req).await;
    let mut seen = [ids(&first), ids(&second)].concat();
    seen.sort_unstable();
    assert_eq!(seen, vec![public, coursework, own]);

    for (user, id, expected) in [
        (&alan, private, StatusCode::NOT_FOUND),
        (&ada, private, StatusCode::NOT_FOUND),
        (&ada, coursework, StatusCode::OK),
        (&admin, own, StatusCode::OK),
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/documents/{id}/"))
            .insert_header(auth(user))
            .to_request();
        let (status, _) = send(&app, req).await;
        assert_eq!(status, expected, "user {} document {id}", user.username);
    }
}

#[actix_web::test]
async fn test_list_documents_pagination_envelope() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    for name in ["one", "two", "three"] {
        upload(&app, &grace, upload_body(name, &format!("{name}.txt"), name.as_bytes(), json!({}))).await;
    }

    let req = test::TestRequest::get()
        .uri("/api/documents/")
        .insert_header(auth(&grace))
        .to_request();
    let (status, page) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 3);
    assert_eq!(page["results"].as_array().unwrap().len(), 2);
    assert_eq!(page["previous"], Value::Null);
    assert!(page["next"].as_str().unwrap().ends_with("page=2"));
    assert!(page["results"][0].get("extracted_text").is_none());
    assert_eq!(page["results"][0]["title"], "three");

    let req = test::TestRequest::get()
        .uri("/api/documents?page=2")
        .insert_header(auth(&grace))
        .to_request();
    let (_, page) = send(&app, req).await;
    assert_eq!(page["results"].as_array().unwrap().len(), 1);
    assert_eq!(page["next"], Value::Null);
    assert!(page["previous"].is_string());

    for invalid in ["3", "0"] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/documents?page={invalid}"))
            .insert_header(auth(&grace))
            .to_request();
        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Invalid page.");
    }
}

#[actix_web::test]
async fn test_list_documents_filters_search_and_ordering() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let app = env.app().await;
    upload(&app, &grace, upload_body("Anatomy", "anatomy.md", b"# Bones\nThe femur.", json!({"subject": "Biology"}))).await;
    upload(&app, &grace, upload_body("Vectors", "vectors.txt", b"Dot products and the femur", json!({"subject": "Math"}))).await;

    let titles = |page: &Value| -> Vec<String> {
        page["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|document| document["title"].as_str().unwrap().to_owned())
            .collect()
    };
    for (query, expected) in [
        ("file_type=md", vec!["Anatomy"]),
        ("subject=Math", vec!["Vectors"]),
        ("status=READY&ordering=title", vec!["Anatomy", "Vectors"]),
        ("search=femur&ordering=-title", vec!["Vectors", "Anatomy"]),
        ("search=femur,dot", vec!["Vectors"]),
        ("status=ERROR", vec![]),
    ] {
        let req = test::TestRequest::get()
            .uri(&format!("/api/documents?{query}"))
            .insert_header(auth(&grace))
            .to_request();
        let (status, page) = send(&app, req).await;
        assert_eq!(status, StatusCode::OK, "{query}");
        assert_eq!(titles(&page), expected, "{query}");
    }

    let req = test::TestRequest::get()
        .uri("/api/documents?file_type=docx")
        .insert_header(auth(&grace))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_update_document_permissions() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let alan = env.user("alan", Role::Teacher).await;
    let ada = env.user("ada", Role::Student).await;
    let app = env.app().await;
    let course_id = create_course(&app, &grace, "BIO101", true).await;
    let doc = upload(
        &app,
        &grace,
        upload_body("Cells", "cells.txt", b"cells", json!({"is_public": true, "course": course_id})),
    )
    .await;
    let id = doc["id"].as_i64().unwrap();

    let req = test::TestRequest::patch()
        .uri(&format!("/api/documents/{id}"))
        .insert_header(auth(&ada))
        .set_json(json!({"title": "Mine now"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/documents/{id}"))
        .insert_header(auth(&alan))
        .set_json(json!({"subject": "Biology", "course": null}))
        .to_request();
    let (status, body) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subject"], "Biology");
    assert_eq!(body["course"], Value::Null);
    assert_eq!(body["title"], "Cells");

    let req = test::TestRequest::put()
        .uri(&format!("/api/documents/{id}"))
        .insert_header(auth(&grace))
        .set_json(json!({"description": "no title"}))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_document_removes_file() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let ada = env.user("ada", Role::Student).await;
    let app = env.app().await;
    let doc = upload(&app, &grace, upload_body("Cells", "cells.txt", b"cells", json!({"is_public": true}))).await;
    let id = doc["id"].as_i64().unwrap();
    let stored = env.state.config.media_root.join(doc["file"].as_str().unwrap());

    let req = test::TestRequest::delete()
        .uri(&format!("/api/documents/{id}/"))
        .insert_header(auth(&ada))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/documents/{id}/"))
        .insert_header(auth(&grace))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(!stored.exists());

    let req = test::TestRequest::get()
        .uri(&format!("/api/documents/{id}/"))
        .insert_header(auth(&grace))
        .to_request();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_my_documents_lists_only_own_uploads() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let ada = env.user("ada", Role::Student).await;
    let app = env.app().await;
    upload(&app, &grace, upload_body("Public", "p.txt", b"p", json!({"is_public": true}))).await;
    let own = upload(&app, &ada, upload_body("Notes", "n.txt", b"n", json!({}))).await;

    let req = test::TestRequest::get()
        .uri("/api/documents/my_documents/")
        .insert_header(auth(&ada))
        .to_request();
    let (status, page) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["count"], 1);
    assert_eq!(ids(&page), vec![own["id"].as_i64().unwrap()]);
}
