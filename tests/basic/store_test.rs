use crate::common;
use eduvoice::access::{CourseScope, DocumentScope};
use eduvoice::db::models::course::{self, CourseQuery, NewCourse};
use eduvoice::db::models::document::{self, DocumentQuery, FileType, NewDocument};
use eduvoice::db::models::status::Status;
use eduvoice::db::models::user::Role;

fn new_document(title: &str, uploaded_by: i64, course_id: Option<i64>) -> NewDocument {
    NewDocument {
        title: title.to_owned(),
        description: String::new(),
        file: format!("documents/{title}.txt"),
        file_type: FileType::Txt,
        subject: String::new(),
        is_public: false,
        course_id,
        uploaded_by,
        file_size: 1,
    }
}

#[actix_web::test]
async fn test_delete_course_detaches_documents() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let db = &env.state.db;
    let created = course::Manager::create(
        db,
        &NewCourse {
            name: "Biology".into(),
            code: "BIO101".into(),
            description: String::new(),
            is_active: true,
            created_by: grace.id,
        },
    )
    .await
    .unwrap();
    let doc = document::Manager::create(db, &new_document("cells", grace.id, Some(created.id)))
        .await
        .unwrap();
    assert_eq!(doc.status, Status::Pending);

    course::Manager::delete(db, created.id).await.unwrap();
    let doc = document::Manager::find_by_id(db, doc.id).await.unwrap().unwrap();
    assert_eq!(doc.course_id, None);
}

#[actix_web::test]
async fn test_set_status_keeps_text_when_none_given() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let db = &env.state.db;
    let doc = document::Manager::create(db, &new_document("cells", grace.id, None))
        .await
        .unwrap();
    document::Manager::set_status(db, doc.id, Status::Ready, Some("text"))
        .await
        .unwrap();
    document::Manager::set_status(db, doc.id, Status::Ready, None)
        .await
        .unwrap();
    let doc = document::Manager::find_by_id(db, doc.id).await.unwrap().unwrap();
    assert_eq!(doc.extracted_text.as_deref(), Some("text"));
    assert!(doc.has_text());
}

#[actix_web::test]
async fn test_learner_scope_includes_enrolled_course_documents() {
    let env = common::setup().await;
    let grace = env.user("grace", Role::Teacher).await;
    let ada = env.user("ada", Role::Student).await;
    let db = &env.state.db;
    let created = course::Manager::create(
        db,
        &NewCourse {
            name: "Biology".into(),
            code: "BIO101".into(),
            description: String::new(),
            is_active: false,
            created_by: grace.id,
        },
    )
    .await
    .unwrap();
    document::Manager::create(db, &new_document("cells", grace.id, Some(created.id)))
        .await
        .unwrap();

    let scope = DocumentScope::Learner(ada.id);
    let (count, _) = document::Manager::find_visible(db, &scope, &DocumentQuery::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(count, 0);
    let courses = course::Manager::find_visible(db, &CourseScope::EnrolledOrActive(ada.id), &CourseQuery::default())
        .await
        .unwrap();
    assert!(courses.is_empty());

    course::Manager::enroll(db, created.id, ada.id).await.unwrap();
    let (count, rows) = document::Manager::find_visible(db, &scope, &DocumentQuery::default(), 10, 0)
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert_eq!(rows[0].title, "cells");
    let courses = course::Manager::find_visible(db, &CourseScope::EnrolledOrActive(ada.id), &CourseQuery::default())
        .await
        .unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0].id, created.id);
}
