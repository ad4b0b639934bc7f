use eduvoice::db::init::connect;
use tempfile::tempdir;

#[actix_web::test]
async fn test_connect_when_sqlite_file_missing_expect_created_and_migrated() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("fresh.sqlite3");
    let conn = connect(&format!("sqlite://{}", path.display())).await.unwrap();
    assert!(path.exists());
    let (tables,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('user', 'course', 'course_student', 'document', 'conversion_job')",
    )
    .fetch_one(&conn.pool)
    .await
    .unwrap();
    assert_eq!(tables, 5);
}

#[actix_web::test]
async fn test_connect_when_not_sqlite_expect_error() {
    let actual = connect("postgres://localhost/eduvoice").await.unwrap_err();
    let expected = "Unsupported database URL";
    assert!(
        actual.to_string().contains(expected),
        "\"{actual}\" doesn't contain {expected}"
    );
}
