mod common;

use anyhow::Result;
use learnhub::authz::Role;
use learnhub::errors::AppError;
use learnhub::models::class::{ClassCreateRequest, ClassUpdateRequest};
use learnhub::models::course::{CourseCreateRequest, CourseUpdateRequest};
use learnhub::models::project::ProjectCreateRequest;
use learnhub::services::{classes, courses, projects};

use common::{seed_course, seed_user, test_pool, ts};

fn course_request(mentor_id: Option<i64>, start: &str, end: &str) -> CourseCreateRequest {
    CourseCreateRequest {
        name: "Distributed Systems".to_string(),
        description: None,
        mentor_id,
        start_date: start.to_string(),
        end_date: end.to_string(),
    }
}

fn field_of(err: &AppError) -> Option<&str> {
    match err {
        AppError::Validation { field, .. } => Some(field.as_str()),
        _ => None,
    }
}

#[tokio::test]
async fn only_the_owning_mentor_updates_a_class() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let owner = seed_user(&pool, "m", Role::Mentor).await?;
    let other = seed_user(&pool, "n", Role::Mentor).await?;
    let admin = seed_user(&pool, "root", Role::Admin).await?;
    let course = seed_course(&pool, &owner, "01-03-2025 09:00", "30-06-2025 17:00").await?;
    let class = classes::create_class(
        &pool,
        &owner,
        course.id,
        ClassCreateRequest {
            name: "Consensus".to_string(),
            description: None,
            start_date: "05-03-2025 09:00".to_string(),
            end_date: "05-03-2025 12:00".to_string(),
        },
    )
    .await?;

    let rename = || ClassUpdateRequest {
        name: Some("Raft in practice".to_string()),
        ..Default::default()
    };

    let err = classes::update_class(&pool, &other, course.id, class.id, rename()).await.unwrap_err();
    assert_eq!(err.kind(), "forbidden");

    let (before, after) = classes::update_class(&pool, &owner, course.id, class.id, rename()).await?;
    assert_eq!(before.name, "Consensus");
    assert_eq!(after.name, "Raft in practice");
    assert_eq!(after.start_date, before.start_date);

    classes::update_class(&pool, &admin, course.id, class.id, rename()).await?;

    // Existence is reported before ownership.
    let err = classes::update_class(&pool, &other, course.id, class.id + 10, rename()).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");

    let err = classes::update_class(
        &pool,
        &owner,
        course.id,
        class.id,
        ClassUpdateRequest {
            end_date: Some("05-03-2025 08:00".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(field_of(&err), Some("start_date"));

    let err = classes::delete_class(&pool, &other, course.id, class.id).await.unwrap_err();
    assert_eq!(err.kind(), "forbidden");
    classes::delete_class(&pool, &owner, course.id, class.id).await?;
    Ok(())
}

#[tokio::test]
async fn course_creation_rules() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let mentor = seed_user(&pool, "mentor", Role::Mentor).await?;
    let admin = seed_user(&pool, "root", Role::Admin).await?;
    let student = seed_user(&pool, "student", Role::Student).await?;

    let err = courses::create_course(&pool, &student, course_request(None, "01-03-2025 09:00", "30-06-2025 17:00"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "forbidden");

    let err = courses::create_course(&pool, &admin, course_request(None, "01-03-2025 09:00", "30-06-2025 17:00"))
        .await
        .unwrap_err();
    assert_eq!(field_of(&err), Some("mentor_id"));

    let err = courses::create_course(
        &pool,
        &admin,
        course_request(Some(student.id), "01-03-2025 09:00", "30-06-2025 17:00"),
    )
    .await
    .unwrap_err();
    assert_eq!(field_of(&err), Some("mentor_id"));

    let assigned = courses::create_course(
        &pool,
        &admin,
        course_request(Some(mentor.id), "01-03-2025 09:00", "30-06-2025 17:00"),
    )
    .await?;
    assert_eq!(assigned.mentor_id, mentor.id);

    // A mentor always owns what they create, whatever mentor_id says.
    let own = courses::create_course(
        &pool,
        &mentor,
        course_request(Some(admin.id), "01-03-2025 09:00", "30-06-2025 17:00"),
    )
    .await?;
    assert_eq!(own.mentor_id, mentor.id);

    let err = courses::create_course(&pool, &mentor, course_request(None, "01-03-2025 09:00", "01-03-2025 09:00"))
        .await
        .unwrap_err();
    assert_eq!(field_of(&err), Some("start_date"), "equal start and end are rejected");

    let err = courses::create_course(&pool, &mentor, course_request(None, "2025-03-01", "30-06-2025 17:00"))
        .await
        .unwrap_err();
    assert_eq!(field_of(&err), Some("start_date"));

    let mut blank = course_request(None, "01-03-2025 09:00", "30-06-2025 17:00");
    blank.name = "   ".to_string();
    let err = courses::create_course(&pool, &mentor, blank).await.unwrap_err();
    assert_eq!(field_of(&err), Some("name"));
    Ok(())
}

#[tokio::test]
async fn course_updates_and_deletion() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let owner = seed_user(&pool, "owner", Role::Mentor).await?;
    let other = seed_user(&pool, "other", Role::Mentor).await?;
    let admin = seed_user(&pool, "root", Role::Admin).await?;
    let course = seed_course(&pool, &owner, "01-03-2025 09:00", "30-06-2025 17:00").await?;

    let err = courses::update_course(
        &pool,
        &other,
        course.id,
        CourseUpdateRequest {
            name: Some("Hijacked".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "forbidden");

    let err = courses::update_course(
        &pool,
        &owner,
        course.id,
        CourseUpdateRequest {
            mentor_id: Some(other.id),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind(), "forbidden", "mentors cannot hand a course away");

    let err = courses::update_course(
        &pool,
        &owner,
        course.id,
        CourseUpdateRequest {
            start_date: Some("01-07-2025 09:00".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(field_of(&err), Some("start_date"), "merged window must stay ordered");

    let (_, reassigned) = courses::update_course(
        &pool,
        &admin,
        course.id,
        CourseUpdateRequest {
            mentor_id: Some(other.id),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(reassigned.mentor_id, other.id);
    assert_eq!(reassigned.name, course.name);

    let err = courses::delete_course(&pool, &other, course.id).await.unwrap_err();
    assert_eq!(err.kind(), "forbidden", "even the owner cannot delete a course");

    courses::delete_course(&pool, &admin, course.id).await?;
    let err = courses::get_course(&pool, &owner, course.id).await.unwrap_err();
    assert_eq!(err.kind(), "not_found");
    Ok(())
}

#[tokio::test]
async fn course_end_cannot_move_before_a_project_deadline() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let mentor = seed_user(&pool, "mentor", Role::Mentor).await?;
    let course = seed_course(&pool, &mentor, "01-03-2025 09:00", "30-06-2025 17:00").await?;
    projects::create_project(
        &pool,
        &mentor,
        course.id,
        ProjectCreateRequest {
            name: "Key-value store".to_string(),
            description: None,
            deadline: "15-06-2025 23:59".to_string(),
        },
    )
    .await?;

    let shrink_to = |end: &str| CourseUpdateRequest {
        end_date: Some(end.to_string()),
        ..Default::default()
    };

    let err = courses::update_course(&pool, &mentor, course.id, shrink_to("01-04-2025 10:00"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "validation_failed");
    assert_eq!(field_of(&err), Some("end_date"));

    let unchanged = courses::get_course(&pool, &mentor, course.id).await?;
    assert_eq!(unchanged.end_date, course.end_date);

    // Ending exactly at the deadline is allowed.
    let (_, updated) = courses::update_course(&pool, &mentor, course.id, shrink_to("15-06-2025 23:59")).await?;
    assert_eq!(updated.end_date, ts("15-06-2025 23:59"));
    Ok(())
}
