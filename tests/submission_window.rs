mod common;

use anyhow::Result;
use learnhub::authz::Role;
use learnhub::models::project::ProjectCreateRequest;
use learnhub::services::projects;
use learnhub::services::submissions::{self, GradeError, SubmitError};

use common::{seed_course, seed_user, test_pool, ts};

fn project_request() -> ProjectCreateRequest {
    ProjectCreateRequest {
        name: "Key-value store".to_string(),
        description: None,
        deadline: "15-06-2025 23:59".to_string(),
    }
}

#[tokio::test]
async fn submissions_only_inside_the_course_window() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let mentor = seed_user(&pool, "mentor", Role::Mentor).await?;
    let student = seed_user(&pool, "student", Role::Student).await?;
    let admin = seed_user(&pool, "root", Role::Admin).await?;
    let course = seed_course(&pool, &mentor, "01-03-2025 09:00", "30-06-2025 17:00").await?;
    let project = projects::create_project(&pool, &mentor, course.id, project_request()).await?;

    let err = submissions::submit_project(&pool, &student, course.id, project.id, "kv.zip", ts("01-03-2025 08:59"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::TooEarly { .. }));

    let err = submissions::submit_project(&pool, &student, course.id, project.id, "kv.zip", ts("30-06-2025 17:01"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::TooLate { .. }));

    // Both window edges are inclusive.
    let at_open = submissions::submit_project(&pool, &student, course.id, project.id, "kv.zip", ts("01-03-2025 09:00")).await?;
    assert_eq!(at_open.score, 0);
    assert_eq!(at_open.learner_id, student.id);
    assert!(at_open.grading_note.is_none());
    submissions::submit_project(&pool, &student, course.id, project.id, "kv-v2.zip", ts("30-06-2025 17:00")).await?;

    for staff in [mentor, admin] {
        let err = submissions::submit_project(&pool, &staff, course.id, project.id, "kv.zip", ts("01-04-2025 10:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmitError::Forbidden(_)), "{:?} may not submit", staff.role);
    }

    let err = submissions::submit_project(&pool, &student, course.id, project.id + 50, "kv.zip", ts("01-04-2025 10:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::ProjectNotFound { .. }));

    let err = submissions::submit_project(&pool, &student, course.id, project.id, "  ", ts("01-04-2025 10:00"))
        .await
        .unwrap_err();
    assert!(matches!(err, SubmitError::Invalid(_)));

    assert_eq!(submissions::list_submissions(&pool, &student, course.id, project.id).await?.len(), 2);
    Ok(())
}

#[tokio::test]
async fn grading_bounds_are_inclusive() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let mentor = seed_user(&pool, "mentor", Role::Mentor).await?;
    let student = seed_user(&pool, "student", Role::Student).await?;
    let course = seed_course(&pool, &mentor, "01-03-2025 09:00", "30-06-2025 17:00").await?;
    let project = projects::create_project(&pool, &mentor, course.id, project_request()).await?;
    let submission =
        submissions::submit_project(&pool, &student, course.id, project.id, "kv.zip", ts("01-04-2025 10:00")).await?;
    let now = ts("02-04-2025 10:00");

    let err = submissions::grade_submission(&pool, &mentor, submission.id, 150, None, now)
        .await
        .unwrap_err();
    assert!(matches!(err, GradeError::ScoreOutOfRange(150)));
    let err = submissions::grade_submission(&pool, &mentor, submission.id, -1, None, now)
        .await
        .unwrap_err();
    assert!(matches!(err, GradeError::ScoreOutOfRange(-1)));

    let (_, graded) =
        submissions::grade_submission(&pool, &mentor, submission.id, 100, Some("Excellent".to_string()), now).await?;
    assert_eq!(graded.score, 100);
    assert_eq!(graded.grading_note.as_deref(), Some("Excellent"));
    assert_eq!(graded.file_reference, submission.file_reference);
    assert_eq!(graded.submitted_at, submission.submitted_at);

    let (before, regraded) = submissions::grade_submission(&pool, &mentor, submission.id, 0, None, now).await?;
    assert_eq!(before.score, 100);
    assert_eq!(regraded.score, 0);
    assert_eq!(regraded.grading_note.as_deref(), Some("Excellent"), "a missing note keeps the old one");

    let err = submissions::grade_submission(&pool, &student, submission.id, 90, None, now)
        .await
        .unwrap_err();
    assert!(matches!(err, GradeError::Forbidden(_)));

    let err = submissions::grade_submission(&pool, &mentor, 4_242, 90, None, now).await.unwrap_err();
    assert!(matches!(err, GradeError::NotFound(4_242)));

    // Role is checked before existence.
    let err = submissions::grade_submission(&pool, &student, 4_242, 90, None, now).await.unwrap_err();
    assert!(matches!(err, GradeError::Forbidden(_)));
    Ok(())
}

#[tokio::test]
async fn deadline_may_not_outlive_the_course() -> Result<()> {
    let (_dir, pool) = test_pool().await?;
    let mentor = seed_user(&pool, "mentor", Role::Mentor).await?;
    let course = seed_course(&pool, &mentor, "01-03-2025 09:00", "30-06-2025 17:00").await?;

    let mut req = project_request();
    req.deadline = "30-06-2025 17:00".to_string();
    projects::create_project(&pool, &mentor, course.id, req).await?;

    let mut req = project_request();
    req.deadline = "01-07-2025 09:00".to_string();
    let err = projects::create_project(&pool, &mentor, course.id, req).await.unwrap_err();
    assert_eq!(err.kind(), "validation_failed");
    Ok(())
}
