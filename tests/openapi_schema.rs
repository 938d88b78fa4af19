use anyhow::Result;

#[test]
fn openapi_lists_workflow_paths_and_schemas() -> Result<()> {
    let doc = learnhub::docs::build_openapi(8000);
    let json = serde_json::to_value(&doc)?;

    let paths = json["paths"].as_object().expect("paths object");
    for path in [
        "/api/auth/register",
        "/api/courses",
        "/api/courses/{course_id}/enrollments",
        "/api/courses/{course_id}/enrollments/{learner_id}",
        "/api/courses/{course_id}/classes/{class_id}/attendances",
        "/api/courses/{course_id}/projects/{project_id}/submissions",
        "/api/submissions/{submission_id}/grade",
    ] {
        assert!(paths.contains_key(path), "missing path {path}");
    }

    let schemas = json["components"]["schemas"].as_object().expect("schemas object");
    for schema in ["Course", "Class", "Project", "Enrollment", "EnrollmentStatus", "Submission", "Attendance", "Role"] {
        assert!(schemas.contains_key(schema), "missing schema {schema}");
    }

    assert!(json["components"]["securitySchemes"]["bearer_auth"].is_object());
    assert_eq!(json["servers"][0]["url"], "http://localhost:8000");
    Ok(())
}
