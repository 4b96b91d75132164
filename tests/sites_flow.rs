mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_to_string, TestApp};

#[tokio::test]
async fn host_selects_the_site() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let owner = app.insert_user("owner", "password", "user").await?;
    let other_site = app.insert_site("jobs.example.org", "Other jobs").await?;

    let home_company = app.insert_company(app.site_id, owner, "Tramcar").await?;
    let home_category = app.insert_category(app.site_id, "Software").await?;
    let home_job = app
        .insert_job(app.site_id, home_category, home_company, owner, "Home Job")
        .await?;
    app.activate(home_job).await?;

    let other_company = app.insert_company(other_site, owner, "Elsewhere").await?;
    let other_category = app.insert_category(other_site, "Operations").await?;
    let other_job = app
        .insert_job(other_site, other_category, other_company, owner, "Other Job")
        .await?;
    app.activate(other_job).await?;

    let home = app.get_with_host("/jobs/", "example.com").await?;
    let html = body_to_string(home.into_body()).await?;
    assert!(html.contains("Home Job"));
    assert!(!html.contains("Other Job"));

    let other = app.get_with_host("/jobs/", "Jobs.Example.org:8080").await?;
    let html = body_to_string(other.into_body()).await?;
    assert!(html.contains("Other Job"));
    assert!(!html.contains("Home Job"));

    // Unknown hosts fall back to the default site.
    let fallback = app.get_with_host("/jobs/", "unknown.test").await?;
    let html = body_to_string(fallback.into_body()).await?;
    assert!(html.contains("Home Job"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn records_of_another_site_are_not_found() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let owner = app.insert_user("owner", "password", "user").await?;
    let other_site = app.insert_site("jobs.example.org", "Other jobs").await?;
    let company = app.insert_company(other_site, owner, "Elsewhere").await?;
    let category = app.insert_category(other_site, "Operations").await?;
    let job = app
        .insert_job(other_site, category, company, owner, "Other Job")
        .await?;

    let show_job = app.get_with_host(&format!("/jobs/{job}/"), "example.com").await?;
    assert_eq!(show_job.status(), StatusCode::NOT_FOUND);

    let show_company = app
        .get_with_host(&format!("/companies/{company}/"), "example.com")
        .await?;
    assert_eq!(show_company.status(), StatusCode::NOT_FOUND);

    let visible = app
        .get_with_host(&format!("/jobs/{job}/"), "jobs.example.org")
        .await?;
    assert_eq!(visible.status(), StatusCode::OK);

    app.cleanup().await?;
    Ok(())
}
