mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, assert_redirects, body_to_string, location, TestApp};

#[tokio::test]
async fn anonymous_company_views() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let index = app.get("/companies/", None).await?;
    assert_eq!(index.status(), StatusCode::OK);

    let new = app.get("/companies/new", None).await?;
    assert_redirects(&new, "/login/?next=/companies/new");

    let missing = app.get("/companies/1/", None).await?;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    let edit = app.get("/companies/1/edit", None).await?;
    assert_redirects(&edit, "/login/?next=/companies/1/edit");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn existing_company_is_shown() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let owner = app.insert_user("owner", "password", "user").await?;
    let company = app.insert_company(app.site_id, owner, "Tramcar").await?;

    let response = app.get(&format!("/companies/{company}/"), None).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let html = body_to_string(response.into_body()).await?;
    assert!(html.contains("Tramcar"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn owner_creates_and_edits_company() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("admin", "password", "user").await?;
    let cookie = app.login_cookie("admin", "password").await?;

    let form = app.get("/companies/new", Some(&cookie)).await?;
    assert_eq!(form.status(), StatusCode::OK);

    let created = app
        .post_form(
            "/companies/new",
            &[("name", "Tramcar"), ("url", "https://tramcar.org")],
            Some(&cookie),
        )
        .await?;
    assert_eq!(created.status(), StatusCode::FOUND);
    let show_path = location(&created).expect("redirect location").to_string();
    assert!(show_path.starts_with("/companies/"));

    let edit_path = format!("{show_path}edit");
    let edit_form = app.get(&edit_path, Some(&cookie)).await?;
    assert_eq!(edit_form.status(), StatusCode::OK);

    let updated = app
        .post_form(&edit_path, &[("name", "Tramcar Inc."), ("url", "")], Some(&cookie))
        .await?;
    assert_redirects(&updated, &show_path);

    let page = app.get(&show_path, None).await?;
    let html = body_to_string(page.into_body()).await?;
    assert!(html.contains("Tramcar Inc."));
    assert!(!html.contains("https:"));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn invalid_company_form_is_rerendered() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("admin", "password", "user").await?;
    let cookie = app.login_cookie("admin", "password").await?;

    let response = app
        .post_form("/companies/new", &[("name", " "), ("url", "nope")], Some(&cookie))
        .await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let html = body_to_string(response.into_body()).await?;
    assert!(html.contains("Name is required."));
    assert!(html.contains("Enter a valid URL."));

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn other_users_cannot_edit_company() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let owner = app.insert_user("owner", "password", "user").await?;
    app.insert_user("intruder", "password", "user").await?;
    app.insert_user("staff", "password", "admin").await?;
    let company = app.insert_company(app.site_id, owner, "Tramcar").await?;

    let intruder = app.login_cookie("intruder", "password").await?;
    let denied = app
        .get(&format!("/companies/{company}/edit"), Some(&intruder))
        .await?;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let staff = app.login_cookie("staff", "password").await?;
    let allowed = app
        .get(&format!("/companies/{company}/edit"), Some(&staff))
        .await?;
    assert_eq!(allowed.status(), StatusCode::OK);

    app.cleanup().await?;
    Ok(())
}
