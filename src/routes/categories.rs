use askama::Template;
use axum::{
    extract::{Path, State},
    response::Html,
};
use diesel::prelude::*;

use crate::auth::OptionalUser;
use crate::error::AppResult;
use crate::jobs::{active_job_counts, describe_jobs, list_active_jobs};
use crate::models::Category;
use crate::pages::{CategoriesIndexPage, CategoryRow, JobRow, JobsIndexPage};
use crate::schema::categories;
use crate::site::CurrentSite;
use crate::state::AppState;

pub async fn categories_index(
    State(state): State<AppState>,
    site: CurrentSite,
    user: OptionalUser,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;

    let category_list: Vec<Category> = categories::table
        .filter(categories::site_id.eq(site.id()))
        .order(categories::name.asc())
        .load(&mut conn)?;
    let counts = active_job_counts(&mut conn, site.id())?;

    let page = CategoriesIndexPage {
        title: "Categories".to_string(),
        username: user.username(),
        categories: category_list
            .into_iter()
            .map(|category| CategoryRow {
                active_jobs: counts.get(&category.id).copied().unwrap_or(0),
                id: category.id,
                name: category.name,
            })
            .collect(),
    };

    Ok(Html(page.render()?))
}

pub async fn categories_show(
    State(state): State<AppState>,
    site: CurrentSite,
    user: OptionalUser,
    Path(category_id): Path<i32>,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;

    let category: Option<Category> = categories::table
        .filter(categories::site_id.eq(site.id()))
        .filter(categories::id.eq(category_id))
        .first(&mut conn)
        .optional()?;

    // An unknown category lists nothing rather than 404ing.
    let jobs = list_active_jobs(&mut conn, site.id(), Some(category_id))?;
    let listings = describe_jobs(&mut conn, jobs)?;

    let page = JobsIndexPage {
        title: category
            .map(|category| category.name)
            .unwrap_or_else(|| "Jobs".to_string()),
        username: user.username(),
        jobs: listings.iter().map(JobRow::from).collect(),
        show_state: false,
    };

    Ok(Html(page.render()?))
}
