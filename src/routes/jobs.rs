use askama::Template;
use axum::{
    extract::{OriginalUri, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use chrono::Utc;
use diesel::{pg::PgConnection, prelude::*};

use crate::auth::{found, path_and_query, policy, AuthenticatedUser, LoginRedirect, OptionalUser};
use crate::error::{AppError, AppResult};
use crate::forms::{FormErrors, JobForm, ValidJob};
use crate::jobs::{
    activate_job, create_job, describe_jobs, expire_job, find_job, list_active_jobs,
    list_user_jobs,
};
use crate::models::{Category, Company, Job, JobChangeset, NewJob};
use crate::pages::{JobFormPage, JobRow, JobShowPage, JobsIndexPage, SelectOption};
use crate::schema::{categories, companies, jobs};
use crate::site::CurrentSite;
use crate::state::AppState;

use super::companies::find_company;

pub async fn jobs_index(
    State(state): State<AppState>,
    site: CurrentSite,
    user: OptionalUser,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;
    let active = list_active_jobs(&mut conn, site.id(), None)?;
    let listings = describe_jobs(&mut conn, active)?;

    let page = JobsIndexPage {
        title: "Jobs".to_string(),
        username: user.username(),
        jobs: listings.iter().map(JobRow::from).collect(),
        show_state: false,
    };
    Ok(Html(page.render()?))
}

pub async fn jobs_mine(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;
    let own = list_user_jobs(&mut conn, site.id(), user.user_id)?;
    let listings = describe_jobs(&mut conn, own)?;

    let page = JobsIndexPage {
        title: "My jobs".to_string(),
        username: user.username,
        jobs: listings.iter().map(JobRow::from).collect(),
        show_state: true,
    };
    Ok(Html(page.render()?))
}

pub async fn jobs_show(
    State(state): State<AppState>,
    user: OptionalUser,
    site: CurrentSite,
    Path(job_id): Path<i32>,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;
    let job = find_job(&mut conn, site.id(), job_id)?.ok_or_else(AppError::not_found)?;

    let company: Company = companies::table.find(job.company_id).first(&mut conn)?;
    let category: Category = categories::table.find(job.category_id).first(&mut conn)?;
    let viewer = user.0.as_ref();

    let page = JobShowPage {
        title: job.title.clone(),
        username: user.username(),
        job_id: job.id,
        state: job.state().as_str(),
        can_edit: viewer.is_some_and(|viewer| policy::can_manage(viewer, job.user_id)),
        can_activate: viewer.is_some_and(policy::is_staff),
        description: job.description,
        application_info: job.application_info,
        email: job.email,
        company_id: company.id,
        company_name: company.name,
        category_id: category.id,
        category_name: category.name,
    };
    Ok(Html(page.render()?))
}

pub async fn jobs_new(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;
    let page = job_form_page(
        &mut conn,
        &user,
        site.id(),
        "New job",
        "/jobs/new/",
        JobForm::default(),
        Vec::new(),
    )?;
    Ok(Html(page.render()?))
}

pub async fn jobs_create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Form(form): Form<JobForm>,
) -> AppResult<Response> {
    let mut conn = state.db()?;

    let valid = match validate_job(&mut conn, &user, site.id(), &form)? {
        Ok(valid) => valid,
        Err(errors) => {
            let page = job_form_page(
                &mut conn,
                &user,
                site.id(),
                "New job",
                "/jobs/new/",
                form,
                errors,
            )?;
            return Ok((StatusCode::BAD_REQUEST, Html(page.render()?)).into_response());
        }
    };

    let job = create_job(
        &mut conn,
        &NewJob {
            title: valid.title,
            description: valid.description,
            application_info: valid.application_info,
            email: valid.email,
            category_id: valid.category_id,
            company_id: valid.company_id,
            site_id: site.id(),
            user_id: user.user_id,
        },
    )?;

    tracing::info!(
        job_id = job.id,
        site_id = site.id(),
        user_id = %user.user_id,
        "job created"
    );
    Ok(found(&show_path(job.id)))
}

pub async fn jobs_edit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Path(job_id): Path<i32>,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;
    let job = managed_job(&mut conn, &user, site.id(), job_id)?;

    let form = JobForm {
        title: job.title.clone(),
        description: job.description.clone(),
        application_info: job.application_info.clone(),
        email: job.email.clone(),
        category: job.category_id.to_string(),
        company: job.company_id.to_string(),
    };
    let page = job_form_page(
        &mut conn,
        &user,
        site.id(),
        &format!("Edit {}", job.title),
        &edit_path(job.id),
        form,
        Vec::new(),
    )?;
    Ok(Html(page.render()?))
}

pub async fn jobs_update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Path(job_id): Path<i32>,
    Form(form): Form<JobForm>,
) -> AppResult<Response> {
    let mut conn = state.db()?;
    let job = managed_job(&mut conn, &user, site.id(), job_id)?;

    let valid = match validate_job(&mut conn, &user, site.id(), &form)? {
        Ok(valid) => valid,
        Err(errors) => {
            let page = job_form_page(
                &mut conn,
                &user,
                site.id(),
                &format!("Edit {}", job.title),
                &edit_path(job.id),
                form,
                errors,
            )?;
            return Ok((StatusCode::BAD_REQUEST, Html(page.render()?)).into_response());
        }
    };

    diesel::update(jobs::table.find(job.id))
        .set(&JobChangeset {
            title: &valid.title,
            description: &valid.description,
            application_info: &valid.application_info,
            email: &valid.email,
            category_id: valid.category_id,
            company_id: valid.company_id,
            updated_at: Utc::now().naive_utc(),
        })
        .execute(&mut conn)?;

    tracing::info!(job_id = job.id, site_id = site.id(), "job updated");
    Ok(found(&show_path(job.id)))
}

/// Staff only. Anyone else is sent to log in as someone who may.
pub async fn jobs_activate(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    user: AuthenticatedUser,
    site: CurrentSite,
    Path(job_id): Path<i32>,
) -> AppResult<Response> {
    if !policy::is_staff(&user) {
        tracing::debug!(job_id, user_id = %user.user_id, "activation requires staff");
        return Ok(LoginRedirect::new(path_and_query(&uri)).into_response());
    }

    let mut conn = state.db()?;
    let job = find_job(&mut conn, site.id(), job_id)?.ok_or_else(AppError::not_found)?;
    activate_job(&mut conn, &job)?;

    Ok(found(&show_path(job.id)))
}

pub async fn jobs_expire(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Path(job_id): Path<i32>,
) -> AppResult<Response> {
    let mut conn = state.db()?;
    let job = managed_job(&mut conn, &user, site.id(), job_id)?;
    expire_job(&mut conn, &job)?;

    Ok(found(&show_path(job.id)))
}

fn show_path(job_id: i32) -> String {
    format!("/jobs/{job_id}/")
}

fn edit_path(job_id: i32) -> String {
    format!("/jobs/{job_id}/edit")
}

fn managed_job(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    site_id: i32,
    job_id: i32,
) -> AppResult<Job> {
    let job = find_job(conn, site_id, job_id)?.ok_or_else(AppError::not_found)?;
    if !policy::can_manage(user, job.user_id) {
        tracing::warn!(job_id, user_id = %user.user_id, "job change denied");
        return Err(AppError::forbidden());
    }
    Ok(job)
}

/// Field validation plus the checks that need the database: the category must
/// belong to the site and the company must be one the user may post for.
fn validate_job(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    site_id: i32,
    form: &JobForm,
) -> AppResult<Result<ValidJob, FormErrors>> {
    let valid = match form.clean() {
        Ok(valid) => valid,
        Err(errors) => return Ok(Err(errors)),
    };

    let mut errors = Vec::new();

    let category_exists = categories::table
        .filter(categories::site_id.eq(site_id))
        .filter(categories::id.eq(valid.category_id))
        .first::<Category>(conn)
        .optional()?
        .is_some();
    if !category_exists {
        errors.push("Select a valid category.".to_string());
    }

    let company_allowed = find_company(conn, site_id, valid.company_id)?
        .is_some_and(|company| policy::can_manage(user, company.user_id));
    if !company_allowed {
        errors.push("Select a valid company.".to_string());
    }

    Ok(if errors.is_empty() {
        Ok(valid)
    } else {
        Err(errors)
    })
}

fn job_form_page(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    site_id: i32,
    title: &str,
    action: &str,
    form: JobForm,
    errors: FormErrors,
) -> AppResult<JobFormPage> {
    let category_list: Vec<Category> = categories::table
        .filter(categories::site_id.eq(site_id))
        .order(categories::name.asc())
        .load(conn)?;

    let mut company_query = companies::table
        .filter(companies::site_id.eq(site_id))
        .into_boxed();
    if !policy::is_staff(user) {
        company_query = company_query.filter(companies::user_id.eq(user.user_id));
    }
    let company_list: Vec<Company> = company_query.order(companies::name.asc()).load(conn)?;

    let selected = |raw: &str, id: i32| raw.trim() == id.to_string();

    Ok(JobFormPage {
        title: title.to_string(),
        username: user.username.clone(),
        action: action.to_string(),
        categories: category_list
            .into_iter()
            .map(|category| SelectOption {
                selected: selected(&form.category, category.id),
                id: category.id,
                name: category.name,
            })
            .collect(),
        companies: company_list
            .into_iter()
            .map(|company| SelectOption {
                selected: selected(&form.company, company.id),
                id: company.id,
                name: company.name,
            })
            .collect(),
        job_title: form.title,
        description: form.description,
        application_info: form.application_info,
        email: form.email,
        errors,
    })
}
