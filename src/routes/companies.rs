use askama::Template;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use diesel::{pg::PgConnection, prelude::*};

use crate::auth::{found, policy, AuthenticatedUser, OptionalUser};
use crate::error::{AppError, AppResult};
use crate::forms::CompanyForm;
use crate::jobs::{describe_jobs, list_company_jobs};
use crate::models::{Company, CompanyChangeset, NewCompany};
use crate::pages::{CompaniesIndexPage, CompanyFormPage, CompanyRow, CompanyShowPage, JobRow};
use crate::schema::companies;
use crate::site::CurrentSite;
use crate::state::AppState;

pub fn find_company(
    conn: &mut PgConnection,
    site_id: i32,
    company_id: i32,
) -> QueryResult<Option<Company>> {
    companies::table
        .filter(companies::site_id.eq(site_id))
        .filter(companies::id.eq(company_id))
        .first(conn)
        .optional()
}

pub async fn companies_index(
    State(state): State<AppState>,
    site: CurrentSite,
    user: OptionalUser,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;

    let company_list: Vec<Company> = companies::table
        .filter(companies::site_id.eq(site.id()))
        .order(companies::name.asc())
        .load(&mut conn)?;

    let page = CompaniesIndexPage {
        title: "Companies".to_string(),
        username: user.username(),
        companies: company_list
            .into_iter()
            .map(|company| CompanyRow {
                id: company.id,
                name: company.name,
            })
            .collect(),
    };

    Ok(Html(page.render()?))
}

pub async fn companies_show(
    State(state): State<AppState>,
    user: OptionalUser,
    site: CurrentSite,
    Path(company_id): Path<i32>,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;

    let company = find_company(&mut conn, site.id(), company_id)?.ok_or_else(AppError::not_found)?;
    let jobs = list_company_jobs(&mut conn, site.id(), company.id)?;
    let listings = describe_jobs(&mut conn, jobs)?;

    let page = CompanyShowPage {
        can_edit: user
            .0
            .as_ref()
            .is_some_and(|user| policy::can_manage(user, company.user_id)),
        username: user.username(),
        title: company.name,
        company_id: company.id,
        url: company.url.unwrap_or_default(),
        jobs: listings.iter().map(JobRow::from).collect(),
    };

    Ok(Html(page.render()?))
}

pub async fn companies_new(user: AuthenticatedUser) -> AppResult<Html<String>> {
    let page = CompanyFormPage {
        title: "New company".to_string(),
        username: user.username,
        action: "/companies/new".to_string(),
        name: String::new(),
        url: String::new(),
        errors: Vec::new(),
    };
    Ok(Html(page.render()?))
}

pub async fn companies_create(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Form(form): Form<CompanyForm>,
) -> AppResult<Response> {
    let valid = match form.clean() {
        Ok(valid) => valid,
        Err(errors) => {
            return invalid_form("New company", "/companies/new", &user, form, errors);
        }
    };

    let mut conn = state.db()?;
    let company: Company = diesel::insert_into(companies::table)
        .values(&NewCompany {
            name: valid.name,
            url: valid.url,
            site_id: site.id(),
            user_id: user.user_id,
        })
        .get_result(&mut conn)?;

    tracing::info!(
        company_id = company.id,
        site_id = site.id(),
        user_id = %user.user_id,
        "company created"
    );
    Ok(found(&format!("/companies/{}/", company.id)))
}

pub async fn companies_edit(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Path(company_id): Path<i32>,
) -> AppResult<Html<String>> {
    let mut conn = state.db()?;
    let company = managed_company(&mut conn, &user, site.id(), company_id)?;

    let page = CompanyFormPage {
        title: format!("Edit {}", company.name),
        username: user.username,
        action: format!("/companies/{}/edit", company.id),
        name: company.name,
        url: company.url.unwrap_or_default(),
        errors: Vec::new(),
    };
    Ok(Html(page.render()?))
}

pub async fn companies_update(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    site: CurrentSite,
    Path(company_id): Path<i32>,
    Form(form): Form<CompanyForm>,
) -> AppResult<Response> {
    let mut conn = state.db()?;
    let company = managed_company(&mut conn, &user, site.id(), company_id)?;

    let valid = match form.clean() {
        Ok(valid) => valid,
        Err(errors) => {
            let action = format!("/companies/{}/edit", company.id);
            let title = format!("Edit {}", company.name);
            return invalid_form(&title, &action, &user, form, errors);
        }
    };

    diesel::update(companies::table.find(company.id))
        .set(&CompanyChangeset {
            name: &valid.name,
            url: valid.url.as_deref(),
        })
        .execute(&mut conn)?;

    tracing::info!(company_id = company.id, site_id = site.id(), "company updated");
    Ok(found(&format!("/companies/{}/", company.id)))
}

fn managed_company(
    conn: &mut PgConnection,
    user: &AuthenticatedUser,
    site_id: i32,
    company_id: i32,
) -> AppResult<Company> {
    let company = find_company(conn, site_id, company_id)?.ok_or_else(AppError::not_found)?;
    if !policy::can_manage(user, company.user_id) {
        tracing::warn!(company_id, user_id = %user.user_id, "company edit denied");
        return Err(AppError::forbidden());
    }
    Ok(company)
}

fn invalid_form(
    title: &str,
    action: &str,
    user: &AuthenticatedUser,
    form: CompanyForm,
    errors: Vec<String>,
) -> AppResult<Response> {
    let page = CompanyFormPage {
        title: title.to_string(),
        username: user.username.clone(),
        action: action.to_string(),
        name: form.name,
        url: form.url,
        errors,
    };
    Ok((StatusCode::BAD_REQUEST, Html(page.render()?)).into_response())
}
