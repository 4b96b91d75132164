//! Page templates. Each struct renders one file under `templates/`.

use askama::Template;

use crate::jobs::JobListing;

#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: i32,
    pub title: String,
    pub company_name: String,
    pub category_name: String,
    pub posted_on: String,
    pub state: &'static str,
}

impl From<&JobListing> for JobRow {
    fn from(listing: &JobListing) -> Self {
        let job = &listing.job;
        JobRow {
            id: job.id,
            title: job.title.clone(),
            company_name: listing.company_name.clone(),
            category_name: listing.category_name.clone(),
            posted_on: job
                .paid_at
                .unwrap_or(job.created_at)
                .format("%Y-%m-%d")
                .to_string(),
            state: job.state().as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SelectOption {
    pub id: i32,
    pub name: String,
    pub selected: bool,
}

#[derive(Debug, Clone)]
pub struct CategoryRow {
    pub id: i32,
    pub name: String,
    pub active_jobs: i64,
}

#[derive(Debug, Clone)]
pub struct CompanyRow {
    pub id: i32,
    pub name: String,
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorPage {
    pub title: String,
    pub username: String,
    pub status: u16,
    pub message: String,
}

#[derive(Template)]
#[template(path = "jobs_index.html")]
pub struct JobsIndexPage {
    pub title: String,
    pub username: String,
    pub jobs: Vec<JobRow>,
    pub show_state: bool,
}

#[derive(Template)]
#[template(path = "jobs_show.html")]
pub struct JobShowPage {
    pub title: String,
    pub username: String,
    pub job_id: i32,
    pub description: String,
    pub application_info: String,
    pub email: String,
    pub company_id: i32,
    pub company_name: String,
    pub category_id: i32,
    pub category_name: String,
    pub state: &'static str,
    pub can_edit: bool,
    pub can_activate: bool,
}

#[derive(Template)]
#[template(path = "job_form.html")]
pub struct JobFormPage {
    pub title: String,
    pub username: String,
    pub action: String,
    pub job_title: String,
    pub description: String,
    pub application_info: String,
    pub email: String,
    pub categories: Vec<SelectOption>,
    pub companies: Vec<SelectOption>,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "categories_index.html")]
pub struct CategoriesIndexPage {
    pub title: String,
    pub username: String,
    pub categories: Vec<CategoryRow>,
}

#[derive(Template)]
#[template(path = "companies_index.html")]
pub struct CompaniesIndexPage {
    pub title: String,
    pub username: String,
    pub companies: Vec<CompanyRow>,
}

#[derive(Template)]
#[template(path = "companies_show.html")]
pub struct CompanyShowPage {
    pub title: String,
    pub username: String,
    pub company_id: i32,
    pub url: String,
    pub can_edit: bool,
    pub jobs: Vec<JobRow>,
}

#[derive(Template)]
#[template(path = "company_form.html")]
pub struct CompanyFormPage {
    pub title: String,
    pub username: String,
    pub action: String,
    pub name: String,
    pub url: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    pub title: String,
    pub username: String,
    pub form_username: String,
    pub next: String,
    pub errors: Vec<String>,
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterPage {
    pub title: String,
    pub username: String,
    pub form_username: String,
    pub errors: Vec<String>,
}
