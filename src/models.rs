use chrono::NaiveDateTime;
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::*;

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = sites)]
pub struct Site {
    pub id: i32,
    pub domain: String,
    pub name: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = sites)]
pub struct NewSite {
    pub domain: String,
    pub name: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = site_configs)]
#[diesel(primary_key(site_id))]
#[diesel(belongs_to(Site))]
pub struct SiteConfig {
    pub site_id: i32,
    pub expire_after_days: i32,
    pub admin_email: Option<String>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = site_configs)]
pub struct NewSiteConfig {
    pub site_id: i32,
    pub expire_after_days: i32,
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Queryable, Identifiable)]
#[diesel(table_name = users)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = categories)]
#[diesel(belongs_to(Site))]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub site_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = categories)]
pub struct NewCategory {
    pub name: String,
    pub site_id: i32,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = companies)]
#[diesel(belongs_to(Site))]
#[diesel(belongs_to(User))]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub url: Option<String>,
    pub site_id: i32,
    pub user_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = companies)]
pub struct NewCompany {
    pub name: String,
    pub url: Option<String>,
    pub site_id: i32,
    pub user_id: Uuid,
}

#[derive(AsChangeset)]
#[diesel(table_name = companies)]
#[diesel(treat_none_as_null = true)]
pub struct CompanyChangeset<'a> {
    pub name: &'a str,
    pub url: Option<&'a str>,
}

#[derive(Debug, Clone, Queryable, Identifiable, Associations)]
#[diesel(table_name = jobs)]
#[diesel(belongs_to(Category))]
#[diesel(belongs_to(Company))]
#[diesel(belongs_to(Site))]
#[diesel(belongs_to(User))]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub application_info: String,
    pub email: String,
    pub category_id: i32,
    pub company_id: i32,
    pub site_id: i32,
    pub user_id: Uuid,
    pub paid_at: Option<NaiveDateTime>,
    pub expired_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Listing projection of a job's timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Draft,
    Active,
    Expired,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Draft => "draft",
            JobState::Active => "active",
            JobState::Expired => "expired",
        }
    }
}

impl Job {
    pub fn state(&self) -> JobState {
        match (self.paid_at, self.expired_at) {
            (_, Some(_)) => JobState::Expired,
            (Some(_), None) => JobState::Active,
            (None, None) => JobState::Draft,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = jobs)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub application_info: String,
    pub email: String,
    pub category_id: i32,
    pub company_id: i32,
    pub site_id: i32,
    pub user_id: Uuid,
}

#[derive(AsChangeset)]
#[diesel(table_name = jobs)]
pub struct JobChangeset<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub application_info: &'a str,
    pub email: &'a str,
    pub category_id: i32,
    pub company_id: i32,
    pub updated_at: NaiveDateTime,
}
