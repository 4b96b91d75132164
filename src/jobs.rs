//! Job listing queries and the draft/active/expired lifecycle.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime, Utc};
use diesel::dsl::count_star;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Category, Company, Job, NewJob};
use crate::schema::{categories, companies, jobs};

#[derive(Debug, Error)]
pub enum JobLifecycleError {
    #[error("job {0} has expired and cannot be activated")]
    AlreadyExpired(i32),
    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),
}

pub type JobLifecycleResult<T> = Result<T, JobLifecycleError>;

/// A job together with the names it is displayed with.
#[derive(Debug, Clone)]
pub struct JobListing {
    pub job: Job,
    pub company_name: String,
    pub category_name: String,
}

/// Paid, unexpired jobs of a site, most recently paid first.
pub fn list_active_jobs(
    conn: &mut PgConnection,
    site_id: i32,
    category_id: Option<i32>,
) -> QueryResult<Vec<Job>> {
    let mut query = jobs::table
        .filter(jobs::site_id.eq(site_id))
        .filter(jobs::paid_at.is_not_null())
        .filter(jobs::expired_at.is_null())
        .into_boxed();

    if let Some(category_id) = category_id {
        query = query.filter(jobs::category_id.eq(category_id));
    }

    query
        .order(jobs::paid_at.desc())
        .then_order_by(jobs::id.desc())
        .load(conn)
}

pub fn list_company_jobs(
    conn: &mut PgConnection,
    site_id: i32,
    company_id: i32,
) -> QueryResult<Vec<Job>> {
    jobs::table
        .filter(jobs::site_id.eq(site_id))
        .filter(jobs::company_id.eq(company_id))
        .filter(jobs::paid_at.is_not_null())
        .filter(jobs::expired_at.is_null())
        .order(jobs::paid_at.desc())
        .then_order_by(jobs::id.desc())
        .load(conn)
}

/// Every job a user posted on a site, in any state, newest first.
pub fn list_user_jobs(
    conn: &mut PgConnection,
    site_id: i32,
    user_id: Uuid,
) -> QueryResult<Vec<Job>> {
    jobs::table
        .filter(jobs::site_id.eq(site_id))
        .filter(jobs::user_id.eq(user_id))
        .order(jobs::created_at.desc())
        .then_order_by(jobs::id.desc())
        .load(conn)
}

pub fn find_job(conn: &mut PgConnection, site_id: i32, job_id: i32) -> QueryResult<Option<Job>> {
    jobs::table
        .filter(jobs::site_id.eq(site_id))
        .filter(jobs::id.eq(job_id))
        .first(conn)
        .optional()
}

pub fn create_job(conn: &mut PgConnection, new_job: &NewJob) -> QueryResult<Job> {
    diesel::insert_into(jobs::table)
        .values(new_job)
        .get_result(conn)
}

/// Marks a job as paid. Activating an active job keeps its original `paid_at`.
pub fn activate_job(conn: &mut PgConnection, job: &Job) -> JobLifecycleResult<Job> {
    if job.expired_at.is_some() {
        return Err(JobLifecycleError::AlreadyExpired(job.id));
    }

    let now = Utc::now().naive_utc();
    let updated = diesel::update(
        jobs::table
            .find(job.id)
            .filter(jobs::paid_at.is_null())
            .filter(jobs::expired_at.is_null()),
    )
    .set((jobs::paid_at.eq(Some(now)), jobs::updated_at.eq(now)))
    .execute(conn)?;

    if updated > 0 {
        tracing::info!(job_id = job.id, site_id = job.site_id, "job activated");
    }

    Ok(jobs::table.find(job.id).first(conn)?)
}

/// Removes a job from listings. The record stays readable.
pub fn expire_job(conn: &mut PgConnection, job: &Job) -> JobLifecycleResult<Job> {
    let now = Utc::now().naive_utc();
    let updated = diesel::update(jobs::table.find(job.id).filter(jobs::expired_at.is_null()))
        .set((jobs::expired_at.eq(Some(now)), jobs::updated_at.eq(now)))
        .execute(conn)?;

    if updated > 0 {
        tracing::info!(job_id = job.id, site_id = job.site_id, "job expired");
    }

    Ok(jobs::table.find(job.id).first(conn)?)
}

/// Expires active jobs on a site that were paid more than `expire_after` before `now`.
pub fn expire_stale_jobs(
    conn: &mut PgConnection,
    site_id: i32,
    now: NaiveDateTime,
    expire_after: Duration,
) -> QueryResult<usize> {
    let cutoff = now - expire_after;
    diesel::update(
        jobs::table
            .filter(jobs::site_id.eq(site_id))
            .filter(jobs::paid_at.lt(cutoff))
            .filter(jobs::expired_at.is_null()),
    )
    .set((jobs::expired_at.eq(Some(now)), jobs::updated_at.eq(now)))
    .execute(conn)
}

pub fn active_job_counts(conn: &mut PgConnection, site_id: i32) -> QueryResult<HashMap<i32, i64>> {
    let rows: Vec<(i32, i64)> = jobs::table
        .filter(jobs::site_id.eq(site_id))
        .filter(jobs::paid_at.is_not_null())
        .filter(jobs::expired_at.is_null())
        .group_by(jobs::category_id)
        .select((jobs::category_id, count_star()))
        .load(conn)?;
    Ok(rows.into_iter().collect())
}

/// Attaches company and category names, preserving the order of `rows`.
pub fn describe_jobs(conn: &mut PgConnection, rows: Vec<Job>) -> QueryResult<Vec<JobListing>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let company_ids: Vec<i32> = rows.iter().map(|job| job.company_id).collect();
    let category_ids: Vec<i32> = rows.iter().map(|job| job.category_id).collect();

    let company_names: HashMap<i32, String> = companies::table
        .filter(companies::id.eq_any(company_ids))
        .load::<Company>(conn)?
        .into_iter()
        .map(|company| (company.id, company.name))
        .collect();
    let category_names: HashMap<i32, String> = categories::table
        .filter(categories::id.eq_any(category_ids))
        .load::<Category>(conn)?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();

    Ok(rows
        .into_iter()
        .map(|job| JobListing {
            company_name: company_names
                .get(&job.company_id)
                .cloned()
                .unwrap_or_default(),
            category_name: category_names
                .get(&job.category_id)
                .cloned()
                .unwrap_or_default(),
            job,
        })
        .collect())
}
