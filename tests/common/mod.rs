use std::env;

use anyhow::{anyhow, Context, Result};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::NaiveDateTime;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::PgConnection;
use http_body_util::BodyExt;
use jobboard::auth::jwt::JwtService;
use jobboard::auth::password::hash_password;
use jobboard::config::AppConfig;
use jobboard::db::{self, PgPool};
use jobboard::models::{Category, Company, Job, NewCategory, NewCompany, NewJob, NewUser};
use jobboard::routes;
use jobboard::schema::{categories, companies, jobs, users};
use jobboard::site::create_site;
use jobboard::state::AppState;
use once_cell::sync::Lazy;
use tokio::sync::Mutex;
use tower::util::ServiceExt;
use uuid::Uuid;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

pub struct TestApp {
    pub state: AppState,
    /// Site served when the request host matches nothing.
    pub site_id: i32,
    router: Router,
}

impl TestApp {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_DATABASE_URL")
            .context("TEST_DATABASE_URL must be set for integration tests")?;

        let pool = db::init_pool_with_size(&database_url, db::DEFAULT_MAX_POOL_SIZE)?;
        prepare_database(&pool).await?;

        let site_id = {
            let pool = pool.clone();
            tokio::task::spawn_blocking(move || -> Result<i32> {
                let mut conn = pool
                    .get()
                    .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
                Ok(create_site(&mut conn, "example.com", "example.com", None)?.id)
            })
            .await
            .context("site setup task panicked")??
        };

        let config = AppConfig {
            database_url,
            database_max_pool_size: db::DEFAULT_MAX_POOL_SIZE,
            server_host: "127.0.0.1".to_string(),
            server_port: 0,
            jwt_secret: "test-secret".to_string(),
            jwt_issuer: "test-issuer".to_string(),
            jwt_audience: "test-audience".to_string(),
            jwt_expiry_minutes: 60,
            session_cookie_secure: false,
            session_cookie_domain: None,
            default_site_id: Some(site_id),
            cors_allowed_origin: None,
        };

        let jwt = JwtService::from_config(&config)?;
        let state = AppState::new(pool, config, jwt);
        let router = routes::create_router(state.clone());

        Ok(Self {
            state,
            site_id,
            router,
        })
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.with_conn(|conn| truncate_all(conn)).await
    }

    pub async fn insert_site(&self, domain: &str, name: &str) -> Result<i32> {
        let domain = domain.to_string();
        let name = name.to_string();
        self.with_conn(move |conn| Ok(create_site(conn, &domain, &name, None)?.id))
            .await
    }

    pub async fn insert_user(&self, username: &str, password: &str, role: &str) -> Result<Uuid> {
        let username = username.to_string();
        let password = password.to_string();
        let role = role.to_string();
        self.with_conn(move |conn| {
            let user = NewUser {
                id: Uuid::new_v4(),
                username,
                password_hash: hash_password(&password)?,
                role,
            };
            diesel::insert_into(users::table)
                .values(&user)
                .execute(conn)
                .context("failed to insert user")?;
            Ok(user.id)
        })
        .await
    }

    pub async fn insert_category(&self, site_id: i32, name: &str) -> Result<i32> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let category: Category = diesel::insert_into(categories::table)
                .values(&NewCategory { name, site_id })
                .get_result(conn)
                .context("failed to insert category")?;
            Ok(category.id)
        })
        .await
    }

    pub async fn insert_company(&self, site_id: i32, user_id: Uuid, name: &str) -> Result<i32> {
        let name = name.to_string();
        self.with_conn(move |conn| {
            let company: Company = diesel::insert_into(companies::table)
                .values(&NewCompany {
                    name,
                    url: None,
                    site_id,
                    user_id,
                })
                .get_result(conn)
                .context("failed to insert company")?;
            Ok(company.id)
        })
        .await
    }

    pub async fn insert_job(
        &self,
        site_id: i32,
        category_id: i32,
        company_id: i32,
        user_id: Uuid,
        title: &str,
    ) -> Result<i32> {
        let title = title.to_string();
        self.with_conn(move |conn| {
            let job = jobboard::jobs::create_job(
                conn,
                &NewJob {
                    title,
                    description: "testing".to_string(),
                    application_info: "testing".to_string(),
                    email: "admin@tramcar.org".to_string(),
                    category_id,
                    company_id,
                    site_id,
                    user_id,
                },
            )
            .context("failed to insert job")?;
            Ok(job.id)
        })
        .await
    }

    pub async fn activate(&self, job_id: i32) -> Result<Job> {
        self.with_conn(move |conn| {
            let job: Job = jobs::table.find(job_id).first(conn)?;
            Ok(jobboard::jobs::activate_job(conn, &job)?)
        })
        .await
    }

    #[allow(dead_code)]
    pub async fn set_paid_at(&self, job_id: i32, paid_at: NaiveDateTime) -> Result<()> {
        self.with_conn(move |conn| {
            diesel::update(jobs::table.find(job_id))
                .set(jobs::paid_at.eq(Some(paid_at)))
                .execute(conn)
                .context("failed to set paid_at")?;
            Ok(())
        })
        .await
    }

    pub async fn load_job(&self, job_id: i32) -> Result<Job> {
        self.with_conn(move |conn| Ok(jobs::table.find(job_id).first(conn)?))
            .await
    }

    /// Logs in through the form and returns the `name=value` cookie pair.
    pub async fn login_cookie(&self, username: &str, password: &str) -> Result<String> {
        let response = self
            .post_form(
                "/login/",
                &[("username", username), ("password", password)],
                None,
            )
            .await?;
        anyhow::ensure!(
            response.status() == StatusCode::FOUND,
            "login failed with status {}",
            response.status()
        );
        session_cookie_of(&response).ok_or_else(|| anyhow!("login did not set a session cookie"))
    }

    pub async fn get(&self, path: &str, cookie: Option<&str>) -> Result<hyper::Response<Body>> {
        self.send(Method::GET, path, None, cookie, None).await
    }

    #[allow(dead_code)]
    pub async fn get_with_host(&self, path: &str, host: &str) -> Result<hyper::Response<Body>> {
        self.send(Method::GET, path, Some(host), None, None).await
    }

    pub async fn post_form(
        &self,
        path: &str,
        fields: &[(&str, &str)],
        cookie: Option<&str>,
    ) -> Result<hyper::Response<Body>> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(fields)
            .finish();
        self.send(Method::POST, path, None, cookie, Some(body)).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        host: Option<&str>,
        cookie: Option<&str>,
        form: Option<String>,
    ) -> Result<hyper::Response<Body>> {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(host) = host {
            builder = builder.header(header::HOST, host);
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = match form {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))?,
            None => builder.body(Body::empty())?,
        };
        Ok(self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("infallible response"))
    }

    pub async fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut PgConnection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.state.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| anyhow!("failed to get database connection: {err}"))?;
            f(&mut conn)
        })
        .await
        .context("connection task panicked")?
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

pub async fn body_to_string(body: Body) -> Result<String> {
    let collected = body
        .collect()
        .await
        .map_err(|err| anyhow!("failed to read response body: {err}"))?;
    Ok(String::from_utf8_lossy(&collected.to_bytes()).into_owned())
}

pub fn location(response: &hyper::Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
}

#[track_caller]
pub fn assert_redirects(response: &hyper::Response<Body>, expected: &str) {
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(location(response), Some(expected));
}

pub fn session_cookie_of(response: &hyper::Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with("sessionid="))
        .map(str::to_string)
}

async fn prepare_database(pool: &PgPool) -> Result<()> {
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let mut conn = pool
            .get()
            .map_err(|err| anyhow!("failed to acquire connection: {err}"))?;
        db::run_migrations(&mut conn)?;
        truncate_all(&mut conn)?;
        Ok(())
    })
    .await
    .context("migration task panicked")?
}

fn truncate_all(conn: &mut PgConnection) -> Result<()> {
    conn.batch_execute(
        "TRUNCATE TABLE jobs, companies, categories, site_configs, sites, users RESTART IDENTITY CASCADE;",
    )
    .context("failed to truncate tables")?;
    Ok(())
}
