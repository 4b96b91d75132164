use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Response},
    Form,
};
use diesel::prelude::*;
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    auth::{
        clear_session_cookie, found, password, safe_next, session_cookie, OptionalUser,
    },
    error::{AppError, AppResult},
    forms::{LoginForm, RegisterForm},
    models::{NewUser, User, ROLE_USER},
    pages::{LoginPage, RegisterPage},
    schema::users::dsl,
    state::AppState,
};

const DEFAULT_LOGIN_REDIRECT: &str = "/";
const REGISTER_REDIRECT: &str = "/jobs/mine/";

#[derive(Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

pub async fn login_form(
    user: OptionalUser,
    Query(query): Query<NextQuery>,
) -> AppResult<Html<String>> {
    let page = LoginPage {
        title: "Login".to_string(),
        username: user.username(),
        form_username: String::new(),
        next: safe_next(query.next.as_deref()).unwrap_or_default().to_string(),
        errors: Vec::new(),
    };
    Ok(Html(page.render()?))
}

pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let next = safe_next(form.next.as_deref())
        .or_else(|| safe_next(query.next.as_deref()))
        .unwrap_or(DEFAULT_LOGIN_REDIRECT)
        .to_string();

    let mut conn = state.db()?;
    let user: Option<User> = dsl::users
        .filter(dsl::username.eq(form.username.trim()))
        .first(&mut conn)
        .optional()?;

    let valid = match &user {
        Some(user) => password::verify_password(&form.password, &user.password_hash)
            .unwrap_or_else(|err| {
                tracing::warn!(user_id = %user.id, error = %err, "unreadable password hash");
                false
            }),
        None => false,
    };

    let user = match user {
        Some(user) if valid => user,
        _ => {
            tracing::info!(username = %form.username, "failed login");
            let page = LoginPage {
                title: "Login".to_string(),
                username: String::new(),
                form_username: form.username,
                next: if next == DEFAULT_LOGIN_REDIRECT {
                    String::new()
                } else {
                    next
                },
                errors: vec![
                    "Please enter a correct username and password. Note that both fields may be case-sensitive."
                        .to_string(),
                ],
            };
            return Ok((StatusCode::UNAUTHORIZED, Html(page.render()?)).into_response());
        }
    };

    tracing::info!(user_id = %user.id, "user logged in");
    sign_in(&state, &user, &next)
}

pub async fn logout(State(state): State<AppState>) -> AppResult<Response> {
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, clear_session_cookie(&state)?);
    Ok((headers, found(DEFAULT_LOGIN_REDIRECT)).into_response())
}

pub async fn register_form(user: OptionalUser) -> AppResult<Html<String>> {
    let page = RegisterPage {
        title: "Register".to_string(),
        username: user.username(),
        form_username: String::new(),
        errors: Vec::new(),
    };
    Ok(Html(page.render()?))
}

pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let mut conn = state.db()?;

    let mut errors = Vec::new();
    let valid = match form.clean() {
        Ok(valid) => Some(valid),
        Err(mut form_errors) => {
            errors.append(&mut form_errors);
            None
        }
    };

    if let Some(valid) = &valid {
        let taken = dsl::users
            .filter(dsl::username.eq(&valid.username))
            .first::<User>(&mut conn)
            .optional()?
            .is_some();
        if taken {
            errors.push("A user with that username already exists.".to_string());
        }
    }

    let valid = match valid {
        Some(valid) if errors.is_empty() => valid,
        _ => {
            let page = RegisterPage {
                title: "Register".to_string(),
                username: String::new(),
                form_username: form.username,
                errors,
            };
            return Ok((StatusCode::BAD_REQUEST, Html(page.render()?)).into_response());
        }
    };

    let new_user = NewUser {
        id: Uuid::new_v4(),
        username: valid.username,
        password_hash: password::hash_password(&valid.password)?,
        role: ROLE_USER.to_string(),
    };
    let user: User = diesel::insert_into(dsl::users)
        .values(&new_user)
        .get_result(&mut conn)
        .map_err(|err| match err {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UniqueViolation,
                _,
            ) => AppError::bad_request("A user with that username already exists."),
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = %user.id, "user registered");
    sign_in(&state, &user, REGISTER_REDIRECT)
}

fn sign_in(state: &AppState, user: &User, location: &str) -> AppResult<Response> {
    let token = state
        .jwt
        .generate_token(user.id, &user.username, &user.role)
        .map_err(AppError::from)?;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session_cookie(state, &token)?);
    Ok((headers, found(location)).into_response())
}
