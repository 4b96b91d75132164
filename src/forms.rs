//! Submitted form payloads and their validation.
//!
//! Every field deserializes as a string with a default so that a missing or
//! malformed value is reported back on the form instead of rejecting the
//! request outright. Field rules are declared with `validator`; `clean`
//! trims the input, runs them and turns the result into typed values.

use serde::Deserialize;
use validator::{Validate, ValidateUrl, ValidationError, ValidationErrors};

pub type FormErrors = Vec<String>;

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct JobForm {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Title is required."),
        length(max = 255, message = "Title must be at most 255 characters.")
    )]
    pub title: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Description is required."))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Application info is required."))]
    pub application_info: String,
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,
    #[serde(default)]
    #[validate(custom(function = "positive_id", message = "Select a valid category."))]
    pub category: String,
    #[serde(default)]
    #[validate(custom(function = "positive_id", message = "Select a valid company."))]
    pub company: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidJob {
    pub title: String,
    pub description: String,
    pub application_info: String,
    pub email: String,
    pub category_id: i32,
    pub company_id: i32,
}

impl JobForm {
    const FIELDS: &'static [&'static str] = &[
        "title",
        "description",
        "application_info",
        "email",
        "category",
        "company",
    ];

    fn trimmed(&self) -> Self {
        Self {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            application_info: self.application_info.trim().to_string(),
            email: self.email.trim().to_string(),
            category: self.category.trim().to_string(),
            company: self.company.trim().to_string(),
        }
    }

    pub fn clean(&self) -> Result<ValidJob, FormErrors> {
        let form = self.trimmed();
        form.validate().map_err(|errors| messages(&errors, Self::FIELDS))?;

        match (parse_id(&form.category), parse_id(&form.company)) {
            (Some(category_id), Some(company_id)) => Ok(ValidJob {
                title: form.title,
                description: form.description,
                application_info: form.application_info,
                email: form.email,
                category_id,
                company_id,
            }),
            _ => Err(vec!["Select a valid category.".to_string()]),
        }
    }
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct CompanyForm {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank", message = "Name is required."),
        length(max = 255, message = "Name must be at most 255 characters.")
    )]
    pub name: String,
    #[serde(default)]
    #[validate(
        length(max = 200, message = "Enter a valid URL."),
        custom(function = "optional_web_url", message = "Enter a valid URL.")
    )]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidCompany {
    pub name: String,
    pub url: Option<String>,
}

impl CompanyForm {
    const FIELDS: &'static [&'static str] = &["name", "url"];

    pub fn clean(&self) -> Result<ValidCompany, FormErrors> {
        let form = Self {
            name: self.name.trim().to_string(),
            url: self.url.trim().to_string(),
        };
        form.validate().map_err(|errors| messages(&errors, Self::FIELDS))?;

        Ok(ValidCompany {
            url: Some(form.url).filter(|url| !url.is_empty()),
            name: form.name,
        })
    }
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    pub next: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        length(min = 1, message = "Username is required."),
        custom(
            function = "username_chars",
            message = "Username must be at most 150 characters of letters, digits and @/./+/-/_."
        )
    )]
    pub username: String,
    #[serde(default)]
    #[validate(
        length(min = 8, message = "Password must be at least 8 characters."),
        must_match(other = "password2", message = "The two password fields didn't match.")
    )]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub password: String,
}

impl RegisterForm {
    const FIELDS: &'static [&'static str] = &["username", "password1"];

    pub fn clean(&self) -> Result<ValidRegistration, FormErrors> {
        let form = Self {
            username: self.username.trim().to_string(),
            ..self.clone()
        };
        form.validate().map_err(|errors| messages(&errors, Self::FIELDS))?;

        Ok(ValidRegistration {
            username: form.username,
            password: form.password1,
        })
    }
}

/// Flattens validation errors into messages, in the order the fields appear on
/// the form.
fn messages(errors: &ValidationErrors, fields: &[&str]) -> FormErrors {
    let by_field = errors.field_errors();
    let mut messages: FormErrors = Vec::new();
    for field in fields {
        let Some(field_errors) = by_field.get(*field) else {
            continue;
        };
        for error in field_errors.iter() {
            let message = match &error.message {
                Some(message) => message.to_string(),
                None => format!("Invalid value for {field}."),
            };
            if !messages.contains(&message) {
                messages.push(message);
            }
        }
    }
    messages
}

fn parse_id(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|id| *id > 0)
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

fn positive_id(value: &str) -> Result<(), ValidationError> {
    match parse_id(value) {
        Some(_) => Ok(()),
        None => Err(ValidationError::new("invalid_choice")),
    }
}

fn username_chars(value: &str) -> Result<(), ValidationError> {
    if value.chars().count() <= 150
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        Ok(())
    } else {
        Err(ValidationError::new("username"))
    }
}

/// Empty is allowed; anything else must be an absolute http(s) URL.
fn optional_web_url(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Ok(());
    }
    let web = value.validate_url()
        && url::Url::parse(value)
            .map(|url| matches!(url.scheme(), "http" | "https") && url.host_str().is_some())
            .unwrap_or(false);
    if web {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}
