//! Input validation for registration and login.
//!
//! Every failing field is reported, not just the first one. Successful
//! validation returns the normalized (trimmed) request.

use chatly_types::error::ValidationErrors;
use chatly_types::identity::{LoginRequest, RegisterRequest};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_register(req: &RegisterRequest) -> Result<RegisterRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let username = req.username.trim();
    if username.is_empty() {
        errors.push("username", "Username is required");
    } else if username.chars().count() < MIN_USERNAME_LEN {
        errors.push("username", "Username must be at least 3 characters");
    }

    let email = req.email.trim();
    if email.is_empty() {
        errors.push("email", "Email is required");
    } else if !is_valid_email(email) {
        errors.push("email", "Please provide a valid email");
    }

    if req.password.is_empty() {
        errors.push("password", "Password is required");
    } else if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password", "Password must be at least 6 characters");
    }

    errors.into_result()?;
    Ok(RegisterRequest {
        username: username.to_string(),
        email: email.to_string(),
        password: req.password.clone(),
    })
}

pub fn validate_login(req: &LoginRequest) -> Result<LoginRequest, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    if req.password.is_empty() {
        errors.push("password", "Password is required");
    }

    let email = non_blank(req.email.as_deref());
    let username = non_blank(req.username.as_deref());

    if let Some(email) = email {
        if !is_valid_email(email) {
            errors.push("email", "Please provide a valid email");
        }
    }
    if email.is_none() && username.is_none() {
        errors.push("email", "Either email or username is required");
    }

    errors.into_result()?;
    Ok(LoginRequest {
        username: username.map(str::to_string),
        email: email.map(str::to_string),
        password: req.password.clone(),
    })
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Shape check only: `local@domain.tld`, no whitespace.
fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|l| !l.is_empty())
}
