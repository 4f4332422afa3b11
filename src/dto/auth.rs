use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::FieldError, middleware::validate::Validate};

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub exp: usize,
}

fn looks_like_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        && !value.chars().any(char::is_whitespace)
}

fn strong_enough(password: &str) -> bool {
    password.chars().count() >= 6
        && password.chars().any(|c| c.is_ascii_alphabetic())
        && password.chars().any(|c| c.is_ascii_digit())
}

fn email_field(value: Option<String>, errors: &mut Vec<FieldError>) -> Option<String> {
    match value.map(|v| v.trim().to_lowercase()) {
        None => {
            errors.push(FieldError::new("email", "Email is required"));
            None
        }
        Some(email) if !looks_like_email(&email) => {
            errors.push(FieldError::new("email", "Invalid email address"));
            None
        }
        Some(email) => Some(email),
    }
}

impl Validate for RegisterRequest {
    type Valid = NewUser;

    fn validate(self) -> Result<NewUser, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = match self.name.map(|v| v.trim().to_string()) {
            Some(name) if name.chars().count() >= 3 => Some(name),
            Some(_) => {
                errors.push(FieldError::new("name", "Name must be at least 3 characters"));
                None
            }
            None => {
                errors.push(FieldError::new("name", "Name is required"));
                None
            }
        };

        let email = email_field(self.email, &mut errors);

        let password = match self.password {
            Some(password) if strong_enough(&password) => Some(password),
            Some(_) => {
                errors.push(FieldError::new(
                    "password",
                    "Password must be at least 6 characters and contain a letter and a number",
                ));
                None
            }
            None => {
                errors.push(FieldError::new("password", "Password is required"));
                None
            }
        };

        match (name, email, password) {
            (Some(name), Some(email), Some(password)) => Ok(NewUser {
                name,
                email,
                password,
            }),
            _ => Err(errors),
        }
    }
}

impl Validate for LoginRequest {
    type Valid = Credentials;

    fn validate(self) -> Result<Credentials, Vec<FieldError>> {
        let mut errors = Vec::new();
        let email = email_field(self.email, &mut errors);
        let password = self.password.filter(|p| !p.is_empty());
        if password.is_none() {
            errors.push(FieldError::new("password", "Password is required"));
        }

        match (email, password) {
            (Some(email), Some(password)) => Ok(Credentials { email, password }),
            _ => Err(errors),
        }
    }
}
