//! Account model and customer registration rules.

use core::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use storefront_core::{AccountId, DomainError, Email};

use crate::password::check_password_policy;
use crate::{PasswordHash, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl FromStr for Gender {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            _ => Err(DomainError::validation("Invalid gender")),
        }
    }
}

/// An account as held by the datastore.
///
/// Accounts are never physically deleted; `is_active = false` disables login.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub email: Email,
    pub role: Role,
    pub password_hash: PasswordHash,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub dob: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// A bare account with only the credentials set (used for back-office accounts).
    pub fn new(email: Email, role: Role, password_hash: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            id: AccountId::new(),
            email,
            role,
            password_hash,
            phone_number: None,
            gender: None,
            dob: None,
            is_active: true,
            created_at: now,
        }
    }

    pub fn new_customer(registration: ValidatedRegistration, password_hash: PasswordHash, now: DateTime<Utc>) -> Self {
        Self {
            phone_number: Some(registration.phone_number),
            gender: Some(registration.gender),
            dob: Some(registration.dob),
            ..Self::new(registration.email, Role::Customer, password_hash, now)
        }
    }

    /// Non-sensitive name shown to clients after login.
    pub fn display_name(&self) -> &str {
        self.email.local_part()
    }

    pub fn summary(&self) -> AccountSummary {
        AccountSummary {
            id: self.id,
            email: self.email.to_string(),
            role: self.role,
            phone_number: self.phone_number.clone(),
            gender: self.gender,
            dob: self.dob,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

/// Client-facing view of an account (never includes the password hash).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub id: AccountId,
    pub email: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub gender: Option<Gender>,
    pub dob: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Raw customer self-registration input.
///
/// Absent fields read as empty strings and fail validation with the
/// field's own message.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CustomerRegistration {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub phone_number: String,
    pub gender: String,
    pub dob: String,
}

/// Registration input that passed every shape check.
#[derive(Debug, Clone)]
pub struct ValidatedRegistration {
    pub email: Email,
    pub password: String,
    pub phone_number: String,
    pub gender: Gender,
    pub dob: NaiveDate,
}

impl CustomerRegistration {
    /// Check the input in a fixed order, reporting the first failure.
    pub fn validate(self) -> Result<ValidatedRegistration, DomainError> {
        check_password_policy(&self.password)?;
        if self.password != self.confirm_password {
            return Err(DomainError::validation("Password and confirmation not matched"));
        }
        let email = Email::parse(&self.email).map_err(|_| DomainError::validation("Invalid email"))?;
        let gender: Gender = self.gender.parse()?;
        let dob = parse_dob(&self.dob).ok_or_else(|| DomainError::validation("Invalid dob"))?;
        let phone_number = normalize_phone(&self.phone_number)
            .ok_or_else(|| DomainError::validation("Invalid phone number"))?;

        Ok(ValidatedRegistration {
            email,
            password: self.password,
            phone_number,
            gender,
            dob,
        })
    }
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (reduced to its UTC date).
fn parse_dob(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.with_timezone(&Utc).date_naive())
    })
}

fn normalize_phone(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let digits = raw.strip_prefix('+').unwrap_or(raw);
    if digits.len() < 8 || digits.len() > 15 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(raw.to_string())
}
