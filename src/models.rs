// Wire types for the budget service, plus the normalisation step that
// turns whatever `/fetch-user-data` returned into one list shape.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CommandError, CommandResult};

/// Message shown when the service has nothing recorded for the user.
pub const NO_DATA_MESSAGE: &str = "No data available for this user.";

/// Sign-up payload. Only lives for the duration of the request.
#[derive(Serialize, Debug)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Serialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginResponse {
    pub token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ExpenseResponse {
    pub category: String,
}

/// One spending category as sent by the service. `BudgetAmount` may be
/// `null` when no budget was set for the category.
#[derive(Deserialize, Debug)]
struct RawCategory {
    #[serde(rename = "CategoryName", default = "unknown_category")]
    category_name: String,
    #[serde(rename = "TotalAmount", default)]
    total_amount: f64,
    #[serde(rename = "BudgetAmount", default)]
    budget_amount: Option<f64>,
}

fn unknown_category() -> String {
    "Unknown".to_string()
}

/// A spending category with its budget already coerced to a number.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryRecord {
    pub category_name: String,
    pub total_amount: f64,
    pub budget_amount: f64,
}

impl RawCategory {
    fn normalise(self) -> CategoryRecord {
        CategoryRecord {
            category_name: self.category_name,
            total_amount: self.total_amount,
            budget_amount: self.budget_amount.unwrap_or(0.0),
        }
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct Notification {
    #[serde(rename = "Message", default = "no_message")]
    pub message: String,
    #[serde(rename = "CreatedAt", default = "unknown_timestamp")]
    pub created_at: String,
}

fn no_message() -> String {
    "No message provided.".to_string()
}

fn unknown_timestamp() -> String {
    "Unknown timestamp".to_string()
}

#[derive(Deserialize, Debug)]
pub struct NotificationsResponse {
    /// Absent and `null` both mean no notifications.
    #[serde(default)]
    body: Option<Vec<Notification>>,
}

impl NotificationsResponse {
    pub fn into_notifications(self) -> Vec<Notification> {
        self.body.unwrap_or_default()
    }
}

/// The `body` of a user-data response, before it is interpreted.
#[derive(Debug, PartialEq)]
pub enum Body {
    /// Already a JSON value (normally a list).
    Raw(Value),
    /// A JSON document serialised into a string.
    Encoded(String),
}

/// User data after body unwrapping.
#[derive(Debug, PartialEq)]
pub enum UserData {
    Records(Vec<CategoryRecord>),
    /// The service sent its "no data" sentinel instead of a list.
    NoData(String),
}

impl Body {
    /// Pick the body out of a decoded response. A bare list is its own
    /// body; an object without `body` is treated as an empty list unless it
    /// carries a sentinel `message`.
    pub fn from_response(value: Value) -> CommandResult<Self> {
        match value {
            Value::Array(_) => Ok(Body::Raw(value)),
            Value::Object(mut map) => match map.remove("body") {
                Some(Value::String(s)) => Ok(Body::Encoded(s)),
                Some(inner) => Ok(Body::Raw(inner)),
                None if map.contains_key("message") => Ok(Body::Raw(Value::Object(map))),
                None => Ok(Body::Raw(Value::Array(Vec::new()))),
            },
            other => Err(CommandError::Decode(format!(
                "expected a list or an object, got {other}"
            ))),
        }
    }

    pub fn resolve(self) -> CommandResult<UserData> {
        let value = match self {
            Body::Raw(value) => value,
            Body::Encoded(text) => serde_json::from_str(&text)?,
        };
        match value {
            Value::Object(map) => match map.get("message").and_then(Value::as_str) {
                Some(message) => Ok(UserData::NoData(message.to_string())),
                None => Err(CommandError::Decode(
                    "user data object carries neither records nor a message".into(),
                )),
            },
            Value::Null => Ok(UserData::Records(Vec::new())),
            list => {
                let raw: Vec<RawCategory> = serde_json::from_value(list)?;
                Ok(UserData::Records(raw.into_iter().map(RawCategory::normalise).collect()))
            }
        }
    }
}

/// Decode a `/fetch-user-data` response body into normalised records.
pub fn parse_user_data(text: &str) -> CommandResult<UserData> {
    let value: Value = serde_json::from_str(text)?;
    Body::from_response(value)?.resolve()
}
