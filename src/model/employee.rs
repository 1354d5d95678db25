use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::Id;

/// An employee row. `recipient_id` is the reports-to link; `recipient` is only
/// ever filled by the employee-with-recipient query and holds the direct
/// recipient, never a longer chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Id,
    pub last_name: String,
    pub first_name: Option<String>,
    pub title: String,
    pub title_of_courtesy: String,
    pub birth_date: NaiveDate,
    pub hire_date: NaiveDate,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub home_phone: String,
    pub extension: i32,
    pub notes: String,
    pub recipient_id: Option<Id>,
    #[sqlx(skip)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<Box<Employee>>,
}

impl Employee {
    pub fn with_recipient(mut self, recipient: Option<Employee>) -> Self {
        self.recipient = recipient.map(Box::new);
        self
    }
}
