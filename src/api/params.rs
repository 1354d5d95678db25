use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

use crate::model::Id;
use crate::store::{Page, SearchTerm};

/// Query-string parameters with lenient numeric coercion.
///
/// A numeric parameter that is missing, non-numeric, negative or out of range
/// reads as 0. There is no validation error for bad input.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn new(values: HashMap<String, String>) -> Self {
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn int(&self, key: &str) -> i64 {
        self.get(key)
            .and_then(|value| value.parse::<i64>().ok())
            .filter(|n| *n >= 0)
            .unwrap_or(0)
    }

    pub fn page(&self) -> Page {
        Page::new(self.int("limit"), self.int("offset"))
    }

    pub fn id(&self) -> Id {
        Id::try_from(self.int("id")).unwrap_or(0)
    }

    /// Search term with the prefix marker appended; a missing term is empty.
    pub fn term(&self) -> SearchTerm {
        SearchTerm::prefix(self.get("term").unwrap_or_default())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for QueryParams
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // a query string that does not decode is treated like no parameters
        let values = Query::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .map(|Query(values)| values)
            .unwrap_or_default();
        Ok(Self(values))
    }
}
