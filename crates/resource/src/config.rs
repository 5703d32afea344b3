use std::env;

use crate::breadcrumbs::DEFAULT_BREADCRUMB_CAPACITY;

/// Environment variable holding the backend URL prefix.
pub const BASE_URL_ENV: &str = "ORION_SERVER_URL";

/// Environment variable bounding the breadcrumb trail.
pub const BREADCRUMBS_ENV: &str = "RESOURCE_BREADCRUMBS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceConfig {
    /// Prepended verbatim to every endpoint. Empty means same-origin paths.
    pub base_url: String,
    pub breadcrumb_capacity: usize,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            breadcrumb_capacity: DEFAULT_BREADCRUMB_CAPACITY,
        }
    }
}

impl ResourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_breadcrumb_capacity(mut self, capacity: usize) -> Self {
        self.breadcrumb_capacity = capacity;
        self
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ResourceConfig::from_env`], reading through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let base_url = lookup(BASE_URL_ENV).unwrap_or_default();
        let breadcrumb_capacity = lookup(BREADCRUMBS_ENV)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_BREADCRUMB_CAPACITY);
        Self {
            base_url,
            breadcrumb_capacity,
        }
    }

    /// Fully-qualified URL for `endpoint`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}
