//! Repeater tab entity.

use serde::{Deserialize, Serialize};

use crate::id::{generate_id, short_id};
use crate::request::{RepeaterRequest, RequestConfig, TabSeed};
use crate::response::RepeaterResponse;

/// A replay workspace: one editable request, its target and its last response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tab {
    /// Unique identifier, fixed at creation.
    pub id: String,
    /// Display label.
    pub name: String,
    /// Host the tab has been used against; empty until known.
    #[serde(default)]
    pub domain: String,
    /// Editable request.
    #[serde(default)]
    pub request: RepeaterRequest,
    /// Target configuration.
    #[serde(default)]
    pub config: RequestConfig,
    /// Last successful response.
    #[serde(default)]
    pub response: Option<RepeaterResponse>,
}

impl Tab {
    /// Creates a tab with a fresh id, merging the seed over the defaults.
    #[must_use]
    pub fn new(seed: &TabSeed) -> Self {
        Self::with_id(generate_id(), seed)
    }

    /// Creates a tab with the given id.
    #[must_use]
    pub fn with_id(id: String, seed: &TabSeed) -> Self {
        let name = format!("{}-new", short_id(&id));
        Self {
            id,
            name,
            domain: seed.domain(),
            request: seed.to_request(),
            config: seed.to_config(),
            response: None,
        }
    }

    /// First eight characters of the id.
    #[must_use]
    pub fn short_id(&self) -> &str {
        short_id(&self.id)
    }

    /// Sets the domain and derives the name from it.
    pub fn apply_domain(&mut self, domain: &str) {
        self.name = format!("{}-{domain}", short_id(&self.id));
        self.domain = domain.to_string();
    }

    /// Resets request, config and response to their defaults.
    pub fn reset(&mut self) {
        self.request = RepeaterRequest::default();
        self.config = RequestConfig::default();
        self.response = None;
    }
}

/// A tab-like object read from an imported tabs file.
///
/// Every field is optional; missing ones take the defaults. The imported id
/// is never reused.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TabImport {
    /// Label to keep, if any.
    pub name: Option<String>,
    /// Domain to keep.
    pub domain: String,
    /// Request.
    pub request: RepeaterRequest,
    /// Config.
    pub config: RequestConfig,
    /// Response.
    pub response: Option<RepeaterResponse>,
}

impl TabImport {
    /// Converts into a tab with a fresh id.
    #[must_use]
    pub fn into_tab(self) -> Tab {
        let mut tab = Tab::new(&TabSeed::default());
        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            tab.name = name;
        }
        tab.domain = self.domain;
        tab.request = self.request;
        tab.config = self.config;
        tab.response = self.response;
        tab
    }
}
