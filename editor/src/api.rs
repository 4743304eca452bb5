//! Page server client — load the page, fetch the component menu, save edits.
//!
//! DESIGN
//! ======
//! Every endpoint is a `POST` answering `{error, msg, data}`. `error == 0`
//! means success; anything else is surfaced as [`ApiError::Rejected`] with
//! the server's message. Trees coming back are validated with the same rules
//! as any other layout input, so a corrupt page fails here rather than deep
//! inside a compilation pass.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::consts::API_OK;
use crate::layout::{LayoutError, LayoutTree};
use crate::loader::ComponentManifest;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server rejected request ({code}): {msg}")]
    Rejected { code: i64, msg: String },

    #[error("response carried no data")]
    MissingData,

    #[error(transparent)]
    Layout(#[from] LayoutError),
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub error: i64,
    #[serde(default)]
    pub msg: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub fn ok(data: Option<T>) -> Self {
        Self { error: API_OK, msg: "succ".into(), data }
    }

    #[must_use]
    pub fn rejected(code: i64, msg: impl Into<String>) -> Self {
        Self { error: code, msg: msg.into(), data: None }
    }

    /// Unwrap a success envelope into its (possibly absent) data.
    ///
    /// # Errors
    ///
    /// [`ApiError::Rejected`] when `error` is non-zero.
    pub fn into_result(self) -> Result<Option<T>, ApiError> {
        if self.error == API_OK {
            Ok(self.data)
        } else {
            Err(ApiError::Rejected { code: self.error, msg: self.msg })
        }
    }
}

/// Wire shape of `/loadPage` data before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PagePayload {
    pub tree: serde_json::Value,
    /// Component name → module URL overrides.
    #[serde(default)]
    pub hook: BTreeMap<String, String>,
}

/// A validated page as returned by [`PageApi::load_page`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedPage {
    pub tree: LayoutTree,
    pub hook: BTreeMap<String, String>,
}

impl TryFrom<PagePayload> for LoadedPage {
    type Error = LayoutError;

    fn try_from(payload: PagePayload) -> Result<Self, Self::Error> {
        Ok(Self { tree: LayoutTree::from_value(payload.tree)?, hook: payload.hook })
    }
}

/// HTTP client for the page server.
#[derive(Debug, Clone)]
pub struct PageApi {
    http: reqwest::Client,
    base: String,
}

impl PageApi {
    pub fn new(base: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base: base.into().trim_end_matches('/').to_owned() }
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path.trim_start_matches('/'))
    }

    /// `POST /loadPage` — the current tree plus component module overrides.
    ///
    /// # Errors
    ///
    /// Transport errors, a rejected envelope, missing data, or an invalid tree.
    pub async fn load_page(&self) -> Result<LoadedPage, ApiError> {
        let payload: PagePayload = self.post("loadPage", None::<&()>).await?.ok_or(ApiError::MissingData)?;
        let page = LoadedPage::try_from(payload)?;
        info!(roots = page.tree.nodes.len(), "page loaded");
        Ok(page)
    }

    /// `POST /getCompMenu` — components available to drag into the page.
    ///
    /// # Errors
    ///
    /// Transport errors, a rejected envelope, or missing data.
    pub async fn comp_menu(&self) -> Result<Vec<ComponentManifest>, ApiError> {
        self.post("getCompMenu", None::<&()>).await?.ok_or(ApiError::MissingData)
    }

    /// `POST /savePage` — persist the edited tree.
    ///
    /// # Errors
    ///
    /// Transport errors or a rejected envelope.
    pub async fn save_page(&self, tree: &LayoutTree) -> Result<(), ApiError> {
        self.post::<serde_json::Value, _>("savePage", Some(tree)).await?;
        info!(roots = tree.nodes.len(), "page saved");
        Ok(())
    }

    async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<Option<T>, ApiError> {
        let mut request = self.http.post(self.url(path));
        if let Some(body) = body {
            request = request.json(body);
        }
        let envelope: Envelope<T> = request.send().await?.error_for_status()?.json().await?;
        envelope.into_result()
    }
}
