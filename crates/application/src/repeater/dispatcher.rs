//! Sends the active tab's request through the replay endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use snare_domain::codec::parse_header_lines;
use snare_domain::{LogDetails, LogSource, Protocol, ProxyLogStatus, format_request_for_api};
use tracing::{debug, info, warn};

use super::TabStore;
use crate::events::EventBus;
use crate::ports::{ApiError, RepeaterApi, StatusReporter};

/// Message shown when a send fails without any detail.
pub const SEND_FAILED: &str = "Failed to send request";

/// Clears the loading flag on every exit path.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// One field of the editable request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestEdit {
    /// Replace the method.
    Method(String),
    /// Replace the URL.
    Url(String),
    /// Replace the raw header block.
    Headers(String),
    /// Replace the body.
    Body(String),
}

/// Partial change to a tab's target configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigPatch {
    /// New protocol.
    pub protocol: Option<Protocol>,
    /// New port.
    pub port: Option<String>,
    /// New host.
    pub host: Option<String>,
    /// New redirect policy.
    pub follow_redirects: Option<bool>,
}

/// Replays tab requests and stores the responses on the tabs.
pub struct RequestDispatcher {
    api: Arc<dyn RepeaterApi>,
    status: Arc<dyn StatusReporter>,
    events: EventBus,
    loading: AtomicBool,
}

impl RequestDispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(
        api: Arc<dyn RepeaterApi>,
        status: Arc<dyn StatusReporter>,
        events: EventBus,
    ) -> Self {
        Self {
            api,
            status,
            events,
            loading: AtomicBool::new(false),
        }
    }

    /// Returns true while a send is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Sends the active tab's request.
    ///
    /// Does nothing without an active tab. A tab without a host is rejected
    /// before any network call. The store stays borrowed for the whole send,
    /// so the response always lands on the tab that was sent.
    pub async fn send(&self, store: &mut TabStore) {
        let Some(tab) = store.active_tab().cloned() else {
            return;
        };

        if tab.config.host.is_empty() {
            self.status.error("Host is required");
            return;
        }

        let _loading = LoadingGuard::start(&self.loading);
        self.status.set_error(None);

        let payload = format_request_for_api(&tab.request, &tab.config);
        let details = LogDetails {
            method: Some(payload.method.clone()),
            url: Some(payload.url.clone()),
            headers: Some(parse_header_lines(&payload.headers)),
            content: Some(payload.body.clone()),
            ..LogDetails::default()
        };
        self.events.request(
            LogSource::Repeater,
            format!("Repeater request: {} {}", payload.method, payload.url),
            Some(details.clone()),
        );
        debug!(method = %payload.method, url = %payload.url, "sending repeater request");

        match self.api.send(&payload).await {
            Ok(reply) => {
                let response = reply.into_response();
                info!(status = response.status, url = %payload.url, "repeater response");
                self.events.info(
                    LogSource::Repeater,
                    format!("Repeater response: {} {}", response.status, payload.url),
                    Some(LogDetails {
                        status: Some(ProxyLogStatus::Code(response.status)),
                        headers: Some(response.headers.clone()),
                        content: Some(response.body.clone()),
                        ..LogDetails::default()
                    }),
                );

                store.update_tab(&tab.id, |t| t.response = Some(response));
                if tab.domain.is_empty() {
                    store.update_tab_name(&tab.id, &tab.config.host);
                }
                self.status.success("Request sent successfully");
            }
            Err(error) => {
                warn!(%error, url = %payload.url, "repeater request failed");
                self.events.error(
                    LogSource::Repeater,
                    format!("Repeater request failed: {error}"),
                    Some(details),
                );
                self.status.error(&failure_message(&error));
            }
        }
    }

    /// Resets the active tab's request, config and response.
    pub fn clear(&self, store: &mut TabStore) {
        if store.update_active_tab(snare_domain::Tab::reset) {
            self.status.success("Request and response cleared");
        }
    }

    /// Edits one field of the active tab's request.
    pub fn update_request(&self, store: &mut TabStore, edit: RequestEdit) {
        store.update_active_tab(|tab| match edit {
            RequestEdit::Method(method) => tab.request.method = method,
            RequestEdit::Url(url) => tab.request.url = url,
            RequestEdit::Headers(headers) => tab.request.headers = headers,
            RequestEdit::Body(body) => tab.request.body = body,
        });
    }

    /// Merges a patch into the active tab's config.
    pub fn update_config(&self, store: &mut TabStore, patch: ConfigPatch) {
        store.update_active_tab(|tab| {
            if let Some(protocol) = patch.protocol {
                tab.config.protocol = protocol;
            }
            if let Some(port) = patch.port {
                tab.config.port = port;
            }
            if let Some(host) = patch.host {
                tab.config.host = host;
            }
            if let Some(follow) = patch.follow_redirects {
                tab.config.follow_redirects = follow;
            }
        });
    }
}

/// Backend detail first, then the error's own message.
fn failure_message(error: &ApiError) -> String {
    error
        .detail()
        .map_or_else(|| error.message_or(SEND_FAILED), str::to_string)
}
