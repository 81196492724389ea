use std::sync::{Mutex, PoisonError};

use reqwest::Client as HttpClient;
use tracing::debug;

/// Outbound HTTP session shared by the bot and its commands.
///
/// Opened once at startup and closed once at shutdown; a closed session
/// hands out no client.
pub struct Session {
    client: Mutex<Option<HttpClient>>,
}

impl Session {
    pub fn open() -> Self {
        Self {
            client: Mutex::new(Some(HttpClient::new())),
        }
    }

    /// A handle to the underlying client, or `None` once closed.
    pub fn client(&self) -> Option<HttpClient> {
        self.client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Releases the session. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        let closed = self
            .client
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some();

        if closed {
            debug!("HTTP session closed");
        }
        closed
    }
}
