//! Health check for the hosting platform's uptime probe.
//!
//! The server gets its own OS thread and runtime so a slow probe can never
//! hold up the gateway loop.

use std::io;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use axum::Router;
use axum::extract::State;
use axum::routing::get;
use tracing::{error, info};

use crate::identity::BotIdentity;

pub struct HealthServer {
    identity: BotIdentity,
    addr: SocketAddr,
    started: AtomicBool,
}

impl HealthServer {
    pub fn new(identity: BotIdentity, addr: SocketAddr) -> Self {
        Self {
            identity,
            addr,
            started: AtomicBool::new(false),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Binds and starts serving in the background.
    ///
    /// Only the first call does anything; it returns the bound address.
    /// Later calls return `Ok(None)`, even if the first one failed.
    pub fn launch(&self) -> io::Result<Option<SocketAddr>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }

        let listener = TcpListener::bind(self.addr)?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        let app = router(self.identity.clone());
        thread::Builder::new()
            .name("health-check".to_string())
            .spawn(move || serve(listener, app))?;

        info!("Health check listening on {}", local_addr);
        Ok(Some(local_addr))
    }
}

pub fn router(identity: BotIdentity) -> Router {
    Router::new().route("/", get(home)).with_state(identity)
}

async fn home(State(identity): State<BotIdentity>) -> String {
    format!("Bot {identity} is operational")
}

fn serve(listener: TcpListener, app: Router) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(why) => {
            error!("Failed to start health check runtime: {:?}", why);
            return;
        }
    };

    runtime.block_on(async move {
        let listener = match tokio::net::TcpListener::from_std(listener) {
            Ok(listener) => listener,
            Err(why) => {
                error!("Failed to register health check listener: {:?}", why);
                return;
            }
        };

        if let Err(why) = axum::serve(listener, app).await {
            error!("Health check server stopped: {:?}", why);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local_server(identity: &BotIdentity) -> HealthServer {
        HealthServer::new(identity.clone(), "127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn serves_placeholder_until_identity_is_known() {
        let identity = BotIdentity::new();
        let server = local_server(&identity);
        let addr = server.launch().unwrap().expect("first launch binds");

        let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        assert_eq!(
            response.text().await.unwrap(),
            "Bot Loading... is operational"
        );

        identity.set("watchtower#0420");
        let body = reqwest::get(format!("http://{addr}/"))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "Bot watchtower#0420 is operational");
    }

    #[tokio::test]
    async fn only_root_is_routed() {
        let identity = BotIdentity::new();
        let server = local_server(&identity);
        let addr = server.launch().unwrap().unwrap();

        let response = reqwest::get(format!("http://{addr}/status")).await.unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    }

    #[test]
    fn launches_once() {
        let server = local_server(&BotIdentity::new());

        assert!(server.launch().unwrap().is_some());
        assert!(server.launch().unwrap().is_none());
        assert!(server.launch().unwrap().is_none());
    }

    #[test]
    fn failed_bind_is_not_retried() {
        let taken = TcpListener::bind("127.0.0.1:0").unwrap();
        let server = HealthServer::new(BotIdentity::new(), taken.local_addr().unwrap());

        assert!(server.launch().is_err());
        assert!(server.launch().unwrap().is_none());
    }
}
