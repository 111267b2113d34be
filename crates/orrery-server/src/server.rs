//! Publish server implementation.

use std::io::Cursor;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use orrery_github::{Failure, Flow, FlowOutcome, Publisher};
use serde::{Deserialize, Serialize};
use tiny_http::{Header, Method, Request, Response, Server};
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind to {address}: {error}")]
    BindError { address: String, error: String },
    #[error("Failed to spawn server thread: {0}")]
    Spawn(std::io::Error),
    #[error("Server thread panicked")]
    ThreadPanic,
}

/// Runs one publishing flow to completion.
pub trait PublishService: Send + Sync + 'static {
    fn run(&self, flow: Flow) -> FlowOutcome;
}

impl PublishService for Publisher {
    fn run(&self, flow: Flow) -> FlowOutcome {
        Publisher::run(self, flow)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
}

/// HTTP server for the publish routes. The accept loop runs on a background
/// thread and each request is handled on its own thread, so a long upload
/// never blocks `/health`.
pub struct PublishServer {
    address: String,
    port: u16,
    actual_port: Option<u16>,
    server: Option<Arc<Server>>,
    handle: Option<JoinHandle<()>>,
}

type JsonResponse = Response<Cursor<Vec<u8>>>;

impl PublishServer {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
            actual_port: None,
            server: None,
            handle: None,
        }
    }

    pub fn start(&mut self, service: Arc<dyn PublishService>) -> Result<(), ServerError> {
        let address = format!("{}:{}", self.address, self.port);
        let server = Server::http(&address).map_err(|e| ServerError::BindError {
            address: address.clone(),
            error: e.to_string(),
        })?;

        let actual_port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .unwrap_or(self.port);
        self.actual_port = Some(actual_port);
        info!("Publish server listening on {}:{actual_port}", self.address);

        let server = Arc::new(server);
        let accept = server.clone();
        let started = Instant::now();
        let handle = thread::Builder::new()
            .name("publish-server".into())
            .spawn(move || Self::run_server(&accept, service, started))
            .map_err(ServerError::Spawn)?;

        self.server = Some(server);
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop accepting requests and wait for the accept loop to exit.
    /// Requests already being handled finish on their own threads.
    pub fn stop(&mut self) {
        if let Some(server) = self.server.take() {
            server.unblock();
        }
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Publish server thread panicked");
        }
    }

    /// Block until the accept loop exits.
    pub fn wait(&mut self) -> Result<(), ServerError> {
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| ServerError::ThreadPanic),
            None => Ok(()),
        }
    }

    pub fn actual_port(&self) -> u16 {
        self.actual_port.unwrap_or(self.port)
    }

    fn run_server(server: &Server, service: Arc<dyn PublishService>, started: Instant) {
        for request in server.incoming_requests() {
            let service = service.clone();
            let spawned = thread::Builder::new()
                .name("publish-request".into())
                .spawn(move || {
                    if let Err(e) = Self::handle_request(request, service.as_ref(), started) {
                        warn!("Publish server error: {e}");
                    }
                });
            if let Err(e) = spawned {
                warn!("Could not spawn request thread: {e}");
            }
        }
        debug!("Publish server accept loop exited");
    }

    fn handle_request(
        request: Request,
        service: &dyn PublishService,
        started: Instant,
    ) -> std::io::Result<()> {
        let path = request.url().split('?').next().unwrap_or("").to_string();
        let response = match (request.method(), path.as_str()) {
            (&Method::Get, "/health") => json_response(
                200,
                serde_json::to_string(&HealthResponse {
                    status: "ok".to_string(),
                    uptime_seconds: started.elapsed().as_secs_f64(),
                }),
            ),
            (&Method::Post, route) => match Flow::from_route(route) {
                Some(flow) => {
                    info!("POST {route}: running {} flow", flow.label());
                    let outcome = service.run(flow);
                    info!("{} flow finished: {}", flow.label(), outcome.summary());
                    json_response(200, serde_json::to_string(&outcome))
                }
                None => not_found(),
            },
            _ => not_found(),
        };
        request.respond(response)
    }
}

impl Drop for PublishServer {
    fn drop(&mut self) {
        self.stop();
    }
}

fn with_json_type(response: JsonResponse) -> JsonResponse {
    match Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]) {
        Ok(header) => response.with_header(header),
        Err(()) => response,
    }
}

/// Serialization failures become a 500 carrying the standard failure shape.
pub(crate) fn json_response(status: u16, body: serde_json::Result<String>) -> JsonResponse {
    let (status, body) = match body {
        Ok(body) => (status, body),
        Err(e) => (
            500,
            serde_json::to_string(&Failure::new(e.to_string())).unwrap_or_else(|_| {
                r#"{"success":false,"error":"Internal server error"}"#.to_string()
            }),
        ),
    };
    with_json_type(Response::from_string(body).with_status_code(status))
}

fn not_found() -> JsonResponse {
    Response::from_string("Not Found").with_status_code(404)
}
