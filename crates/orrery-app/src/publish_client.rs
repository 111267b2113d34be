//! Background client for the publish server.
//!
//! The viewer hands a [`Flow`] to [`PublishClient::submit`]; a worker thread
//! posts it to the server and the outcome comes back through
//! [`PublishClient::drain_results`] on a later frame. Only one request may be
//! in flight at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use orrery_github::{Failure, Flow, FlowOutcome};
use tracing::{info, warn};

/// A finished request.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub flow: Flow,
    pub outcome: FlowOutcome,
}

pub struct PublishClient {
    task_sender: Option<Sender<Flow>>,
    result_receiver: Receiver<PublishResult>,
    worker: Option<JoinHandle<()>>,
    busy: Arc<AtomicBool>,
    last_status: Option<String>,
}

impl PublishClient {
    /// Start the worker. `base_url` is the server origin, e.g.
    /// `http://127.0.0.1:5000`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let (task_tx, task_rx) = crossbeam_channel::bounded::<Flow>(1);
        let (result_tx, result_rx) = crossbeam_channel::unbounded();
        let busy = Arc::new(AtomicBool::new(false));

        let base_url = base_url.into();
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let flag = Arc::clone(&busy);
        let worker = thread::Builder::new()
            .name("publish-client".into())
            .spawn(move || {
                while let Ok(flow) = task_rx.recv() {
                    let outcome = post_flow(&agent, &base_url, flow);
                    flag.store(false, Ordering::Release);
                    if result_tx.send(PublishResult { flow, outcome }).is_err() {
                        break;
                    }
                }
            });
        let worker = match worker {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("Could not start publish client: {e}");
                None
            }
        };

        Self {
            task_sender: worker.as_ref().map(|_| task_tx),
            result_receiver: result_rx,
            worker,
            busy,
            last_status: None,
        }
    }

    /// Queue `flow`. Returns `false` while another request is still running
    /// or if the worker is gone.
    pub fn submit(&mut self, flow: Flow) -> bool {
        let Some(sender) = &self.task_sender else {
            return false;
        };
        if self.busy.swap(true, Ordering::AcqRel) {
            info!("Ignoring {} request: another request is in flight", flow.label());
            return false;
        }
        if sender.send(flow).is_err() {
            self.busy.store(false, Ordering::Release);
            return false;
        }
        info!("Requested {} from the publish server", flow.label());
        self.last_status = Some(format!("{}: running...", flow.label()));
        true
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Collect finished requests. Call once per frame.
    pub fn drain_results(&mut self) -> Vec<PublishResult> {
        let results: Vec<PublishResult> = self.result_receiver.try_iter().collect();
        for result in &results {
            let summary = result.outcome.summary();
            if result.outcome.is_success() {
                info!("{} finished: {summary}", result.flow.label());
            } else {
                warn!("{} finished: {summary}", result.flow.label());
            }
            self.last_status = Some(format!("{}: {summary}", result.flow.label()));
        }
        results
    }

    /// What the HUD shows about publishing, if anything happened yet.
    pub fn status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    /// Stop the worker after the request in flight, if any, completes.
    pub fn shutdown(&mut self) {
        self.task_sender.take();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }

    /// Stop without waiting. A request still in flight is left to the
    /// server and its worker thread is detached.
    pub fn close(&mut self) {
        self.task_sender.take();
        if self.is_busy() {
            if let Some(worker) = self.worker.take() {
                warn!(
                    "Closing with a publish request in flight; detaching {:?}",
                    worker.thread().name().unwrap_or("publish-client")
                );
            }
            return;
        }
        self.shutdown();
    }
}

impl Drop for PublishClient {
    fn drop(&mut self) {
        self.close();
    }
}

fn post_flow(agent: &ureq::Agent, base_url: &str, flow: Flow) -> FlowOutcome {
    let url = format!("{}{}", base_url.trim_end_matches('/'), flow.route());
    let body = match agent.post(&url).call() {
        Ok(response) => response.into_string(),
        Err(ureq::Error::Status(code, response)) => {
            let detail = response.into_string().unwrap_or_default();
            return FlowOutcome::Failed(Failure::new(format!(
                "Publish server returned {code}: {}",
                detail.trim()
            )));
        }
        Err(e) => {
            return FlowOutcome::Failed(Failure::new(format!(
                "Could not reach publish server: {e}"
            )));
        }
    };
    body.map_err(|e| e.to_string())
        .and_then(|text| serde_json::from_str::<FlowOutcome>(&text).map_err(|e| e.to_string()))
        .unwrap_or_else(|e| FlowOutcome::Failed(Failure::new(format!("Bad response: {e}"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;
    use tiny_http::{Response, Server};

    fn wait_for(client: &mut PublishClient) -> PublishResult {
        let start = Instant::now();
        loop {
            if let Some(result) = client.drain_results().into_iter().next() {
                return result;
            }
            assert!(start.elapsed() < Duration::from_secs(5), "no result");
            thread::sleep(Duration::from_millis(10));
        }
    }

    /// A server that answers every request after `delay` with `body`.
    fn serve(body: &'static str, delay: Duration) -> String {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        thread::spawn(move || {
            for request in server.incoming_requests() {
                thread::sleep(delay);
                let _ = request.respond(Response::from_string(body));
            }
        });
        format!("http://127.0.0.1:{port}")
    }

    #[test]
    fn test_result_comes_back() {
        let url = serve(
            r#"{"success":true,"repositoryUrl":"https://github.com/o/r","cloneUrl":"https://github.com/o/r.git","user":"o"}"#,
            Duration::ZERO,
        );
        let mut client = PublishClient::new(url, Duration::from_secs(5));
        assert!(client.submit(Flow::Publish));
        let result = wait_for(&mut client);
        assert_eq!(result.flow, Flow::Publish);
        assert!(result.outcome.is_success());
        assert!(!client.is_busy());
        assert_eq!(client.status(), Some("publish: Published https://github.com/o/r"));
    }

    #[test]
    fn test_refuses_while_in_flight() {
        let url = serve(r#"{"success":false,"error":"slow"}"#, Duration::from_millis(300));
        let mut client = PublishClient::new(url, Duration::from_secs(5));
        assert!(client.submit(Flow::Upload));
        assert!(client.is_busy());
        assert!(!client.submit(Flow::Publish));

        let result = wait_for(&mut client);
        assert_eq!(result.flow, Flow::Upload);
        assert!(client.submit(Flow::Publish));
    }

    #[test]
    fn test_close_does_not_wait_for_slow_request() {
        let url = serve(r#"{"success":false,"error":"slow"}"#, Duration::from_secs(3));
        let mut client = PublishClient::new(url, Duration::from_secs(10));
        assert!(client.submit(Flow::Upload));

        let start = Instant::now();
        client.close();
        assert!(start.elapsed() < Duration::from_secs(1));
        assert!(!client.submit(Flow::Publish));
    }

    #[test]
    fn test_close_when_idle_joins_worker() {
        let url = serve(r#"{"success":false,"error":"x"}"#, Duration::ZERO);
        let mut client = PublishClient::new(url, Duration::from_secs(5));
        client.close();
        assert!(client.worker.is_none());
        assert!(!client.submit(Flow::Publish));
    }

    #[test]
    fn test_unreachable_server_is_a_failure() {
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        drop(server);

        let mut client =
            PublishClient::new(format!("http://127.0.0.1:{port}"), Duration::from_secs(2));
        assert!(client.submit(Flow::PullRequest));
        match wait_for(&mut client).outcome {
            FlowOutcome::Failed(failure) => {
                assert!(failure.error.starts_with("Could not reach publish server"))
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn test_garbage_response_is_a_failure() {
        let url = serve("<html>proxy error</html>", Duration::ZERO);
        let mut client = PublishClient::new(url, Duration::from_secs(5));
        client.submit(Flow::Publish);
        let result = wait_for(&mut client);
        assert!(!result.outcome.is_success());
        assert!(result.outcome.summary().starts_with("Failed: Bad response"));
    }
}
