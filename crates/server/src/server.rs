//! TCP transport for the compute node.
//!
//! Newline-delimited JSON: every line from the client is a [`Request`],
//! every line back is a [`Response`]. A connection must look the service
//! up by name before it may execute tasks.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use compute_core::{ErrorKind, Reply, Request, Response, WireError};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::{Dispatcher, ServerConfig, TaskRegistry};

/// A compute node bound to a TCP address.
pub struct ComputeServer {
    listener: TcpListener,
    service: Arc<Service>,
}

/// What every connection shares: read-only, no locks.
struct Service {
    name: String,
    version: String,
    dispatcher: Dispatcher,
}

/// Per-connection state.
#[derive(Default)]
struct Session {
    bound: bool,
}

impl ComputeServer {
    /// Bind the listener for `config`, serving tasks from `registry`.
    pub async fn bind(config: ServerConfig, registry: TaskRegistry) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(config.bind_addr).await?;
        let service = Arc::new(Service {
            name: config.service_name.clone(),
            version: config.version.clone(),
            dispatcher: Dispatcher::new(registry),
        });
        Ok(Self { listener, service })
    }

    /// Address actually bound, useful when the configured port is 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve until Ctrl+C.
    pub async fn serve(self) -> anyhow::Result<()> {
        self.serve_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Serve until `shutdown` completes. Connections already accepted keep
    /// running on their own tasks.
    pub async fn serve_until<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = self.local_addr()?;
        info!(
            "{} v{} ready to execute tasks on {}",
            self.service.name, self.service.version, addr
        );
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                result = self.listener.accept() => {
                    match result {
                        Ok((stream, peer)) => {
                            debug!("Accepted connection from {}", peer);
                            let service = Arc::clone(&self.service);
                            tokio::spawn(async move {
                                if let Err(e) = service.handle_connection(stream).await {
                                    error!("Connection {} failed: {}", peer, e);
                                }
                                debug!("Connection from {} closed", peer);
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                _ = &mut shutdown => {
                    break;
                }
            }
        }

        info!("Compute server stopped");
        Ok(())
    }
}

impl Service {
    /// Handle a client connection.
    async fn handle_connection(&self, stream: TcpStream) -> anyhow::Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();
        let mut session = Session::default();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Request>(&line) {
                Ok(request) => self.handle_request(&mut session, request).await,
                Err(e) => {
                    error!("Failed to parse request: {}", e);
                    Response::err(None, ErrorKind::Malformed, e.to_string())
                }
            };

            let mut response_json = serde_json::to_string(&response)?;
            response_json.push('\n');
            writer.write_all(response_json.as_bytes()).await?;
        }

        Ok(())
    }

    async fn handle_request(&self, session: &mut Session, request: Request) -> Response {
        match request {
            Request::Lookup { service } => {
                if service == self.name {
                    session.bound = true;
                    Response::ok(
                        None,
                        Reply::Bound {
                            service,
                            version: self.version.clone(),
                        },
                    )
                } else {
                    Response::err(
                        None,
                        ErrorKind::Transport,
                        format!("service `{}` is not bound", service),
                    )
                }
            }

            Request::Execute { task } => {
                let id = Some(task.request_id);
                if !session.bound {
                    return Response::err(
                        id,
                        ErrorKind::Transport,
                        "look up the service before executing tasks",
                    );
                }
                match self.dispatcher.dispatch(task).await {
                    Ok(result) => Response::ok(id, Reply::Executed(result)),
                    Err(e) => Response {
                        id,
                        result: None,
                        error: Some(WireError::from(&e)),
                    },
                }
            }

            Request::Ping => Response::ok(None, Reply::Pong),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_core::{Task, TaskEnvelope};
    use compute_tasks::MandelbrotSetTask;
    use serde::Deserialize;

    fn service() -> Service {
        Service {
            name: "Computer".to_string(),
            version: "test".to_string(),
            dispatcher: Dispatcher::new(TaskRegistry::with_builtin_tasks()),
        }
    }

    fn mandelbrot() -> TaskEnvelope {
        TaskEnvelope::seal(&MandelbrotSetTask::new([-2.0, -2.0], 4.0, 4, 8).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_execute_requires_lookup() {
        let service = service();
        let mut session = Session::default();
        let response = service
            .handle_request(&mut session, Request::Execute { task: mandelbrot() })
            .await;
        assert_eq!(response.error.unwrap().kind, ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_lookup_wrong_name() {
        let service = service();
        let mut session = Session::default();
        let response = service
            .handle_request(
                &mut session,
                Request::Lookup {
                    service: "Elsewhere".to_string(),
                },
            )
            .await;
        assert!(response.result.is_none());
        assert!(!session.bound);
    }

    #[tokio::test]
    async fn test_lookup_then_execute() {
        let service = service();
        let mut session = Session::default();
        let bound = service
            .handle_request(
                &mut session,
                Request::Lookup {
                    service: "Computer".to_string(),
                },
            )
            .await;
        assert!(matches!(bound.result, Some(Reply::Bound { .. })));

        let envelope = mandelbrot();
        let request_id = envelope.request_id;
        let response = service
            .handle_request(&mut session, Request::Execute { task: envelope })
            .await;
        assert_eq!(response.id, Some(request_id));
        let Some(Reply::Executed(result)) = response.result else {
            panic!("Wrong reply");
        };
        let grid = result.decode::<MandelbrotSetTask>().unwrap();
        assert_eq!(grid.resolution(), 4);
    }

    #[tokio::test]
    async fn test_ping() {
        let service = service();
        let response = service
            .handle_request(&mut Session::default(), Request::Ping)
            .await;
        assert!(matches!(response.result, Some(Reply::Pong)));
    }

    #[tokio::test]
    async fn test_tcp_roundtrip_and_malformed_line() {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = ComputeServer::bind(config, TaskRegistry::with_builtin_tasks())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(server.serve_until(async {
            let _ = stop_rx.await;
        }));

        let stream = TcpStream::connect(addr).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        writer.write_all(b"this is not json\n").await.unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert_eq!(response.error.unwrap().kind, ErrorKind::Malformed);

        writer
            .write_all(b"{\"method\":\"lookup\",\"service\":\"Computer\"}\n")
            .await
            .unwrap();
        let line = lines.next_line().await.unwrap().unwrap();
        let response: Response = serde_json::from_str(&line).unwrap();
        assert!(matches!(response.result, Some(Reply::Bound { .. })));

        let request = Request::Execute { task: mandelbrot() };
        let mut json = serde_json::to_string(&request).unwrap();
        json.push('\n');
        writer.write_all(json.as_bytes()).await.unwrap();
        let line = lines.next_line().await.unwrap().unwrap();

        #[derive(Deserialize)]
        struct Raw {
            result: serde_json::Value,
        }
        let raw: Raw = serde_json::from_str(&line).unwrap();
        assert_eq!(raw.result["type"], "executed");
        assert_eq!(
            raw.result["result_type"],
            format!("{}/output", MandelbrotSetTask::KIND)
        );

        stop_tx.send(()).unwrap();
        handle.await.unwrap().unwrap();
    }
}
