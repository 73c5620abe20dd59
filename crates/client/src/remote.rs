//! Handle to a compute node across the network.

use async_trait::async_trait;
use compute_core::{
    Computer, ComputeError, Reply, Request, Response, Result, Task, TaskEnvelope,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tracing::debug;

struct Connection {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Connection {
    async fn roundtrip(&mut self, request: &Request) -> Result<Response> {
        let mut json = serde_json::to_string(request)?;
        json.push('\n');
        self.writer
            .write_all(json.as_bytes())
            .await
            .map_err(transport)?;

        let line = self
            .lines
            .next_line()
            .await
            .map_err(transport)?
            .ok_or_else(|| ComputeError::Transport("connection closed by server".to_string()))?;

        Ok(serde_json::from_str(&line)?)
    }
}

fn transport(e: std::io::Error) -> ComputeError {
    ComputeError::Transport(e.to_string())
}

/// A [`Computer`] living on another host.
///
/// Holds one connection; concurrent `execute` calls on the same handle take
/// turns on it.
pub struct RemoteComputer {
    service: String,
    server_version: String,
    connection: Mutex<Connection>,
}

impl RemoteComputer {
    /// Connect to `addr` and look up `service` there.
    ///
    /// Both an unreachable host and an unknown service name surface as
    /// [`ComputeError::Transport`].
    pub async fn lookup(addr: impl ToSocketAddrs, service: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr).await.map_err(transport)?;
        let (reader, writer) = stream.into_split();
        let mut connection = Connection {
            lines: BufReader::new(reader).lines(),
            writer,
        };

        let reply = connection
            .roundtrip(&Request::Lookup {
                service: service.to_string(),
            })
            .await?
            .into_result()?;

        let Reply::Bound { service, version } = reply else {
            return Err(ComputeError::Transport(
                "unexpected reply to lookup".to_string(),
            ));
        };
        debug!("Bound to {} v{}", service, version);

        Ok(Self {
            service,
            server_version: version,
            connection: Mutex::new(connection),
        })
    }

    /// Name of the service this handle is bound to.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Version the server reported on lookup.
    pub fn server_version(&self) -> &str {
        &self.server_version
    }

    /// Check that the server still answers.
    pub async fn ping(&self) -> Result<()> {
        let mut connection = self.connection.lock().await;
        match connection.roundtrip(&Request::Ping).await?.into_result()? {
            Reply::Pong => Ok(()),
            _ => Err(ComputeError::Transport("unexpected reply to ping".to_string())),
        }
    }
}

#[async_trait]
impl Computer for RemoteComputer {
    async fn execute<T: Task>(&self, task: T) -> Result<T::Output> {
        let envelope = TaskEnvelope::seal(&task)?;
        let request_id = envelope.request_id;

        let response = {
            let mut connection = self.connection.lock().await;
            connection
                .roundtrip(&Request::Execute { task: envelope })
                .await?
        };

        if response.id.is_some_and(|id| id != request_id) {
            return Err(ComputeError::Transport(format!(
                "reply does not belong to request {}",
                request_id
            )));
        }

        match response.into_result()? {
            Reply::Executed(result) => {
                debug!("{} executed remotely in {} ms", T::KIND, result.elapsed_ms);
                result.decode::<T>()
            }
            _ => Err(ComputeError::Transport(
                "unexpected reply to execute".to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use compute_server::{ComputeServer, ServerConfig, TaskRegistry};
    use compute_tasks::{EuclideanTspTask, MandelbrotSetTask};
    use std::net::SocketAddr;

    async fn start_server() -> (SocketAddr, tokio::sync::oneshot::Sender<()>) {
        let config = ServerConfig {
            bind_addr: "127.0.0.1:0".parse().unwrap(),
            ..Default::default()
        };
        let server = ComputeServer::bind(config, TaskRegistry::with_builtin_tasks())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(server.serve_until(async {
            let _ = rx.await;
        }));
        (addr, tx)
    }

    #[tokio::test]
    async fn test_remote_tour_matches_direct_execution() {
        let (addr, _stop) = start_server().await;
        let computer = RemoteComputer::lookup(addr, "Computer").await.unwrap();
        assert_eq!(computer.service(), "Computer");

        let task = EuclideanTspTask::from_coordinates(&[
            [6.0, 3.0],
            [2.0, 2.0],
            [5.0, 8.0],
            [1.0, 5.0],
            [1.0, 6.0],
            [2.0, 7.0],
            [2.0, 8.0],
            [6.0, 5.0],
            [1.0, 3.0],
            [6.0, 6.0],
        ])
        .unwrap();

        let direct = task.execute().unwrap();
        let remote = computer.execute(task).await.unwrap();
        assert_eq!(remote.order, direct.order);
        assert_eq!(remote.order, vec![0, 1, 8, 3, 4, 5, 6, 2, 9, 7]);
        assert_eq!(remote.cost, direct.cost);
    }

    #[tokio::test]
    async fn test_remote_grid_and_repeated_calls() {
        let (addr, _stop) = start_server().await;
        let computer = RemoteComputer::lookup(addr, "Computer").await.unwrap();
        let task = MandelbrotSetTask::new([-2.0, -2.0], 4.0, 16, 32).unwrap();

        let first = computer.execute(task.clone()).await.unwrap();
        let second = computer.execute(task.clone()).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first, task.execute().unwrap());
        computer.ping().await.unwrap();
    }

    #[tokio::test]
    async fn test_remote_invalid_argument() {
        let (addr, _stop) = start_server().await;
        let computer = RemoteComputer::lookup(addr, "Computer").await.unwrap();
        let task = MandelbrotSetTask {
            corner: [0.0, 0.0],
            edge_length: 1.0,
            resolution: 4,
            iteration_limit: 0,
        };
        let err = computer.execute(task).await.unwrap_err();
        assert!(matches!(err, ComputeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_overflowing_tour_fails_the_same_way_remotely() {
        let (addr, _stop) = start_server().await;
        let computer = RemoteComputer::lookup(addr, "Computer").await.unwrap();
        let task = EuclideanTspTask::from_coordinates(&[[0.0, 0.0], [1e200, 0.0], [0.0, 1.0]])
            .unwrap();

        assert!(task.execute().is_err());
        let err = computer.execute(task).await.unwrap_err();
        assert!(matches!(err, ComputeError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_lookup_unknown_service_is_transport_failure() {
        let (addr, _stop) = start_server().await;
        let err = RemoteComputer::lookup(addr, "Nobody").await.err().unwrap();
        assert!(matches!(err, ComputeError::Transport(_)));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_failure() {
        // Bind then drop, so nothing listens on the port.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = RemoteComputer::lookup(addr, "Computer").await.err().unwrap();
        assert!(matches!(err, ComputeError::Transport(_)));
    }
}
