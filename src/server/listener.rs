use std::sync::Arc;

use anyhow::Context;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::http::connection::{Connection, Site};
use crate::http::status::StatusCode;
use crate::server::pool::WorkerPool;

pub async fn run(cfg: &Config) -> anyhow::Result<()> {
    let site = Site::from_config(&cfg.http)
        .with_context(|| format!("invalid server root {}", cfg.http.root.display()))?;

    let listener = TcpListener::bind(&cfg.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", cfg.server.listen_addr))?;
    info!(
        "Serving files in {} on http://{}",
        site.root.path().display(),
        listener.local_addr()?
    );

    let pool = WorkerPool::new(cfg.server.workers, cfg.server.queue_depth);
    serve(listener, Arc::new(site), pool).await
}

/// Accepts connections forever, handing each to the pool.
pub async fn serve(listener: TcpListener, site: Arc<Site>, pool: WorkerPool) -> anyhow::Result<()> {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                error!("accept failed: {}", e);
                continue;
            }
        };
        debug!("Accepted connection from {}", peer);

        if let Err(e) = socket.set_nodelay(true) {
            debug!(%peer, error = %e, "failed to set TCP_NODELAY");
        }

        match pool.try_admit() {
            Ok(admission) => {
                let site = site.clone();
                admission.spawn(async move {
                    Connection::new(socket, peer, site).run().await;
                });
            }
            Err(e) => {
                error!(%peer, error = %e, "refusing connection");
                refuse(&socket);
            }
        }
    }
}

/// Best-effort 503 for a connection the pool cannot take. Never waits on
/// the client.
fn refuse(socket: &TcpStream) {
    let reply = format!(
        "HTTP/1.1 {}\r\nConnection: Closed\r\nContent-Length: 0\r\n\r\n",
        StatusCode::ServiceUnavailable
    );
    if let Err(e) = socket.try_write(reply.as_bytes()) {
        debug!(error = %e, "could not send 503");
    }
}
