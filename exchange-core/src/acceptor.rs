use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

use crate::dispatcher::Dispatcher;
use crate::session::Session;

/// Socket read timeout; a timeout loops the worker rather than terminating the session (§4.3,
/// §5 "Timeouts").
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// Grace period given to in-flight session workers to flush after a shutdown signal (§4.5).
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Binds the listening socket and accepts connections until a Ctrl-C/SIGINT is received, then
/// stops accepting and gives in-flight sessions `SHUTDOWN_GRACE` to finish (§4.5, §6 "Exit
/// codes"). One `tokio::spawn`ed worker per accepted connection (§5 "Scheduling model").
pub async fn run_acceptor(bind_addr: &str, dispatcher: Arc<Dispatcher>) -> std::io::Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    info!(%bind_addr, "exchange gateway listening");

    let mut next_session_id: u64 = 1;
    let mut workers = Vec::new();

    loop {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, peer_addr) = match accepted {
                    Ok(pair) => pair,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };
                let session_id = next_session_id;
                next_session_id += 1;
                let dispatcher = dispatcher.clone();
                info!(session_id, %peer_addr, "accepted connection");
                workers.push(tokio::spawn(run_session(session_id, stream, dispatcher)));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received, closing listener");
                break;
            }
        }
    }

    let shutdown = async {
        for worker in workers {
            let _ = worker.await;
        }
    };
    if tokio::time::timeout(SHUTDOWN_GRACE, shutdown).await.is_err() {
        warn!("session workers did not finish within the shutdown grace period");
    }

    Ok(())
}

async fn run_session(session_id: u64, mut stream: TcpStream, dispatcher: Arc<Dispatcher>) {
    let mut session = Session::new(session_id);
    let mut read_buf = [0u8; 4096];

    loop {
        let read_result = tokio::time::timeout(READ_TIMEOUT, stream.read(&mut read_buf)).await;

        let n = match read_result {
            Ok(Ok(0)) => {
                info!(session_id, "peer closed connection");
                break;
            }
            Ok(Ok(n)) => n,
            Ok(Err(e)) => {
                warn!(session_id, error = %e, "socket read error");
                break;
            }
            Err(_) => continue, // read timeout: loop and keep waiting, not a termination (§5)
        };

        let outbound = session.feed(&read_buf[..n], &dispatcher);
        for frame in outbound {
            if let Err(e) = stream.write_all(&frame).await {
                warn!(session_id, error = %e, "socket write error");
                return;
            }
        }

        if session.state() == crate::session::SessionState::Closing {
            let _ = stream.shutdown().await;
            break;
        }
    }
}
