//! Unix socket server and per-connection command loop

use crate::protocol::Request;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{error, info, warn};

pub struct SocketServer {
    path: PathBuf,
    listener: UnixListener,
}

impl SocketServer {
    /// Bind the listening socket, removing any stale path entry first.
    pub fn bind(path: &Path) -> std::io::Result<Self> {
        let _ = std::fs::remove_file(path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let listener = UnixListener::bind(path)?;
        info!("Socket server listening on {:?}", path);
        Ok(Self {
            path: path.to_path_buf(),
            listener,
        })
    }

    pub async fn accept(&self) -> std::io::Result<UnixStream> {
        let (stream, _) = self.listener.accept().await?;
        Ok(stream)
    }
}

impl Drop for SocketServer {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[async_trait::async_trait]
pub trait RequestHandler {
    /// Produce the complete wire reply for one command.
    async fn handle(&self, request: Request) -> String;
}

/// Serve one client until it disconnects. One command line per iteration;
/// a malformed or unknown command gets an error reply and the connection
/// stays open.
pub async fn handle_client<H>(stream: UnixStream, handler: Arc<H>)
where
    H: RequestHandler + Send + Sync + 'static,
{
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => {
                info!("Client closed connection");
                break;
            }
            Ok(_) => {
                let command = line.trim_end_matches(['\r', '\n']);
                let reply = match Request::parse(command) {
                    Ok(request) => handler.handle(request).await,
                    Err(e) => {
                        warn!("Rejected command {:?}: {:?}", command, e);
                        e.reply().to_string()
                    }
                };
                if let Err(e) = writer.write_all(reply.as_bytes()).await {
                    error!("Failed to write reply: {}", e);
                    break;
                }
            }
            Err(e) => {
                error!("Read error: {}", e);
                break;
            }
        }
    }
}
