//! Console transport abstraction
//!
//! The console is reached over a plain bidirectional byte stream. The
//! [`Transport`] trait is the seam between the session state machine and the
//! socket, so tests can substitute in-memory streams for real TCP.

use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::{Error, Result};

/// Read buffer size for a single transport read
const READ_CHUNK_SIZE: usize = 4096;

/// A bidirectional byte stream carrying the console dialogue
#[async_trait]
pub trait Transport: Send {
    /// Read whatever bytes are available, waiting for at least one.
    /// An empty result means the remote side closed the stream.
    async fn read_chunk(&mut self) -> Result<Vec<u8>>;

    /// Write all of `data` to the stream
    async fn write_all(&mut self, data: &[u8]) -> Result<()>;

    /// Shut down the write side and release the stream
    async fn shutdown(&mut self) -> Result<()>;
}

/// [`Transport`] over any async byte stream
pub struct StreamTransport<S> {
    inner: S,
}

impl<S> StreamTransport<S> {
    /// Wrap an already connected stream
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl StreamTransport<TcpStream> {
    /// Open a TCP connection to the console
    pub async fn connect(host: &str, port: u16, timeout: Duration) -> Result<Self> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect((host, port)))
            .await
            .map_err(|_| Error::Timeout { duration: timeout })?
            .map_err(|e| Error::ConnectFailed {
                host: host.to_string(),
                port,
                reason: e.to_string(),
            })?;

        // Prompt-sized writes; Nagle coalescing only adds latency here
        if let Err(e) = stream.set_nodelay(true) {
            debug!("Failed to set TCP_NODELAY: {}", e);
        }

        Ok(Self { inner: stream })
    }
}

#[async_trait]
impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn read_chunk(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        let n = self
            .inner
            .read(&mut buf)
            .await
            .map_err(|e| Error::Transport {
                reason: e.to_string(),
            })?;
        buf.truncate(n);
        Ok(buf)
    }

    async fn write_all(&mut self, data: &[u8]) -> Result<()> {
        self.inner
            .write_all(data)
            .await
            .map_err(|e| Error::Transport {
                reason: e.to_string(),
            })?;
        self.inner.flush().await.map_err(|e| Error::Transport {
            reason: e.to_string(),
        })?;
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.inner
            .shutdown()
            .await
            .map_err(|e| Error::Transport {
                reason: e.to_string(),
            })?;
        Ok(())
    }
}
