//! Dedicated writer task for a single connection.
//!
//! Finalization never touches the socket directly: encoded response
//! bytes go through an mpsc channel to a writer task that owns the
//! write half of the connection. This keeps `complete()` callable from
//! any task without sharing the stream behind a lock, and gives the
//! transport resource a single place to shut the stream down.
//!
//! ```text
//! finalize ─► mpsc::Sender<Bytes> ─► Writer Task ─► connection
//! ```
//!
//! Closing the channel (see [`WriterHandle::close`]) ends the task,
//! which flushes and shuts the stream down before exiting.

use bytes::Bytes;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{DispatchError, Result};

/// Default channel capacity for queued writes.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Handle for sending encoded bytes to the writer task.
///
/// Cheaply cloneable; all clones feed the same connection.
#[derive(Clone)]
pub struct WriterHandle {
    tx: mpsc::Sender<Bytes>,
}

impl WriterHandle {
    /// Queue bytes for writing.
    ///
    /// Fails with [`DispatchError::ConnectionClosed`] once the writer
    /// task has shut down.
    pub async fn send(&self, bytes: Bytes) -> Result<()> {
        self.tx
            .send(bytes)
            .await
            .map_err(|_| DispatchError::ConnectionClosed)
    }

    /// Close the write channel.
    ///
    /// Queued bytes are still flushed; the writer task then shuts the
    /// stream down and exits. Idempotent.
    pub fn close(&self) {
        // Dropping all senders is how the channel closes; an explicit
        // marker is enough because handles are clones of one sender.
        let _ = self.tx.try_send(Bytes::new());
    }

    /// Whether the writer task is still accepting bytes.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

/// Spawn the writer task for a connection's write half.
///
/// Returns the sending handle and the task's join handle. The task
/// exits when every [`WriterHandle`] clone is dropped or after a
/// [`close`](WriterHandle::close) marker, shutting the stream down on
/// the way out.
pub fn spawn_writer_task<W>(writer: W, capacity: usize) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = WriterHandle { tx };
    let task = tokio::spawn(writer_loop(rx, writer));
    (handle, task)
}

/// Spawn the writer task with the default channel capacity.
pub fn spawn_writer_task_default<W>(writer: W) -> (WriterHandle, JoinHandle<Result<()>>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    spawn_writer_task(writer, DEFAULT_CHANNEL_CAPACITY)
}

/// Drain the channel onto the stream; shut down on close.
async fn writer_loop<W>(mut rx: mpsc::Receiver<Bytes>, mut writer: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(bytes) = rx.recv().await {
        if bytes.is_empty() {
            // Close marker.
            break;
        }
        writer.write_all(&bytes).await?;
        writer.flush().await?;
    }
    let _ = writer.shutdown().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{duplex, AsyncReadExt};

    #[tokio::test]
    async fn test_send_reaches_stream() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task_default(client);

        handle.send(Bytes::from_static(b"HTTP/1.1 200 OK\r\n\r\n"))
            .await
            .unwrap();

        let mut buf = vec![0u8; 64];
        let n = server.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"HTTP/1.1 200 OK\r\n\r\n");
    }

    #[tokio::test]
    async fn test_close_shuts_stream_down() {
        let (client, mut server) = duplex(4096);
        let (handle, task) = spawn_writer_task_default(client);

        handle.send(Bytes::from_static(b"tail")).await.unwrap();
        handle.close();

        task.await.unwrap().unwrap();

        let mut buf = Vec::new();
        server.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"tail");
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let (client, _server) = duplex(4096);
        let (handle, task) = spawn_writer_task_default(client);

        handle.close();
        task.await.unwrap().unwrap();

        let result = handle.send(Bytes::from_static(b"late")).await;
        assert!(matches!(result, Err(DispatchError::ConnectionClosed)));
    }

    #[tokio::test]
    async fn test_task_exits_when_handles_drop() {
        let (client, _server) = duplex(4096);
        let (handle, task) = spawn_writer_task_default(client);

        drop(handle);

        let result = task.await.unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_clones_feed_same_stream() {
        let (client, mut server) = duplex(4096);
        let (handle, _task) = spawn_writer_task_default(client);
        let clone = handle.clone();

        handle.send(Bytes::from_static(b"one,")).await.unwrap();
        clone.send(Bytes::from_static(b"two")).await.unwrap();

        let mut buf = vec![0u8; 16];
        let mut got = Vec::new();
        while got.len() < 7 {
            let n = server.read(&mut buf).await.unwrap();
            got.extend_from_slice(&buf[..n]);
        }
        assert_eq!(got, b"one,two");
    }
}
