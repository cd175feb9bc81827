//! Concurrent readers that keep the child's output pipes empty.
//!
//! The OS pipe buffer is bounded (~64 KiB on Linux); a conversion tool
//! writing verbose progress to stderr blocks on write once the buffer
//! fills if nothing reads it, and the run would appear to hang forever.
//! Both streams are therefore drained by independent tasks for the whole
//! lifetime of the child, each into its own buffer. Capture preserves
//! emission order within a stream, with no ordering across streams.

use std::io::ErrorKind;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Join bound after a normal exit.
pub(crate) const DRAIN_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shorter flush bound after a kill; the streams are already closed and
/// anything still buffered arrives almost immediately.
pub(crate) const DRAIN_KILL_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

const READ_CHUNK_SIZE: usize = 8_192;

/// Read an output stream to EOF, appending chunks to the shared buffer.
async fn read_output_stream<R>(mut reader: R, buf: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => {
                if let Ok(mut guard) = buf.lock() {
                    guard.extend_from_slice(&chunk[..n]);
                }
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
}

/// Two concurrent stream readers attached to a spawned child.
pub(crate) struct OutputDrain {
    stdout_buf: Arc<Mutex<Vec<u8>>>,
    stderr_buf: Arc<Mutex<Vec<u8>>>,
    stdout_task: Option<JoinHandle<()>>,
    stderr_task: Option<JoinHandle<()>>,
}

impl OutputDrain {
    /// Take the child's pipes and start draining them. Must run before the
    /// first wait on the child.
    pub(crate) fn start(child: &mut Child) -> Self {
        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));

        let stdout_task = child.stdout.take().map(|stream| {
            let buf = Arc::clone(&stdout_buf);
            tokio::spawn(async move {
                read_output_stream(stream, buf).await;
            })
        });
        let stderr_task = child.stderr.take().map(|stream| {
            let buf = Arc::clone(&stderr_buf);
            tokio::spawn(async move {
                read_output_stream(stream, buf).await;
            })
        });

        Self {
            stdout_buf,
            stderr_buf,
            stdout_task,
            stderr_task,
        }
    }

    /// Wait for both readers to hit EOF, bounded by `limit` per stream so a
    /// misbehaving reader cannot hang the caller, then return the captured
    /// output. On a bounded-wait expiry the partial buffer is returned.
    pub(crate) async fn join(mut self, limit: Duration) -> (String, String) {
        join_reader(self.stdout_task.take(), limit).await;
        join_reader(self.stderr_task.take(), limit).await;

        let stdout = take_buffer(&self.stdout_buf);
        let stderr = take_buffer(&self.stderr_buf);
        (stdout, stderr)
    }
}

async fn join_reader(task: Option<JoinHandle<()>>, limit: Duration) {
    let Some(task) = task else {
        return;
    };
    if tokio::time::timeout(limit, task).await.is_err() {
        tracing::debug!("output drain did not finish within {limit:?}");
    }
}

fn take_buffer(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    match buf.lock() {
        Ok(mut guard) => String::from_utf8_lossy(&std::mem::take(&mut *guard)).into_owned(),
        Err(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn reader_accumulates_until_eof() {
        let data = b"line one\nline two\n".to_vec();
        let buf = Arc::new(Mutex::new(Vec::new()));
        read_output_stream(BufReader::new(&data[..]), Arc::clone(&buf)).await;
        assert_eq!(*buf.lock().unwrap(), data);
    }

    #[tokio::test]
    async fn join_returns_both_streams() {
        let mut child = tokio::process::Command::new("sh")
            .arg("-c")
            .arg("echo out; echo err 1>&2")
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()
            .expect("spawn sh");

        let drain = OutputDrain::start(&mut child);
        let _ = child.wait().await;
        let (stdout, stderr) = drain.join(DRAIN_JOIN_TIMEOUT).await;
        assert_eq!(stdout, "out\n");
        assert_eq!(stderr, "err\n");
    }
}
