//! Local invocation harness.
//!
//! Stands in for the platform runtime: reads one JSON event per line, invokes
//! the adapter, writes one JSON result per line. Invocation errors are written
//! in the platform's error shape.

use std::future::Future;
use std::io;

use serde::Serialize;
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use uuid::Uuid;

use crate::adapter::{AdapterError, Invoke};

/// Result reported for a failed invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationError {
    pub error_message: String,
    pub error_type: String,
}

impl From<&AdapterError> for InvocationError {
    fn from(e: &AdapterError) -> Self {
        Self {
            error_message: e.to_string(),
            error_type: e.kind().to_string(),
        }
    }
}

/// Counters for one harness run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HarnessStats {
    pub succeeded: u64,
    pub failed: u64,
}

/// Invocation context handed to the adapter for each event.
pub fn invocation_context() -> Value {
    json!({
        "awsRequestId": Uuid::new_v4().to_string(),
        "functionName": env!("CARGO_PKG_NAME"),
        "functionVersion": env!("CARGO_PKG_VERSION"),
    })
}

/// Run every event from `input` through `handler` until end of input or `shutdown`.
///
/// An invocation already in flight when `shutdown` fires is completed and
/// reported; no further events are read.
pub async fn run<R, W, H, S>(
    input: R,
    mut output: W,
    handler: &H,
    shutdown: S,
) -> io::Result<HarnessStats>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    H: Invoke,
    S: Future<Output = ()>,
{
    let mut stats = HarnessStats::default();
    let mut lines = input.lines();
    tokio::pin!(shutdown);

    loop {
        let next = tokio::select! {
            biased;
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested, no further events read");
                None
            }
            line = lines.next_line() => line?,
        };
        let Some(line) = next else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let context = invocation_context();
        let rendered = match handler.invoke(line.as_bytes(), &context).await {
            Ok(response) => {
                stats.succeeded += 1;
                serde_json::to_string(&response)?
            }
            Err(e) => {
                stats.failed += 1;
                serde_json::to_string(&InvocationError::from(&e))?
            }
        };

        output.write_all(rendered.as_bytes()).await?;
        output.write_all(b"\n").await?;
        output.flush().await?;
    }

    tracing::info!(
        succeeded = stats.succeeded,
        failed = stats.failed,
        "Harness stopped"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::AdapterResult;
    use crate::event::ProxyResponse;
    use crate::lifecycle::Shutdown;
    use std::time::Duration;
    use tokio::io::BufReader;
    use tokio::time::timeout;

    /// Answers 200 for any event that parses, fails otherwise.
    struct Parrot;

    impl Invoke for Parrot {
        async fn invoke(&self, event: &[u8], context: &Value) -> AdapterResult<ProxyResponse> {
            let event: Value = serde_json::from_slice(event)?;
            assert!(context["awsRequestId"].is_string());
            Ok(ProxyResponse {
                status_code: 200,
                body: event["path"].as_str().unwrap_or_default().to_string(),
                ..Default::default()
            })
        }
    }

    #[tokio::test]
    async fn test_run_lines() {
        let input: &[u8] = b"{\"path\":\"/a\"}\n\n{not json\n{\"path\":\"/b\"}\n";
        let mut output = Vec::new();

        let stats = run(input, &mut output, &Parrot, std::future::pending())
            .await
            .unwrap();
        assert_eq!(stats, HarnessStats { succeeded: 2, failed: 1 });

        let lines: Vec<Value> = std::str::from_utf8(&output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0]["body"], "/a");
        assert_eq!(lines[1]["errorType"], "MalformedEvent");
        assert_eq!(lines[2]["statusCode"], 200);
    }

    #[tokio::test]
    async fn test_shutdown_stops_reading_open_input() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let shutdown = Shutdown::new();
        let mut output = Vec::new();

        writer.write_all(b"{\"path\":\"/first\"}\n").await.unwrap();

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.trigger();
        });

        let stats = timeout(
            Duration::from_secs(2),
            run(BufReader::new(reader), &mut output, &Parrot, shutdown.wait()),
        )
        .await
        .expect("harness kept waiting on open input after shutdown")
        .unwrap();

        assert_eq!(stats, HarnessStats { succeeded: 1, failed: 0 });
        let rendered: Value = serde_json::from_slice(output.trim_ascii_end()).unwrap();
        assert_eq!(rendered["body"], "/first");
        drop(writer);
    }

    #[tokio::test]
    async fn test_shutdown_before_start_reads_nothing() {
        let input: &[u8] = b"{\"path\":\"/never\"}\n";
        let shutdown = Shutdown::new();
        shutdown.trigger();
        let mut output = Vec::new();

        let stats = run(input, &mut output, &Parrot, shutdown.wait()).await.unwrap();
        assert_eq!(stats, HarnessStats::default());
        assert!(output.is_empty());
    }
}
