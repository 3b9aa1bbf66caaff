//! Message transport seam
//!
//! The worker only needs to pull the next message and publish a message to a
//! routing key. The bundled transport speaks JSON lines: bare messages in,
//! envelopes out.

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thumbnailer_core::{FileMessage, FILE_PROCESSING_MESSAGE};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;

#[async_trait]
pub trait MessageSource: Send {
    /// Next inbound message, or `None` when the source is exhausted
    async fn next_message(&mut self) -> anyhow::Result<Option<FileMessage>>;
}

#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, routing_key: &str, message: &FileMessage) -> anyhow::Result<()>;
}

/// Outbound wire shape
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    pub routing_key: String,
    pub message_type: String,
    pub payload: FileMessage,
}

/// Reads one JSON message per line. Lines that do not parse are logged and skipped.
pub struct JsonLinesSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

impl JsonLinesSource<BufReader<tokio::io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

#[async_trait]
impl<R: AsyncBufRead + Unpin + Send> MessageSource for JsonLinesSource<R> {
    async fn next_message(&mut self) -> anyhow::Result<Option<FileMessage>> {
        while let Some(line) = self
            .lines
            .next_line()
            .await
            .context("Failed to read from message source")?
        {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<FileMessage>(line) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding malformed message");
                }
            }
        }
        Ok(None)
    }
}

/// Writes one envelope per line
pub struct JsonLinesPublisher<W> {
    writer: Mutex<W>,
}

impl<W: AsyncWrite + Unpin + Send> JsonLinesPublisher<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl JsonLinesPublisher<tokio::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> MessagePublisher for JsonLinesPublisher<W> {
    async fn publish(&self, routing_key: &str, message: &FileMessage) -> anyhow::Result<()> {
        let envelope = Envelope {
            routing_key: routing_key.to_string(),
            message_type: FILE_PROCESSING_MESSAGE.to_string(),
            payload: message.clone(),
        };
        let mut line = serde_json::to_vec(&envelope).context("Failed to encode message")?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(&line)
            .await
            .context("Failed to publish message")?;
        writer.flush().await.context("Failed to publish message")?;

        tracing::debug!(routing_key = %routing_key, message_id = %message.uuid, "Message published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_messages_and_skips_garbage() {
        let input = b"{\"Uuid\":\"a\",\"Library\":\"l\",\"Path\":\"p\"}\n\nnot json\n{\"Uuid\":\"b\",\"Library\":\"l\",\"Path\":\"q\",\"Mime\":\"application/pdf\"}\n";
        let mut source = JsonLinesSource::new(&input[..]);

        assert_eq!(source.next_message().await.unwrap().unwrap().uuid, "a");
        let second = source.next_message().await.unwrap().unwrap();
        assert_eq!(second.uuid, "b");
        assert_eq!(second.mime.as_deref(), Some("application/pdf"));
        assert!(source.next_message().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn publishes_envelope_per_line() {
        let publisher = JsonLinesPublisher::new(Vec::new());
        let mut message = FileMessage::new("d1", "miniofiles", "docs/a.pdf");
        message
            .extra
            .insert("Harvester".to_string(), serde_json::json!("sharepoint"));

        publisher.publish("next.queue", &message).await.unwrap();
        publisher.publish("other.queue", &message).await.unwrap();

        let output = String::from_utf8(publisher.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["routingKey"], "next.queue");
        assert_eq!(lines[0]["messageType"], "fileProcessingMessage");
        assert_eq!(lines[0]["payload"]["Uuid"], "d1");
        assert_eq!(lines[0]["payload"]["Harvester"], "sharepoint");
        assert_eq!(lines[1]["routingKey"], "other.queue");
    }
}
