//! SQS long-poll loop feeding bucket notifications to the pipeline.
//!
//! Each SQS message body is an S3 event document. A message is deleted from
//! the queue only after every record in it went through the pipeline without
//! error; otherwise it becomes visible again after the queue's visibility
//! timeout and is redelivered. Bodies that are not event documents, and
//! records where every failing path failed on a key that can never decode,
//! are logged and dropped. Paths that finished have already logged their
//! results by then.

use crate::config::ListenerConfig;
use crate::imaging::ImageBackend;
use crate::notification::S3Event;
use crate::pipeline::Pipeline;
use crate::storage::ObjectStore;
use aws_sdk_sqs::Client;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use std::future::Future;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("no queue URL: set listener.queue_url or pass --queue-url")]
    MissingQueueUrl,
    #[error("failed to receive from {queue_url}: {message}")]
    Receive { queue_url: String, message: String },
}

/// What happened to one received message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Processed; delete from the queue.
    Done,
    /// Not an event document, or a key no retry can fix; delete so it
    /// stops coming back.
    Discard,
    /// Processing failed; leave for redelivery.
    Retry,
}

pub struct Listener {
    client: Client,
    queue_url: String,
    max_messages: i32,
    wait_time_seconds: i32,
}

impl Listener {
    pub fn new(client: Client, queue_url: String, config: &ListenerConfig) -> Self {
        Self {
            client,
            queue_url,
            max_messages: config.max_messages,
            wait_time_seconds: config.wait_time_seconds,
        }
    }

    /// Poll until `shutdown` resolves. A poll in flight is abandoned on
    /// shutdown; a message being processed is finished first.
    pub async fn run<S, B>(
        &self,
        pipeline: &Pipeline<S, B>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ListenerError>
    where
        S: ObjectStore + 'static,
        B: ImageBackend + 'static,
    {
        tokio::pin!(shutdown);
        info!(queue_url = %self.queue_url, "listening for notifications");

        loop {
            let messages = tokio::select! {
                _ = &mut shutdown => {
                    info!("shutdown requested, stopping listener");
                    return Ok(());
                }
                received = self.receive() => received?,
            };

            if messages.is_empty() {
                debug!("no messages received");
                continue;
            }

            for message in messages {
                let disposition = process_message(pipeline, message.body()).await;
                if disposition != Disposition::Retry {
                    self.delete(&message).await;
                }
            }
        }
    }

    async fn receive(&self) -> Result<Vec<Message>, ListenerError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&self.queue_url)
            .max_number_of_messages(self.max_messages)
            .wait_time_seconds(self.wait_time_seconds)
            .send()
            .await
            .map_err(|e| ListenerError::Receive {
                queue_url: self.queue_url.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;
        Ok(output.messages.unwrap_or_default())
    }

    async fn delete(&self, message: &Message) {
        let Some(receipt) = message.receipt_handle() else {
            warn!("message has no receipt handle, cannot delete");
            return;
        };
        if let Err(e) = self
            .client
            .delete_message()
            .queue_url(&self.queue_url)
            .receipt_handle(receipt)
            .send()
            .await
        {
            error!(error = %DisplayErrorContext(&e), "failed to delete SQS message");
        }
    }
}

/// Run one message body through the pipeline and decide its fate.
pub async fn process_message<S, B>(pipeline: &Pipeline<S, B>, body: Option<&str>) -> Disposition
where
    S: ObjectStore + 'static,
    B: ImageBackend + 'static,
{
    let Some(body) = body else {
        warn!("received SQS message with empty body, discarding");
        return Disposition::Discard;
    };

    let event = match S3Event::from_json(body) {
        Ok(event) => event,
        Err(e) => {
            error!(error = %e, "message body is not an S3 event document, discarding");
            return Disposition::Discard;
        }
    };

    match pipeline.handle_event(event).await {
        Ok(outcomes) => {
            debug!(outcomes = outcomes.len(), "message processed");
            Disposition::Done
        }
        Err(e) if e.is_permanent() => {
            error!(
                error = %e,
                completed = e.completed().len(),
                "notification can never succeed, discarding"
            );
            Disposition::Discard
        }
        Err(e) => {
            error!(error = %e, "notification failed, leaving message for redelivery");
            Disposition::Retry
        }
    }
}
