//! Outbound reply surface.
//!
//! The concrete chat transport (pairing, session storage, media upload) is
//! external; the bot only needs the small trait below. `ConsoleMessenger`
//! backs the local CLI harness and `ChannelMessenger` backs the tests.

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// A formatted reply ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    /// Image plus caption, used by the identity lookup when the peer
    /// service returns a profile photo.
    Media { caption: String, image: Vec<u8> },
}

/// Trait for messenger implementations.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Get the messenger name.
    fn name(&self) -> &str;

    /// Send a plain text message.
    async fn send_text(&self, recipient: &str, content: &str) -> Result<()>;

    /// Send an image with a caption.
    async fn send_media(&self, recipient: &str, caption: &str, image: Vec<u8>) -> Result<()>;

    /// Deliver a [`Reply`] through whichever channel it needs.
    async fn deliver(&self, recipient: &str, reply: Reply) -> Result<()> {
        match reply {
            Reply::Text(content) => self.send_text(recipient, &content).await,
            Reply::Media { caption, image } => self.send_media(recipient, &caption, image).await,
        }
    }
}

/// Messenger that prints replies to stdout; used by the CLI harness.
pub struct ConsoleMessenger;

#[async_trait]
impl Messenger for ConsoleMessenger {
    fn name(&self) -> &str {
        "console"
    }

    async fn send_text(&self, recipient: &str, content: &str) -> Result<()> {
        println!("[{recipient}] {content}");
        Ok(())
    }

    async fn send_media(&self, recipient: &str, caption: &str, image: Vec<u8>) -> Result<()> {
        println!("[{recipient}] <imagen {} bytes> {caption}", image.len());
        Ok(())
    }
}

/// Messenger that forwards every delivery into an mpsc channel so tests can
/// assert on ordering and content.
pub struct ChannelMessenger {
    tx: mpsc::UnboundedSender<(String, Reply)>,
}

impl ChannelMessenger {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(String, Reply)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Messenger for ChannelMessenger {
    fn name(&self) -> &str {
        "channel"
    }

    async fn send_text(&self, recipient: &str, content: &str) -> Result<()> {
        self.tx
            .send((recipient.to_string(), Reply::Text(content.to_string())))
            .map_err(|_| anyhow::anyhow!("channel closed"))
    }

    async fn send_media(&self, recipient: &str, caption: &str, image: Vec<u8>) -> Result<()> {
        self.tx
            .send((
                recipient.to_string(),
                Reply::Media {
                    caption: caption.to_string(),
                    image,
                },
            ))
            .map_err(|_| anyhow::anyhow!("channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn channel_messenger_captures_deliveries_in_order() {
        let (messenger, mut rx) = ChannelMessenger::new();
        messenger.send_text("a", "first").await.unwrap();
        messenger
            .deliver("a", Reply::Media { caption: "pic".into(), image: vec![1, 2] })
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), ("a".into(), Reply::Text("first".into())));
        match rx.recv().await.unwrap() {
            (recipient, Reply::Media { caption, image }) => {
                assert_eq!(recipient, "a");
                assert_eq!(caption, "pic");
                assert_eq!(image, vec![1, 2]);
            }
            other => panic!("unexpected delivery: {other:?}"),
        }
    }
}
