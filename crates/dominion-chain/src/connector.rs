//! Transport contract between a node and the network backlog.

use async_trait::async_trait;
use dominion_types::{Block, Event};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::config::ChainConfig;
use crate::queue::{Queue, QueueError};

/// Errors raised by a [`Connector`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectorError {
    /// The wait was interrupted by cancellation.
    #[error("connector wait canceled")]
    Canceled,

    /// The transport was shut down.
    #[error("connector closed")]
    Closed,

    /// The transport failed to carry the item.
    #[error("transport failure: {reason}")]
    Transport {
        /// What went wrong.
        reason: String,
    },
}

impl From<QueueError> for ConnectorError {
    fn from(err: QueueError) -> Self {
        match err {
            QueueError::Canceled => Self::Canceled,
            QueueError::Closed => Self::Closed,
        }
    }
}

/// Bidirectional channel to the network backlog.
///
/// Sends may wait for room; receives wait for the next item until the
/// token is cancelled.
#[async_trait]
pub trait Connector: Send + Sync + std::fmt::Debug {
    /// Publish an event to the network.
    async fn send_event_to_backlog(&self, event: &Event) -> Result<(), ConnectorError>;

    /// Publish a block to the network.
    async fn send_block_to_backlog(&self, block: &Block) -> Result<(), ConnectorError>;

    /// Next candidate block from the network.
    async fn get_backlog_block(&self, cancel: &CancelToken) -> Result<Block, ConnectorError>;

    /// Next event observed on the network.
    async fn get_backlog_event(&self, cancel: &CancelToken) -> Result<Event, ConnectorError>;
}

/// In-process transport: one bounded queue per direction of traffic.
///
/// Whatever is sent comes straight back to the receive side, which is the
/// whole network as seen by a lone authority.
#[derive(Debug)]
pub struct LocalConnector {
    events: Queue<Event>,
    blocks: Queue<Block>,
}

impl LocalConnector {
    /// Connector with explicit queue capacities.
    pub fn new(event_capacity: usize, block_capacity: usize) -> Self {
        Self {
            events: Queue::bounded(event_capacity),
            blocks: Queue::bounded(block_capacity),
        }
    }

    /// Connector sized from the chain configuration.
    pub fn from_config(config: &ChainConfig) -> Self {
        Self::new(config.event_queue_capacity, config.block_queue_capacity)
    }

    /// Shut the transport down. Items already queued can still be received.
    pub fn close(&self) {
        self.events.close();
        self.blocks.close();
    }

    /// Events waiting to be received.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Blocks waiting to be received.
    pub fn pending_blocks(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for LocalConnector {
    fn default() -> Self {
        Self::from_config(&ChainConfig::default())
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn send_event_to_backlog(&self, event: &Event) -> Result<(), ConnectorError> {
        self.events.push_uncancellable(event.clone()).await?;
        debug!(kind = %event.kind(), "Event queued on local transport");
        Ok(())
    }

    async fn send_block_to_backlog(&self, block: &Block) -> Result<(), ConnectorError> {
        self.blocks.push_uncancellable(block.clone()).await?;
        debug!(events = block.events().len(), "Block queued on local transport");
        Ok(())
    }

    async fn get_backlog_block(&self, cancel: &CancelToken) -> Result<Block, ConnectorError> {
        Ok(self.blocks.pop(cancel).await?)
    }

    async fn get_backlog_event(&self, cancel: &CancelToken) -> Result<Event, ConnectorError> {
        Ok(self.events.pop(cancel).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dominion_types::{BlockTimestamp, CreatePlanet};

    use super::*;
    use crate::genesis::genesis_block;

    #[tokio::test]
    async fn sent_items_come_back() {
        let connector = LocalConnector::new(8, 2);
        let cancel = CancelToken::new();
        let event = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(5));

        connector.send_event_to_backlog(&event).await.unwrap();
        connector.send_block_to_backlog(&genesis_block()).await.unwrap();
        assert_eq!(connector.pending_events(), 1);
        assert_eq!(connector.pending_blocks(), 1);

        assert_eq!(connector.get_backlog_event(&cancel).await.unwrap(), event);
        assert_eq!(
            connector.get_backlog_block(&cancel).await.unwrap(),
            genesis_block()
        );
    }

    #[tokio::test]
    async fn closed_transport_refuses_sends() {
        let connector = LocalConnector::default();
        let cancel = CancelToken::new();
        let event = Event::new(CreatePlanet {}, BlockTimestamp::from_unix_millis(5));
        connector.send_event_to_backlog(&event).await.unwrap();
        connector.close();

        assert_eq!(
            connector.send_block_to_backlog(&genesis_block()).await,
            Err(ConnectorError::Closed)
        );
        assert_eq!(connector.get_backlog_event(&cancel).await.unwrap(), event);
        assert_eq!(
            connector.get_backlog_event(&cancel).await,
            Err(ConnectorError::Closed)
        );
    }

    #[tokio::test]
    async fn empty_receive_honours_cancellation() {
        let connector = LocalConnector::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            connector.get_backlog_block(&cancel).await,
            Err(ConnectorError::Canceled)
        );
        assert_eq!(
            connector.get_backlog_event(&cancel).await,
            Err(ConnectorError::Canceled)
        );
    }
}
