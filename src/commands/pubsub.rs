//! Pub/sub accessors

use crate::client::{Database, KeyValueClient};
use crate::command::Command;
use crate::connection::ManageConnection;
use crate::core::error::ClientResult;

impl<M: ManageConnection> KeyValueClient<M> {
    /// PUBLISH a message to a channel.
    ///
    /// Fire-and-forget: success means the server accepted the message, not
    /// that any subscriber received it.
    pub async fn publish(&self, db: Database, channel: &str, message: &str) -> ClientResult<()> {
        self.execute(db, Command::new("PUBLISH").arg(channel).arg(message))
            .await?;
        Ok(())
    }
}
