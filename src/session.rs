//! Read-only snapshot of remote session state.
//!
//! Destination-folder defaults come from the server: the session's default
//! download directory plus the directories existing torrents already use.
//! The snapshot is taken once per staging action and handed around as plain
//! owned data - nothing here holds a lock or a connection.

use tracing::debug;

use crate::api::TransmissionClient;
use crate::error::StageResult;

#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    /// The server's configured default download directory.
    pub download_dir: String,
    /// Download directories of torrents already in the session, in listing
    /// order, possibly with repeats.
    pub torrent_dirs: Vec<String>,
}

impl SessionSnapshot {
    pub async fn fetch(client: &TransmissionClient) -> StageResult<Self> {
        let session = client.session_get().await?;
        let torrents = client.torrent_summaries().await?;
        let torrent_dirs: Vec<String> = torrents
            .into_iter()
            .filter_map(|t| t.download_dir)
            .collect();
        debug!(
            default_dir = %session.download_dir,
            known_dirs = torrent_dirs.len(),
            "Fetched session snapshot"
        );
        Ok(Self {
            download_dir: session.download_dir,
            torrent_dirs,
        })
    }

    /// Destination choices for an add action: the session default first,
    /// then every known torrent directory, deduplicated in insertion order.
    pub fn destination_choices(&self) -> Vec<String> {
        let mut choices = vec![self.download_dir.clone()];
        for dir in &self.torrent_dirs {
            if !choices.contains(dir) {
                choices.push(dir.clone());
            }
        }
        choices
    }
}
