use serde::{Deserialize, Serialize};

/// Method name for adding a torrent.
pub const METHOD_TORRENT_ADD: &str = "torrent-add";
/// Method name for reading session settings.
pub const METHOD_SESSION_GET: &str = "session-get";
/// Method name for reading torrent fields.
pub const METHOD_TORRENT_GET: &str = "torrent-get";

/// Request envelope sent to the Transmission RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub method: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null", default)]
    pub arguments: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<i64>,
}

impl RpcRequest {
    pub fn new(method: &str, arguments: serde_json::Value) -> Self {
        Self {
            method: method.to_string(),
            arguments,
            tag: None,
        }
    }
}

/// Response envelope returned by the Transmission RPC endpoint.
///
/// `result` is `"success"` on success; anything else is a human-readable
/// error string from the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub result: String,
    #[serde(default)]
    pub arguments: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<i64>,
}

impl RpcResponse {
    pub fn is_success(&self) -> bool {
        self.result == "success"
    }

    /// Extract the added (or duplicate) torrent from a torrent-add response.
    pub fn added_torrent(&self) -> Option<AddedTorrent> {
        let args = self.arguments.as_ref()?;
        let entry = args
            .get("torrent-added")
            .or_else(|| args.get("torrent-duplicate"))?;
        serde_json::from_value(entry.clone()).ok()
    }
}

/// Torrent identity returned inside a torrent-add response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddedTorrent {
    pub id: i64,
    pub name: String,
    #[serde(rename = "hashString")]
    pub hash_string: String,
}

/// Arguments for the torrent-add method, using Transmission's wire names.
///
/// Index arrays that are empty are omitted entirely; the server treats a
/// missing array as "no constraint", which is what an untouched tree means.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TorrentAddArgs {
    /// Base64-encoded contents of the .torrent file
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub metainfo: Option<String>,
    #[serde(
        rename = "download-dir",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub download_dir: Option<String>,
    #[serde(
        rename = "bandwidthPriority",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub bandwidth_priority: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub paused: Option<bool>,
    #[serde(
        rename = "files-wanted",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub files_wanted: Vec<u32>,
    #[serde(
        rename = "files-unwanted",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub files_unwanted: Vec<u32>,
    #[serde(
        rename = "priority-low",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub priority_low: Vec<u32>,
    #[serde(
        rename = "priority-high",
        skip_serializing_if = "Vec::is_empty",
        default
    )]
    pub priority_high: Vec<u32>,
}

impl TorrentAddArgs {
    pub fn into_request(self) -> RpcRequest {
        let arguments =
            serde_json::to_value(&self).expect("torrent-add arguments are always serializable");
        RpcRequest::new(METHOD_TORRENT_ADD, arguments)
    }
}

/// The subset of session-get fields the stager consults.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionInfo {
    #[serde(rename = "download-dir")]
    pub download_dir: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// One torrent row from a torrent-get listing.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentSummary {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "downloadDir", default)]
    pub download_dir: Option<String>,
}

/// Arguments payload of a torrent-get response.
#[derive(Debug, Clone, Deserialize)]
pub struct TorrentGetResult {
    #[serde(default)]
    pub torrents: Vec<TorrentSummary>,
}
