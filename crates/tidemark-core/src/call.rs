//! Typed requests and responses for node calls.
//!
//! Every supported zome call has its own variant so argument shapes are
//! checked at compile time and validated once at the boundary with
//! [`NodeCall::validate`].

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{AgentId, EntryId};

/// Longest accepted entry content, in bytes.
pub const MAX_CONTENT_LEN: usize = 64 * 1024;

/// A request to a single node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum NodeCall {
    /// Author a new app entry.
    CommitEntry { content: String },
    /// Fetch an entry's content by address.
    GetEntry { address: EntryId },
    /// Link `target` from `base`.
    LinkEntries { base: EntryId, target: EntryId },
    /// List link targets for `base`.
    GetLinks { base: EntryId },
    /// Send a direct message to another agent.
    Send { to_agent: AgentId, payload: String },
}

impl NodeCall {
    pub fn commit(content: impl Into<String>) -> Self {
        NodeCall::CommitEntry {
            content: content.into(),
        }
    }

    /// Wire name of the call.
    pub fn name(&self) -> &'static str {
        match self {
            NodeCall::CommitEntry { .. } => "commit_entry",
            NodeCall::GetEntry { .. } => "get_entry",
            NodeCall::LinkEntries { .. } => "link_entries",
            NodeCall::GetLinks { .. } => "get_links",
            NodeCall::Send { .. } => "send",
        }
    }

    /// Reject malformed arguments before they reach a node.
    pub fn validate(&self) -> Result<()> {
        match self {
            NodeCall::CommitEntry { content } => {
                if content.is_empty() {
                    return Err(Error::InvalidCall("commit_entry: empty content".into()));
                }
                if content.len() > MAX_CONTENT_LEN {
                    return Err(Error::InvalidCall(format!(
                        "commit_entry: content is {} bytes, limit is {}",
                        content.len(),
                        MAX_CONTENT_LEN
                    )));
                }
            }
            NodeCall::LinkEntries { base, target } if base == target => {
                return Err(Error::InvalidCall(format!(
                    "link_entries: base and target are both {}",
                    base
                )));
            }
            NodeCall::Send { payload, .. } if payload.is_empty() => {
                return Err(Error::InvalidCall("send: empty payload".into()));
            }
            _ => {}
        }
        Ok(())
    }
}

/// A node's answer to a [`NodeCall`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "response", content = "value", rename_all = "snake_case")]
pub enum CallResponse {
    Committed(EntryId),
    Entry(Option<String>),
    Linked(EntryId),
    Links(Vec<EntryId>),
    Sent(String),
}

impl CallResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            CallResponse::Committed(_) => "committed",
            CallResponse::Entry(_) => "entry",
            CallResponse::Linked(_) => "linked",
            CallResponse::Links(_) => "links",
            CallResponse::Sent(_) => "sent",
        }
    }

    /// Address of a committed entry.
    pub fn into_committed(self) -> Result<EntryId> {
        match self {
            CallResponse::Committed(id) => Ok(id),
            other => Err(other.mismatch("commit_entry")),
        }
    }

    /// Content of a fetched entry, `None` if not found.
    pub fn into_entry(self) -> Result<Option<String>> {
        match self {
            CallResponse::Entry(content) => Ok(content),
            other => Err(other.mismatch("get_entry")),
        }
    }

    /// Address of the created link entry.
    pub fn into_linked(self) -> Result<EntryId> {
        match self {
            CallResponse::Linked(id) => Ok(id),
            other => Err(other.mismatch("link_entries")),
        }
    }

    /// Link targets.
    pub fn into_links(self) -> Result<Vec<EntryId>> {
        match self {
            CallResponse::Links(links) => Ok(links),
            other => Err(other.mismatch("get_links")),
        }
    }

    /// Acknowledgement returned by the recipient of a message.
    pub fn into_sent(self) -> Result<String> {
        match self {
            CallResponse::Sent(ack) => Ok(ack),
            other => Err(other.mismatch("send")),
        }
    }

    fn mismatch(&self, call: &'static str) -> Error {
        Error::UnexpectedResponse {
            call,
            got: self.kind(),
        }
    }
}
