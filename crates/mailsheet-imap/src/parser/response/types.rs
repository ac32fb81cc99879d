//! Parsed response data.

use crate::types::{Capability, ResponseCode, SeqNum, Uid};

/// Untagged server data (`* ...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UntaggedResponse {
    /// `* OK`.
    Ok {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* NO`: a warning.
    No {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BAD`: a protocol-level complaint.
    Bad {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* PREAUTH` greeting.
    PreAuth {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* BYE`: the server is closing the connection.
    Bye {
        /// Optional response code.
        code: Option<ResponseCode>,
        /// Human-readable text.
        text: String,
    },
    /// `* CAPABILITY ...`.
    Capability(Vec<Capability>),
    /// `* FLAGS (...)`.
    Flags(Vec<String>),
    /// `* SEARCH n n n`, in server order.
    Search(Vec<SeqNum>),
    /// `* n EXISTS`.
    Exists(u32),
    /// `* n RECENT`.
    Recent(u32),
    /// `* n EXPUNGE`.
    Expunge(SeqNum),
    /// `* n FETCH (...)`.
    Fetch {
        /// Message the data belongs to.
        seq: SeqNum,
        /// Data items returned.
        items: Vec<FetchItem>,
    },
    /// Untagged data this client does not interpret, keyed by its name.
    Other(String),
}

/// A data item inside a FETCH response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchItem {
    /// `UID n`.
    Uid(Uid),
    /// `FLAGS (...)`.
    Flags(Vec<String>),
    /// `RFC822.SIZE n`.
    Rfc822Size(u32),
    /// `BODY[section]` or `RFC822` contents; `None` when the server sent NIL.
    Body {
        /// Section specifier; empty for the whole message.
        section: String,
        /// Raw bytes.
        data: Option<Vec<u8>>,
    },
}
