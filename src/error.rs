use std::{io, path::PathBuf};

use thiserror::Error;

use crate::Key;

/// A persisted token stream that does not describe a search tree.
///
/// Loading fails as a whole; no partially reconstructed tree is ever returned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("stream ended after {position} tokens but the tree is incomplete")]
    UnexpectedEnd { position: usize },

    #[error("token {token:?} at position {position} is neither `#` nor an integer key")]
    InvalidToken { position: usize, token: String },

    #[error("unexpected token at position {position} after a complete tree")]
    TrailingTokens { position: usize },

    #[error("key {key} breaks search-tree ordering")]
    OutOfOrder { key: Key },
}

/// Errors from persisting a [`Forest`](crate::Forest).
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed tree file {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },
}
