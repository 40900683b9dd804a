use std::io;

use thiserror::Error;

use crate::cache::{key::CacheKey, record::Namespace};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("I/O error accessing cache")]
    Io(#[from] io::Error),

    #[error("Corrupt {namespace} record for '{key}'")]
    Corrupt {
        namespace: Namespace,
        key: CacheKey,
        #[source]
        source: serde_json::Error,
    },

    #[error("Error encoding {namespace} record for '{key}'")]
    Encode {
        namespace: Namespace,
        key: CacheKey,
        #[source]
        source: serde_json::Error,
    },
}
