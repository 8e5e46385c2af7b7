//! Search backends.
//!
//! A backend executes a [`SearchRequest`] against one index and answers in Elasticsearch
//! response shape. [`MemoryBackend`] evaluates requests over documents loaded into memory.

mod memory;

pub use memory::MemoryBackend;

use crate::{error::BackendError, request::SearchRequest, response::BackendResponse};

/// Executes search requests.
pub trait SearchBackend {
    /// Runs `request` against the index it names.
    fn search(&self, request: &SearchRequest) -> Result<BackendResponse, BackendError>;
}

impl<B: SearchBackend + ?Sized> SearchBackend for &B {
    fn search(&self, request: &SearchRequest) -> Result<BackendResponse, BackendError> {
        (**self).search(request)
    }
}
