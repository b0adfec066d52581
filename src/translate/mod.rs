// Translation architecture
//
// - Backend: transport to the remote service (MyMemory over HTTP), behind a trait so it can be mocked
// - Client: cache, retry loop and the quota latch on top of any backend

pub mod client;
pub mod mymemory;

use async_trait::async_trait;

pub use client::*;
pub use mymemory::*;

use crate::error::Result;

/// Raw HTTP reply returned by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// Transport used by the translation client to reach the remote service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Request one translation of `phrase` for a `source|target` language pair
    async fn fetch(&self, phrase: &str, langpair: &str) -> Result<HttpReply>;
}
