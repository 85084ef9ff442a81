//! Per-container configuration structs.
//!
//! One dedicated `*Config` type per container variant, following the
//! grounding codebase's `config::lru`/`config::lfu`/etc. modules. Unlike
//! the grounding codebase, fields are public rather than private-plus-
//! getter: the fields *are* the documented construction contract (§6 of
//! SPEC_FULL.md), and a getter that just returns a private field copy adds
//! a layer with no behavior behind it.

mod fifo;
mod lfu;
mod lfuda;
mod lru;
mod rr;
mod tlru;
mod ulru;
mod ut;

pub use fifo::FifoCacheConfig;
pub use lfu::LfuCacheConfig;
pub use lfuda::LfudaCacheConfig;
pub use lru::{LruCacheConfig, MruCacheConfig};
pub use rr::RrCacheConfig;
pub use tlru::TlruCacheConfig;
pub use ulru::UlruCacheConfig;
pub use ut::UtConfig;
