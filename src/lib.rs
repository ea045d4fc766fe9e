//! Client-side configuration cache
//!
//! `confetch` keeps a local snapshot of the key/value settings served by a
//! remote configuration service. It fetches them over HTTP, refreshes the
//! snapshot on a timer in a background task, fires per-key callbacks when a
//! value perceivably changes, and projects the snapshot onto plain
//! structures through declarative field bindings.
//!
//! Updates are applied key-by-key with last-writer-wins-by-timestamp
//! semantics: an incoming setting replaces the stored one only when it
//! carries a strictly later `updated` timestamp and a different value.
//! Timestamp "touches" and clock regressions are discarded, and keys that
//! disappear from the service are kept (deletions do not propagate).
//!
//! # Example
//!
//! ```no_run
//! use confetch::{bind_config, ConfigManager};
//! use std::time::Duration;
//!
//! #[derive(Debug, Default)]
//! struct HttpSettings {
//!     port: i64,
//!     verbose: bool,
//! }
//!
//! bind_config!(HttpSettings {
//!     port: integer => "http.port",
//!     verbose: boolean => "http.verbose",
//! });
//!
//! # async fn run() -> confetch::Result<()> {
//! let manager = ConfigManager::connect(
//!     "billing",
//!     "http://config.internal:8080/v1/settings",
//!     Duration::from_secs(30),
//! )
//! .await?;
//!
//! manager.set_update_handler(
//!     |setting| println!("{} changed to {}", setting.key, setting.value),
//!     &["http.port"],
//! );
//! manager.spawn_refresh_loop();
//!
//! let mut settings = HttpSettings::default();
//! manager.populate(&mut settings)?;
//! # Ok(())
//! # }
//! ```

pub mod bind;
pub mod error;
pub mod fetcher;
pub mod macros;
pub mod manager;
pub mod types;

// Re-export commonly used types
pub use bind::{Bindable, BindingTable, BindingTableBuilder, FieldBinding, FieldKind, FieldValue};
pub use error::{ConfigError, Result};
pub use fetcher::{HttpFetcher, HttpFetcherConfig, SettingsFetcher, SERVICE_NAME_HEADER};
pub use manager::{ConfigManager, UpdateHandler};
pub use types::Setting;
