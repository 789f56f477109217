//! Extension point for document sources.
//!
//! A [`Connector`] produces [`SourceItem`]s (a filename plus its plain text)
//! that flow into [`run_sync`](crate::ingest::run_sync). The built-in
//! filesystem connector is registered from config; anything else (a CMS, a
//! database, a chat export) can implement the trait and be registered by hand.
//!
//! ```rust
//! use ragchat::config::Config;
//! use ragchat::traits::ConnectorRegistry;
//!
//! let registry = ConnectorRegistry::from_config(&Config::default());
//! assert!(registry.is_empty());
//! ```

use anyhow::Result;
use async_trait::async_trait;

use crate::config::Config;
use crate::models::SourceItem;

/// A source of documents to ingest.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use anyhow::Result;
/// use ragchat::models::SourceItem;
/// use ragchat::traits::Connector;
///
/// pub struct FaqConnector;
///
/// #[async_trait]
/// impl Connector for FaqConnector {
///     fn name(&self) -> &str { "faq" }
///     fn description(&self) -> &str { "Frequently asked questions" }
///
///     async fn scan(&self) -> Result<Vec<SourceItem>> {
///         Ok(vec![SourceItem {
///             filename: "faq.txt".into(),
///             text: "Visitors need a valid passport to enter the country.".into(),
///         }])
///     }
/// }
/// ```
#[async_trait]
pub trait Connector: Send + Sync {
    /// Instance name, e.g. `"guides"`.
    fn name(&self) -> &str;

    /// One-line description for listings.
    fn description(&self) -> &str;

    /// Type identifier; custom connectors keep the default.
    fn connector_type(&self) -> &str {
        "custom"
    }

    /// `"{type}:{name}"`, used in logs and sync reports.
    fn label(&self) -> String {
        format!("{}:{}", self.connector_type(), self.name())
    }

    /// Fetch every item currently available from the source.
    ///
    /// An `Err` aborts the whole sync and leaves the index as it was. Items
    /// that cannot be read individually should be logged and left out.
    async fn scan(&self) -> Result<Vec<SourceItem>>;
}

/// The set of connectors a sync runs over.
#[derive(Default)]
pub struct ConnectorRegistry {
    connectors: Vec<Box<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the connectors configured in `config`.
    pub fn from_config(config: &Config) -> Self {
        use crate::connector_fs::FilesystemConnector;

        let mut registry = Self::new();
        if let Some(fs) = &config.connectors.filesystem {
            registry.register(Box::new(FilesystemConnector::new("docs", fs.clone())));
        }
        registry
    }

    pub fn register(&mut self, connector: Box<dyn Connector>) {
        self.connectors.push(connector);
    }

    pub fn connectors(&self) -> &[Box<dyn Connector>] {
        &self.connectors
    }

    /// Look up a connector by `"type:name"` label or bare name.
    pub fn find(&self, key: &str) -> Option<&dyn Connector> {
        self.connectors
            .iter()
            .find(|c| c.label() == key || c.name() == key)
            .map(|c| c.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }
}
