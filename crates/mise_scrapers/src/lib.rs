pub mod archive;
pub mod browser;
pub mod cli;
pub mod error;
pub mod feed;
pub mod http;
pub mod logging;
pub mod manager;
pub mod normalize;
pub mod nyt;
pub mod page;
pub mod queue;
pub mod rate_limit;
pub mod search_api;
pub mod selectors;

pub use cli::{handle_acquire, AcquireArgs, Preset};
pub use error::SourceError;
pub use logging::{init_logging, Logger};
pub use manager::{
    AcquireOptions, AcquisitionManager, AcquisitionReport, ArchivePeriod, SourceKind, SourceOutcome,
};
pub use queue::{PassQueue, PassTicket};

pub mod prelude {
    pub use super::browser::{BrowserSession, PageElement, SessionFactory};
    pub use super::manager::{AcquireOptions, AcquisitionManager};
    pub use super::SourceError;
    pub use mise_core::{Article, Error, Recipe, RecordStorage, Result};
}
