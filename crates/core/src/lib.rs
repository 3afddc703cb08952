pub mod config;
pub mod document;
pub mod metadata;
pub mod money;
pub mod period;
pub mod rules;
pub mod transaction;

pub use config::{CacheConfig, Config, ConfigError, OcrConfig, ParserConfig};
pub use document::{DocumentType, RawDocumentText};
pub use metadata::StatementMetadata;
pub use money::Money;
pub use period::DateRange;
pub use rules::{ColumnRole, Direction, HeaderKeyword, LineRule, MatchType, SignRule};
pub use transaction::{ParsedTransaction, RowWarning};
