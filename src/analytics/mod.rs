//! SERP time-series analytics
//!
//! Interest scores, rank volatility, new-entrant detection and content-change
//! detection. The analyzers are pure functions over snapshot rows; the
//! [`SerpAnalytics`] service feeds them from a repository.

pub mod changes;
pub mod comparator;
pub mod engine;
pub mod entrants;
pub mod error;
pub mod interest;
pub mod volatility;
pub mod window;

pub use changes::content_changes;
pub use comparator::{compare, DayPairComparison, RankMove};
pub use engine::{BackfillOptions, BackfillReport, SerpAnalytics};
pub use entrants::new_entrants;
pub use error::{AnalyticsError, AnalyticsResult};
pub use interest::{score_day_pair, ScoringConfig, MAX_INTEREST_SCORE};
pub use volatility::rank_volatility;
pub use window::AnalysisWindow;
