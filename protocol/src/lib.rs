//! Wire types for the Zoekt JSON search API (`POST /api/search`).
//!
//! Field names follow Zoekt's Go structs, so everything is serialized in
//! PascalCase. Zoekt emits `null` for empty slices and maps; those decode to
//! empty collections here.

mod search;

pub use search::FileKey;
pub use search::FileMatch;
pub use search::LineFragment;
pub use search::LineMatch;
pub use search::RepoTemplates;
pub use search::SearchOptions;
pub use search::SearchRequest;
pub use search::SearchResponse;
pub use search::SearchResult;
