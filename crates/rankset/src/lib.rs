//! rankset: an in-memory ordered set indexed by rank.
//!
//! A [`SortedSet`] associates each unique member with a score and keeps
//! the members ordered by (score, member). Point lookups are O(1)
//! through a membership map; rank lookups, score ranges, rank ranges,
//! and bulk range deletions are O(log n) through a span-augmented skip
//! list, the same shape Redis uses for its sorted sets.
//!
//! Scores are opaque to the set: ordering and addition go through a
//! caller-supplied [`ScoreHandler`], so anything with a total order can
//! score — integers, floats via [`FloatOrder`], or composite structs
//! with a custom handler.
//!
//! ```
//! use rankset::{NaturalOrder, ScoreRange, SortedSet};
//!
//! let mut board: SortedSet<&str, i64, NaturalOrder> = SortedSet::new();
//! board.add(1500, "alice");
//! board.add(900, "bob");
//! board.add(1200, "carol");
//!
//! assert_eq!(board.rank(&"bob"), Some(0));
//! assert_eq!(board.reverse_rank(&"alice"), Some(0));
//!
//! let mid = board.range_by_score(&ScoreRange::inclusive(1000, 1400));
//! assert_eq!(mid.len(), 1);
//! assert_eq!(mid[0].member, "carol");
//! ```

mod error;
mod range;
mod score;
mod skiplist;
mod sorted_set;

pub use error::SumUnsupported;
pub use range::ScoreRange;
pub use score::{Descending, FloatOrder, NaturalOrder, ScoreHandler};
pub use skiplist::Entry;
pub use sorted_set::SortedSet;
