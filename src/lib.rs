pub mod io;
pub mod models;
pub mod resolver;
pub mod segmenter;
pub mod stages;

pub use io::{load_roster, normalize_text, read_transcript, LinkRow, RosterError};
pub use models::{IdentitySignals, MatchMethod, MatchResult, Roster, RosterRecord, Speaker};
pub use resolver::{extract_signals, resolve, Resolver, ResolverConfig, DEFAULT_FUZZY_THRESHOLD};
pub use segmenter::{segment, segment_text, Segmenter, SegmenterConfig};
pub use stages::{execute_link, execute_split, LinkConfig, SplitConfig};
