//! Chat turn handling: intent routing, program pitches, schedule
//! confirmation and the conversation log model.

pub mod intent;
pub mod model;
pub mod prompts;
pub mod router;

pub use intent::{Classifier, Extractor, Intent, OracleClassifier, OracleExtractor};
pub use model::{ChatReply, ConversationLogEntry};
pub use router::{AFFIRMATIVES, ConversationRouter, is_affirmative};
