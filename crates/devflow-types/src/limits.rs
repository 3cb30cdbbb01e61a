//! Content limits and reputation weights.
//!
//! These values are shared by the store (which validates input against them)
//! and the reputation ledger (which scores activity with them).

/// Minimum question title length, in characters.
pub const MIN_TITLE_LEN: usize = 5;
/// Maximum question title length, in characters.
pub const MAX_TITLE_LEN: usize = 100;
/// Minimum question body length, in characters.
pub const MIN_QUESTION_BODY_LEN: usize = 20;
/// Maximum length of a single tag, in characters.
pub const MAX_TAG_LEN: usize = 30;
/// Minimum answer body length, in characters.
pub const MIN_ANSWER_BODY_LEN: usize = 10;

/// Minimum username length, in characters.
pub const MIN_USERNAME_LEN: usize = 3;
/// Maximum username length, in characters.
pub const MAX_USERNAME_LEN: usize = 20;
/// Minimum password length, in characters.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Maximum number of notifications returned by a "recent" listing.
pub const RECENT_NOTIFICATIONS_LIMIT: u32 = 20;

/// Points awarded per question authored.
pub const QUESTION_POINTS: i64 = 5;
/// Points awarded per answer authored.
pub const ANSWER_POINTS: i64 = 10;
/// Points awarded per upvote received on an answer.
pub const UPVOTE_POINTS: i64 = 2;
/// Points removed per downvote received on an answer.
pub const DOWNVOTE_PENALTY: i64 = 2;
/// Points awarded per accepted answer.
pub const ACCEPTED_ANSWER_POINTS: i64 = 15;

/// Lower bound of a user's reputation.
pub const MIN_REPUTATION: i64 = 0;
/// Upper bound of a user's reputation.
pub const MAX_REPUTATION: i64 = 10_000;
