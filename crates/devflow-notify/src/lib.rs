//! Notification inbox for DevFlow.
//!
//! Store operations emit inbox entries when someone answers a question,
//! upvotes an answer, or accepts an answer. Emission never notifies a user
//! about their own action, and callers use [`notify_best_effort`] so that a
//! failed insert is logged instead of failing the triggering operation.
//!
//! All read-side operations are scoped to a single recipient: a user can only
//! list, count, or mark their own notifications.
//!
//! # Usage
//!
//! ```rust,ignore
//! use devflow_notify::{notify_best_effort, NewNotification};
//! use devflow_types::NotificationKind;
//!
//! notify_best_effort(
//!     &conn,
//!     &NewNotification {
//!         recipient_id: question.user_id,
//!         sender_id: actor.id,
//!         kind: NotificationKind::Answer,
//!         message: format!("{} answered your question: \"{}\"", actor.username, question.title),
//!         question_id: Some(question.id),
//!         answer_id: Some(answer.id),
//!     },
//! );
//! ```

mod error;
mod store;

pub use error::NotifyError;
pub use store::{
    get_notification, list_recent, mark_all_read, mark_read, notify, notify_best_effort,
    unread_count, NewNotification, Notification,
};
