// src/notifications/mod.rs

pub mod dispatch;
pub mod mailer;
pub mod templates;

pub use mailer::Mailer;
pub use templates::{Notification, NotificationKind, RenderedEmail};
