//! Local notification rendering and dispatch.

mod dispatcher;
mod render;

pub use dispatcher::NotificationDispatcher;
pub use render::{notification_key, render_body, render_title, tier_for};
