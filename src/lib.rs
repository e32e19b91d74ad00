//! Real-time server-rendered components with lifecycle-safe async loading.
//!
//! A route handler builds its UI out of reactive [`State`] cells, async
//! closures, and [`Resource`]s; the page is rendered once over plain HTTP and
//! then kept up to date over a websocket. A resource issues one load per
//! change of its trigger state and guarantees that only the latest load's
//! result is ever shown: superseded requests are cancelled, and anything that
//! slips through is refused at commit time.
//!
//! The `demos/` directory walks through the motivating example, a component
//! fetching a random joke, in three progressively safer versions.

use axum::response::Response;

use context::Context;
use html::Element;

mod closures;
mod config;
pub mod context;
mod handler;
pub mod html;
pub mod joke;
mod lifecycle;
pub mod live;
mod random_id;
mod reactive_js;
mod resource;
mod states;

pub use closures::Closure;
pub use config::Config;
pub use handler::LiveHandler;
pub use lifecycle::Lifecycle;
pub use resource::{LoadError, Resource};
pub use states::{ModifyError, State, StateRef};

pub type LiveResponse = Response<Render>;

/// What a live handler returns: the tree to render, plus the context that
/// built it and now drives the session.
pub struct Render {
    pub(crate) element: Element,
    pub(crate) context: Context,
}
