//! Client-side state for the Linkly URL shortener.
//!
//! [`session::AuthSession`] and [`collection::UrlCollection`] keep the signed-in
//! session and the user's links in sync with the server; [`view`] and
//! [`charts`] derive what the dashboard and analytics screens show.

pub mod api;
pub mod app;
pub mod charts;
pub mod collection;
pub mod config;
pub mod error;
pub mod models;
pub mod sequence;
pub mod session;
pub mod token_store;
pub mod view;

pub use app::App;
pub use config::ClientConfig;
pub use error::ApiError;
