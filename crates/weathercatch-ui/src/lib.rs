//! Request coordination for the WeatherCatch dashboard.
//!
//! [`AppController`] owns the dashboard state and sequences every fetch;
//! renderers observe it through a `watch` snapshot and a `broadcast` event
//! stream.

pub mod clock;
pub mod controller;
pub mod debounce;
pub mod error_mapping;
pub mod message;
pub mod services;
pub mod state;
pub mod view;

pub use controller::{AppController, ControllerHandle, ControllerServices, ControllerSettings};
pub use message::Command;
pub use state::{DashboardEvent, DashboardState, ErrorBanner, Reading, RetryTarget};
