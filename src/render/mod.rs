//! Markup for the viewer page.
//!
//! Rendering is a pure function of a [`ViewModel`](crate::viewer::ViewModel):
//! the DOM layer swaps the produced HTML into the viewer container after
//! every state change.

pub mod html;

pub use html::{page_shell, viewer_body};
