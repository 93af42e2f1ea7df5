//! Core types and scheduling logic for the nudge reminder engine.
//!
//! This crate has no async-runtime or database dependencies. Storage
//! backends implement [`store::SlotStore`]; timer loops and host surfaces
//! live in the other workspace crates and drive an [`engine::Engine`].

// Store impls are written with native `async fn`; the trait itself spells
// out the `Send` futures.
#![allow(async_fn_in_trait)]

pub mod clock;
pub mod due;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod memory;
pub mod notify;
pub mod reminder;
pub mod repository;
pub mod settings;
pub mod store;
pub mod view;

pub use error::{Error, Result, ValidationError};
