//! # Walletgate Testkit
//!
//! Test utilities for the Walletgate workspace.
//!
//! ## Contents
//!
//! - [`MockWallet`]: an in-memory wallet implementing the full capability
//!   set, with real protocol-scoped self-encryption and per-basket output
//!   tracking, recording every call for assertions
//! - [`TestFixture`]: a mock wallet bundled with a manager wrapping it
//! - Handler helpers: [`ChannelHandler`], [`CountingHandler`],
//!   [`FailingHandler`], [`AutoGrantHandler`], [`AutoDenyHandler`]
//! - Proptest [`generators`] for requests and their building blocks
//!
//! Use the generators with proptest:
//!
//! ```rust
//! use proptest::prelude::*;
//! use walletgate_testkit::generators;
//!
//! proptest! {
//!     #[test]
//!     fn keys_are_stable(request in generators::permission_request()) {
//!         prop_assert_eq!(request.resource_key(), request.clone().resource_key());
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;
pub mod mock;

pub use fixtures::{
    originator, AutoDenyHandler, AutoGrantHandler, ChannelHandler, CountingHandler,
    FailingHandler, TestFixture, ADMIN_DOMAIN,
};
pub use mock::{CallRecord, MockWallet};
