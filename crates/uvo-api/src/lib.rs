//! Account session for the Kia USA owners service
//!
//! This crate owns everything that talks to the remote service: the
//! [`AccountSession`] trait the rest of the workspace programs against, the
//! reqwest-backed [`KiaOwnersClient`], the error taxonomy, and the private
//! wire payload types. Vehicle state is typed once, when the service
//! response is decoded into a [`uvo_core::VehicleSnapshot`].
//!
//! With the `testing` feature enabled the crate also ships
//! [`testing::MockAccountSession`], a scriptable session used by the
//! coordinator, account and entity test suites.

mod client;
mod error;
mod payload;
mod session;

#[cfg(feature = "testing")]
pub mod testing;

pub use client::{KiaOwnersClient, BRAND_KIA, REGION_USA};
pub use error::{ApiError, ApiResult};
pub use session::{AccountSession, SharedSession};
