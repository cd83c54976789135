// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 The todo-api-server authors

//! # Authentication Module
//!
//! Bearer-token authentication against a remote OIDC provider.
//!
//! ## Auth Flow
//!
//! 1. Client sends `Authorization: Bearer <JWT>`
//! 2. The [`Auth`] extractor pulls the token from the header
//! 3. [`TokenVerifier`] checks structure, signature, expiry, issuer, and
//!    audience against the provider's published key set
//! 4. The verified subject claim becomes the `user_id` that scopes all
//!    todo operations
//!
//! ## Security
//!
//! - The key set is fetched over HTTPS and cached with a TTL
//! - A key id missing from the cached set triggers exactly one forced
//!   refresh before failing, so provider-side key rotation needs no
//!   out-of-band cache invalidation
//! - Clock skew tolerance is 60 seconds
//! - All verification failures are 401s; only a failed key-set fetch is
//!   reported as 503, since it is an infrastructure problem rather than a
//!   credential problem

pub mod claims;
pub mod error;
pub mod extractor;
pub mod jwks;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testutil;

pub use claims::{AuthenticatedUser, ClaimSet};
pub use error::AuthError;
pub use extractor::Auth;
pub use jwks::KeySetCache;
pub use verifier::TokenVerifier;
