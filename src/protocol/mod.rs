// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP plumbing for talking to a gateway.
//!
//! - [`GatewayHttpConfig`]: where a gateway lives and its TLS settings
//! - [`Fetcher`]: one logical request with deadline, retry and backoff
//! - [`Resource`]: the fixed REST resources read on every cycle

mod http;
mod resource;

pub use http::{FetchRequest, FetchResponse, Fetcher, GatewayHttpConfig, HttpMethod};
pub use resource::{AUTH_COOKIE, LOGIN_PATH, Resource, auth_cookie};
