// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Login exchange with `/api/login/Basic`.

use serde::{Deserialize, Serialize};

/// Credentials posted to the login resource.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    /// Account role, normally `customer`.
    pub username: &'a str,
    /// Gateway password.
    pub password: &'a str,
    /// Account e-mail address.
    pub email: &'a str,
}

/// Successful login answer.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Session token, sent back as the `AuthCookie` cookie.
    pub token: String,

    /// E-mail echoed by the gateway.
    #[serde(default)]
    pub email: Option<String>,

    /// Roles granted to the session.
    #[serde(default)]
    pub roles: Vec<String>,
}
