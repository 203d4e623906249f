// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Push Payload Merge
//!
//! Folds vendor push payloads into the published message so the server can
//! fan it out to the matching mobile push gateways.

use serde_json::{Map, Value};

/// Vendor token -> payload map supplied with a publish.
pub type PushPayloads = Map<String, Value>;

/// Prefix every push destination key carries.
pub const PUSH_KEY_PREFIX: &str = "pn_";

/// Key under which a non-object message is stored after merging.
pub const OTHER_KEY: &str = "pn_other";

/// Apple's payload key; wrapped and routed to [`APNS_KEY`].
const APS_TOKEN: &str = "aps";
const APNS_KEY: &str = "pn_apns";

/// Merges `payloads` into `base`, returning a new object.
///
/// - An object `base` is copied (shallowly) and push keys are added to it.
/// - Any other non-null `base` is stored under `pn_other`.
/// - Tokens already starting with `pn_` are used verbatim; others get the
///   prefix, except `aps` which becomes `pn_apns: {"aps": payload}`.
/// - Colliding destination keys resolve to the last one written.
///
/// Callers skip this entirely when `payloads` is empty.
pub fn merge_push_payloads(base: Option<&Value>, payloads: &PushPayloads) -> Map<String, Value> {
    let mut merged = match base {
        Some(Value::Object(fields)) => fields.clone(),
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            let mut map = Map::new();
            map.insert(OTHER_KEY.to_string(), other.clone());
            map
        }
    };

    for (token, payload) in payloads {
        let (key, value) = push_entry(token, payload);
        merged.insert(key, value);
    }

    merged
}

/// Computes the destination key and value for one vendor payload.
fn push_entry(token: &str, payload: &Value) -> (String, Value) {
    if token.starts_with(PUSH_KEY_PREFIX) {
        return (token.to_string(), payload.clone());
    }
    if token == APS_TOKEN {
        let mut wrapped = Map::new();
        wrapped.insert(APS_TOKEN.to_string(), payload.clone());
        return (APNS_KEY.to_string(), Value::Object(wrapped));
    }
    (format!("{PUSH_KEY_PREFIX}{token}"), payload.clone())
}
