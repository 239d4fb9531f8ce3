//! Outbound header filtering.
//!
//! # Responsibilities
//! - Build the outbound header map from caller-supplied name/value lists
//! - Strip deny-listed headers (credentials and forwarding state of this
//!   service must never reach a caller-chosen origin)
//!
//! # Design Decisions
//! - Names are matched in their canonical lowercase form, so `cookie`,
//!   `Cookie` and `COOKIE` are all stripped
//! - Multiple values for one name keep their order
//! - Illegal names or values are reported, never silently dropped

use std::collections::{BTreeMap, HashSet};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

/// Convert caller headers into a `HeaderMap`, dropping blocked names.
pub fn filter_headers(
    headers: &BTreeMap<String, Vec<String>>,
    blocked: &HashSet<HeaderName>,
) -> Result<HeaderMap, String> {
    let mut filtered = HeaderMap::new();
    for (name, values) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| format!("invalid header name: {name:?}"))?;
        if blocked.contains(&header_name) {
            tracing::debug!(header = %header_name, "Stripping blocked header");
            continue;
        }
        for value in values {
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| format!("invalid value for header {name:?}"))?;
            filtered.append(header_name.clone(), header_value);
        }
    }
    Ok(filtered)
}
