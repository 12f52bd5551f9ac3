//! Reading a single property out of a remote JSON document.

use serde_json::Value;
use tracing::{debug, error};

use crate::fetcher::http_fetcher::{FetcherOptions, HttpResourceFetcher};

/// Fetch `url`, parse it as JSON and return the top-level `property`.
///
/// Returns `None` if the download fails, the body is empty or not JSON, or
/// the property is missing. Present but falsy values (`null`, `false`, `0`,
/// `""`) are also reported as missing. Never fails.
pub async fn get_property_from_json_url(
    url: &str,
    property: &str,
    fetcher: Option<&HttpResourceFetcher>,
) -> Option<Value> {
    let owned;
    let fetcher = match fetcher {
        Some(fetcher) => fetcher,
        None => match HttpResourceFetcher::new(url, FetcherOptions::new(true)) {
            Ok(fetcher) => {
                owned = fetcher;
                &owned
            }
            Err(e) => {
                error!("Cannot fetch JSON from \"{}\": {}", url, e);
                return None;
            }
        },
    };

    let response = fetcher.get().await.ok().flatten()?;
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => {
            debug!("Failed to read body of \"{}\": {}", url, e.reason());
            return None;
        }
    };

    if body.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(&body) {
        Ok(json) => json.get(property).filter(|v| is_truthy(v)).cloned(),
        Err(e) => {
            error!("JSON parsing failed for \"{}\": {}", url, e);
            None
        }
    }
}

/// JavaScript truthiness of a JSON value.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
