//! Coarse locator normalization for saturation counting.

use url::Url;

/// Query parameters that change on every page load and must not make two
/// visits to the same location look distinct.
const VOLATILE_PARAMS: &[&str] = &[
    "ts", "t", "_", "timestamp", "time", "session", "sid", "token", "cache", "nonce", "rand",
];

/// Reduce a URL to the coarse location used by the saturation table.
///
/// Strips the fragment and volatile query parameters, sorts the surviving
/// parameters, and drops credentials. Distinct fingerprints may map to the
/// same coarse locator; that is the point — saturation counts re-entries
/// of a location, not of a state.
pub fn coarse_locator(raw_url: &str) -> String {
    let Ok(url) = Url::parse(raw_url) else {
        return raw_url.trim().to_string();
    };

    let mut params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !VOLATILE_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    params.sort();

    let host = url.host_str().unwrap_or_default();
    let mut out = format!("{}://{}{}", url.scheme(), host, url.path());
    if !params.is_empty() {
        let joined: Vec<String> = params
            .into_iter()
            .map(|(k, v)| if v.is_empty() { k } else { format!("{k}={v}") })
            .collect();
        out.push('?');
        out.push_str(&joined.join("&"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volatile_params_are_stripped() {
        assert_eq!(
            coarse_locator("https://app.test/users?ts=17345&page=2"),
            "https://app.test/users?page=2"
        );
    }

    #[test]
    fn fragment_is_dropped() {
        assert_eq!(
            coarse_locator("https://app.test/users#row-17"),
            "https://app.test/users"
        );
    }

    #[test]
    fn param_order_is_canonical() {
        assert_eq!(
            coarse_locator("https://app.test/u?b=2&a=1"),
            coarse_locator("https://app.test/u?a=1&b=2")
        );
    }

    #[test]
    fn unparseable_input_passes_through() {
        assert_eq!(coarse_locator("not a url"), "not a url");
    }
}
