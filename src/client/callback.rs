//! OAuth redirect landing
//!
//! After a provider sign-in the server redirects the browser to
//! `{frontend}/auth/success?token=...`. The token must be consumed once and
//! removed from the visible URL so a reload or a shared link does not replay it.

use url::Url;

/// Frontend path the server redirects to after a successful OAuth sign-in
pub const OAUTH_SUCCESS_PATH: &str = "/auth/success";

/// Query parameter carrying the issued token
pub const OAUTH_TOKEN_PARAM: &str = "token";

/// Take the OAuth token out of `url`, rewriting it in place.
///
/// Returns `None` and leaves `url` untouched unless it is the success
/// landing with a non-empty token parameter. Other query parameters are kept.
pub fn take_oauth_token(url: &mut Url) -> Option<String> {
    if url.path().trim_end_matches('/') != OAUTH_SUCCESS_PATH {
        return None;
    }

    let mut token = None;
    let mut rest = Vec::new();
    for (key, value) in url.query_pairs() {
        if key == OAUTH_TOKEN_PARAM {
            if token.is_none() && !value.is_empty() {
                token = Some(value.into_owned());
            }
        } else {
            rest.push((key.into_owned(), value.into_owned()));
        }
    }

    let token = token?;
    if rest.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(rest);
    }
    Some(token)
}
