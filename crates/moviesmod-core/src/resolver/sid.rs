//! SID login gate resolution
//!
//! Three sequential form POSTs simulating the gate's login/consent flow,
//! run on one cookie session: the landing form's `_wp_http` field, then
//! the refreshed form's `_wp_http2` + `token`, then a meta-refresh whose
//! `url=` target is the gateway redirect. A missing field at any step
//! aborts with no redirect URL; the caller treats that branch as empty.

use url::Url;

use crate::client::HttpClient;
use crate::parser::gateway::{parse_landing_form, parse_meta_refresh_url};

/// Runs the SID handshake; `None` when any step's expected field is absent
pub async fn resolve_sid_redirect(client: &HttpClient, sid_url: &str) -> Option<String> {
    match try_resolve(client, sid_url).await {
        Ok(redirect) => redirect,
        Err(e) => {
            tracing::debug!(sid_url, error = %e, "SID handshake failed");
            None
        }
    }
}

async fn try_resolve(
    client: &HttpClient,
    sid_url: &str,
) -> crate::error::Result<Option<String>> {
    let session = client.session()?;

    // Step 1: landing form with the _wp_http hidden field
    let first_page = session.get(sid_url).await?;
    let Some(first_form) = parse_landing_form(&first_page) else {
        tracing::debug!(sid_url, "no landing form on SID page");
        return Ok(None);
    };
    let Some(wp_http) = first_form.wp_http else {
        tracing::debug!(sid_url, "_wp_http field missing");
        return Ok(None);
    };

    let second_page = session
        .post_form_text(
            &first_form.action,
            &[("_wp_http", wp_http.as_str())],
            &[("Referer", sid_url)],
        )
        .await?;

    // Step 2: refreshed form carrying _wp_http2 and token
    let Some(second_form) = parse_landing_form(&second_page) else {
        tracing::debug!(sid_url, "no second landing form");
        return Ok(None);
    };
    let (Some(wp_http2), Some(token)) = (second_form.wp_http2, second_form.token) else {
        tracing::debug!(sid_url, "_wp_http2 or token field missing");
        return Ok(None);
    };

    let final_page = session
        .post_form_text(
            &second_form.action,
            &[("_wp_http2", wp_http2.as_str()), ("token", token.as_str())],
            &[("Referer", sid_url)],
        )
        .await?;

    // Step 3: meta refresh with the redirect target
    let Some(target) = parse_meta_refresh_url(&final_page) else {
        tracing::debug!(sid_url, "no meta refresh on final SID page");
        return Ok(None);
    };

    let redirect = resolve_against_origin(sid_url, &target);
    if let Some(url) = &redirect {
        tracing::debug!(redirect = %url, "SID resolved to redirect");
    }
    Ok(redirect)
}

/// Resolves a possibly-relative target against the SID URL's origin
fn resolve_against_origin(sid_url: &str, target: &str) -> Option<String> {
    let base = Url::parse(sid_url).ok()?;
    base.join(target).ok().map(|url| url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_against_origin_relative() {
        let resolved =
            resolve_against_origin("https://sid.example/?sid=1", "/?go=abc123").unwrap();
        assert_eq!(resolved, "https://sid.example/?go=abc123");
    }

    #[test]
    fn test_resolve_against_origin_absolute() {
        let resolved =
            resolve_against_origin("https://sid.example/?sid=1", "https://driveseed.org/file/9")
                .unwrap();
        assert_eq!(resolved, "https://driveseed.org/file/9");
    }
}
