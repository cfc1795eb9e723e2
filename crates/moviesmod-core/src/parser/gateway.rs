//! Gateway page parsing
//!
//! Everything scraped off the file-hosting gateway and its follow-up
//! pages: the client-side redirect script, file metadata, download-option
//! buttons, the worker-bot token/id script patterns, SID landing forms
//! and meta-refresh targets. Each site quirk is one small function so a
//! layout change replaces one pattern, not the surrounding control flow.

use regex::Regex;
use scraper::{Html, Selector};

use crate::types::{DownloadOption, GatewayFileInfo, OptionKind};

/// Extracts the client-side redirect target from a gateway landing page
///
/// Matches `window.location.replace("<path>")`; the path is relative to
/// the gateway origin.
pub fn extract_redirect_path(html: &str) -> Option<String> {
    let re = Regex::new(r#"window\.location\.replace\("([^"]+)"\)"#).ok()?;
    re.captures(html).map(|caps| caps[1].to_string())
}

/// Extracts size and file name from the file page's metadata list
///
/// The list items read "Name : <file>" and "Size : <size>".
pub fn parse_file_info(html: &str) -> GatewayFileInfo {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("ul.list-group li") else {
        return GatewayFileInfo::default();
    };

    let mut info = GatewayFileInfo::default();
    for item in document.select(&selector) {
        let text = item.text().collect::<String>();
        if text.contains("Size :") {
            info.size = field_value(&text);
        } else if text.contains("Name :") {
            info.file_name = field_value(&text);
        }
    }
    info
}

fn field_value(text: &str) -> Option<String> {
    let value = text.splitn(2, ':').nth(1)?.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Classifies the action anchors on a file page into download options
///
/// Case-insensitive label substring match, first anchor wins per kind.
/// Relative hrefs are resolved against the gateway origin. The returned
/// list is sorted ascending by resolution priority (resume first).
pub fn parse_download_options(html: &str, origin: &str) -> Vec<DownloadOption> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut instant: Option<DownloadOption> = None;
    let mut worker: Option<DownloadOption> = None;
    let mut resume: Option<DownloadOption> = None;

    for anchor in document.select(&selector) {
        let text = anchor.text().collect::<String>().trim().to_string();
        let lower = text.to_lowercase();
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let url = absolutize(href, origin);

        if lower.contains("instant download") {
            instant.get_or_insert(DownloadOption {
                title: text,
                kind: OptionKind::Instant,
                url,
            });
        } else if lower.contains("resume worker bot") {
            worker.get_or_insert(DownloadOption {
                title: text,
                kind: OptionKind::Worker,
                url,
            });
        } else if lower.contains("resume cloud") || lower.contains("cloud resume download") {
            resume.get_or_insert(DownloadOption {
                title: text,
                kind: OptionKind::Resume,
                url,
            });
        }
    }

    let mut options: Vec<DownloadOption> =
        [resume, worker, instant].into_iter().flatten().collect();
    options.sort_by_key(DownloadOption::priority);
    options
}

fn absolutize(href: &str, origin: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}{}", origin.trim_end_matches('/'), href)
    }
}

/// Finds the final download anchor on a Resume Cloud page
///
/// Looks for the "Cloud Resume Download" label, falling back to the
/// styled success button.
pub fn find_resume_final_link(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let selector = Selector::parse("a[href]").ok()?;
    for anchor in document.select(&selector) {
        let text = anchor.text().collect::<String>().to_lowercase();
        if text.contains("cloud resume download")
            && let Some(href) = anchor.value().attr("href")
        {
            return Some(href.to_string());
        }
    }

    let button_selector = Selector::parse("a.btn-success").ok()?;
    document
        .select(&button_selector)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(|href| href.to_string())
}

/// Finds the worker-bot script block carrying the token-append call
pub fn extract_worker_script(html: &str) -> Option<String> {
    let re = Regex::new(r#"(?s)<script type="text/javascript">(.*?)</script>"#).ok()?;
    re.captures_iter(html)
        .map(|caps| caps[1].to_string())
        .find(|script| script.contains("formData.append('token'"))
}

/// Extracts the bearer token and download id from a worker-bot script
///
/// Primary patterns: the token literal in the form-append call and the
/// id embedded in the `fetch('/download?id=...')` call.
pub fn extract_worker_token_id(script: &str) -> Option<(String, String)> {
    let token_re = Regex::new(r"formData\.append\('token', '([^']+)'\)").ok()?;
    let id_re = Regex::new(r"fetch\('/download\?id=([^']+)',").ok()?;

    let token = token_re.captures(script)?[1].to_string();
    let id = id_re.captures(script)?[1].to_string();
    Some((token, id))
}

/// Looser token/id patterns tried when the primary pair is absent
pub fn extract_worker_token_id_fallback(script: &str) -> Option<(String, String)> {
    let token_re = Regex::new(r#"token['"]?\s*[:=]\s*['"]([^'"]+)['"]"#).ok()?;
    let id_re = Regex::new(r#"id['"]?\s*[:=]\s*['"]([^'"]+)['"]"#).ok()?;

    let token = token_re.captures(script)?[1].to_string();
    let id = id_re.captures(script)?[1].to_string();
    Some((token, id))
}

/// Extracts the `url=` target of a `<meta http-equiv="refresh">` tag
///
/// The attribute keyword is matched case-insensitively (`url=` / `URL=`).
pub fn parse_meta_refresh_url(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[http-equiv="refresh"]"#).ok()?;
    let re = Regex::new(r"(?i)url=(.*)").ok()?;

    for element in document.select(&selector) {
        if let Some(content) = element.value().attr("content")
            && let Some(caps) = re.captures(content)
        {
            let url = caps[1].trim().replace(['"', '\''], "");
            if !url.is_empty() {
                return Some(url);
            }
        }
    }
    None
}

/// Fields of the SID gate's `landing` form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingForm {
    pub action: String,
    pub wp_http: Option<String>,
    pub wp_http2: Option<String>,
    pub token: Option<String>,
}

/// Parses the `#landing` form of a SID gate page
pub fn parse_landing_form(html: &str) -> Option<LandingForm> {
    let document = Html::parse_document(html);
    let form_selector = Selector::parse("#landing").ok()?;
    let form = document.select(&form_selector).next()?;
    let action = form.value().attr("action")?.to_string();

    let input_value = |name: &str| -> Option<String> {
        let selector = Selector::parse(&format!(r#"input[name="{}"]"#, name)).ok()?;
        form.select(&selector)
            .next()
            .and_then(|input| input.value().attr("value"))
            .map(|value| value.to_string())
    };

    Some(LandingForm {
        action,
        wp_http: input_value("_wp_http"),
        wp_http2: input_value("_wp_http2"),
        token: input_value("token"),
    })
}
