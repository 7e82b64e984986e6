//! Response header helpers: entity alerts, failure alerts, total count and pagination links.

use crate::query::PageRequest;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue};
use url::form_urlencoded::byte_serialize;

/// Prefix of alert message keys (`residenceApp.resident.created`).
pub const APPLICATION_NAME: &str = "residenceApp";

pub const ALERT_HEADER: HeaderName = HeaderName::from_static("x-residenceapp-alert");
pub const ERROR_HEADER: HeaderName = HeaderName::from_static("x-residenceapp-error");
pub const PARAMS_HEADER: HeaderName = HeaderName::from_static("x-residenceapp-params");
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    if let Ok(v) = HeaderValue::from_str(value) {
        headers.insert(name, v);
    }
}

fn alert_headers(entity: &str, action: &str, param: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ALERT_HEADER, &format!("{}.{}.{}", APPLICATION_NAME, entity, action));
    insert(&mut headers, PARAMS_HEADER, param);
    headers
}

pub fn entity_created_headers(entity: &str, id: impl std::fmt::Display, location: &str) -> HeaderMap {
    let mut headers = alert_headers(entity, "created", &id.to_string());
    insert(&mut headers, header::LOCATION, location);
    headers
}

pub fn entity_updated_headers(entity: &str, id: impl std::fmt::Display) -> HeaderMap {
    alert_headers(entity, "updated", &id.to_string())
}

pub fn entity_deleted_headers(entity: &str, id: impl std::fmt::Display) -> HeaderMap {
    alert_headers(entity, "deleted", &id.to_string())
}

pub fn failure_headers(entity: &str, error_key: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, ERROR_HEADER, &format!("error.{}", error_key));
    insert(&mut headers, PARAMS_HEADER, entity);
    headers
}

/// `X-Total-Count`, plus an RFC 5988 `Link` header when the listing is paged.
/// `extra` holds the remaining query pairs (e.g. sort) to carry into the links.
pub fn list_headers(base_path: &str, page: Option<PageRequest>, total: u64, extra: &[(String, String)]) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, TOTAL_COUNT_HEADER, &total.to_string());
    if let Some(page) = page {
        insert(&mut headers, header::LINK, &link_header(base_path, page, total, extra));
    }
    headers
}

fn encode(s: &str) -> String {
    byte_serialize(s.as_bytes()).collect()
}

fn link_header(base_path: &str, page: PageRequest, total: u64, extra: &[(String, String)]) -> String {
    let size = u64::from(page.size.max(1));
    let total_pages = total.div_ceil(size);
    let last = total_pages.saturating_sub(1);
    let current = u64::from(page.page);

    let suffix: String = extra
        .iter()
        .map(|(k, v)| format!("&{}={}", encode(k), encode(v)))
        .collect();
    let link = |n: u64, rel: &str| format!("<{}?page={}&size={}{}>; rel=\"{}\"", base_path, n, size, suffix, rel);

    let mut links = Vec::new();
    if current < last {
        links.push(link(current + 1, "next"));
    }
    if current > 0 {
        links.push(link(current - 1, "prev"));
    }
    links.push(link(last, "last"));
    links.push(link(0, "first"));
    links.join(",")
}
