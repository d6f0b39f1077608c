//! Request inspection.
//!
//! # Responsibilities
//! - Generate a UUID request id for every request lacking one
//! - Extract the hostname and pathname to dispatch on
//! - Rebuild the caller identity from the upstream authentication headers
//!
//! # Design Decisions
//! - Identity headers are trusted: an upstream layer authenticates and
//!   strips client-supplied copies
//! - No `x-user-id` header means anonymous, whatever else is present

use axum::http::{header, HeaderMap, HeaderValue, Request, Uri};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::context::UserIdentity;

pub const X_REQUEST_ID: &str = "x-request-id";
pub const X_USER_ID: &str = "x-user-id";
pub const X_USER_ROLES: &str = "x-user-roles";
pub const X_USER_PERMISSIONS: &str = "x-user-permissions";
pub const X_USER_SUPER_ADMIN: &str = "x-user-super-admin";
pub const X_USER_SUPPLIER: &str = "x-user-supplier";
pub const X_USER_ORGANIZATION: &str = "x-user-organization";

/// UUID v4 request ids for `SetRequestIdLayer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Hostname from the `Host` header, or the URI authority (HTTP/2).
pub fn request_hostname(headers: &HeaderMap, uri: &Uri) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .or_else(|| uri.host())
        .filter(|h| !h.is_empty())
        .map(str::to_string)
}

/// Caller identity carried by the upstream authentication headers.
pub fn identity_from_headers(headers: &HeaderMap) -> Option<UserIdentity> {
    let id = header_str(headers, X_USER_ID)?;
    if id.is_empty() {
        return None;
    }

    let mut user = UserIdentity::new(id)
        .with_roles(split_list(header_str(headers, X_USER_ROLES)))
        .with_permissions(split_list(header_str(headers, X_USER_PERMISSIONS)));
    if header_flag(headers, X_USER_SUPER_ADMIN) {
        user = user.super_admin();
    }
    if header_flag(headers, X_USER_SUPPLIER) {
        user = user.supplier();
    }
    if let Some(org) = header_str(headers, X_USER_ORGANIZATION).filter(|o| !o.is_empty()) {
        user = user.member_of(org);
    }
    Some(user)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok()).map(str::trim)
}

fn header_flag(headers: &HeaderMap, name: &str) -> bool {
    header_str(headers, name)
        .is_some_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
