// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys. No exporter is installed by the library;
//! counters are no-ops until the host process sets a recorder.
pub const USER_REGISTERED: &str = "user.registered";
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const AUTHZ_DENIED: &str = "authz.denied";
pub const HTTP_RATE_LIMITED: &str = "http.rate_limited";
pub const RESOURCE_CREATED: &str = "resource.created";

/// Count a newly persisted entity, labelled by kind.
pub fn resource_created(kind: &'static str) {
    metrics::counter!(RESOURCE_CREATED, "kind" => kind).increment(1);
}
