/// GET /check-health
///
/// Liveness probe for deployment tooling.
pub async fn check_health() -> &'static str {
    "Server is up and running"
}
