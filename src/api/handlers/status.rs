//! Liveness endpoint

/// GET / (and any unrouted path)
///
/// Always `200 ok`, independent of upstream health. A body that fails to
/// reach the client is a transport event logged by the trace layer.
pub async fn liveness() -> &'static str {
    "ok"
}
