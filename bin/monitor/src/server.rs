//! Minimal HTTP exporter: `/metrics` in prometheus text format, `/healthz`.

use prometheus::{Encoder, Registry, TextEncoder};
use tiny_http::{Header, Response, Server};
use tracing::{info, warn};

/// Render every metric registered on the registry as prometheus text.
pub fn gather_text(registry: &Registry) -> String {
    let families = registry.gather();
    let mut out = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&families, &mut out) {
        warn!(error = %e, "failed encoding metrics");
        return String::new();
    }
    String::from_utf8(out).unwrap_or_default()
}

/// Serve the exporter until the process exits. Blocking; run on its own
/// thread.
pub fn serve(bind: &str, registry: Registry) -> eyre::Result<()> {
    let server = Server::http(bind)
        .map_err(|e| eyre::eyre!("failed to bind metrics server on {bind}: {e}"))?;
    info!(bind, "metrics server started");

    for req in server.incoming_requests() {
        let resp = match (req.method().as_str(), req.url()) {
            ("GET", "/metrics") => {
                let body = gather_text(&registry);
                let h = Header::from_bytes(&b"Content-Type"[..], &b"text/plain; version=0.0.4"[..])
                    .unwrap();
                Response::from_string(body)
                    .with_status_code(200)
                    .with_header(h)
            }
            ("GET", "/healthz") => {
                let body = serde_json::json!({"status": "ok"}).to_string();
                let h = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).unwrap();
                Response::from_string(body)
                    .with_status_code(200)
                    .with_header(h)
            }
            _ => Response::from_string("not found\n").with_status_code(404),
        };

        if let Err(e) = req.respond(resp) {
            warn!(error = %e, "failed writing http response");
        }
    }
    Ok(())
}
