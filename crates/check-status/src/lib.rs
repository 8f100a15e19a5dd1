//! HTTP status page, grounded on `ngx_http_upstream_check_status_handler`.
//!
//! Serves the same XHTML table the original module renders: one row per
//! peer, the down ones highlighted, with a header line of health counters.
//! `axum` answers HEAD automatically for any route registered with `get`
//! and returns 405 for any other method on that path, so unlike the
//! original there is no manual method check here.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use check_config::ProbeKind;
use check_shm::{ShmRegion, SharedPeerState};
use std::fmt::Write as _;
use std::sync::Arc;

/// Static metadata about a peer the status page needs beyond what's in
/// shared memory: its display name and which probe it runs.
#[derive(Debug, Clone)]
pub struct PeerDescriptor {
    pub name: String,
    pub kind: ProbeKind,
}

pub struct StatusState {
    pub region: Arc<ShmRegion>,
    pub peers: Vec<PeerDescriptor>,
    pub shm_name: String,
}

/// Builds the axum router serving the status page at `path`.
pub fn router(path: &str, state: Arc<StatusState>) -> Router {
    Router::new().route(path, get(status_handler)).with_state(state)
}

async fn status_handler(State(state): State<Arc<StatusState>>) -> impl IntoResponse {
    if state.peers.len() != state.region.peer_count() {
        tracing::error!(
            configured = state.peers.len(),
            mapped = state.region.peer_count(),
            "status page peer descriptors do not match the shared-memory region"
        );
        return (StatusCode::INTERNAL_SERVER_ERROR, "shared memory region mismatch")
            .into_response();
    }

    let body = render(&state);
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Html(body),
    )
        .into_response()
}

fn render(state: &StatusState) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD XHTML 1.0 Strict//EN\n\
         \"http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd\">\n\
         <html xmlns=\"http://www.w3.org/1999/xhtml\">\n\
         <head>\n  <title>Upstream check status</title>\n</head>\n\
         <body>\n<h1>Upstream check status</h1>\n\
         <h2>Check upstream server number: {}, shm_name: {}</h2>\n\
         <table style=\"background-color:white\" cellspacing=\"0\" cellpadding=\"3\" border=\"1\">\n\
         \x20 <tr bgcolor=\"#C0C0C0\">\n\
         \x20   <th>Index</th>\n\
         \x20   <th>Name</th>\n\
         \x20   <th>Status</th>\n\
         \x20   <th>Business</th>\n\
         \x20   <th>Rise counts</th>\n\
         \x20   <th>Fall counts</th>\n\
         \x20   <th>Access counts</th>\n\
         \x20   <th>Check type</th>\n\
         \x20 </tr>\n",
        state.peers.len(),
        state.shm_name,
    );

    for (i, descriptor) in state.peers.iter().enumerate() {
        let peer = SharedPeerState::new(state.region.slot(i));
        let snapshot = peer.snapshot();
        let row_attr = if snapshot.down { " bgcolor=\"#FF0000\"" } else { "" };
        let status = if snapshot.down { "down" } else { "up" };
        let _ = write!(
            out,
            "\x20 <tr{row_attr}>\n\
             \x20   <td>{i}</td>\n\
             \x20   <td>{}</td>\n\
             \x20   <td>{status}</td>\n\
             \x20   <td>{}</td>\n\
             \x20   <td>{}</td>\n\
             \x20   <td>{}</td>\n\
             \x20   <td>{}</td>\n\
             \x20   <td>{}</td>\n\
             \x20 </tr>\n",
            descriptor.name,
            snapshot.business,
            snapshot.rise_count,
            snapshot.fall_count,
            snapshot.access_count,
            descriptor.kind.name(),
        );
    }

    out.push_str("</table>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use check_shm::ShmRegion;

    fn state_with_one_peer(name: &str, down: bool) -> Arc<StatusState> {
        let region = ShmRegion::open_or_create(900_000 + down as u64, 1).unwrap();
        if !down {
            let peer = SharedPeerState::new(region.slot(0));
            // Any worker id works here; this is a probe writing its own
            // verdict, unrelated to the status page's lock-free reads.
            peer.record_verdict(1, check_shm::Verdict::Pass, 1, 2, 1);
        }
        Arc::new(StatusState {
            region: Arc::new(region),
            peers: vec![PeerDescriptor {
                name: name.to_string(),
                kind: ProbeKind::Http,
            }],
            shm_name: "test-shm".to_string(),
        })
    }

    #[test]
    fn renders_down_row_with_red_background() {
        let state = state_with_one_peer("10.0.0.1:80", true);
        let html = render(&state);
        assert!(html.contains("bgcolor=\"#FF0000\""));
        assert!(html.contains(">down<"));
        assert!(html.contains("10.0.0.1:80"));
    }

    #[test]
    fn renders_up_row_without_red_background() {
        let state = state_with_one_peer("10.0.0.2:80", false);
        let html = render(&state);
        assert!(!html.contains("bgcolor=\"#FF0000\""));
        assert!(html.contains(">up<"));
    }
}
