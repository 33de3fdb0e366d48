use _model::Venue;
use anyhow::{anyhow, Result};
use geo::Point;
use tiny_http::{Header, Request, Response, Server};
use tracing::{debug, info, warn};

use super::{
    filter::View,
    render::{self, Links},
};
use crate::dataset;

/// What the server knows between requests. Nothing here changes while it
/// runs; every request builds its own view from the query string.
pub struct Dashboard {
    pub venues: Vec<Venue>,
    pub base: View,
    pub center: Point,
}

#[derive(Debug, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub attachment: Option<&'static str>,
    pub body: String,
}

impl Reply {
    fn html(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/html; charset=utf-8",
            attachment: None,
            body,
        }
    }

    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            attachment: None,
            body: body.to_string(),
        }
    }
}

impl Dashboard {
    /// Answers one request for `url` (path plus optional query).
    pub fn handle(&self, url: &str) -> Reply {
        let (path, query) = url.split_once('?').unwrap_or((url, ""));
        let view = View::from_query(&self.base, query);
        let rows = view.select(&self.venues);

        match path {
            "/" | "/index.html" => {
                let links = Links { interactive: true };
                match render::page(&rows, self.venues.len(), &view, self.center, &links) {
                    Ok(x) => Reply::html(200, x),
                    Err(err) => {
                        warn!("failed to render dashboard: {err}");
                        Reply::text(500, "failed to render dashboard")
                    }
                }
            }
            "/export.csv" => {
                let mut body = Vec::new();
                match dataset::write_to(&mut body, rows) {
                    Ok(()) => Reply {
                        status: 200,
                        content_type: "text/csv; charset=utf-8",
                        attachment: Some("eye_hospitals_filtered.csv"),
                        body: String::from_utf8_lossy(&body).into_owned(),
                    },
                    Err(err) => {
                        warn!("failed to export csv: {err}");
                        Reply::text(500, "failed to export csv")
                    }
                }
            }
            _ => Reply::text(404, "not found"),
        }
    }

    /// Serves until the process is stopped. Requests are handled one at a
    /// time on this thread.
    pub fn serve(&self, addr: &str) -> Result<()> {
        let server = Server::http(addr).map_err(|x| anyhow!("Failed to listen on {addr}: {x}"))?;
        info!("dashboard listening on {addr}");
        println!("Dashboard at http://{addr}/");

        for request in server.incoming_requests() {
            let url = request.url().to_string();
            let reply = self.handle(&url);
            debug!("{} {url} -> {}", request.method(), reply.status);
            if let Err(err) = respond(request, reply) {
                warn!("failed to answer {url}: {err}");
            }
        }
        Ok(())
    }
}

fn respond(request: Request, reply: Reply) -> Result<()> {
    let mut response = Response::from_string(reply.body)
        .with_status_code(reply.status)
        .with_header(header("Content-Type", reply.content_type)?);
    if let Some(name) = reply.attachment {
        let value = format!("attachment; filename=\"{name}\"");
        response = response.with_header(header("Content-Disposition", &value)?);
    }
    request.respond(response)?;
    Ok(())
}

fn header(name: &str, value: &str) -> Result<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes())
        .map_err(|_| anyhow!("invalid header {name}: {value}"))
}
