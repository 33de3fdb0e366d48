use std::fmt::Write;

use _model::{Tier, Venue};
use geo::Point;
use serde::Serialize;

use super::filter::{SortKey, View};

const HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Eye hospitals</title>
  <link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" crossorigin="" />
  <script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js" crossorigin=""></script>
  <style>
    body { font-family: Arial, sans-serif; margin: 0; color: #1f2933; }
    header, main { padding: 0.75rem 1.25rem; }
    header { display: flex; flex-wrap: wrap; gap: 1.5rem; align-items: center; border-bottom: 1px solid #d9e2ec; }
    header h1 { font-size: 1.25rem; margin: 0; }
    form label { margin-right: 0.75rem; }
    form input { width: 5rem; }
    #map { height: 600px; }
    .legend { background: white; padding: 6px 10px; border-radius: 6px; line-height: 1.5; box-shadow: 0 0 8px rgba(0, 0, 0, 0.2); }
    .legend i { display: inline-block; width: 12px; height: 12px; border-radius: 50%; margin-right: 6px; vertical-align: middle; }
    table { border-collapse: collapse; width: 100%; font-size: 0.9rem; }
    th, td { text-align: left; padding: 4px 8px; border-bottom: 1px solid #e4e7eb; }
    th a { color: inherit; }
    td.num { text-align: right; }
    .empty { padding: 1rem; background: #f0f4f8; border-radius: 6px; }
  </style>
</head>
<body>
"#;

const SCRIPT: &str = r#"
  var map = L.map('map');
  L.tileLayer('https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png', {
    maxZoom: 19,
    attribution: '&copy; OpenStreetMap contributors'
  }).addTo(map);
  map.setView([CENTER.lat, CENTER.lon], 11);

  var bounds = [];
  MARKERS.forEach(function (m) {
    L.circleMarker([m.lat, m.lon], {
      radius: 6,
      color: m.color,
      fill: true,
      fillColor: m.color,
      fillOpacity: 0.7,
      weight: 2
    })
      .bindPopup(m.popup, { maxWidth: 300 })
      .bindTooltip(m.tooltip)
      .addTo(map);
    bounds.push([m.lat, m.lon]);
  });
  if (bounds.length > 1) {
    map.fitBounds(bounds, { padding: [24, 24] });
  }

  var legend = L.control({ position: 'bottomright' });
  legend.onAdd = function () {
    var div = L.DomUtil.create('div', 'legend');
    div.innerHTML = LEGEND;
    return div;
  };
  legend.addTo(map);
"#;

#[derive(Serialize)]
struct Marker {
    lat: f64,
    lon: f64,
    color: &'static str,
    popup: String,
    tooltip: String,
}

#[derive(Serialize)]
struct Center {
    lat: f64,
    lon: f64,
}

/// Options that only make sense when the page is served.
pub struct Links {
    pub interactive: bool,
}

/// The full dashboard page for the given rows, `total` being the size of the
/// unfiltered dataset.
pub fn page(
    rows: &[&Venue],
    total: usize,
    view: &View,
    center: Point,
    links: &Links,
) -> serde_json::Result<String> {
    let mut out = String::from(HEAD);

    let _ = write!(
        out,
        "<header>\n  <h1>Eye hospitals</h1>\n  <span>Showing {}/{}</span>\n",
        rows.len(),
        total
    );
    if links.interactive {
        filter_form(&mut out, view);
        let _ = writeln!(
            out,
            "  <a href=\"export.csv?{}\" download>Download CSV</a>",
            escape(&view.to_query())
        );
    }
    out.push_str("</header>\n<div id=\"map\"></div>\n<main>\n");

    if rows.is_empty() {
        out.push_str("  <p class=\"empty\">No venues match the selected filters</p>\n");
    } else {
        listing(&mut out, rows, view, links);
    }
    out.push_str("</main>\n<script>\n");

    let markers: Vec<_> = rows.iter().map(|x| marker(x)).collect();
    let center = Center {
        lat: center.y(),
        lon: center.x(),
    };
    let _ = writeln!(out, "  var MARKERS = {};", script_json(&markers)?);
    let _ = writeln!(out, "  var CENTER = {};", script_json(&center)?);
    let _ = writeln!(out, "  var LEGEND = {};", script_json(&legend())?);
    out.push_str(SCRIPT);
    out.push_str("</script>\n</body>\n</html>\n");

    Ok(out)
}

fn filter_form(out: &mut String, view: &View) {
    let _ = write!(
        out,
        "  <form method=\"get\">\n    \
         <label>Min rating <input name=\"min_rating\" type=\"number\" min=\"0\" max=\"5\" step=\"0.1\" value=\"{}\"></label>\n    \
         <label>Min reviews <input name=\"min_reviews\" type=\"number\" min=\"0\" step=\"50\" value=\"{}\"></label>\n    \
         <input type=\"hidden\" name=\"sort\" value=\"{}\">\n    \
         <input type=\"hidden\" name=\"order\" value=\"{}\">\n",
        view.filter.min_rating,
        view.filter.min_reviews,
        view.sort.key.slug(),
        if view.sort.descending { "desc" } else { "asc" },
    );
    if !view.filter.excluded.is_empty() {
        let excluded = itertools::join(view.filter.excluded.iter(), ",");
        let _ = writeln!(
            out,
            "    <input type=\"hidden\" name=\"exclude\" value=\"{}\">",
            escape(&excluded)
        );
    }
    out.push_str("    <button type=\"submit\">Apply</button>\n  </form>\n");

    if !view.filter.excluded.is_empty() {
        let mut reset = view.clone();
        reset.filter.excluded.clear();
        let _ = writeln!(
            out,
            "  <span>Removed: {} <a href=\"?{}\">restore</a></span>",
            view.filter.excluded.len(),
            escape(&reset.to_query())
        );
    }
}

const COLUMNS: &[(&str, SortKey)] = &[
    ("Name", SortKey::Name),
    ("Rating", SortKey::Rating),
    ("Reviews", SortKey::Reviews),
    ("Locality", SortKey::Locality),
    ("Address", SortKey::Address),
    ("Phone", SortKey::Phone),
    ("Website", SortKey::Website),
    ("Open now", SortKey::OpenNow),
    ("Tier", SortKey::Tier),
];

fn listing(out: &mut String, rows: &[&Venue], view: &View, links: &Links) {
    out.push_str("  <table>\n    <thead><tr>");
    for (label, key) in COLUMNS {
        if links.interactive {
            let arrow = match (view.sort.key == *key, view.sort.descending) {
                (true, true) => " ▼",
                (true, false) => " ▲",
                _ => "",
            };
            let _ = write!(
                out,
                "<th><a href=\"?{}\">{label}</a>{arrow}</th>",
                escape(&view.sorted_by(*key).to_query())
            );
        } else {
            let _ = write!(out, "<th>{label}</th>");
        }
    }
    if links.interactive {
        out.push_str("<th></th>");
    }
    out.push_str("</tr></thead>\n    <tbody>\n");

    for x in rows {
        let _ = write!(
            out,
            "      <tr><td><a href=\"{}\">{}</a></td><td class=\"num\">{:.1}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td style=\"color: {}\">{}</td>",
            escape(&x.place_id.link()),
            escape(&x.name),
            x.rating,
            thousands(x.review_count),
            escape(x.locality().unwrap_or("Unknown")),
            escape(&x.address),
            escape(x.phone.as_deref().unwrap_or("N/A")),
            website(x.website.as_deref(), "Visit"),
            open_now(x.open_now),
            x.tier().color(),
            x.tier(),
        );
        if links.interactive {
            let _ = write!(
                out,
                "<td><a href=\"?{}\">remove</a></td>",
                escape(&view.without(&x.place_id).to_query())
            );
        }
        out.push_str("</tr>\n");
    }
    out.push_str("    </tbody>\n  </table>\n");
}

fn marker(venue: &Venue) -> Marker {
    let tier = venue.tier();
    let mut popup = String::new();
    let _ = write!(
        popup,
        "<div style=\"font-family: Arial; font-size: 12px; width: 260px;\">\
         <h4 style=\"margin: 5px 0; color: {color};\">{name}</h4><hr style=\"margin: 3px 0;\">\
         <b>Rating:</b> {rating:.1}/5.0 ({tier})<br>\
         <b>Reviews:</b> {reviews}<br>\
         <b>Address:</b> {address}<br>\
         <b>Phone:</b> {phone}<br>\
         <b>Open now:</b> {open}<br>",
        color = tier.color(),
        name = escape(&venue.name),
        rating = venue.rating,
        reviews = thousands(venue.review_count),
        address = escape(&venue.address),
        phone = escape(venue.phone.as_deref().unwrap_or("N/A")),
        open = open_now(venue.open_now),
    );
    if venue.website.is_some() {
        let _ = write!(
            popup,
            "<b>Website:</b> {}<br>",
            website(venue.website.as_deref(), "Visit")
        );
    }
    let _ = write!(
        popup,
        "<a href=\"{}\" target=\"_blank\">Google Maps</a></div>",
        escape(&venue.place_id.link())
    );

    Marker {
        lat: venue.latitude,
        lon: venue.longitude,
        color: tier.color(),
        popup,
        tooltip: format!("{} ({:.1} ★)", escape(&venue.name), venue.rating),
    }
}

fn legend() -> String {
    let mut out = String::from("<b>Rating</b><br>");
    for tier in Tier::all() {
        let _ = write!(
            out,
            "<i style=\"background: {}\"></i>{} ({})<br>",
            tier.color(),
            tier,
            tier.range()
        );
    }
    out
}

fn website(url: Option<&str>, label: &str) -> String {
    match url {
        Some(x) if x.starts_with("http://") || x.starts_with("https://") => {
            format!("<a href=\"{}\" target=\"_blank\">{label}</a>", escape(x))
        }
        Some(x) => escape(x),
        None => "N/A".to_string(),
    }
}

fn open_now(x: Option<bool>) -> &'static str {
    match x {
        Some(true) => "yes",
        Some(false) => "no",
        None => "unknown",
    }
}

/// JSON that is safe to embed in a `<script>` element.
fn script_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::dashboard::tests::venues;

    fn center() -> Point {
        Point::new(77.5946, 12.9716)
    }

    fn interactive() -> Links {
        Links { interactive: true }
    }

    #[test]
    fn shows_counts_and_rows() {
        let venues = venues();
        let view = View::default();
        let rows = view.select(&venues);
        let html = page(&rows, venues.len(), &view, center(), &interactive()).unwrap();

        assert!(html.contains("Showing 10/10"));
        assert!(html.contains("Narayana Nethralaya"));
        assert!(html.contains("Download CSV"));
        assert_eq!(html.matches("remove</a>").count(), 10);
        assert!(html.contains("2,150"));
    }

    #[test]
    fn empty_view() {
        let venues = venues();
        let mut view = View::default();
        view.filter.min_rating = 5.0;
        let rows = view.select(&venues);
        let html = page(&rows, venues.len(), &view, center(), &interactive()).unwrap();

        assert!(html.contains("Showing 0/10"));
        assert!(html.contains("No venues match the selected filters"));
        assert!(html.contains("var MARKERS = [];"));
    }

    #[test]
    fn static_page_has_no_links() {
        let venues = venues();
        let view = View::default();
        let rows = view.select(&venues);
        let html = page(&rows, venues.len(), &view, center(), &Links { interactive: false }).unwrap();
        assert!(!html.contains("Download CSV"));
        assert!(!html.contains("remove</a>"));
    }

    #[test]
    fn names_are_escaped() {
        let mut venues = venues();
        venues[0].name = "</script><b>Eye & Co</b>".to_string();
        let view = View::default();
        let rows = view.select(&venues);
        let html = page(&rows, venues.len(), &view, center(), &interactive()).unwrap();

        assert!(!html.contains("</script><b>"));
        assert!(html.contains("&lt;/script&gt;&lt;b&gt;Eye &amp; Co"));
    }

    #[test]
    fn unsafe_websites_are_not_linked() {
        assert_eq!(website(Some("javascript:alert(1)"), "Visit"), "javascript:alert(1)");
        assert_eq!(
            website(Some("https://www.lvpei.org"), "Visit"),
            "<a href=\"https://www.lvpei.org\" target=\"_blank\">Visit</a>"
        );
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(750), "750");
        assert_eq!(thousands(2150), "2,150");
        assert_eq!(thousands(1234567), "1,234,567");
    }

    #[test]
    fn legend_lists_every_tier() {
        let legend = legend();
        for tier in Tier::all() {
            assert!(legend.contains(tier.color()));
        }
    }
}
