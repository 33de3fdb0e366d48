use _model::Venue;

pub const NAME_WIDTH: usize = 30;
pub const LOCALITY_WIDTH: usize = 15;

/// Cuts `value` to `width` characters, marking the cut with "...".
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    let mut out: String = value.chars().take(width).collect();
    out.push_str("...");
    out
}

/// Left aligned columns separated by two spaces, numeric cells right
/// aligned.
pub fn render(headers: &[&str], rows: &[Vec<String>]) -> String {
    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, header)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(|x| x.chars().count())
                .max()
                .unwrap_or(0)
                .max(header.chars().count())
        })
        .collect();

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| {
                if looks_numeric(cell) {
                    format!("{cell:>width$}")
                } else {
                    format!("{cell:<width$}")
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(line(headers.to_vec()));
    lines.push(
        widths
            .iter()
            .map(|x| "-".repeat(*x))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in rows {
        let cells = (0..headers.len())
            .map(|i| row.get(i).map(String::as_str).unwrap_or("-"))
            .collect();
        lines.push(line(cells));
    }
    lines.join("\n")
}

fn looks_numeric(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|x| x.is_ascii_digit() || x == '.' || x == ',')
}

/// The dashboard listing as shown in a terminal.
pub fn venues(rows: &[&Venue]) -> String {
    let rows: Vec<_> = rows
        .iter()
        .map(|x| {
            vec![
                truncate(&x.name, NAME_WIDTH),
                format!("{:.1}", x.rating),
                x.review_count.to_string(),
                truncate(x.locality().unwrap_or("Unknown"), LOCALITY_WIDTH),
                x.tier().to_string(),
                x.place_id.to_string(),
            ]
        })
        .collect();
    render(&["name", "rating", "reviews", "locality", "tier", "id"], &rows)
}
