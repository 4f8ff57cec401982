//! Generic terminal formatting: section banners, aligned tables and numbers.
//!
//! Formatting lives here so the analyses only compute values and the wording of
//! the report can change in one place.

/// Width of the `=` rules around section headers.
const RULE_WIDTH: usize = 80;

/// Horizontal alignment of a table column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// A plain-text table with a header row and a dashed separator.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<(String, Align)>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn column(mut self, header: impl Into<String>, align: Align) -> Self {
        self.headers.push((header.into(), align));
        self
    }

    pub fn row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render with each column as wide as its widest cell.
    pub fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, (h, _))| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut out = String::new();
        let header: Vec<String> = self.headers.iter().map(|(h, _)| h.clone()).collect();
        push_line(&mut out, &header, &self.headers, &widths);

        let dashes: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(dashes.join(" ").trim_end());
        out.push('\n');

        for row in &self.rows {
            push_line(&mut out, row, &self.headers, &widths);
        }
        out
    }
}

fn push_line(out: &mut String, cells: &[String], columns: &[(String, Align)], widths: &[usize]) {
    let parts: Vec<String> = columns
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(i, ((_, align), &w))| {
            let cell = cells.get(i).map(String::as_str).unwrap_or("");
            pad(cell, w, *align)
        })
        .collect();
    out.push_str(parts.join(" ").trim_end());
    out.push('\n');
}

/// Pad by character count so labels like `γ+Fe₃C` line up.
fn pad(s: &str, width: usize, align: Align) -> String {
    let fill = " ".repeat(width.saturating_sub(s.chars().count()));
    match align {
        Align::Left => format!("{s}{fill}"),
        Align::Right => format!("{fill}{s}"),
    }
}

/// Banner printed before each analysis.
pub fn format_section_header(title: &str) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    format!("\n{rule}\n  {title}\n{rule}\n")
}

pub fn print_section_header(title: &str) {
    println!("{}", format_section_header(title));
}

/// `0.8891 (88.91%)`
pub fn fmt_fraction(f: f64) -> String {
    format!("{f:.4} ({:.2}%)", f * 100.0)
}

/// `1000 K (727°C)`
pub fn fmt_temperature(t_k: f64) -> String {
    format!("{t_k:.0} K ({:.0}°C)", crate::domain::kelvin_to_celsius(t_k))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_is_framed_by_rules() {
        let h = format_section_header("A6: Eutectoid Steel Analysis");
        let lines: Vec<&str> = h.lines().collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[1].len(), 80);
        assert_eq!(lines[2], "  A6: Eutectoid Steel Analysis");
        assert_eq!(lines[1], lines[3]);
    }

    #[test]
    fn table_aligns_on_characters_not_bytes() {
        let mut t = Table::new().column("phase", Align::Left).column("pct", Align::Right);
        t.row(["γ+Fe₃C", "11.09"]);
        t.row(["α", "88.91"]);
        let text = t.render();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "phase    pct");
        assert_eq!(lines[1], "------ -----");
        assert_eq!(lines[2], "γ+Fe₃C 11.09");
        assert_eq!(lines[3], "α      88.91");
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn number_helpers() {
        assert_eq!(fmt_fraction(0.889055), "0.8891 (88.91%)");
        assert_eq!(fmt_temperature(1000.0), "1000 K (727°C)");
    }
}
