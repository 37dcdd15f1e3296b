// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Plain-text export of one production order.
//!
//! The document is a two-column table of OP details followed by the size
//! summary, written as `OP_Report_<op>.txt`.

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::dates;
use crate::sizes::SizeSummary;
use crate::types::Product;
use crate::utils::pad_display;

const TITLE: &str = "Production Order Report";

/// Render an amount as Colombian pesos: `$ 1.234.567,89`.
pub fn format_cop(value: f64) -> String {
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = (cents / 100).to_string();
    let fraction = cents % 100;

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}$ {},{:02}", sign, grouped, fraction)
}

/// `OP_Report_<op>.txt`, with anything but letters, digits, `-` and `_`
/// replaced so the OP cannot escape the target directory.
pub fn report_file_name(op: &str) -> String {
    let safe: String = op
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("OP_Report_{}.txt", if safe.is_empty() { "unknown" } else { &safe })
}

fn text(value: Option<&str>) -> String {
    value.unwrap_or_default().to_string()
}

/// Zero and missing both render as blank.
fn number<T: PartialEq + Default + ToString>(value: Option<T>) -> String {
    match value {
        Some(v) if v != T::default() => v.to_string(),
        _ => String::new(),
    }
}

/// One OP ready to be written out.
#[derive(Debug, Clone, PartialEq)]
pub struct OpReport {
    pub op: String,
    pub rows: Vec<(&'static str, String)>,
    pub sizes: SizeSummary,
}

impl OpReport {
    pub fn from_product(product: &Product) -> Self {
        let sizes = product
            .size_quantities
            .as_ref()
            .map(SizeSummary::from_quantities)
            .unwrap_or_default();

        let price = product.price;
        let total_price = price.zip(product.quantity).map(|(p, q)| p * q as f64);

        let rows = vec![
            ("OP", product.op_label().to_string()),
            ("Reference", text(product.reference.as_deref())),
            ("Brand", text(product.brand.as_deref())),
            ("Description", text(product.description.as_deref())),
            ("Campaign", text(product.campaign.as_deref())),
            ("Type", text(product.product_type.as_deref())),
            ("Assigned date", dates::format_for_display(product.assigned_date.as_deref())),
            ("Entry date", dates::format_for_display(product.plant_entry_date.as_deref())),
            ("Quantity", product.quantity.map(|q| q.to_string()).unwrap_or_default()),
            ("Price", price.map(format_cop).unwrap_or_default()),
            ("Total price", total_price.map(format_cop).unwrap_or_default()),
            ("Status", text(product.status.as_deref())),
            ("Stoppage reason", text(product.stoppage_reason.as_deref())),
            ("Cycle", text(product.cycle_calculated.as_deref())),
            ("Quantity made", number(product.quantity_made)),
            ("Quantity pending", number(product.quantity_pending)),
            (
                "Delivery %",
                product
                    .delivery_percentage
                    .filter(|p| *p != 0.0)
                    .map(|p| format!("{}%", p))
                    .unwrap_or_default(),
            ),
            (
                "Actual delivery date",
                dates::format_for_display(product.actual_delivery_date.as_deref()),
            ),
            ("Team", product.team_name()),
            ("SAM", number(product.sam)),
            ("SAM total", number(product.sam_total)),
            ("Persons", number(product.num_persons)),
            ("Load days", number(product.load_days)),
        ];

        Self { op: product.op_label().to_string(), rows, sizes }
    }

    pub fn file_name(&self) -> String {
        report_file_name(&self.op)
    }

    pub fn render(&self) -> String {
        let label_width = self
            .rows
            .iter()
            .map(|(label, _)| label.len())
            .max()
            .unwrap_or(0)
            .max("Size".len())
            + 2;
        let rule = "=".repeat(label_width + 30);

        let mut out = String::new();
        let _ = writeln!(out, "{}", TITLE);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "OP details");
        let _ = writeln!(out, "{}", "-".repeat(rule.len()));
        for (label, value) in &self.rows {
            let _ = writeln!(out, "{}{}", pad_display(label, label_width), value);
        }

        let _ = writeln!(out);
        let _ = writeln!(out, "Size summary");
        let _ = writeln!(out, "{}", "-".repeat(rule.len()));
        let _ = writeln!(out, "{}{}", pad_display("Size", label_width), "Quantity");
        for row in &self.sizes.rows {
            let _ = writeln!(out, "{}{}", pad_display(&row.size, label_width), row.quantity);
        }
        let _ = writeln!(out, "{}{}", pad_display("Total", label_width), self.sizes.total);
        out
    }

    /// Write the report into `dir` and return the file path.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.render())?;
        tracing::info!("OP_EXPORTED | op={} path={}", self.op, path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Team, TeamRef};
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn sample() -> Product {
        Product {
            id: 1,
            op: Some("4512".into()),
            reference: Some("REF-9".into()),
            price: Some(15500.5),
            quantity: Some(30),
            assigned_date: Some("2025-01-10".into()),
            plant_entry_date: Some("2025-01-12T00:00:00".into()),
            module: Some(TeamRef::Team(Team { id: 3, name: "Equipo 3".into(), ..Team::default() })),
            size_quantities: Some(BTreeMap::from([
                ("M".to_string(), 20),
                ("4".to_string(), 10),
            ])),
            delivery_percentage: Some(50.0),
            quantity_made: Some(0),
            ..Product::default()
        }
    }

    #[test]
    fn test_format_cop() {
        assert_eq!(format_cop(0.0), "$ 0,00");
        assert_eq!(format_cop(999.0), "$ 999,00");
        assert_eq!(format_cop(1234567.891), "$ 1.234.567,89");
        assert_eq!(format_cop(-2500.0), "-$ 2.500,00");
    }

    #[test]
    fn test_report_file_name() {
        assert_eq!(report_file_name("4512"), "OP_Report_4512.txt");
        assert_eq!(report_file_name("../etc"), "OP_Report____etc.txt");
        assert_eq!(report_file_name(""), "OP_Report_unknown.txt");
    }

    #[test]
    fn test_rows_follow_document_order() {
        let report = OpReport::from_product(&sample());
        let labels: Vec<&str> = report.rows.iter().map(|(l, _)| *l).collect();
        assert_eq!(labels.len(), 23);
        assert_eq!(&labels[..3], &["OP", "Reference", "Brand"]);
        assert_eq!(labels[22], "Load days");

        let value = |label: &str| report.rows.iter().find(|(l, _)| *l == label).unwrap().1.clone();
        assert_eq!(value("Assigned date"), "10/01/2025");
        assert_eq!(value("Entry date"), "12/01/2025");
        assert_eq!(value("Total price"), "$ 465.015,00");
        assert_eq!(value("Delivery %"), "50%");
        assert_eq!(value("Quantity made"), "");
        assert_eq!(value("Team"), "Equipo 3");
    }

    #[test]
    fn test_render_and_write() {
        let report = OpReport::from_product(&sample());
        let rendered = report.render();
        assert!(rendered.starts_with(TITLE));
        let size_lines: Vec<&str> = rendered
            .lines()
            .skip_while(|l| *l != "Size summary")
            .collect();
        assert!(size_lines[3].starts_with('4'));
        assert!(size_lines[4].starts_with('M'));
        assert!(size_lines[5].starts_with("Total") && size_lines[5].ends_with("30"));

        let dir = TempDir::new().unwrap();
        let path = report.write_to(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), "OP_Report_4512.txt");
        assert_eq!(fs::read_to_string(path).unwrap(), rendered);
    }
}
