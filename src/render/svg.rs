use std::f64::consts::PI;
use std::fmt::Write;

use serde::{Deserialize, Serialize};

use crate::segments::{SectorSet, Segment};

/// Padding around the wheel so the pointer is not clipped.
const PAD: f64 = 8.0;
const MIN_INNER_RADIUS: f64 = 8.0;
const SEPARATOR_DEG: f64 = 0.4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WheelTheme {
    pub background: String,
    pub primary: String,
    pub text: String,
    pub center_fill: String,
    pub tick_color: String,
}

impl Default for WheelTheme {
    fn default() -> Self {
        Self {
            background: "#0b0d12".into(),
            primary: "#111827".into(),
            text: "#0b0d12".into(),
            center_fill: "#ffffff".into(),
            tick_color: "#111827".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    pub radius: f64,
    pub thickness: f64,
    pub label_max_chars: usize,
    pub show_pointer: bool,
    pub pointer_size: f64,
    pub theme: WheelTheme,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            radius: 160.0,
            thickness: 56.0,
            label_max_chars: 18,
            show_pointer: true,
            pointer_size: 12.0,
            theme: WheelTheme::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

/// 0° at 12 o'clock, growing clockwise.
pub fn polar_to_cartesian(cx: f64, cy: f64, r: f64, angle_deg: f64) -> Point {
    let rad = (angle_deg - 90.0) * PI / 180.0;
    Point {
        x: cx + r * rad.cos(),
        y: cy + r * rad.sin(),
    }
}

/// SVG path for an annular wedge between two angles.
pub fn describe_donut_slice(
    cx: f64,
    cy: f64,
    r_outer: f64,
    r_inner: f64,
    start_deg: f64,
    end_deg: f64,
) -> String {
    let large_arc = if end_deg - start_deg <= 180.0 { 0 } else { 1 };
    let p1 = polar_to_cartesian(cx, cy, r_outer, start_deg);
    let p2 = polar_to_cartesian(cx, cy, r_outer, end_deg);
    let p3 = polar_to_cartesian(cx, cy, r_inner, end_deg);
    let p4 = polar_to_cartesian(cx, cy, r_inner, start_deg);
    format!(
        "M {:.3} {:.3} A {r_outer} {r_outer} 0 {large_arc} 1 {:.3} {:.3} L {:.3} {:.3} A {r_inner} {r_inner} 0 {large_arc} 0 {:.3} {:.3} Z",
        p1.x, p1.y, p2.x, p2.y, p3.x, p3.y, p4.x, p4.y
    )
}

/// Cuts a label to `max` characters, ending in an ellipsis when shortened.
pub fn truncate_label(label: &str, max: usize) -> String {
    if label.chars().count() <= max {
        return label.to_string();
    }
    if max <= 1 {
        return "…".to_string();
    }
    let mut out: String = label.chars().take(max - 1).collect();
    out.push('…');
    out
}

/// Evenly spaced hues for segments that bring no colour of their own.
pub fn auto_colors(n: usize) -> Vec<String> {
    (0..n)
        .map(|i| {
            let hue = (360.0 * i as f64 / n as f64).round();
            format!("hsl({hue} 68% 58%)")
        })
        .collect()
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Renders the wheel rotated clockwise by `angle_deg`.
pub fn render_svg(
    segments: &[Segment],
    sectors: &SectorSet,
    angle_deg: f64,
    options: &RenderOptions,
) -> String {
    let outer = options.radius;
    let inner = (options.radius - options.thickness).max(MIN_INNER_RADIUS);
    let cx = outer + PAD;
    let cy = outer + PAD;
    let dim = (outer + PAD) * 2.0;
    let label_radius = (inner + outer) / 2.0;
    let palette = auto_colors(segments.len().max(1));
    let theme = &options.theme;

    let mut svg = String::new();
    // Writing into a String cannot fail.
    let _ = write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {dim} {dim}" width="{dim}" height="{dim}">"#
    );
    let _ = write!(
        svg,
        r#"<circle cx="{cx}" cy="{cy}" r="{outer}" fill="{}" opacity="0.06"/>"#,
        escape(&theme.primary)
    );
    let _ = write!(svg, r#"<g transform="rotate({angle_deg:.4} {cx} {cy})">"#);

    for (sector, segment) in sectors.sectors().iter().zip(segments) {
        let color = segment
            .color
            .clone()
            .unwrap_or_else(|| palette[sector.index % palette.len()].clone());
        let path = describe_donut_slice(cx, cy, outer, inner, sector.start_angle, sector.end_angle);
        let separator = describe_donut_slice(
            cx,
            cy,
            outer,
            inner,
            sector.start_angle,
            sector.start_angle + SEPARATOR_DEG,
        );
        let pos = polar_to_cartesian(cx, cy, label_radius, sector.mid_angle);
        let _ = write!(
            svg,
            r#"<g data-id="{id}"><path d="{path}" fill="{color}"/><path d="{separator}" fill="rgba(255,255,255,0.18)"/><g transform="rotate({mid:.3} {x:.3} {y:.3})"><text x="{x:.3}" y="{y:.3}" text-anchor="middle" dominant-baseline="middle" font-size="12" font-weight="600" fill="{text}"><title>{full}</title>{shown}</text></g></g>"#,
            id = escape(&segment.id),
            color = escape(&color),
            mid = sector.mid_angle,
            x = pos.x,
            y = pos.y,
            text = escape(&theme.text),
            full = escape(&segment.label),
            shown = escape(&truncate_label(&segment.label, options.label_max_chars)),
        );
    }
    svg.push_str("</g>");

    let _ = write!(
        svg,
        r#"<circle cx="{cx}" cy="{cy}" r="{inner}" fill="{}"/>"#,
        escape(&theme.background)
    );

    if options.show_pointer {
        let size = options.pointer_size.clamp(6.0, 24.0);
        let top = cy - outer;
        let _ = write!(
            svg,
            r#"<circle cx="{cx}" cy="{:.3}" r="{:.3}" fill="{}"/><path d="M {cx} {:.3} L {:.3} {:.3} L {:.3} {:.3} Z" fill="{}"/>"#,
            top - size * 0.1,
            size * 0.5,
            escape(&theme.center_fill),
            top - size * 0.5,
            cx - size * 0.7,
            top + size * 0.9,
            cx + size * 0.7,
            top + size * 0.9,
            escape(&theme.tick_color)
        );
    }

    svg.push_str("</svg>");
    svg
}
