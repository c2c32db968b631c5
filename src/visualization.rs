//! Visualization utilities for optimized routes.
//!
//! Generates SVG maps of candidate routes and scatter plots of Pareto fronts,
//! with optional PNG export.

use crate::catalog::{category_color, category_name, LocationCatalog};
use crate::individual::Fitness;
use crate::optimizer::RouteResult;
use crate::routing::Coordinate;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::process::Command;
#[cfg(feature = "resvg")]
use resvg::usvg;
#[cfg(feature = "resvg")]
use resvg::render;
#[cfg(feature = "resvg")]
use resvg::FitTo;
#[cfg(feature = "resvg")]
use resvg::tiny_skia::{Pixmap, Transform};
#[cfg(feature = "resvg")]
use resvg::usvg::TreeParsing;

/// Stroke colours for successive routes and front series.
const PALETTE: [&str; 6] = ["#2c3e50", "#16a085", "#8e44ad", "#d35400", "#2980b9", "#c0392b"];

/// SVG visualization generator
pub struct Visualizer {
    /// Canvas width
    pub width: f64,
    /// Canvas height
    pub height: f64,
    /// Margin
    pub margin: f64,
    /// Stop marker radius
    pub node_radius: f64,
}

impl Default for Visualizer {
    fn default() -> Self {
        Visualizer {
            width: 800.0,
            height: 800.0,
            margin: 50.0,
            node_radius: 7.0,
        }
    }
}

/// Linear map from a data box onto the drawable area, y pointing up.
struct Frame {
    min_x: f64,
    min_y: f64,
    scale_x: f64,
    scale_y: f64,
    left: f64,
    bottom: f64,
}

impl Frame {
    fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.left + (x - self.min_x) * self.scale_x,
            self.bottom - (y - self.min_y) * self.scale_y,
        )
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

impl Visualizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn header(&self, svg: &mut String, extra_style: &str) {
        svg.push_str(&format!(
            r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="0 0 {} {}">
<style>
    .poi {{ fill: #bdc3c7; stroke: #7f8c8d; stroke-width: 1; }}
    .label {{ font-family: Arial; font-size: 10px; fill: #2c3e50; }}
    .title {{ font-family: Arial; font-size: 14px; fill: #2c3e50; font-weight: bold; }}
    .axis {{ stroke: #2c3e50; stroke-width: 1; }}
{}
</style>
<rect width="100%" height="100%" fill="#ecf0f1"/>
"##,
            self.width, self.height, self.width, self.height, extra_style
        ));
    }

    /// Map of the catalog with every route drawn on top.
    ///
    /// A route follows its geometry when present, otherwise straight segments
    /// between its stops. Stops are coloured by category and numbered in
    /// visiting order.
    pub fn generate_routes_svg(&self, catalog: &LocationCatalog, routes: &[RouteResult]) -> String {
        let mut svg = String::new();
        self.header(&mut svg, "    .route { stroke-width: 3; fill: none; stroke-opacity: 0.8; }");

        let mut points: Vec<Coordinate> = catalog.iter().map(|l| l.lon_lat()).collect();
        for route in routes {
            if let Some(geometry) = &route.geometry {
                points.extend_from_slice(geometry.coordinates());
            }
            points.extend(route.locations.iter().map(|l| [l.lon, l.lat]));
        }
        let frame = self.frame_for(&points, true);

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">{} route(s) over {} locations</text>
"##,
            self.margin, routes.len(), catalog.len()
        ));

        for loc in catalog.iter() {
            let (x, y) = frame.apply(loc.longitude, loc.latitude);
            svg.push_str(&format!(
                r##"<circle cx="{:.2}" cy="{:.2}" r="3" class="poi"><title>{}</title></circle>
"##,
                x, y, escape(&loc.name)
            ));
        }

        for (i, route) in routes.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            let path: Vec<Coordinate> = match &route.geometry {
                Some(geometry) => geometry.coordinates().to_vec(),
                None => route.locations.iter().map(|l| [l.lon, l.lat]).collect(),
            };
            let d: Vec<String> = path
                .iter()
                .enumerate()
                .map(|(k, c)| {
                    let (x, y) = frame.apply(c[0], c[1]);
                    format!("{} {:.2} {:.2}", if k == 0 { "M" } else { "L" }, x, y)
                })
                .collect();
            svg.push_str(&format!(
                r##"<path d="{}" class="route" stroke="{}"/>
"##,
                d.join(" "), color
            ));

            for (k, stop) in route.locations.iter().enumerate() {
                let (x, y) = frame.apply(stop.lon, stop.lat);
                svg.push_str(&format!(
                    r##"<circle cx="{:.2}" cy="{:.2}" r="{}" fill="{}" stroke="{}" stroke-width="2"><title>{}</title></circle>
<text x="{:.2}" y="{:.2}" class="label" text-anchor="middle">{}</text>
"##,
                    x, y, self.node_radius, stop.category_color, color, escape(&stop.name),
                    x, y - self.node_radius - 3.0, k + 1
                ));
            }
        }

        // Legend: routes, then categories present in the catalog.
        let mut legend_y = self.height - self.margin + 15.0 - 16.0 * routes.len() as f64;
        for (i, route) in routes.iter().enumerate() {
            svg.push_str(&format!(
                r##"<line x1="{}" y1="{:.2}" x2="{}" y2="{:.2}" stroke="{}" stroke-width="3"/>
<text x="{}" y="{:.2}" class="label">Route {}: distance {:.4}, satisfaction {:.3}{}</text>
"##,
                self.margin, legend_y, self.margin + 20.0, legend_y, PALETTE[i % PALETTE.len()],
                self.margin + 25.0, legend_y + 4.0, route.id, route.distance, route.satisfaction,
                if route.geometry.is_some() { "" } else { " (proxy)" }
            ));
            legend_y += 16.0;
        }

        let mut categories: Vec<_> = catalog.iter().map(|l| l.category_id).collect();
        categories.sort_unstable();
        categories.dedup();
        let legend_x = self.width - self.margin - 90.0;
        for (k, category) in categories.iter().enumerate() {
            let y = self.margin + 16.0 * k as f64;
            svg.push_str(&format!(
                r##"<rect x="{}" y="{:.2}" width="12" height="12" fill="{}"/>
<text x="{}" y="{:.2}" class="label">{}</text>
"##,
                legend_x, y, category_color(*category), legend_x + 16.0, y + 10.0, escape(category_name(*category))
            ));
        }

        svg.push_str("</svg>");
        svg
    }

    /// Scatter plot of one or more fronts, distance on x and satisfaction on
    /// y, with an optional reference point (e.g. the greedy baseline).
    pub fn generate_pareto_svg(&self, series: &[(String, Vec<Fitness>)], reference: Option<(&str, Fitness)>) -> String {
        let mut svg = String::new();
        self.header(&mut svg, "");

        let mut points: Vec<Coordinate> = series
            .iter()
            .flat_map(|(_, front)| front.iter())
            .chain(reference.iter().map(|(_, f)| f))
            .filter(|f| f.distance.is_finite() && f.satisfaction.is_finite())
            .map(|f| [f.distance, f.satisfaction])
            .collect();
        if points.is_empty() {
            points.push([0.0, 0.0]);
        }
        let frame = self.frame_for(&points, false);

        svg.push_str(&format!(
            r##"<text x="{}" y="25" class="title">Pareto front: distance (min) vs satisfaction (max)</text>
"##,
            self.margin
        ));

        let (x0, y0) = (self.margin, self.height - self.margin);
        svg.push_str(&format!(
            r##"<line x1="{x0}" y1="{y0}" x2="{}" y2="{y0}" class="axis"/>
<line x1="{x0}" y1="{y0}" x2="{x0}" y2="{}" class="axis"/>
<text x="{}" y="{}" class="label" text-anchor="middle">distance</text>
<text x="{}" y="{}" class="label" transform="rotate(-90 {} {})">satisfaction</text>
"##,
            self.width - self.margin, self.margin,
            self.width / 2.0, self.height - 15.0,
            15.0, self.height / 2.0, 15.0, self.height / 2.0
        ));

        // Axis ticks at the data extremes.
        let (min_d, max_d, min_s, max_s) = bounds(&points);
        for (value, pos) in [(min_d, frame.apply(min_d, min_s).0), (max_d, frame.apply(max_d, min_s).0)] {
            svg.push_str(&format!(
                r##"<text x="{:.2}" y="{}" class="label" text-anchor="middle">{:.4}</text>
"##,
                pos, y0 + 15.0, value
            ));
        }
        for (value, pos) in [(min_s, frame.apply(min_d, min_s).1), (max_s, frame.apply(min_d, max_s).1)] {
            svg.push_str(&format!(
                r##"<text x="{}" y="{:.2}" class="label" text-anchor="end">{:.3}</text>
"##,
                x0 - 5.0, pos + 3.0, value
            ));
        }

        for (i, (name, front)) in series.iter().enumerate() {
            let color = PALETTE[i % PALETTE.len()];
            for f in front.iter().filter(|f| f.distance.is_finite()) {
                let (x, y) = frame.apply(f.distance, f.satisfaction);
                svg.push_str(&format!(
                    r##"<circle cx="{:.2}" cy="{:.2}" r="4" fill="{}" fill-opacity="0.7"/>
"##,
                    x, y, color
                ));
            }
            let ly = self.margin + 16.0 * i as f64;
            svg.push_str(&format!(
                r##"<circle cx="{}" cy="{:.2}" r="5" fill="{}"/>
<text x="{}" y="{:.2}" class="label">{}</text>
"##,
                self.width - self.margin - 140.0, ly, color,
                self.width - self.margin - 130.0, ly + 4.0, escape(name)
            ));
        }

        if let Some((label, f)) = reference {
            if f.distance.is_finite() {
                let (x, y) = frame.apply(f.distance, f.satisfaction);
                svg.push_str(&format!(
                    r##"<path d="M {:.2} {:.2} L {:.2} {:.2} M {:.2} {:.2} L {:.2} {:.2}" stroke="#e74c3c" stroke-width="3"/>
<text x="{:.2}" y="{:.2}" class="label">{}</text>
"##,
                    x - 6.0, y - 6.0, x + 6.0, y + 6.0, x - 6.0, y + 6.0, x + 6.0, y - 6.0,
                    x + 9.0, y - 9.0, escape(label)
                ));
            }
        }

        svg.push_str("</svg>");
        svg
    }

    /// Fit `points` into the drawable area; `equal_aspect` keeps map proportions.
    fn frame_for(&self, points: &[Coordinate], equal_aspect: bool) -> Frame {
        let (min_x, max_x, min_y, max_y) = bounds(points);
        let span_x = (max_x - min_x).max(1e-9);
        let span_y = (max_y - min_y).max(1e-9);
        let mut scale_x = (self.width - 2.0 * self.margin) / span_x;
        let mut scale_y = (self.height - 2.0 * self.margin) / span_y;
        if equal_aspect {
            let scale = scale_x.min(scale_y);
            scale_x = scale;
            scale_y = scale;
        }
        Frame {
            min_x,
            min_y,
            scale_x,
            scale_y,
            left: self.margin,
            bottom: self.height - self.margin,
        }
    }

    /// Save SVG to file
    pub fn save_svg<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(svg.as_bytes())?;
        Ok(())
    }

    /// Save SVG as PNG, natively with the `resvg` feature, otherwise through
    /// `rsvg-convert`, `magick` or `inkscape`, whichever succeeds first.
    pub fn save_png<P: AsRef<Path>>(&self, svg: &str, path: P) -> std::io::Result<()> {
        Self::svg_to_png_file(svg, path.as_ref())
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))
    }

    /// Render an SVG string directly to a PNG file using the available renderer.
    pub fn svg_to_png_file(svg: &str, out: &Path) -> Result<(), Box<dyn std::error::Error>> {
        #[cfg(feature = "resvg")]
        {
            let opt = usvg::Options::default();
            let rtree = usvg::Tree::from_str(svg, &opt)?;
            let (w, h) = svg_size(svg);
            let mut pixmap = Pixmap::new(w, h).ok_or("Failed to create pixmap")?;
            render(&rtree, FitTo::Original, Transform::default(), pixmap.as_mut()).ok_or("resvg render failed")?;
            pixmap.save_png(out)?;
            return Ok(());
        }

        // Fallback: external converters
        let tmp = out.with_extension("svg.tmp");
        std::fs::write(&tmp, svg)?;
        let tmp_s = tmp.to_string_lossy().to_string();
        let out_s = out.to_string_lossy().to_string();
        let (tmp_s, out_s) = (tmp_s.as_str(), out_s.as_str());

        let attempts: [(&str, Vec<&str>); 3] = [
            ("rsvg-convert", vec!["-o", out_s, tmp_s]),
            ("magick", vec!["convert", tmp_s, out_s]),
            ("inkscape", vec![tmp_s, "--export-type=png", "--export-filename", out_s]),
        ];
        for (program, args) in attempts.iter() {
            if let Ok(status) = Command::new(program).args(args).status() {
                if status.success() {
                    let _ = std::fs::remove_file(&tmp);
                    return Ok(());
                }
            }
        }

        let _ = std::fs::remove_file(&tmp);
        Err("No SVG->PNG converter succeeded (tried rsvg-convert, magick, inkscape)".into())
    }

    /// Export route data for external plotting (e.g., matplotlib).
    pub fn export_plot_data(&self, routes: &[RouteResult]) -> String {
        let mut data = String::new();

        data.push_str("# Optimized routes\n");
        data.push_str("route,order,id,name,lat,lon,color\n");
        for route in routes {
            for (k, stop) in route.locations.iter().enumerate() {
                data.push_str(&format!(
                    "{},{},{},\"{}\",{},{},{}\n",
                    route.id, k + 1, stop.id, stop.name.replace('"', "'"), stop.lat, stop.lon, stop.category_color
                ));
            }
        }

        data.push_str("\n# Objectives: route, distance, satisfaction, has_geometry\n");
        for route in routes {
            data.push_str(&format!(
                "{},{},{},{}\n",
                route.id, route.distance, route.satisfaction, route.geometry.is_some()
            ));
        }

        data
    }
}

/// `(min_x, max_x, min_y, max_y)` of a point set.
fn bounds(points: &[Coordinate]) -> (f64, f64, f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in points {
        min_x = min_x.min(p[0]);
        max_x = max_x.max(p[0]);
        min_y = min_y.min(p[1]);
        max_y = max_y.max(p[1]);
    }

    if points.is_empty() {
        return (0.0, 1.0, 0.0, 1.0);
    }
    (min_x, max_x, min_y, max_y)
}

/// Canvas size from the root `width`/`height` attributes, 800x800 by default.
#[cfg_attr(not(feature = "resvg"), allow(dead_code))]
fn svg_size(svg: &str) -> (u32, u32) {
    let attr = |name: &str| -> Option<u32> {
        let (_, rest) = svg.split_once(&format!("{}=\"", name))?;
        let (value, _) = rest.split_once('"')?;
        value.parse::<f64>().ok().map(|v| (v as u32).max(1))
    };
    (attr("width").unwrap_or(800), attr("height").unwrap_or(800))
}
