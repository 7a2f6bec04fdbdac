use crate::dataset::{ImageRecord, Instance};
use crate::error::{Error, Result};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_line_segment_mut, Blend};
use itertools::Itertools;
use log::debug;
use std::path::Path;

/// Colors cycled through for the drawn instances
pub const PALETTE: [[u8; 3]; 10] = [
    [31, 119, 180],
    [255, 127, 14],
    [44, 160, 44],
    [214, 39, 40],
    [148, 103, 189],
    [140, 86, 75],
    [227, 119, 194],
    [127, 127, 127],
    [188, 189, 34],
    [23, 190, 207],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    BoundingBox,
    Segmentation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrawOptions {
    /// Instances with an area at or below this are not drawn
    pub min_area: f64,
    pub shape: Shape,
    /// Draw only this instance, ignoring `min_area`
    pub instance: Option<usize>,
    pub show_caption: bool,
    pub alpha: u8,
}

impl Default for DrawOptions {
    fn default() -> Self {
        DrawOptions {
            min_area: 2000.,
            shape: Shape::Segmentation,
            instance: None,
            show_caption: true,
            alpha: 220,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub color: Rgba<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rendering {
    pub image: RgbaImage,
    pub legend: Vec<LegendEntry>,
    pub title: Option<String>,
}

/// The instances `options` asks for
pub fn selected_instances<'a>(record: &'a ImageRecord, options: &DrawOptions) -> Vec<&'a Instance> {
    match options.instance {
        Some(index) => record.instances.get(index).into_iter().collect(),
        None => record
            .instances
            .iter()
            .filter(|instance| {
                instance
                    .annotation
                    .area
                    .map_or(false, |area| area > options.min_area)
            })
            .collect(),
    }
}

/// Closed outline of an x, y, width, height box
pub fn bbox_polyline(bbox: &[f64; 4]) -> Vec<(f32, f32)> {
    let [x, y, width, height] = *bbox;
    vec![
        (x, y),
        (x, y + height),
        (x + width, y + height),
        (x + width, y),
        (x, y),
    ]
    .into_iter()
    .map(|(x, y)| (x as f32, y as f32))
    .collect()
}

/// Pairs up a flat x1,y1,x2,y2,... list and repeats the first point at the end
pub fn closed_polyline(flat: &[f64]) -> Vec<(f32, f32)> {
    let mut points: Vec<(f32, f32)> = flat
        .chunks_exact(2)
        .map(|point| (point[0] as f32, point[1] as f32))
        .collect();
    if let Some(&first) = points.first() {
        points.push(first);
    }
    points
}

fn instance_polylines(instance: &Instance, shape: Shape) -> Vec<Vec<(f32, f32)>> {
    let annotation = &instance.annotation;
    match shape {
        Shape::BoundingBox => annotation.bbox.iter().map(bbox_polyline).collect(),
        Shape::Segmentation => {
            if annotation.is_crowd() {
                debug!("skipping crowd mask of annotation {}", annotation.id);
            }
            annotation
                .polygons()
                .iter()
                .map(|polygon| closed_polyline(polygon))
                .filter(|points| points.len() > 2)
                .collect()
        }
    }
}

fn draw_polyline(canvas: &mut Blend<RgbaImage>, points: &[(f32, f32)], color: Rgba<u8>) {
    for (start, end) in points.iter().tuple_windows() {
        draw_line_segment_mut(canvas, *start, *end, color);
    }
}

/// Draws the selected instances of `record` over its pixels
pub fn draw_image_record(record: &ImageRecord, options: &DrawOptions) -> Rendering {
    let mut canvas = Blend(record.pixels.to_rgba8());
    let mut legend = vec![];

    for (index, instance) in selected_instances(record, options).into_iter().enumerate() {
        let [r, g, b] = PALETTE[index % PALETTE.len()];
        let color = Rgba([r, g, b, options.alpha]);
        for points in instance_polylines(instance, options.shape) {
            draw_polyline(&mut canvas, &points, color);
        }
        legend.push(LegendEntry {
            label: instance.category_name().unwrap_or("unknown").to_string(),
            color,
        });
    }

    let title = if options.show_caption {
        record.caption_text().map(str::to_string)
    } else {
        None
    };

    Rendering {
        image: canvas.0,
        legend,
        title,
    }
}

pub fn draw_image_record_to_file(
    record: &ImageRecord,
    options: &DrawOptions,
    out_path: impl AsRef<Path>,
) -> Result<Rendering> {
    let out_path = out_path.as_ref();
    let rendering = draw_image_record(record, options);
    rendering
        .image
        .save(out_path)
        .map_err(|source| Error::Image {
            path: out_path.to_owned(),
            source,
        })?;
    Ok(rendering)
}
