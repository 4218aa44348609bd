use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfLayerReference, Point, Pt,
};

use crate::error::ReportError;
use crate::risk;

pub const REPORT_FILE_NAME: &str = "patient_report.pdf";
pub const REPORT_TITLE: &str = "BAQA - Patient Assessment Report";

// A4 in points.
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

const LOGO_SIZE: f32 = 90.0;
const LOGO_DPI: f32 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontWeight {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub weight: FontWeight,
    pub size: f32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Everything drawn on the single report page, in points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLayout {
    pub width: f32,
    pub height: f32,
    pub logo: Placement,
    pub rule: (Point2, Point2),
    pub runs: Vec<TextRun>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

#[cfg(test)]
impl ReportLayout {
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.runs.iter().map(|run| run.text.as_str())
    }
}

pub fn download_name(generated_at: NaiveDateTime) -> String {
    format!("Report_{}.pdf", generated_at.format("%Y%m%d_%H%M"))
}

pub fn build_layout(
    attributes: &[(String, String)],
    probability: f64,
    generated_at: NaiveDateTime,
) -> ReportLayout {
    let (w, h) = (PAGE_WIDTH, PAGE_HEIGHT);
    let mut runs = Vec::new();
    let mut push = |text: String, weight: FontWeight, size: f32, x: f32, y: f32| {
        runs.push(TextRun {
            text,
            weight,
            size,
            x,
            y,
        });
    };

    push(REPORT_TITLE.to_string(), FontWeight::Bold, 16.0, 150.0, h - 60.0);
    push(
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M")),
        FontWeight::Regular,
        10.0,
        150.0,
        h - 78.0,
    );

    let mut y = h - 160.0;
    push("Patient Info:".to_string(), FontWeight::Bold, 12.0, 40.0, y);
    y -= 18.0;
    for (label, value) in attributes {
        push(format!("{label}: {value}"), FontWeight::Regular, 11.0, 52.0, y);
        y -= 16.0;
    }

    y -= 10.0;
    push("Risk Summary:".to_string(), FontWeight::Bold, 12.0, 40.0, y);
    y -= 18.0;
    push(
        format!(
            "Estimated 1-year mortality probability: {}",
            risk::format_percent(probability)
        ),
        FontWeight::Regular,
        11.0,
        52.0,
        y,
    );
    y -= 16.0;
    push(
        format!("Risk Level: {}", risk::classify(probability)),
        FontWeight::Regular,
        11.0,
        52.0,
        y,
    );

    ReportLayout {
        width: w,
        height: h,
        logo: Placement {
            x: 40.0,
            y: h - 120.0,
            width: LOGO_SIZE,
            height: LOGO_SIZE,
        },
        rule: (Point2 { x: 40.0, y: h - 130.0 }, Point2 { x: w - 40.0, y: h - 130.0 }),
        runs,
    }
}

pub struct ReportExporter {
    output_dir: PathBuf,
    logo: Option<PathBuf>,
}

impl ReportExporter {
    pub fn new(output_dir: impl Into<PathBuf>, logo: Option<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            logo,
        }
    }

    pub fn artifact_path(&self) -> PathBuf {
        self.output_dir.join(REPORT_FILE_NAME)
    }

    /// Writes the report, replacing any earlier one in the same output directory.
    pub fn export(
        &self,
        attributes: &[(String, String)],
        probability: f64,
        generated_at: NaiveDateTime,
    ) -> Result<PathBuf, ReportError> {
        let layout = build_layout(attributes, probability, generated_at);
        let bytes = render_pdf(&layout, self.logo.as_deref())?;

        let path = self.artifact_path();
        fs::create_dir_all(&self.output_dir).map_err(|source| ReportError::Write {
            path: path.clone(),
            source,
        })?;
        // Write beside the artifact and swap it in, so a failed write never
        // leaves a truncated report behind.
        let staging = self.output_dir.join(format!("{REPORT_FILE_NAME}.partial"));
        let written = fs::write(&staging, bytes).and_then(|_| fs::rename(&staging, &path));
        if let Err(source) = written {
            let _ = fs::remove_file(&staging);
            return Err(ReportError::Write {
                path: path.clone(),
                source,
            });
        }

        tracing::info!(path = %path.display(), "report written");
        Ok(path)
    }
}

fn pt(value: f32) -> Mm {
    Mm::from(Pt(value))
}

pub fn render_pdf(layout: &ReportLayout, logo: Option<&Path>) -> Result<Vec<u8>, ReportError> {
    let (doc, page, layer) =
        PdfDocument::new(REPORT_TITLE, pt(layout.width), pt(layout.height), "Report");
    let layer = doc.get_page(page).get_layer(layer);

    if let Some(path) = logo.filter(|path| path.exists()) {
        if let Err(err) = draw_logo(&layer, path, layout.logo) {
            tracing::warn!(path = %path.display(), error = %err, "skipping report logo");
        }
    }

    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| ReportError::Render(err.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| ReportError::Render(err.to_string()))?;

    for run in &layout.runs {
        let font: &IndirectFontRef = match run.weight {
            FontWeight::Regular => &regular,
            FontWeight::Bold => &bold,
        };
        layer.use_text(run.text.clone(), run.size, pt(run.x), pt(run.y), font);
    }

    let (start, end) = layout.rule;
    layer.add_line(Line {
        points: vec![
            (Point::new(pt(start.x), pt(start.y)), false),
            (Point::new(pt(end.x), pt(end.y)), false),
        ],
        is_closed: false,
    });

    doc.save_to_bytes()
        .map_err(|err| ReportError::Render(err.to_string()))
}

fn draw_logo(layer: &PdfLayerReference, path: &Path, at: Placement) -> anyhow::Result<()> {
    let decoded = image::open(path)?;
    let (width_px, height_px) = (decoded.width().max(1), decoded.height().max(1));
    let native_width = width_px as f32 * 72.0 / LOGO_DPI;
    let native_height = height_px as f32 * 72.0 / LOGO_DPI;

    Image::from_dynamic_image(&decoded).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(pt(at.x)),
            translate_y: Some(pt(at.y)),
            scale_x: Some(at.width / native_width),
            scale_y: Some(at.height / native_height),
            dpi: Some(LOGO_DPI),
            ..Default::default()
        },
    );
    Ok(())
}
