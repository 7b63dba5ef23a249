//! Geometry normalization: baselines, polygon points, ratio scaling,
//! vertical padding. Each transform is independent and works on the whole
//! document tree.

use std::path::Path;

use crate::dom::{XmlDocument, XmlElement};
use crate::error::AltoConvError;
use crate::report::Reporter;

/// Positional attributes scaled by the coordinate ratio.
const SCALED_ATTRS: [&str; 4] = ["HPOS", "VPOS", "WIDTH", "HEIGHT"];

fn parse_num(
    element: &XmlElement,
    attribute: &str,
    path: &Path,
) -> Result<f64, AltoConvError> {
    let raw = element.attr(attribute).unwrap_or_default();
    raw.trim()
        .parse::<f64>()
        .map_err(|_| AltoConvError::InvalidAttribute {
            path: path.to_path_buf(),
            attribute: attribute.to_string(),
            value: raw.to_string(),
        })
}

/// Reconstruct two-point baselines for text lines whose `BASELINE` holds a
/// single numeric token: `"x1 y x2 y"` with `x1 = HPOS` and
/// `x2 = HPOS + WIDTH`. Lines with a full baseline (or none) are untouched.
pub fn extrapolate_baselines(doc: &mut XmlDocument, path: &Path) -> Result<(), AltoConvError> {
    let mut failure = None;
    doc.root.for_each_element_mut(&mut |el| {
        if failure.is_some() || el.local_name() != "TextLine" {
            return;
        }
        let Some(baseline) = el.attr("BASELINE") else {
            return;
        };
        if baseline.split_whitespace().count() != 1 {
            return;
        }
        let numbers = (|| -> Result<(f64, f64, f64), AltoConvError> {
            let y = parse_num(el, "BASELINE", path)?;
            let x1 = parse_num(el, "HPOS", path)?;
            let width = parse_num(el, "WIDTH", path)?;
            Ok((y, x1, width))
        })();
        match numbers {
            Ok((y, x1, width)) => {
                let x2 = x1 + width;
                el.set_attr(
                    "BASELINE",
                    format!("{} {} {} {}", x1 as i64, y as i64, x2 as i64, y as i64),
                );
            }
            Err(err) => failure = Some(err),
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Rewrite every `Polygon/@POINTS` to the space-separated v4 syntax. The
/// comma form is an ALTO v2 artifact; the rewrite is idempotent.
pub fn reformat_polygon_points(doc: &mut XmlDocument) {
    doc.root.for_each_element_mut(&mut |el| {
        if el.local_name() != "Polygon" {
            return;
        }
        if let Some(points) = el.attr("POINTS") {
            let spaced = points.replace(',', " ");
            el.set_attr("POINTS", spaced);
        }
    });
}

/// Canvas size declared inside the document, used to derive the scale ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DeclaredSize {
    pub width: f64,
    pub height: f64,
}

/// Declared size from the first `Page` element (LIMB documents).
pub fn declared_page_size(doc: &XmlDocument, path: &Path) -> Result<DeclaredSize, AltoConvError> {
    let page = doc
        .root
        .find_first("Page")
        .ok_or_else(|| AltoConvError::MissingElement {
            path: path.to_path_buf(),
            element: "Page".to_string(),
        })?;
    Ok(DeclaredSize {
        width: parse_num(page, "WIDTH", path)?,
        height: parse_num(page, "HEIGHT", path)?,
    })
}

/// Declared size from the first `Illustration[@TYPE="image"]` element
/// (pdfalto documents).
pub fn declared_illustration_size(
    doc: &XmlDocument,
    path: &Path,
) -> Result<DeclaredSize, AltoConvError> {
    let mut found = None;
    find_illustration(&doc.root, &mut found);
    let illustration = found.ok_or_else(|| AltoConvError::MissingElement {
        path: path.to_path_buf(),
        element: "Illustration".to_string(),
    })?;
    Ok(DeclaredSize {
        width: parse_num(illustration, "WIDTH", path)?,
        height: parse_num(illustration, "HEIGHT", path)?,
    })
}

fn find_illustration<'a>(el: &'a XmlElement, found: &mut Option<&'a XmlElement>) {
    for child in el.child_elements() {
        if found.is_some() {
            return;
        }
        if child.local_name() == "Illustration" && child.attr("TYPE") == Some("image") {
            *found = Some(child);
            return;
        }
        find_illustration(child, found);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Derive the coordinate ratio for a document by comparing the bound image's
/// pixel size with the declared canvas size.
///
/// The measured ratio is only checked against `expected`: a mismatch is
/// reported, but the expected scenario constant is what gets applied.
pub fn compute_ratio(
    image_path: &Path,
    declared: DeclaredSize,
    expected: f64,
    reporter: &mut Reporter,
) -> Result<f64, AltoConvError> {
    let size = imagesize::size(image_path).map_err(|err| AltoConvError::ImageSize {
        path: image_path.to_path_buf(),
        message: err.to_string(),
    })?;
    let ratio_width = round2(size.width as f64 / declared.width);
    let ratio_height = round2(size.height as f64 / declared.height);
    if ratio_width != expected || ratio_height != expected {
        reporter.warn(format!(
            "ratio height : {} \nratio width : {}",
            ratio_height, ratio_width
        ));
    }
    Ok(expected)
}

/// Multiply every positional attribute under the `PrintSpace` subtree by the
/// ratio, truncating toward zero.
pub fn scale_print_space(
    doc: &mut XmlDocument,
    ratio: f64,
    path: &Path,
) -> Result<(), AltoConvError> {
    let print_space =
        doc.root
            .find_first_mut("PrintSpace")
            .ok_or_else(|| AltoConvError::MissingElement {
                path: path.to_path_buf(),
                element: "PrintSpace".to_string(),
            })?;
    let mut failure = None;
    print_space.for_each_element_mut(&mut |el| {
        if failure.is_some() {
            return;
        }
        for attribute in SCALED_ATTRS {
            if el.attr(attribute).is_none() {
                continue;
            }
            match parse_num(el, attribute, path) {
                Ok(value) => el.set_attr(attribute, ((value * ratio) as i64).to_string()),
                Err(err) => {
                    failure = Some(err);
                    return;
                }
            }
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Add a vertical offset to every `String/@VPOS`. `TextLine` and `SP`
/// siblings are deliberately left alone; only word boxes need the shift.
pub fn apply_vertical_padding(
    doc: &mut XmlDocument,
    padding: i64,
    path: &Path,
) -> Result<(), AltoConvError> {
    let mut failure = None;
    doc.root.for_each_element_mut(&mut |el| {
        if failure.is_some() || el.local_name() != "String" {
            return;
        }
        if el.attr("VPOS").is_none() {
            return;
        }
        match parse_num(el, "VPOS", path) {
            Ok(value) => el.set_attr("VPOS", (value as i64 + padding).to_string()),
            Err(err) => failure = Some(err),
        }
    });
    match failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
