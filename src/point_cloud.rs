//! Image to point cloud conversion.
//!
//! A source image is rasterized to a fixed working width, every pixel that
//! passes the [`VisibilityPolicy`] becomes one particle. The particle's
//! target is the pixel's position in centered, Y-up world space scaled by
//! two; its initial position is a uniform random point inside the
//! dispersion cube.
//!
//! # Example
//!
//! ```ignore
//! let config = PointCloudConfig::default();
//! match point_cloud::load(&config, &mut Sampler::new(None)) {
//!     Ok(buffer) => driver.load(Scene::Blend(buffer)),
//!     Err(e) => tracing::error!("{}", e),
//! }
//! ```

use std::path::PathBuf;

use glam::Vec3;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader, Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::error::{AssetError, ConfigError};
use crate::particles::{ParticleBuffer, ParticlePoint};
use crate::sampling::Sampler;

/// Default channel-sum cutoff for [`ColorPredicate::NotNearWhite`].
pub const NOT_NEAR_WHITE_MAX_SUM: u32 = 700;
/// Default channel-sum cutoff for [`ColorPredicate::Dark`].
pub const DARK_MAX_SUM: u32 = 380;
/// Tallest raster [`rasterize`] will allocate.
pub const MAX_RASTER_HEIGHT: u32 = 4096;

/// Color test applied to pixels that already passed the alpha cutoff.
///
/// Both named predicates test `r + g + b < max_sum`; they differ in intent
/// and default cutoff. `NotNearWhite` drops a white background, `Dark` keeps
/// only a dark silhouette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColorPredicate {
    /// Accept any color.
    Any,
    /// Reject pixels whose channel sum reaches `max_sum`.
    NotNearWhite { max_sum: u32 },
    /// Accept only pixels whose channel sum is below `max_sum`.
    Dark { max_sum: u32 },
}

impl ColorPredicate {
    pub fn not_near_white() -> Self {
        ColorPredicate::NotNearWhite {
            max_sum: NOT_NEAR_WHITE_MAX_SUM,
        }
    }

    pub fn dark() -> Self {
        ColorPredicate::Dark {
            max_sum: DARK_MAX_SUM,
        }
    }

    #[inline]
    pub fn accepts(&self, r: u8, g: u8, b: u8) -> bool {
        let sum = r as u32 + g as u32 + b as u32;
        match *self {
            ColorPredicate::Any => true,
            ColorPredicate::NotNearWhite { max_sum } | ColorPredicate::Dark { max_sum } => {
                sum < max_sum
            }
        }
    }
}

impl Default for ColorPredicate {
    fn default() -> Self {
        Self::not_near_white()
    }
}

/// Which pixels become particles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisibilityPolicy {
    /// Pixels need alpha strictly above this value.
    pub alpha_threshold: u8,
    pub color: ColorPredicate,
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self {
            alpha_threshold: 128,
            color: ColorPredicate::default(),
        }
    }
}

impl VisibilityPolicy {
    #[inline]
    pub fn accepts(&self, pixel: &Rgba<u8>) -> bool {
        let [r, g, b, a] = pixel.0;
        a > self.alpha_threshold && self.color.accepts(r, g, b)
    }
}

/// Resampling filter used when rasterizing to the working width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeFilter {
    Nearest,
    #[default]
    Bilinear,
}

impl From<ResizeFilter> for FilterType {
    fn from(f: ResizeFilter) -> Self {
        match f {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
        }
    }
}

/// Settings for the image scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointCloudConfig {
    /// Source image.
    pub path: PathBuf,
    /// Raster width in pixels; height follows the aspect ratio.
    pub working_width: u32,
    pub filter: ResizeFilter,
    pub visibility: VisibilityPolicy,
    /// Half-width of the cube initial positions are drawn from.
    pub dispersion: f32,
    pub seed: Option<u64>,
}

impl Default for PointCloudConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("assets/silhouette.png"),
            working_width: 200,
            filter: ResizeFilter::default(),
            visibility: VisibilityPolicy::default(),
            dispersion: 800.0,
            seed: None,
        }
    }
}

impl PointCloudConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.working_width == 0 {
            return Err(ConfigError::invalid(
                "image.working_width",
                "must be greater than 0",
            ));
        }
        if !(self.dispersion > 0.0) {
            return Err(ConfigError::invalid(
                "image.dispersion",
                "must be greater than 0",
            ));
        }
        Ok(())
    }
}

/// Resize `image` to `width` pixels wide, preserving aspect ratio.
///
/// Images already at the working width are converted without resampling.
/// Fails when the scaled height exceeds [`MAX_RASTER_HEIGHT`].
pub fn rasterize(
    image: &DynamicImage,
    width: u32,
    filter: ResizeFilter,
) -> Result<RgbaImage, AssetError> {
    let (w, h) = (image.width(), image.height());
    if w == 0 || h == 0 {
        return Ok(image.to_rgba8());
    }
    let scaled = (h as f64 * width as f64 / w as f64).round().max(1.0);
    if scaled > MAX_RASTER_HEIGHT as f64 {
        return Err(AssetError::Dimensions {
            width: w,
            height: h,
        });
    }
    if w == width {
        return Ok(image.to_rgba8());
    }
    let height = scaled as u32;
    let raster = image::imageops::resize(&image.to_rgba8(), width, height, filter.into());
    Ok(raster)
}

/// World-space target for pixel `(x, y)` of a `width` x `height` raster.
#[inline]
pub fn target_for(x: u32, y: u32, width: u32, height: u32) -> Vec3 {
    let half_w = width as f32 / 2.0;
    let half_h = height as f32 / 2.0;
    Vec3::new((x as f32 - half_w) * 2.0, -(y as f32 - half_h) * 2.0, 0.0)
}

/// Number of pixels in `raster` that pass `policy`.
pub fn count_visible(raster: &RgbaImage, policy: &VisibilityPolicy) -> usize {
    raster.pixels().filter(|p| policy.accepts(p)).count()
}

/// Scan a raster row by row and emit one particle per visible pixel.
pub fn scan(
    raster: &RgbaImage,
    policy: &VisibilityPolicy,
    dispersion: f32,
    sampler: &mut Sampler,
) -> ParticleBuffer {
    let (width, height) = raster.dimensions();
    let mut points = Vec::new();

    for (x, y, pixel) in raster.enumerate_pixels() {
        if !policy.accepts(pixel) {
            continue;
        }
        let [r, g, b, _] = pixel.0;
        points.push(ParticlePoint {
            initial: sampler.random_in_cube(dispersion),
            target: target_for(x, y, width, height),
            color: Vec3::new(r as f32, g as f32, b as f32) / 255.0,
        });
    }

    ParticleBuffer::from_points(points, dispersion)
}

/// Rasterize and scan an already-decoded image.
pub fn from_image(
    image: &DynamicImage,
    config: &PointCloudConfig,
    sampler: &mut Sampler,
) -> Result<ParticleBuffer, AssetError> {
    let raster = rasterize(image, config.working_width, config.filter)?;
    let buffer = scan(&raster, &config.visibility, config.dispersion, sampler);
    Ok(buffer)
}

/// Decode the configured image and build its particle buffer.
pub fn load(
    config: &PointCloudConfig,
    sampler: &mut Sampler,
) -> Result<ParticleBuffer, AssetError> {
    let image = ImageReader::open(&config.path)?
        .with_guessed_format()?
        .decode()?;

    tracing::debug!(
        "Decoded {} ({}x{})",
        config.path.display(),
        image.width(),
        image.height()
    );

    let buffer = from_image(&image, config, sampler)?;
    if buffer.is_empty() {
        tracing::warn!(
            "No pixels of {} passed the visibility policy; point cloud is empty",
            config.path.display()
        );
    } else {
        tracing::info!(
            "Built point cloud with {} particles from {}",
            buffer.len(),
            config.path.display()
        );
    }
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alpha_must_exceed_threshold() {
        let policy = VisibilityPolicy {
            alpha_threshold: 50,
            color: ColorPredicate::Any,
        };
        assert!(!policy.accepts(&Rgba([0, 0, 0, 50])));
        assert!(policy.accepts(&Rgba([0, 0, 0, 51])));
    }

    #[test]
    fn test_not_near_white() {
        let p = ColorPredicate::not_near_white();
        assert!(!p.accepts(255, 255, 255));
        assert!(!p.accepts(240, 240, 240));
        assert!(p.accepts(200, 200, 200));
    }

    #[test]
    fn test_dark() {
        let p = ColorPredicate::dark();
        assert!(p.accepts(0, 0, 0));
        assert!(p.accepts(120, 120, 120));
        assert!(!p.accepts(127, 127, 127));
    }

    #[test]
    fn test_target_centering() {
        assert_eq!(target_for(5, 5, 10, 10), Vec3::ZERO);
        assert_eq!(target_for(0, 0, 10, 10), Vec3::new(-10.0, 10.0, 0.0));
        assert_eq!(target_for(9, 0, 10, 10), Vec3::new(8.0, 10.0, 0.0));
    }

    #[test]
    fn test_rasterize_preserves_aspect() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(400, 100));
        let raster = rasterize(&img, 200, ResizeFilter::Nearest).unwrap();
        assert_eq!(raster.dimensions(), (200, 50));
    }

    #[test]
    fn test_rasterize_rejects_extreme_aspect() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(1, 5_000));
        assert!(matches!(
            rasterize(&img, 200, ResizeFilter::Nearest),
            Err(AssetError::Dimensions {
                width: 1,
                height: 5_000
            })
        ));

        let tall = DynamicImage::ImageRgba8(RgbaImage::new(200, MAX_RASTER_HEIGHT + 1));
        assert!(rasterize(&tall, 200, ResizeFilter::Nearest).is_err());

        let edge = DynamicImage::ImageRgba8(RgbaImage::new(10, 10 * MAX_RASTER_HEIGHT / 200));
        assert!(rasterize(&edge, 200, ResizeFilter::Nearest).is_ok());
    }

    #[test]
    fn test_rasterize_keeps_working_width_images() {
        let img = DynamicImage::ImageRgba8(RgbaImage::new(200, 37));
        let raster = rasterize(&img, 200, ResizeFilter::Bilinear).unwrap();
        assert_eq!(raster.dimensions(), (200, 37));
    }

    #[test]
    fn test_scan_skips_transparent() {
        let mut raster = RgbaImage::new(4, 4);
        raster.put_pixel(1, 2, Rgba([10, 10, 10, 255]));
        let mut sampler = Sampler::new(Some(9));
        let buf = scan(&raster, &VisibilityPolicy::default(), 100.0, &mut sampler);
        assert_eq!(buf.len(), 1);
        assert_eq!(buf.target()[0], target_for(1, 2, 4, 4));
        assert!(buf.initial()[0].abs().max_element() <= 100.0);
    }

    #[test]
    fn test_config_validation() {
        let mut config = PointCloudConfig::default();
        assert!(config.validate().is_ok());
        config.working_width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_predicate_toml_shape() {
        let policy: VisibilityPolicy =
            toml::from_str("alpha_threshold = 50\ncolor = { kind = \"dark\", max_sum = 380 }\n")
                .unwrap();
        assert_eq!(policy.alpha_threshold, 50);
        assert_eq!(policy.color, ColorPredicate::dark());
    }
}
