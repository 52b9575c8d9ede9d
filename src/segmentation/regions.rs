use image::GrayImage;
use imageproc::contours::{find_contours, BorderType};
use imageproc::point::Point;
use serde::Serialize;

/// Axis-aligned bounding box over an image, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box enclosing all points (inclusive pixel coordinates)
    pub fn bounding(points: &[Point<u32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
    }

    /// Whether the box is large enough to plausibly hold text
    pub fn is_text_sized(&self, min_width: u32, min_height: u32) -> bool {
        self.width > min_width && self.height > min_height
    }

    /// Clamp the box to an image of the given size.
    /// Returns `None` when nothing of the box remains inside the image.
    pub fn clamp_to(&self, image_width: u32, image_height: u32) -> Option<Self> {
        if self.x >= image_width || self.y >= image_height {
            return None;
        }
        let width = self.width.min(image_width - self.x);
        let height = self.height.min(image_height - self.y);
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self::new(self.x, self.y, width, height))
    }
}

/// Order in which regions are handed to text recognition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum RegionOrder {
    /// Contour discovery order of the segmentation mask
    #[default]
    Discovery,
    /// Top-to-bottom, then left-to-right
    Reading,
}

impl RegionOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Reading => "reading",
        }
    }

    pub fn apply(&self, regions: &mut [Region]) {
        if *self == Self::Reading {
            // Stable sort keeps discovery order for boxes sharing a corner
            regions.sort_by_key(|r| (r.y, r.x));
        }
    }
}

/// Bounding boxes of the outermost contours of a binary mask, in discovery order.
/// Holes and contours nested inside holes are skipped.
pub fn external_boxes(mask: &GrayImage) -> Vec<Region> {
    find_contours::<u32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .filter_map(|c| Region::bounding(&c.points))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn fill(mask: &mut GrayImage, region: Region) {
        for y in region.y..region.y + region.height {
            for x in region.x..region.x + region.width {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    #[test]
    fn test_bounding_box_is_inclusive() {
        let points = vec![Point::new(3, 4), Point::new(10, 4), Point::new(10, 9)];
        assert_eq!(Region::bounding(&points), Some(Region::new(3, 4, 8, 6)));
        assert_eq!(Region::bounding(&[]), None);
    }

    #[test]
    fn test_text_sized_is_strict() {
        assert!(Region::new(0, 0, 51, 21).is_text_sized(50, 20));
        assert!(!Region::new(0, 0, 50, 40).is_text_sized(50, 20));
        assert!(!Region::new(0, 0, 80, 20).is_text_sized(50, 20));
    }

    #[test]
    fn test_clamp_to_image() {
        let region = Region::new(90, 40, 30, 30);
        assert_eq!(region.clamp_to(100, 50), Some(Region::new(90, 40, 10, 10)));
        assert_eq!(region.clamp_to(90, 50), None);
    }

    #[test]
    fn test_external_boxes_skip_holes() {
        let mut mask = GrayImage::new(100, 60);
        fill(&mut mask, Region::new(10, 10, 40, 30));
        // Punch a hole and put a blob inside it
        for y in 15..35 {
            for x in 15..45 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        fill(&mut mask, Region::new(25, 22, 5, 5));
        fill(&mut mask, Region::new(70, 5, 20, 10));

        let boxes = external_boxes(&mask);

        assert_eq!(boxes.len(), 2);
        assert!(boxes.contains(&Region::new(10, 10, 40, 30)));
        assert!(boxes.contains(&Region::new(70, 5, 20, 10)));
    }

    #[test]
    fn test_order_names_match_cli_values() {
        use clap::ValueEnum;
        for order in RegionOrder::value_variants() {
            let value = order.to_possible_value().unwrap();
            assert_eq!(value.get_name(), order.as_str());
        }
    }

    #[test]
    fn test_reading_order_sorts_top_then_left() {
        let mut regions = vec![
            Region::new(200, 100, 60, 30),
            Region::new(10, 100, 60, 30),
            Region::new(300, 5, 60, 30),
        ];

        RegionOrder::Discovery.apply(&mut regions);
        assert_eq!(regions[0], Region::new(200, 100, 60, 30));

        RegionOrder::Reading.apply(&mut regions);
        assert_eq!(
            regions,
            vec![
                Region::new(300, 5, 60, 30),
                Region::new(10, 100, 60, 30),
                Region::new(200, 100, 60, 30),
            ]
        );
    }
}
