use serde::{Deserialize, Serialize};

use crate::geometry::{CropRect, ImageSize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Unconstrained; the default selection is the whole image.
    #[default]
    #[serde(rename = "original")]
    Original,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "3:4")]
    R3_4,
    #[serde(rename = "4:3")]
    R4_3,
    #[serde(rename = "16:9")]
    R16_9,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Original,
        AspectRatio::Square,
        AspectRatio::R3_4,
        AspectRatio::R4_3,
        AspectRatio::R16_9,
    ];

    /// Width over height, or `None` when resizing is unconstrained.
    pub fn ratio(self) -> Option<f32> {
        match self {
            AspectRatio::Original => None,
            AspectRatio::Square => Some(1.0),
            AspectRatio::R3_4 => Some(3.0 / 4.0),
            AspectRatio::R4_3 => Some(4.0 / 3.0),
            AspectRatio::R16_9 => Some(16.0 / 9.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Original => "original",
            AspectRatio::Square => "1:1",
            AspectRatio::R3_4 => "3:4",
            AspectRatio::R4_3 => "4:3",
            AspectRatio::R16_9 => "16:9",
        }
    }

    /// Largest rectangle with this ratio, centered on the image.
    pub fn centered_rect(self, image: ImageSize) -> CropRect {
        let (mut width, mut height) = (image.w(), image.h());
        if let Some(target) = self.ratio() {
            if image.ratio() > target {
                width = height * target;
            } else {
                height = width / target;
            }
        }
        CropRect::new(
            (image.w() - width) / 2.0,
            (image.h() - height) / 2.0,
            width,
            height,
        )
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AspectRatio::ALL
            .into_iter()
            .find(|r| r.label() == wanted)
            .ok_or_else(|| {
                format!("invalid aspect ratio '{s}'; expected original, 1:1, 3:4, 4:3 or 16:9")
            })
    }
}
