//! Light and dark presentation themes.

/// The two themes the page can toggle between.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

/// Top and bottom colour of the background, in linear RGBA.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Gradient {
    pub top: [f32; 4],
    pub bottom: [f32; 4],
}

impl Theme {
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark { Theme::Dark } else { Theme::Light }
    }

    pub fn is_dark(&self) -> bool {
        matches!(self, Theme::Dark)
    }

    pub fn background(&self) -> Gradient {
        match self {
            Theme::Light => Gradient {
                top: srgb_hex(0xa1d2e6),
                bottom: srgb_hex(0xf0f8ff),
            },
            Theme::Dark => Gradient {
                top: srgb_hex(0x0a0e27),
                bottom: srgb_hex(0x2d3748),
            },
        }
    }

    pub fn ambient_intensity(&self) -> f32 {
        match self {
            Theme::Light => 0.5,
            Theme::Dark => 0.05,
        }
    }

    pub fn fog_hex(&self) -> u32 {
        match self {
            Theme::Light => 0xcfd8dc,
            Theme::Dark => 0x0a0e27,
        }
    }

    pub fn fog_colour(&self) -> [f32; 4] {
        srgb_hex(self.fog_hex())
    }

    /// Intensity of the shadow-casting key light.
    pub fn key_light_intensity(&self) -> f32 {
        match self {
            Theme::Light => 2.5,
            Theme::Dark => 0.1,
        }
    }

    /// Intensity of every other directional light.
    pub fn fill_light_intensity(&self) -> f32 {
        match self {
            Theme::Light => 1.0,
            Theme::Dark => 0.0,
        }
    }

    /// Night props (bonfires and their lights) only show in the dark.
    pub fn shows_night_props(&self) -> bool {
        self.is_dark()
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Converts a `0xRRGGBB` sRGB colour into linear RGBA.
pub fn srgb_hex(hex: u32) -> [f32; 4] {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    [channel(16), channel(8), channel(0), 1.0]
}
