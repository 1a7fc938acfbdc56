//! Named colours used by the room and the boxes.

/// Opaque RGB colour as stored in mesh vertices; alpha is set per use.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Vertex colour with `specular` (0..=1) packed into alpha.
    pub fn with_specular(self, specular: f32) -> [u8; 4] {
        let a = (specular.clamp(0.0, 1.0) * 255.0).round() as u8;
        [self.0, self.1, self.2, a]
    }
}

pub const RED: Rgb = Rgb(255, 0, 0);

/// Colours a box can be painted with.
pub const BOX_COLORS: [Rgb; 24] = [
    Rgb(0, 128, 0),     // green
    Rgb(255, 255, 0),   // yellow
    Rgb(0, 0, 255),     // blue
    Rgb(255, 165, 0),   // orange
    Rgb(93, 138, 168),  // air force blue
    Rgb(0, 100, 0),     // dark green
    Rgb(128, 0, 128),   // purple
    Rgb(72, 61, 139),   // dark slate blue
    Rgb(240, 248, 255), // alice blue
    Rgb(255, 215, 0),   // gold
    Rgb(224, 17, 95),   // ruby
    Rgb(128, 0, 0),     // maroon
    Rgb(255, 0, 255),   // fuchsia
    Rgb(222, 165, 164), // pastel pink
    Rgb(128, 128, 128), // gray
    Rgb(255, 255, 255), // white
    Rgb(164, 198, 57),  // android green
    Rgb(165, 42, 42),   // brown
    Rgb(255, 255, 224), // light yellow
    Rgb(143, 188, 143), // dark sea green
    Rgb(0, 255, 255),   // cyan
    Rgb(0, 128, 128),   // teal
    Rgb(114, 47, 55),   // wine
    Rgb(119, 136, 153), // light slate gray
];
