// Display colors for the eyes renderer.
// The Linux framebuffer used here is 32bpp with BGRA byte order in memory.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bgra {
    pub b: u8,
    pub g: u8,
    pub r: u8,
    pub a: u8,
}

impl Bgra {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { b, g, r, a: 255 }
    }

    // Byte order as written to the framebuffer
    pub const fn to_bytes(self) -> [u8; 4] {
        [self.b, self.g, self.r, self.a]
    }

    pub const fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            b: bytes[0],
            g: bytes[1],
            r: bytes[2],
            a: bytes[3],
        }
    }

    pub const BLACK: Bgra = Bgra::rgb(0, 0, 0);
    pub const WHITE: Bgra = Bgra::rgb(255, 255, 255);
}

// Monochrome scheme: background and eyelid overlays vs. eye drawings
pub const BGCOLOR: Bgra = Bgra::BLACK;
pub const FGCOLOR: Bgra = Bgra::WHITE;
