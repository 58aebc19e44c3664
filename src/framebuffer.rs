// Framebuffer surfaces
// The eyes engine draws through the Surface trait; LinuxFramebuffer backs it
// with a memory-mapped /dev/fb0 and a shadow buffer that present() pushes to
// the device in one copy.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::io::AsRawFd;
use std::ptr;

use crate::color::Bgra;

pub const BYTES_PER_PIXEL: usize = 4; // BGRA

/// Primitive drawing operations the eyes engine renders through.
///
/// All coordinates are in pixels; every operation clips to the surface
/// bounds. `present` pushes the logical buffer to the physical device and is
/// only ever invoked by the host (through the render-complete callback),
/// never by the engine itself.
pub trait Surface {
    fn width(&self) -> i32;
    fn height(&self) -> i32;
    fn fill(&mut self, color: Bgra);
    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Bgra);
    fn pixel(&mut self, x: i32, y: i32, color: Bgra);
    fn hline(&mut self, x: i32, y: i32, len: i32, color: Bgra);
    fn vline(&mut self, x: i32, y: i32, len: i32, color: Bgra);
    fn present(&mut self) -> io::Result<()>;
}

// Shared clipped raster ops over a BGRA byte buffer
struct Raster {
    width: i32,
    height: i32,
    data: Vec<u8>,
}

impl Raster {
    fn new(width: i32, height: i32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    fn fill(&mut self, color: Bgra) {
        let bytes = color.to_bytes();
        for px in self.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&bytes);
        }
    }

    fn pixel(&mut self, x: i32, y: i32, color: Bgra) {
        if x < 0 || x >= self.width || y < 0 || y >= self.height {
            return;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&color.to_bytes());
    }

    fn hline(&mut self, x: i32, y: i32, len: i32, color: Bgra) {
        if y < 0 || y >= self.height || len <= 0 {
            return;
        }
        let x0 = x.max(0);
        let x1 = (x + len).min(self.width);
        if x0 >= x1 {
            return;
        }
        let bytes = color.to_bytes();
        let row = y as usize * self.width as usize;
        for px in x0..x1 {
            let i = (row + px as usize) * BYTES_PER_PIXEL;
            self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&bytes);
        }
    }

    fn vline(&mut self, x: i32, y: i32, len: i32, color: Bgra) {
        if x < 0 || x >= self.width || len <= 0 {
            return;
        }
        let y0 = y.max(0);
        let y1 = (y + len).min(self.height);
        let bytes = color.to_bytes();
        for py in y0..y1 {
            let i = (py as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
            self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&bytes);
        }
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Bgra) {
        if w <= 0 || h <= 0 {
            return;
        }
        let y0 = y.max(0);
        let y1 = (y + h).min(self.height);
        for py in y0..y1 {
            self.hline(x, py, w, color);
        }
    }

    #[cfg(test)]
    fn get(&self, x: i32, y: i32) -> Bgra {
        assert!(x >= 0 && x < self.width && y >= 0 && y < self.height);
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        Bgra::from_bytes([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }
}

/// Drawing surface backed by a memory-mapped Linux framebuffer device.
pub struct LinuxFramebuffer {
    raster: Raster,
    _file: File,
    map: *mut u8,
    map_len: usize,
}

impl LinuxFramebuffer {
    pub fn open(path: &str, width: i32, height: i32) -> io::Result<Self> {
        if width <= 0 || height <= 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "screen size must be positive",
            ));
        }
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let map_len = width as usize * height as usize * BYTES_PER_PIXEL;
        // Safety: mapping a freshly opened fd for map_len bytes; the mapping
        // is released in Drop and the pointer never outlives self.
        let map = unsafe {
            libc::mmap(
                ptr::null_mut(),
                map_len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if map == libc::MAP_FAILED {
            return Err(io::Error::last_os_error());
        }
        Ok(Self {
            raster: Raster::new(width, height),
            _file: file,
            map: map as *mut u8,
            map_len,
        })
    }
}

impl Surface for LinuxFramebuffer {
    fn width(&self) -> i32 {
        self.raster.width
    }

    fn height(&self) -> i32 {
        self.raster.height
    }

    fn fill(&mut self, color: Bgra) {
        self.raster.fill(color);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Bgra) {
        self.raster.fill_rect(x, y, w, h, color);
    }

    fn pixel(&mut self, x: i32, y: i32, color: Bgra) {
        self.raster.pixel(x, y, color);
    }

    fn hline(&mut self, x: i32, y: i32, len: i32, color: Bgra) {
        self.raster.hline(x, y, len, color);
    }

    fn vline(&mut self, x: i32, y: i32, len: i32, color: Bgra) {
        self.raster.vline(x, y, len, color);
    }

    fn present(&mut self) -> io::Result<()> {
        // Safety: map covers map_len bytes, which equals the shadow length.
        unsafe {
            ptr::copy_nonoverlapping(self.raster.data.as_ptr(), self.map, self.map_len);
        }
        Ok(())
    }
}

impl Drop for LinuxFramebuffer {
    fn drop(&mut self) {
        // Safety: map/map_len came from a successful mmap in open().
        unsafe {
            libc::munmap(self.map as *mut libc::c_void, self.map_len);
        }
    }
}

// In-memory surface for exercising the engine and gfx helpers off-device.
#[cfg(test)]
pub(crate) struct MemorySurface {
    raster: Raster,
    pub(crate) presented: u32,
}

#[cfg(test)]
impl MemorySurface {
    pub(crate) fn new(width: i32, height: i32) -> Self {
        Self {
            raster: Raster::new(width, height),
            presented: 0,
        }
    }

    pub(crate) fn get(&self, x: i32, y: i32) -> Bgra {
        self.raster.get(x, y)
    }
}

#[cfg(test)]
impl Surface for MemorySurface {
    fn width(&self) -> i32 {
        self.raster.width
    }

    fn height(&self) -> i32 {
        self.raster.height
    }

    fn fill(&mut self, color: Bgra) {
        self.raster.fill(color);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: Bgra) {
        self.raster.fill_rect(x, y, w, h, color);
    }

    fn pixel(&mut self, x: i32, y: i32, color: Bgra) {
        self.raster.pixel(x, y, color);
    }

    fn hline(&mut self, x: i32, y: i32, len: i32, color: Bgra) {
        self.raster.hline(x, y, len, color);
    }

    fn vline(&mut self, x: i32, y: i32, len: i32, color: Bgra) {
        self.raster.vline(x, y, len, color);
    }

    fn present(&mut self) -> io::Result<()> {
        self.presented += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::{BGCOLOR, FGCOLOR};

    #[test]
    fn fill_covers_every_pixel() {
        let mut s = MemorySurface::new(4, 3);
        s.fill(FGCOLOR);
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(s.get(x, y), FGCOLOR);
            }
        }
    }

    #[test]
    fn rect_clips_to_bounds() {
        let mut s = MemorySurface::new(10, 10);
        s.fill(BGCOLOR);
        s.fill_rect(-5, -5, 8, 8, FGCOLOR);
        assert_eq!(s.get(0, 0), FGCOLOR);
        assert_eq!(s.get(2, 2), FGCOLOR);
        assert_eq!(s.get(3, 3), BGCOLOR);
        // Entirely off-screen draws are a no-op
        s.fill_rect(20, 20, 5, 5, FGCOLOR);
        s.pixel(-1, -1, FGCOLOR);
    }

    #[test]
    fn lines_clip_to_bounds() {
        let mut s = MemorySurface::new(10, 10);
        s.fill(BGCOLOR);
        s.hline(8, 4, 10, FGCOLOR);
        assert_eq!(s.get(8, 4), FGCOLOR);
        assert_eq!(s.get(9, 4), FGCOLOR);
        assert_eq!(s.get(7, 4), BGCOLOR);
        s.vline(4, -3, 5, FGCOLOR);
        assert_eq!(s.get(4, 0), FGCOLOR);
        assert_eq!(s.get(4, 1), FGCOLOR);
        assert_eq!(s.get(4, 2), BGCOLOR);
    }

    #[test]
    fn negative_length_is_a_noop() {
        let mut s = MemorySurface::new(4, 4);
        s.fill(BGCOLOR);
        s.hline(0, 0, -1, FGCOLOR);
        s.vline(0, 0, 0, FGCOLOR);
        s.fill_rect(1, 1, -2, 3, FGCOLOR);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(s.get(x, y), BGCOLOR);
            }
        }
    }
}
