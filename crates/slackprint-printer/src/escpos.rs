//! ESC/POS command encoding.

use image::{DynamicImage, GrayImage, Luma};

const ESC: u8 = 0x1b;
const GS: u8 = 0x1d;

/// Rows per `GS v 0` command. Many printers reject taller raster blocks.
const RASTER_BAND_ROWS: u32 = 256;

/// `ESC @`: reset the printer to its power-on state.
pub fn init() -> Vec<u8> {
    vec![ESC, b'@']
}

/// `ESC d n`: print the buffer and feed `lines` lines.
pub fn feed(lines: u8) -> Vec<u8> {
    vec![ESC, b'd', lines]
}

/// `GS V 66 0`: feed to the cutter and cut.
pub fn cut() -> Vec<u8> {
    vec![GS, b'V', 66, 0]
}

/// Characters 0x80 to 0xFF of code page 437, the page `ESC @` selects.
const CP437_HIGH: &str = "ÇüéâäàåçêëèïîìÄÅ\
                          ÉæÆôöòûùÿÖÜ¢£¥₧ƒ\
                          áíóúñÑªº¿⌐¬½¼¡«»\
                          ░▒▓│┤╡╢╖╕╣║╗╝╜╛┐\
                          └┴┬├─┼╞╟╚╔╩╦╠═╬╧\
                          ╨╤╥╙╘╒╓╫╪┘┌█▄▌▐▀\
                          αßΓπΣσµτΦΘΩδ∞φε∩\
                          ≡±≥≤⌠⌡÷≈°∙·√ⁿ²■\u{a0}";

/// Encode text for code page 437.
///
/// Printable ASCII, newline and tab pass through, characters the code page
/// has are mapped to it, and everything else becomes `?`.
pub fn encode_text(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\n' | '\t' => c as u8,
            c if c.is_ascii() && !c.is_ascii_control() => c as u8,
            c => cp437_byte(c).unwrap_or(b'?'),
        })
        .collect()
}

fn cp437_byte(c: char) -> Option<u8> {
    CP437_HIGH
        .chars()
        .position(|high| high == c)
        .map(|index| 0x80 + index as u8)
}

/// Convert to a dithered 1-bit image, compositing transparency onto white.
pub fn to_monochrome(image: &DynamicImage) -> GrayImage {
    let rgba = image.to_rgba8();
    let mut gray = GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let luma = (299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b)) / 1000;
        let alpha = u32::from(a);
        Luma([((luma * alpha + 255 * (255 - alpha)) / 255) as u8])
    });
    image::imageops::dither(&mut gray, &image::imageops::BiLevel);
    gray
}

/// Encode an image as `GS v 0` raster bit-image commands, one per band.
pub fn raster_image(image: &DynamicImage) -> Vec<u8> {
    let mono = to_monochrome(image);
    let (width, height) = mono.dimensions();
    let width_bytes = width.div_ceil(8);

    let mut out = Vec::with_capacity((8 * (height / RASTER_BAND_ROWS + 1) + width_bytes * height) as usize);
    let mut top = 0;
    while top < height {
        let rows = RASTER_BAND_ROWS.min(height - top);
        out.extend_from_slice(&[
            GS,
            b'v',
            b'0',
            0,
            (width_bytes & 0xff) as u8,
            (width_bytes >> 8) as u8,
            (rows & 0xff) as u8,
            (rows >> 8) as u8,
        ]);
        for y in top..top + rows {
            for byte_index in 0..width_bytes {
                let mut byte = 0u8;
                for bit in 0..8 {
                    let x = byte_index * 8 + bit;
                    // Dark pixels are printed dots.
                    if x < width && mono.get_pixel(x, y)[0] < 128 {
                        byte |= 0x80 >> bit;
                    }
                }
                out.push(byte);
            }
        }
        top += rows;
    }
    out
}
