use image::{Rgb, RgbImage, RgbaImage};

/// Flatten the filtered RGBA frame over black for the 2D pixel view
pub fn compose_2d(frame: &RgbaImage) -> RgbImage {
    let (width, height) = frame.dimensions();
    RgbImage::from_fn(width, height, |x, y| {
        let pixel = frame.get_pixel(x, y);
        let alpha = pixel[3] as u16;
        let over_black = |c: u8| ((c as u16 * alpha + 127) / 255) as u8;
        Rgb([over_black(pixel[0]), over_black(pixel[1]), over_black(pixel[2])])
    })
}
