use image::{imageops::FilterType, DynamicImage};
use meatme_core::ImageTensor;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to decode image: {0}")]
	Decode(#[from] image::ImageError),
}

/// Decode raw upload bytes, guessing the format from the content.
///
/// # Errors
///
/// Returns an error if the bytes are not an image in a supported format.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage, Error> {
	Ok(image::load_from_memory(bytes)?)
}

/// Resize to `size`x`size` (ignoring aspect ratio), convert to RGB and scale every channel into `[0, 1]`.
#[must_use]
pub fn to_tensor(image: &DynamicImage, size: u32) -> ImageTensor {
	let resized = image
		.resize_exact(size, size, FilterType::CatmullRom)
		.into_rgb8();

	let data = resized
		.into_raw()
		.into_iter()
		.map(|value| f32::from(value) / 255.0)
		.collect();

	ImageTensor::new(size as usize, size as usize, 3, data)
}

/// Decode and preprocess in one go.
///
/// # Errors
///
/// Returns an error if the bytes cannot be decoded.
pub fn prepare(bytes: &[u8], size: u32) -> Result<ImageTensor, Error> {
	let image = decode(bytes)?;
	tracing::trace!(
		"Decoded {}x{} {:?} image",
		image.width(),
		image.height(),
		image.color()
	);

	Ok(to_tensor(&image, size))
}

#[cfg(test)]
pub mod tests {
	use super::*;
	use image::{GrayImage, ImageOutputFormat, Luma, Rgb, RgbImage, Rgba, RgbaImage};
	use std::io::Cursor;

	pub fn encode(image: DynamicImage, format: ImageOutputFormat) -> Vec<u8> {
		let mut bytes = Cursor::new(Vec::new());
		image.write_to(&mut bytes, format).unwrap();

		bytes.into_inner()
	}

	pub fn png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
		encode(
			DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(color))),
			ImageOutputFormat::Png,
		)
	}

	fn assert_within_unit_range(tensor: &ImageTensor) {
		assert!(tensor
			.as_slice()
			.iter()
			.all(|value| (0.0..=1.0).contains(value)));
	}

	#[test]
	fn output_shape_is_fixed_regardless_of_input_size() {
		for (width, height) in [(1, 1), (150, 150), (640, 480), (20, 900)] {
			let tensor = prepare(&png(width, height, [10, 20, 30]), 150).unwrap();

			assert_eq!(tensor.shape(), [1, 150, 150, 3]);
			assert_eq!(tensor.as_slice().len(), 150 * 150 * 3);
			assert_within_unit_range(&tensor);
		}
	}

	#[test]
	fn channel_values_are_scaled_into_unit_range() {
		let tensor = prepare(&png(64, 32, [255, 0, 51]), 150).unwrap();
		let pixel = &tensor.as_slice()[..3];

		assert!((pixel[0] - 1.0).abs() < 1e-6);
		assert!(pixel[1].abs() < 1e-6);
		assert!((pixel[2] - 0.2).abs() < 1e-6);
	}

	#[test]
	fn alpha_and_grayscale_are_converted_to_rgb() {
		let rgba = encode(
			DynamicImage::ImageRgba8(RgbaImage::from_pixel(30, 40, Rgba([255, 255, 255, 0]))),
			ImageOutputFormat::Png,
		);
		let gray = encode(
			DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 10, Luma([0]))),
			ImageOutputFormat::Png,
		);

		let rgba = prepare(&rgba, 150).unwrap();
		let gray = prepare(&gray, 150).unwrap();

		assert_eq!(rgba.shape(), [1, 150, 150, 3]);
		assert_eq!(gray.shape(), [1, 150, 150, 3]);
		assert!(gray.as_slice().iter().all(|value| *value == 0.0));
	}

	#[test]
	fn decodes_jpeg() {
		let jpeg = encode(
			DynamicImage::ImageRgb8(RgbImage::from_pixel(50, 50, Rgb([120, 60, 30]))),
			ImageOutputFormat::Jpeg(90),
		);

		let tensor = prepare(&jpeg, 150).unwrap();

		assert_eq!(tensor.shape(), [1, 150, 150, 3]);
		assert_within_unit_range(&tensor);
	}

	#[test]
	fn honours_configured_size() {
		let tensor = prepare(&png(10, 10, [0, 0, 0]), 224).unwrap();

		assert_eq!(tensor.shape(), [1, 224, 224, 3]);
	}

	#[test]
	fn same_bytes_give_same_tensor() {
		let bytes = png(123, 77, [90, 180, 45]);

		assert_eq!(prepare(&bytes, 150).unwrap(), prepare(&bytes, 150).unwrap());
	}

	#[test]
	fn rejects_bytes_that_are_not_an_image() {
		let error = prepare(b"definitely not an image", 150).unwrap_err();

		assert!(matches!(error, Error::Decode(_)));
	}

	#[test]
	fn rejects_truncated_image() {
		let bytes = png(100, 100, [1, 2, 3]);

		assert!(prepare(&bytes[..bytes.len() / 2], 150).is_err());
	}
}
