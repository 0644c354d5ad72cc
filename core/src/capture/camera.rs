use image::RgbImage;

use super::source::VideoSource;
use crate::prelude::{ConsoleError, ConsoleResult};

#[cfg(all(target_os = "linux", feature = "camera"))]
use self::v4l_backend::{open, OpenCamera};
#[cfg(not(all(target_os = "linux", feature = "camera")))]
use self::unsupported::{open, OpenCamera};

/// Live capture device by index (`/dev/video<index>` on Linux).
pub struct CameraSource {
    index: usize,
    width: u32,
    height: u32,
    camera: Option<OpenCamera>,
}

impl CameraSource {
    /// `width`/`height` are requested from the driver, which may pick the
    /// nearest mode it supports.
    pub fn new(index: usize, width: u32, height: u32) -> Self {
        Self {
            index,
            width,
            height,
            camera: None,
        }
    }
}

impl VideoSource for CameraSource {
    fn name(&self) -> String {
        format!("camera:{}", self.index)
    }

    fn acquire(&mut self) -> ConsoleResult<()> {
        self.release();
        self.camera = Some(open(self.index, self.width, self.height)?);
        Ok(())
    }

    fn current_frame(&mut self) -> ConsoleResult<RgbImage> {
        self.camera
            .as_mut()
            .ok_or_else(|| ConsoleError::DeviceUnavailable("camera not acquired".into()))?
            .grab()
    }

    /// Dropping the stream turns capture off on the device.
    fn release(&mut self) {
        self.camera = None;
    }

    fn is_acquired(&self) -> bool {
        self.camera.is_some()
    }
}

/// Converts packed YUYV 4:2:2 (BT.601) into RGB.
pub fn yuyv_to_rgb(bytes: &[u8], width: u32, height: u32) -> ConsoleResult<RgbImage> {
    let pixels = width as usize * height as usize;
    let needed = pixels * 2;
    if bytes.len() < needed {
        return Err(ConsoleError::DeviceUnavailable(format!(
            "short YUYV frame: {} of {needed} bytes",
            bytes.len()
        )));
    }

    let mut rgb = Vec::with_capacity(pixels * 3);
    for quad in bytes[..needed].chunks_exact(4) {
        let u = quad[1] as f32 - 128.0;
        let v = quad[3] as f32 - 128.0;
        for luma in [quad[0] as f32, quad[2] as f32] {
            rgb.push((luma + 1.402 * v).round().clamp(0.0, 255.0) as u8);
            rgb.push((luma - 0.344_136 * u - 0.714_136 * v).round().clamp(0.0, 255.0) as u8);
            rgb.push((luma + 1.772 * u).round().clamp(0.0, 255.0) as u8);
        }
    }
    rgb.truncate(pixels * 3);
    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| ConsoleError::DeviceUnavailable("YUYV frame size mismatch".into()))
}

#[cfg(all(target_os = "linux", feature = "camera"))]
mod v4l_backend {
    use image::RgbImage;
    use v4l::buffer::Type;
    use v4l::io::mmap::Stream;
    use v4l::io::traits::CaptureStream;
    use v4l::video::Capture;
    use v4l::{Device, FourCC};

    use super::yuyv_to_rgb;
    use crate::prelude::{ConsoleError, ConsoleResult};

    const BUFFERS: u32 = 4;

    pub struct OpenCamera {
        stream: Stream<'static>,
        _device: Device,
        width: u32,
        height: u32,
        fourcc: FourCC,
    }

    pub fn open(index: usize, width: u32, height: u32) -> ConsoleResult<OpenCamera> {
        let unavailable =
            |err: std::io::Error| ConsoleError::DeviceUnavailable(format!("/dev/video{index}: {err}"));
        let device = Device::new(index).map_err(unavailable)?;
        let mut format = device.format().map_err(unavailable)?;
        format.width = width;
        format.height = height;
        format.fourcc = FourCC::new(b"MJPG");
        let format = device.set_format(&format).map_err(unavailable)?;
        let stream =
            Stream::with_buffers(&device, Type::VideoCapture, BUFFERS).map_err(unavailable)?;
        Ok(OpenCamera {
            stream,
            _device: device,
            width: format.width,
            height: format.height,
            fourcc: format.fourcc,
        })
    }

    impl OpenCamera {
        pub fn grab(&mut self) -> ConsoleResult<RgbImage> {
            let (data, meta) = self
                .stream
                .next()
                .map_err(|e| ConsoleError::DeviceUnavailable(format!("camera read: {e}")))?;
            let used = match meta.bytesused as usize {
                0 => data.len(),
                n => n.min(data.len()),
            };
            let bytes = &data[..used];
            match &self.fourcc.repr {
                b"MJPG" => image::load_from_memory(bytes)
                    .map(|frame| frame.to_rgb8())
                    .map_err(|e| ConsoleError::DeviceUnavailable(format!("camera frame: {e}"))),
                b"YUYV" => yuyv_to_rgb(bytes, self.width, self.height),
                other => Err(ConsoleError::DeviceUnavailable(format!(
                    "unsupported camera format {}",
                    String::from_utf8_lossy(other)
                ))),
            }
        }
    }
}

#[cfg(not(all(target_os = "linux", feature = "camera")))]
mod unsupported {
    use image::RgbImage;

    use crate::prelude::{ConsoleError, ConsoleResult};

    pub struct OpenCamera;

    pub fn open(index: usize, _width: u32, _height: u32) -> ConsoleResult<OpenCamera> {
        Err(ConsoleError::DeviceUnavailable(format!(
            "camera {index}: built without the `camera` feature"
        )))
    }

    impl OpenCamera {
        pub fn grab(&mut self) -> ConsoleResult<RgbImage> {
            Err(ConsoleError::DeviceUnavailable("camera not available".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn missing_device_is_unavailable() {
        let mut camera = CameraSource::new(250, 640, 480);
        assert!(matches!(
            camera.acquire(),
            Err(ConsoleError::DeviceUnavailable(_))
        ));
        assert!(!camera.is_acquired());
        assert!(matches!(
            camera.current_frame(),
            Err(ConsoleError::DeviceUnavailable(_))
        ));
        camera.release();
        assert_eq!(camera.name(), "camera:250");
    }

    #[test]
    fn yuyv_grey_and_colour_convert() {
        // Two pixels of mid grey, then two of pure-ish red.
        let bytes = [128, 128, 128, 128, 76, 85, 76, 255];
        let rgb = yuyv_to_rgb(&bytes, 2, 2).unwrap();
        assert_eq!(*rgb.get_pixel(0, 0), Rgb([128, 128, 128]));
        assert_eq!(*rgb.get_pixel(1, 0), Rgb([128, 128, 128]));
        let red = rgb.get_pixel(0, 1);
        assert!(red[0] > 240 && red[1] < 10 && red[2] < 10, "{red:?}");
    }

    #[test]
    fn short_yuyv_frame_is_rejected() {
        assert!(yuyv_to_rgb(&[0; 6], 2, 2).is_err());
    }
}
