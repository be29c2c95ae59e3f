//! Gencam-capture binary for smoke-testing the acquisition pipeline.
//!
//! Runs the full connect/configure/stream/decode cycle against the mock
//! transport, so the pipeline can be exercised without hardware. Pass a
//! serial as the first argument to test device resolution (the mock
//! device answers to serial 0 or its own).

use gencam_capture::mock::{self, MockTransport};
use gencam_capture::{Camera, CameraConfig, ImageBuffer, LEVEL_RECONFIGURE_STOP};
use tracing::info;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> gencam_capture::Result<()> {
    let serial = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(0);

    let transport = MockTransport::new()
        .with_frame(mock::frame(1280, 720, 1280, 8))
        .with_frame(mock::frame(1280, 720, 1280, 8))
        .with_frame(mock::frame(1280, 720, 1280, 8));

    let camera = Camera::new(transport, serial);
    camera.connect()?;
    camera.set_new_configuration(&CameraConfig::default(), LEVEL_RECONFIGURE_STOP)?;
    camera.start()?;

    let mut image = ImageBuffer::new();
    for _ in 0..3 {
        camera.grab_frame("camera", &mut image)?;
        info!(
            width = image.width,
            height = image.height,
            stride = image.stride,
            encoding = %image.encoding,
            secs = image.stamp.secs,
            nanos = image.stamp.nanos,
            "grabbed frame"
        );
    }

    camera.stop()?;
    camera.disconnect()
}
