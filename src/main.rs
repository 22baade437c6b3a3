mod capture;
mod output;
mod particles;
mod points;
mod render;
mod segmentation;
mod session;

use anyhow::{Context, Result};
use capture::{CaptureSource, ImageSequenceCapture, WebcamCapture};
use clap::{ArgGroup, Parser};
use output::OutputSink;
use particles::{GridConfig, ParticleConfig};
use render::compose_2d;
use segmentation::{filter_black, MaskCompositor, Preprocessor, SegmentationModel};
use session::{ParticleLayer, Session, SessionConfig};
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(
    ArgGroup::new("view_2d")
        .args(["output_2d_device", "output_2d_dir"])
        .multiple(true)
))]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Play a directory of image frames (looped) instead of the webcam
    #[arg(long)]
    input_dir: Option<String>,

    /// v4l2loopback device receiving the 3D view
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Write the 3D view as PNG frames into this directory instead
    #[arg(long)]
    output_dir: Option<String>,

    /// v4l2loopback device receiving the 2D pixel view
    #[arg(long)]
    output_2d_device: Option<String>,

    /// Write the 2D pixel view as PNG frames into this directory
    #[arg(long)]
    output_2d_dir: Option<String>,

    /// Working resolution width
    #[arg(long, default_value_t = 320)]
    width: u32,

    /// Working resolution height
    #[arg(long, default_value_t = 240)]
    height: u32,

    /// Target frames per second
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Path to segmentation model (ONNX file)
    /// If not provided, every pixel is treated as foreground
    #[arg(long)]
    model: Option<String>,

    /// Matte value at or above which a pixel counts as foreground
    #[arg(long, default_value_t = 0.6)]
    threshold: f32,

    /// Send the matte (grayscale silhouette) to the 2D view
    #[arg(long, requires = "view_2d")]
    show_matte: bool,

    /// Overlay the grid particle system on the 3D view
    #[arg(long)]
    particles: bool,

    /// Particle slots
    #[arg(long, default_value_t = 8000)]
    particle_capacity: usize,

    /// Particles spawned per second
    #[arg(long, default_value_t = 100.0)]
    birth_rate: f32,

    /// Mean particle lifespan in seconds
    #[arg(long, default_value_t = 1.0)]
    life_expectancy: f32,

    /// Relative lifespan spread in [0, 1]
    #[arg(long, default_value_t = 0.0)]
    life_variance: f32,

    /// Colour particles by their grid cell
    #[arg(long)]
    particle_color: bool,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let particles = if self.particles {
            let pool = ParticleConfig {
                capacity: self.particle_capacity,
                birth_rate: self.birth_rate,
                life_expectancy: self.life_expectancy,
                life_variance: self.life_variance,
                use_color: self.particle_color,
            };
            pool.validate().context("Invalid particle settings")?;
            Some(ParticleLayer {
                pool,
                grid: GridConfig::default(),
                ..Default::default()
            })
        } else {
            None
        };

        Ok(SessionConfig {
            width: self.width,
            height: self.height,
            particles,
            ..Default::default()
        })
    }
}

/// Where each per-frame product goes
struct Sinks {
    view_3d: Box<dyn OutputSink>,
    view_2d: Option<Box<dyn OutputSink>>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("segment-points starting");
    tracing::info!("Working resolution: {}x{}", args.width, args.height);
    tracing::info!("Target FPS: {}", args.fps);

    let session_config = args.session_config()?;

    let mut capture: Box<dyn CaptureSource> = match &args.input_dir {
        Some(dir) => Box::new(
            ImageSequenceCapture::new(dir).context("Failed to open frame directory")?,
        ),
        None => Box::new(
            WebcamCapture::new(args.input_device, args.width, args.height, args.fps)
                .context("Failed to initialize webcam capture")?,
        ),
    };
    let (capture_width, capture_height) = capture.resolution();
    tracing::info!("Capture: {}x{}", capture_width, capture_height);

    let view_3d = output::open_sink(
        Some(args.output_device.as_str()),
        args.output_dir.as_deref(),
        args.width,
        args.height,
    )?
    .context("No 3D output configured")?;
    let view_2d = output::open_sink(
        args.output_2d_device.as_deref(),
        args.output_2d_dir.as_deref(),
        args.width,
        args.height,
    )
    .context("Failed to initialize 2D output")?;
    let mut sinks = Sinks { view_3d, view_2d };

    let mut model =
        segmentation::create_model(args.model.as_deref()).context("Failed to load segmentation model")?;
    if let Some((model_width, model_height)) = model.input_size() {
        tracing::info!("Segmentation runs at {}x{}", model_width, model_height);
    }

    let compositor = MaskCompositor {
        threshold: args.threshold,
        ..Default::default()
    };

    let pipeline = Pipeline {
        width: args.width,
        height: args.height,
        target_fps: args.fps,
        max_frames: args.frames,
        show_matte: args.show_matte,
        compositor,
    };

    let mut session = Session::new(session_config);
    let result = pipeline.run(capture.as_mut(), model.as_mut(), &mut session, &mut sinks);

    session.reset();
    result
}

struct Pipeline {
    width: u32,
    height: u32,
    target_fps: u32,
    max_frames: Option<u64>,
    show_matte: bool,
    compositor: MaskCompositor,
}

impl Pipeline {
    fn run(
        &self,
        capture: &mut dyn CaptureSource,
        model: &mut dyn SegmentationModel,
        session: &mut Session,
        sinks: &mut Sinks,
    ) -> Result<()> {
        let frame_duration = Duration::from_secs_f32(1.0 / self.target_fps.max(1) as f32);
        let mut frame_count = 0u64;
        let mut total_capture_time = Duration::ZERO;
        let mut total_segment_time = Duration::ZERO;
        let mut total_render_time = Duration::ZERO;
        let mut total_output_time = Duration::ZERO;

        tracing::info!("Starting main pipeline loop");
        match self.max_frames {
            Some(n) => tracing::info!("Stopping after {} frames", n),
            None => tracing::info!("Press Ctrl+C to stop"),
        }

        while self.max_frames.map_or(true, |n| frame_count < n) {
            let loop_start = Instant::now();

            // Capture and bring to working resolution
            let capture_start = Instant::now();
            let frame = capture.capture_frame().context("Failed to capture frame")?;
            let frame = capture::downscale(frame, self.width, self.height);
            total_capture_time += capture_start.elapsed();

            // Segment, darken background, drop black pixels
            let segment_start = Instant::now();
            let matte = model.segment(&frame).context("Failed to segment frame")?;
            let masked = self
                .compositor
                .composite(&frame, &matte)
                .context("Failed to composite mask")?;
            let filtered = filter_black(&masked);
            total_segment_time += segment_start.elapsed();

            // 2D pixel view and 3D point view
            let render_start = Instant::now();
            let view_2d = sinks.view_2d.as_ref().map(|_| {
                if self.show_matte {
                    Preprocessor::matte_to_rgb(&matte, self.width, self.height)
                } else {
                    compose_2d(&filtered)
                }
            });
            let view_3d = session
                .render_frame(&filtered)
                .context("Failed to render 3D view")?;
            total_render_time += render_start.elapsed();

            let output_start = Instant::now();
            if let (Some(sink), Some(view)) = (sinks.view_2d.as_mut(), view_2d) {
                sink.write_frame(&view).context("Failed to write 2D frame")?;
            }
            sinks
                .view_3d
                .write_frame(&view_3d)
                .context("Failed to write 3D frame")?;
            total_output_time += output_start.elapsed();

            frame_count += 1;

            // Log stats every 30 frames
            if frame_count % 30 == 0 {
                let avg = |total: Duration| total.as_secs_f64() * 1000.0 / frame_count as f64;
                let capture_ms = avg(total_capture_time);
                let segment_ms = avg(total_segment_time);
                let render_ms = avg(total_render_time);
                let output_ms = avg(total_output_time);
                let total_ms = capture_ms + segment_ms + render_ms + output_ms;

                tracing::info!(
                    "Frame {}: capture={:.1}ms, segment={:.1}ms, render={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}, particles={}",
                    frame_count,
                    capture_ms,
                    segment_ms,
                    render_ms,
                    output_ms,
                    total_ms,
                    1000.0 / total_ms,
                    session.alive_particles()
                );
            }

            // Frame rate limiting
            let elapsed = loop_start.elapsed();
            if elapsed < frame_duration {
                std::thread::sleep(frame_duration - elapsed);
            }
        }

        tracing::info!("Pipeline finished after {} frames", frame_count);
        Ok(())
    }
}
