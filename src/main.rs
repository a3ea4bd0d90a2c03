use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};

use twincam::camera::{self, CameraRig};
use twincam::compositor::{scaled_dims, Compositor, SlotLayout};
use twincam::config::Config;
use twincam::input::{self, RawModeGuard};
use twincam::preview::PreviewWindow;
use twincam::stats::FpsStats;

/// How long each iteration waits for a cancel keypress.
const KEY_POLL_TIMEOUT: Duration = Duration::from_millis(10);

/// Check the downscale factor (0.0 exclusive to 1.0 inclusive).
/// Applied to CLI arguments and to values merged from the config file.
fn check_scale(scale: f64) -> Result<f64, String> {
    if !(scale > 0.0 && scale <= 1.0) {
        return Err(format!(
            "Scale must be greater than 0 and at most 1, got {}",
            scale
        ));
    }
    Ok(scale)
}

/// Check the exposure time in seconds (0 exclusive to 10 inclusive)
fn check_exposure(exposure: f64) -> Result<f64, String> {
    if !(exposure > 0.0 && exposure <= 10.0) {
        return Err(format!(
            "Exposure must be greater than 0 and at most 10 seconds, got {}",
            exposure
        ));
    }
    Ok(exposure)
}

/// Check the camera count (1-8)
fn check_camera_count(count: usize) -> Result<usize, String> {
    if !(1..=8).contains(&count) {
        return Err(format!("Camera count must be between 1 and 8, got {}", count));
    }
    Ok(count)
}

/// Parse and validate the downscale factor
fn parse_scale(s: &str) -> Result<f64, String> {
    let scale: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    check_scale(scale)
}

/// Parse and validate the exposure time in seconds
fn parse_exposure(s: &str) -> Result<f64, String> {
    let exposure: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    check_exposure(exposure)
}

/// Parse and validate the camera count
fn parse_camera_count(s: &str) -> Result<usize, String> {
    let count: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid camera count", s))?;
    check_camera_count(count)
}

/// Parse a screen position (X,Y format)
fn parse_position(s: &str) -> Result<(u32, u32), String> {
    let parts: Vec<&str> = s.split(',').collect();
    if parts.len() != 2 {
        return Err(format!(
            "Invalid position format '{}'. Use X,Y (e.g., 780,50)",
            s
        ));
    }
    let x: u32 = parts[0]
        .trim()
        .parse()
        .map_err(|_| format!("Invalid x coordinate '{}' in position", parts[0]))?;
    let y: u32 = parts[1]
        .trim()
        .parse()
        .map_err(|_| format!("Invalid y coordinate '{}' in position", parts[1]))?;
    Ok((x, y))
}

/// twincam: side-by-side live preview for multi-camera rigs
#[derive(Parser)]
#[command(name = "twincam")]
#[command(version, about = "Side-by-side live preview for multi-camera rigs")]
#[command(long_about = "Opens a fixed set of cameras, reads them in lockstep, \
    composites the downscaled frames side by side into one monochrome preview \
    window, and reports per-iteration frame rates until ESC is pressed.")]
#[command(after_help = "EXAMPLES:
    # Preview the default two-camera rig
    twincam

    # Three cameras at half scale
    twincam run -n 3 -f 0.5

    # Shorter exposure for faster sensors
    twincam run -e 0.01

    # Headless frame-rate measurement, no window
    twincam run --no-display

    # List available devices
    twincam list-cameras")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List available camera devices
    ListCameras,

    /// Run the acquisition loop and preview window (the default)
    Run {
        /// Number of cameras to open, at device indices 0..N
        #[arg(long, short = 'n', value_parser = parse_camera_count)]
        cameras: Option<usize>,

        /// Downscale factor applied to each frame before compositing
        /// Default: 0.4 (or from config file)
        #[arg(long, short = 'f', value_parser = parse_scale)]
        scale: Option<f64>,

        /// Exposure time in seconds, applied to every camera at startup
        /// Default: 0.06 (or from config file)
        #[arg(long, short = 'e', value_parser = parse_exposure)]
        exposure: Option<f64>,

        /// Skip the preview window; still captures and reports frame rates
        #[arg(long)]
        no_display: bool,

        /// Screen position of the preview window (X,Y)
        #[arg(long, value_parser = parse_position)]
        position: Option<(u32, u32)>,

        /// Custom config file path (default: ~/.config/twincam/config.toml)
        #[arg(long, short = 'c')]
        config: Option<String>,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::ListCameras) => run_list_cameras(),
        Some(Commands::Run {
            cameras,
            scale,
            exposure,
            no_display,
            position,
            config,
        }) => run_preview(cameras, scale, exposure, no_display, position, config),
        None => run_preview(None, None, None, false, None, None),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Run the list-cameras subcommand.
fn run_list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let devices = camera::list_devices()?;

    if devices.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    for device in &devices {
        println!("  {}", device);
    }
    Ok(())
}

/// Display formatted startup status showing the rig and preview settings
fn print_startup_status(
    descriptors: &[camera::CameraDescriptor],
    exposure_seconds: f64,
    scale: f64,
    composite_width: u32,
    composite_height: u32,
    display: bool,
) {
    println!();
    println!("┌─────────────────────────────────────────┐");
    println!("│  twincam v{:<29}│", env!("CARGO_PKG_VERSION"));
    println!("├─────────────────────────────────────────┤");
    for d in descriptors {
        let before = d
            .exposure_before
            .map(|v| format!("{:.0}", v))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "│  cam{}:     {:<28}│",
            d.index,
            format!("{} @ {} fps (exp was {})", d.resolution, d.reported_fps, before)
        );
    }
    println!(
        "│  Exposure: {:<28}│",
        format!("{} us", (exposure_seconds * 1_000_000.0) as i64)
    );
    println!("│  Scale:    {:<28}│", format!("{:.2}", scale));
    println!(
        "│  Preview:  {:<28}│",
        if display {
            format!("{}x{}", composite_width, composite_height)
        } else {
            "disabled".to_string()
        }
    );
    println!("├─────────────────────────────────────────┤");
    println!("│  Press ESC (or Ctrl+C) to stop         │");
    println!("└─────────────────────────────────────────┘");
    println!();
}

/// Run the acquisition loop: open the rig, composite, present, measure.
fn run_preview(
    cameras: Option<usize>,
    scale: Option<f64>,
    exposure: Option<f64>,
    no_display: bool,
    position: Option<(u32, u32)>,
    config_path: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(config_path.as_deref().map(Path::new))?;

    // Config-file values go through the same bounds checks as CLI arguments;
    // clap only sees the latter.
    let count = check_camera_count(cameras.unwrap_or(config.camera.count))?;
    let scale = check_scale(scale.unwrap_or(config.preview.scale))?;
    let exposure_seconds = check_exposure(exposure.unwrap_or(config.camera.exposure_seconds))?;
    let display = !no_display && config.preview.enabled;
    let position = position.unwrap_or((config.preview.window_x, config.preview.window_y));

    if let Err(e) = input::setup_ctrlc_handler() {
        eprintln!("Warning: Could not set up Ctrl+C handler: {}", e);
    }

    // Opening the rig validates that every camera shares one geometry and
    // applies the exposure override; any failure aborts before a window or
    // buffer exists.
    let mut rig = CameraRig::open(count, exposure_seconds, scale)?;

    let (slot_width, slot_height) = scaled_dims(rig.resolution(), scale);
    let layout = SlotLayout::horizontal(rig.len(), slot_width, slot_height);
    let mut compositor = Compositor::new(layout);

    print_startup_status(
        rig.descriptors(),
        exposure_seconds,
        scale,
        compositor.width(),
        compositor.height(),
        display,
    );

    let fps_hint = rig
        .descriptors()
        .first()
        .map(|d| d.reported_fps)
        .unwrap_or(30);

    let mut preview = if display {
        Some(PreviewWindow::open(
            compositor.width(),
            compositor.height(),
            fps_hint,
            position,
            "twincam preview",
        )?)
    } else {
        None
    };

    // Raw mode so ESC arrives without waiting for Enter. If the terminal
    // refuses (e.g. not a tty), Ctrl+C still works via the signal handler.
    let mut raw_mode = match RawModeGuard::enter() {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: raw terminal mode unavailable ({}); use Ctrl+C to stop", e);
            None
        }
    };

    let mut stats = FpsStats::new();
    let mut result: Result<(), Box<dyn std::error::Error>> = Ok(());

    loop {
        let iter_start = Instant::now();

        // Fan-out to all cameras, fan-in before compositing.
        let captures = match rig.grab_all() {
            Ok(captures) => captures,
            Err(e) => {
                result = Err(e.into());
                break;
            }
        };

        for (i, capture) in captures.iter().enumerate() {
            compositor.blit(i, &capture.image);
        }

        if let Some(window) = preview.as_mut() {
            if let Err(e) = window.present(compositor.buffer()) {
                result = Err(e.into());
                break;
            }
        }

        let cancelled = input::poll_cancel_key(KEY_POLL_TIMEOUT).unwrap_or(false);
        if cancelled || input::ctrlc_received() {
            if let Some(mut window) = preview.take() {
                window.shutdown();
            }
            break;
        }

        let sample = stats.record(iter_start.elapsed());
        let mut line = String::new();
        for (i, capture) in captures.iter().enumerate() {
            line.push_str(&format!("cam{}={}Hz ", i, capture.device_fps));
        }
        // Raw mode needs an explicit carriage return.
        print!(
            "{}frame#{} fps={:.1} avg={:.1}\r\n",
            line, sample.frame, sample.fps, sample.avg_fps
        );
        let _ = std::io::stdout().flush();
    }

    if let Some(guard) = raw_mode.as_mut() {
        let _ = guard.exit();
    }
    drop(preview);
    rig.shutdown();

    println!(
        "twincam v{} (capture: nokhwa, display: mpv)",
        env!("CARGO_PKG_VERSION")
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scale_bounds() {
        assert!(parse_scale("0.4").is_ok());
        assert!(parse_scale("1.0").is_ok());
        assert!(parse_scale("0").is_err());
        assert!(parse_scale("1.5").is_err());
        assert!(parse_scale("abc").is_err());
    }

    #[test]
    fn test_parse_exposure_bounds() {
        assert!(parse_exposure("0.06").is_ok());
        assert!(parse_exposure("10").is_ok());
        assert!(parse_exposure("0").is_err());
        assert!(parse_exposure("11").is_err());
    }

    #[test]
    fn test_parse_camera_count_bounds() {
        assert_eq!(parse_camera_count("2").unwrap(), 2);
        assert!(parse_camera_count("0").is_err());
        assert!(parse_camera_count("9").is_err());
        assert!(parse_camera_count("two").is_err());
    }

    fn preview_with_config(contents: &str) -> Result<(), Box<dyn std::error::Error>> {
        use std::io::Write;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", contents).unwrap();
        let path = file.path().to_str().unwrap().to_string();
        run_preview(None, None, None, true, None, Some(path))
    }

    #[test]
    fn test_config_zero_camera_count_is_rejected() {
        let err = preview_with_config("[camera]\ncount = 0").unwrap_err();
        assert!(err.to_string().contains("Camera count must be between"));
    }

    #[test]
    fn test_config_out_of_range_scale_is_rejected() {
        let err = preview_with_config("[preview]\nscale = 3.0").unwrap_err();
        assert!(err.to_string().contains("Scale must be greater than 0"));
    }

    #[test]
    fn test_config_out_of_range_exposure_is_rejected() {
        let err = preview_with_config("[camera]\nexposure_seconds = 100.0").unwrap_err();
        assert!(err.to_string().contains("Exposure must be greater than 0"));
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("780,50").unwrap(), (780, 50));
        assert_eq!(parse_position("0, 0").unwrap(), (0, 0));
        assert!(parse_position("780").is_err());
        assert!(parse_position("a,b").is_err());
    }
}
