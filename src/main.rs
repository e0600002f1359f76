use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use log::info;

use fall_tracker::camera::{VideoSink, VideoSource};
use fall_tracker::config::Config;
use fall_tracker::pipeline::Pipeline;
use fall_tracker::pose::detector::PoseDetector;
use fall_tracker::pose::engine::AsyncPoseEngine;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// コマンドライン引数。未指定の項目はconfig.tomlの値を使う。
#[derive(Debug, PartialEq)]
struct Args {
    /// 動画ファイルのパス、または内蔵カメラを使う"cam"
    input: String,
    model: Option<String>,
    device: Option<String>,
    config: String,
}

fn print_usage() {
    eprintln!("Detect a person falling from a webcam or a video file");
    eprintln!();
    eprintln!("Usage: fall-tracker -i <INPUT> [OPTIONS]");
    eprintln!();
    eprintln!("  -i, --input <PATH|cam>   Video file path, or 'cam' for the internal camera");
    eprintln!("  -m, --model <PATH>       ONNX pose model path");
    eprintln!("  -d, --device <cpu|cuda>  Inference device");
    eprintln!("  -c, --config <PATH>      Config file (default: {})", DEFAULT_CONFIG_PATH);
    eprintln!("  -h, --help               Show this help");
}

/// 引数を解析する。Ok(None)はヘルプ表示の要求。
fn parse_args(argv: &[String]) -> Result<Option<Args>, String> {
    let mut input = None;
    let mut model = None;
    let mut device = None;
    let mut config = DEFAULT_CONFIG_PATH.to_string();

    let mut i = 1;
    while i < argv.len() {
        let flag = argv[i].as_str();
        match flag {
            "-h" | "--help" => return Ok(None),
            "-i" | "--input" | "-m" | "--model" | "-d" | "--device" | "-c" | "--config" => {
                i += 1;
                let value = argv
                    .get(i)
                    .ok_or_else(|| format!("Missing value for {}", flag))?
                    .clone();
                match flag {
                    "-i" | "--input" => input = Some(value),
                    "-m" | "--model" => model = Some(value),
                    "-d" | "--device" => device = Some(value),
                    _ => config = value,
                }
            }
            other => return Err(format!("Unknown argument: {}", other)),
        }
        i += 1;
    }

    let input = input.ok_or_else(|| "Missing required argument -i/--input".to_string())?;
    Ok(Some(Args {
        input,
        model,
        device,
        config,
    }))
}

fn run(args: Args) -> Result<()> {
    let config = Config::load_or_default(&args.config);
    let model_path = args.model.unwrap_or(config.model.path);
    let device = args.device.unwrap_or(config.model.device);

    info!("Start Fall Detection ({})", env!("GIT_VERSION"));
    info!("Initializing inference session for {} device...", device);
    info!("Reading model {}...", model_path);
    let detector = PoseDetector::new(&model_path, &device)
        .with_context(|| format!("Failed to initialize pose model {}", model_path))?;

    let from_camera = args.input == "cam";
    let source = if from_camera {
        VideoSource::open_camera(config.video.camera_index)?
    } else {
        if !Path::new(&args.input).is_file() {
            bail!("Specified input file doesn't exist: {}", args.input);
        }
        VideoSource::open_file(&args.input)?
    };

    let geometry = source.geometry();
    info!(
        "Stream geometry: {}x{} @ {:.1} fps",
        geometry.width, geometry.height, geometry.frame_rate
    );

    let engine = AsyncPoseEngine::start(detector, geometry);
    let sink = if from_camera {
        info!("Evaluating webcam stream...");
        VideoSink::window(&config.video.window_title)?
    } else {
        info!("Evaluating video file stream...");
        VideoSink::file(&args.input, &geometry)?
    };

    Pipeline::new(source, engine, sink).run()
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let argv: Vec<String> = std::env::args().collect();
    let args = match parse_args(&argv) {
        Ok(Some(args)) => args,
        Ok(None) => {
            print_usage();
            return ExitCode::SUCCESS;
        }
        Err(message) => {
            eprintln!("{}", message);
            eprintln!();
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
