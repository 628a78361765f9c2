use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use spectrostream::batch::BatchDriver;
use spectrostream::config::SpectrogramConfig;
use spectrostream::fixtures;
use spectrostream::stream::worker::stream_columns;
use spectrostream::stream::StreamSession;
use spectrostream::wav::read_wav_file;

#[derive(Parser, Debug)]
#[command(
    name = "spectro_cli",
    about = "Spectrogram pipeline harness for batch analysis and stream replay"
)]
struct Cli {
    /// Optional JSON config file (defaults are used when absent)
    #[arg(long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the batch driver over a WAV file and export the column CSV
    Analyze {
        input: PathBuf,
        /// CSV destination; stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Replay a WAV file through the streaming path, printing one JSON
    /// line per column
    Stream {
        input: PathBuf,
        /// Ingest chunk size in samples
        #[arg(long, default_value_t = 1024)]
        chunk_size: usize,
    },
    /// Write a synthetic WAV fixture
    GenFixture {
        #[arg(long)]
        output: PathBuf,
        #[arg(long, value_enum, default_value = "sine")]
        signal: SignalKind,
        #[arg(long, default_value_t = 440.0)]
        frequency: f32,
        #[arg(long, default_value_t = 2.0)]
        duration: f32,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SignalKind {
    Sine,
    Silence,
    Noise,
    Chirp,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = cli
        .config
        .as_ref()
        .map(SpectrogramConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Analyze { input, output } => run_analyze(config, &input, output),
        Commands::Stream { input, chunk_size } => run_stream(config, &input, chunk_size),
        Commands::GenFixture {
            output,
            signal,
            frequency,
            duration,
            sample_rate,
        } => run_gen_fixture(&output, signal, frequency, duration, sample_rate),
    }
}

fn run_analyze(
    mut config: SpectrogramConfig,
    input: &PathBuf,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let audio = read_wav_file(input)
        .with_context(|| format!("decoding {}", input.display()))?;
    config.sample_rate = audio.sample_rate;

    let driver = BatchDriver::new(config)?;
    let result = driver.process_with_progress(&audio.samples, |p| {
        log::info!("[Analyze] {:.1}% ({} columns)", p.percent, p.columns);
    })?;

    log::info!(
        "[Analyze] {} columns over {:.3}s ({} degraded)",
        result.columns.len(),
        result.duration.as_secs_f64(),
        result.degraded_columns
    );

    match output {
        Some(path) => {
            let file = File::create(&path)
                .with_context(|| format!("creating {}", path.display()))?;
            result.write_csv(BufWriter::new(file))?;
        }
        None => result.write_csv(io::stdout().lock())?,
    }

    Ok(ExitCode::from(0))
}

fn run_stream(
    mut config: SpectrogramConfig,
    input: &PathBuf,
    chunk_size: usize,
) -> Result<ExitCode> {
    anyhow::ensure!(chunk_size > 0, "chunk size must be greater than 0");

    let audio = read_wav_file(input)
        .with_context(|| format!("decoding {}", input.display()))?;
    config.sample_rate = audio.sample_rate;

    let mut session = StreamSession::new(config)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for chunk in audio.samples.chunks(chunk_size) {
        let produced = session.ingest(chunk);
        for column in stream_columns(&session, produced) {
            writeln!(out, "{}", serde_json::to_string(&column)?)?;
        }
    }

    log::info!(
        "[Stream] {} columns, delay estimate {:?}",
        session.columns_produced(),
        session.timing().delay_estimate()
    );

    Ok(ExitCode::from(0))
}

fn run_gen_fixture(
    output: &PathBuf,
    signal: SignalKind,
    frequency: f32,
    duration: f32,
    sample_rate: u32,
) -> Result<ExitCode> {
    let samples = match signal {
        SignalKind::Sine => fixtures::sine(sample_rate, frequency, duration, 0.8),
        SignalKind::Silence => fixtures::silence(sample_rate, duration),
        SignalKind::Noise => fixtures::white_noise(sample_rate, duration, 0.8, 42),
        SignalKind::Chirp => fixtures::chirp(sample_rate, 20.0, frequency, duration, 0.8),
    };

    fixtures::write_wav_fixture(output, &samples, sample_rate)
        .with_context(|| format!("writing {}", output.display()))?;
    log::info!(
        "[GenFixture] Wrote {} samples to {}",
        samples.len(),
        output.display()
    );

    Ok(ExitCode::from(0))
}
