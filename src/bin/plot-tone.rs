use keypiano::generator::{Envelope, EnvelopePhase, GeneratorState, SignalGenerator, SineTone};
use keypiano::pipeline::{samples_for, VoiceConfig};
use keypiano::{Note, PianoConfig};
use plotters::prelude::*;
use std::str::FromStr;
use std::time::Duration;

const FRAME_SIZE: usize = 64;
const EDGE_THRESHOLD: f32 = 0.05;

struct Args {
    note: Note,
    duration_ms: u64,
    output_path: String,
    config: PianoConfig,
}

fn print_usage() {
    eprintln!("Usage: plot-tone <note> <duration_ms> <output.svg> [config.yaml]");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  plot-tone A4 300 a4.svg");
    eprintln!("  plot-tone C#5 50 short.svg keypiano.yaml");
}

fn parse_args() -> Result<Args, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() != 4 && args.len() != 5 {
        print_usage();
        return Err("Invalid number of arguments".into());
    }

    let note = Note::from_str(&args[1])?;
    let duration_ms: u64 = args[2].parse()?;
    if duration_ms == 0 {
        return Err("Duration must be greater than zero".into());
    }
    let config = match args.get(4) {
        Some(path) => PianoConfig::load(path)?,
        None => PianoConfig::default(),
    };

    Ok(Args {
        note,
        duration_ms,
        output_path: args[3].clone(),
        config,
    })
}

/// Synthesize the tone and its envelope, frame by frame
fn generate_tone(args: &Args) -> (Vec<f32>, Vec<f32>, Vec<EnvelopePhase>) {
    let sample_rate = args.config.sample_rate;
    let voice: VoiceConfig = args.config.voice_config();
    let total = samples_for(Duration::from_millis(args.duration_ms), sample_rate);

    let envelope = Envelope::new(
        total,
        samples_for(voice.attack, sample_rate),
        samples_for(voice.release, sample_rate),
    );
    let phases = (0..total).map(|i| envelope.phase_at(i)).collect();
    let levels = (0..total)
        .map(|i| envelope.amplitude_at(i) * voice.volume)
        .collect();

    let mut tone = SineTone::new(args.note.frequency(), sample_rate, voice.volume, envelope);
    let mut samples = Vec::with_capacity(total);
    let mut frame_buffer = vec![0.0f32; FRAME_SIZE];
    loop {
        let state = tone.process(&mut frame_buffer);
        samples.extend_from_slice(&frame_buffer);
        if state == GeneratorState::Complete {
            break;
        }
    }
    samples.truncate(total);

    (samples, levels, phases)
}

fn check_edges(samples: &[f32]) -> Result<(), Box<dyn std::error::Error>> {
    let first = samples.first().copied().unwrap_or(0.0);
    let last = samples.last().copied().unwrap_or(0.0);
    if first.abs() > EDGE_THRESHOLD || last.abs() > EDGE_THRESHOLD {
        return Err(format!(
            "CLICK: tone edges not near silence (first = {:.4}, last = {:.4})",
            first, last
        )
        .into());
    }
    println!(
        "  ✓ Edges near silence: first = {:.4}, last = {:.4} (threshold {})",
        first, last, EDGE_THRESHOLD
    );
    Ok(())
}

fn create_plot(
    args: &Args,
    samples: &[f32],
    levels: &[f32],
    phases: &[EnvelopePhase],
) -> Result<(), Box<dyn std::error::Error>> {
    let root = SVGBackend::new(&args.output_path, (1000, 400)).into_drawing_area();
    root.fill(&WHITE)?;

    let ms_per_sample = 1000.0 / args.config.sample_rate as f32;
    let max_time = samples.len() as f32 * ms_per_sample;
    let volume = args.config.volume.max(0.01);

    let title = format!(
        "{} ({:.2} Hz), {}ms, attack={}ms, release={}ms",
        args.note,
        args.note.frequency(),
        args.duration_ms,
        args.config.attack_ms,
        args.config.release_ms
    );

    let mut chart = ChartBuilder::on(&root)
        .caption(&title, ("sans-serif", 20))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f32..max_time, -volume * 1.1..volume * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("Time (ms)")
        .y_desc("Amplitude")
        .x_labels(10)
        .y_labels(10)
        .draw()?;

    chart.draw_series(LineSeries::new(
        samples
            .iter()
            .enumerate()
            .map(|(i, &s)| (i as f32 * ms_per_sample, s)),
        BLUE.stroke_width(1),
    ))?;

    chart.draw_series(LineSeries::new(
        levels
            .iter()
            .enumerate()
            .map(|(i, &l)| (i as f32 * ms_per_sample, l)),
        RED.stroke_width(2),
    ))?;

    // Mark envelope phase changes
    for i in 1..phases.len() {
        if phases[i] != phases[i - 1] {
            chart.draw_series(std::iter::once(plotters::element::Cross::new(
                (i as f32 * ms_per_sample, levels[i]),
                6,
                BLACK.filled(),
            )))?;
        }
    }

    root.present()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = parse_args()?;

    println!("Tone Plot Generator");
    println!("===================");
    println!("  Note: {} ({:.2} Hz)", args.note, args.note.frequency());
    println!("  Duration: {}ms", args.duration_ms);
    println!("  Sample rate: {} Hz", args.config.sample_rate);
    println!("  Volume: {:.2}", args.config.volume);
    println!();

    print!("  Generating tone... ");
    let (samples, levels, phases) = generate_tone(&args);
    println!("done ({} samples)", samples.len());

    check_edges(&samples)?;

    print!("  Creating plot... ");
    create_plot(&args, &samples, &levels, &phases)?;
    println!("done");

    println!();
    println!("Output: {}", args.output_path);

    Ok(())
}
