//! Keyboard piano
//!
//! Usage: keypiano [options] [auto | interactive | save [output.wav]]
//!
//! Without a command a menu is shown.

use keypiano::interactive::{exit_requested, run_session, TerminalKeys};
use keypiano::output::LiveOutput;
use keypiano::pipeline::Renderer;
use keypiano::song::load_song;
use keypiano::{
    parse_song, perform_until, plan, play_song, Cue, KeyMap, Layout, PianoConfig, Result, DEFAULT_SONG,
};
use log::warn;
use std::env;
use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;
use std::process;
use std::str::FromStr;

const USAGE: &str = "Usage: keypiano [options] [command]

Play a melody or live notes from the computer keyboard.

Commands:
  auto               Play the song (Esc to stop)
  interactive        Play notes by pressing keys (Esc to exit)
  save [out.wav]     Render the song to a WAV file (default song_output.wav)

Options:
  --config <file>    YAML configuration file
  --layout <name>    Key layout: melody (default) or chromatic
  --song <file>      Song text file instead of the built-in melody
  -h, --help         Show this help

Without a command, a menu is shown.
";

const DEFAULT_OUTPUT: &str = "song_output.wav";

#[derive(Debug, PartialEq)]
enum Command {
    Auto,
    Interactive,
    Save(Option<String>),
    Menu,
    Help,
}

struct Args {
    config_path: Option<String>,
    layout: Option<Layout>,
    song_path: Option<String>,
    command: Command,
}

fn parse_args<I>(args: I) -> std::result::Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter().peekable();
    let mut config_path = None;
    let mut layout = None;
    let mut song_path = None;
    let mut command = Command::Menu;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => command = Command::Help,
            "--config" => config_path = Some(args.next().ok_or("--config needs a file")?),
            "--song" => song_path = Some(args.next().ok_or("--song needs a file")?),
            "--layout" => {
                let name = args.next().ok_or("--layout needs a name")?;
                layout = Some(Layout::from_str(&name).map_err(|e| e.to_string())?);
            }
            "auto" => command = Command::Auto,
            "interactive" => command = Command::Interactive,
            "save" => command = Command::Save(args.next_if(|name| !name.starts_with('-'))),
            other => return Err(format!("Unknown argument: {}", other)),
        }
    }

    Ok(Args {
        config_path,
        layout,
        song_path,
        command,
    })
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn banner(title: &str) {
    println!("{}", "=".repeat(60));
    println!("{}", title);
    println!("{}", "=".repeat(60));
}

fn auto_play(config: &PianoConfig, map: &KeyMap, song: &str) -> Result<()> {
    let timing = config.timing();
    let cues = plan(map, &parse_song(song), &timing);
    let mut output = LiveOutput::open(config.voice_config())?;

    println!("\nPlaying sequence... (press ESC to stop)");
    let report = {
        let mut keys = TerminalKeys::new()?;
        perform_until(&cues, &mut output, &timing, |cue| {
            let stop = exit_requested(&mut keys).unwrap_or_else(|e| {
                warn!("failed to read keyboard: {}", e);
                false
            });
            if stop {
                return ControlFlow::Break(());
            }
            if !matches!(cue, Cue::Pause(_)) {
                // raw mode: lines need an explicit carriage return
                print!("{}\r\n", cue);
                let _ = io::stdout().flush();
            }
            ControlFlow::Continue(())
        })?
    };

    if report.interrupted {
        output.silence();
        println!("\nSequence interrupted by user");
    } else {
        output.wait_until_idle();
        println!(
            "Sequence finished! ({} notes, {} rests, {} skipped)",
            report.notes, report.rests, report.skipped
        );
    }
    Ok(())
}

fn interactive(config: &PianoConfig, map: &KeyMap) -> Result<()> {
    println!();
    banner("INTERACTIVE KEYBOARD PIANO MODE");
    println!("Press keys to play notes:");
    for (key, tone) in map.iter() {
        println!("  {} -> {}", key, tone);
    }
    println!("\nPress ESC to exit");
    println!("{}\n", "=".repeat(60));

    let mut output = LiveOutput::open(config.voice_config())?;
    let report = {
        let mut keys = TerminalKeys::new()?;
        run_session(map, &mut keys, &mut output, config.timing().note, |key, note| {
            // raw mode: lines need an explicit carriage return
            print!("Key '{}' -> Note: {}\r\n", key, note);
            let _ = io::stdout().flush();
        })?
    };
    output.silence();

    println!("\nExiting interactive mode... ({} notes played)", report.notes);
    Ok(())
}

fn save(config: &PianoConfig, map: &KeyMap, song: &str, filename: &str) -> Result<()> {
    println!("\nGenerating audio file: {}", filename);
    println!("This may take a moment...");

    let mut renderer = Renderer::new(config.voice_config(), config.sample_rate);
    let mut processed = 0;
    let report = play_song(map, song, &config.timing(), &mut renderer, |cue| {
        if let Cue::Play { .. } = cue {
            processed += 1;
            if processed % 10 == 0 {
                println!("  Processed {} notes...", processed);
            }
        }
    })?;

    println!("  Writing {} samples to file...", renderer.samples().len());
    let summary = renderer.write_wav(filename)?;

    println!("\n✓ Audio file saved successfully!");
    println!("  File: {}", summary.path.display());
    println!("  Size: {:.2} KB", summary.bytes as f64 / 1024.0);
    println!("  Duration: {:.2} seconds", summary.seconds);
    println!("  Notes: {}", report.notes);
    Ok(())
}

fn wav_filename(input: Option<String>) -> String {
    match input {
        Some(name) if !name.is_empty() => {
            if name.ends_with(".wav") {
                name
            } else {
                format!("{}.wav", name)
            }
        }
        _ => DEFAULT_OUTPUT.to_string(),
    }
}

fn menu(config: &PianoConfig, map: &KeyMap, song: &str) -> Result<()> {
    banner("KEYBOARD PIANO - Song Player");
    println!("\nChoose an option:");
    println!("1. Play the song sequence automatically");
    println!("2. Interactive mode (press keys to play notes)");
    println!("3. Save song as audio file (WAV)");
    println!("4. Exit");

    match prompt("\nEnter your choice (1/2/3/4): ")?.as_str() {
        "1" => auto_play(config, map, song),
        "2" => interactive(config, map),
        "3" => {
            let name = prompt(&format!("Enter filename (default: {}): ", DEFAULT_OUTPUT))?;
            save(config, map, song, &wav_filename(Some(name)))
        }
        "4" => {
            println!("Goodbye!");
            Ok(())
        }
        _ => {
            println!("Invalid choice. Exiting.");
            Ok(())
        }
    }
}

fn run(args: Args) -> Result<()> {
    let mut config = match &args.config_path {
        Some(path) => PianoConfig::load(path)?,
        None => PianoConfig::default(),
    };
    if let Some(layout) = args.layout {
        config.set_layout(layout);
    }
    let map = config.keymap()?;

    let song = match &args.song_path {
        Some(path) => load_song(path)?,
        None => DEFAULT_SONG.to_string(),
    };

    match args.command {
        Command::Auto => auto_play(&config, &map, &song),
        Command::Interactive => interactive(&config, &map),
        Command::Save(name) => save(&config, &map, &song, &wav_filename(name)),
        Command::Menu => menu(&config, &map, &song),
        Command::Help => {
            print!("{}", USAGE);
            Ok(())
        }
    }
}

fn main() {
    env_logger::init();

    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            process::exit(1);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("\nError: {}", e);
        process::exit(1);
    }
}
