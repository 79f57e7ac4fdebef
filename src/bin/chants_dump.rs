use afs_chants::{
    CHANT_GROUP_SIZE, ChantExtractor, ExecutableVariant, ExtractorSettings, OutputEvent,
};
use anyhow::{Context, Result, bail};
use clap::{Arg, ArgAction, ArgMatches, Command};
use dialoguer::Confirm;
use indoc::indoc;
use log::{LevelFilter, info};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::io::{self, Write};
use std::path::Path;

#[path = "chants_dump/jsonl.rs"]
mod jsonl;

fn command() -> Command {
    Command::new("chants_dump")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Extracts team chants from PES5/PES6/WE9 data into per-team folders")
        .long_about(indoc!(r#"
            Extracts team chants from PES5/PES6/WE9 data into per-team folders.

            The chants table is read from the first known executable found in the game
            directory (pes5.exe, we9.exe, we9lek.exe, pes6.exe). Chants are taken from
            kitserver replacement files when present, otherwise from the AFS containers
            in `dat/`. Each team gets `<output-dir>/<team id>/chant_<slot>.adx`, and a
            kitserver `map.txt` is written next to them.
        "#))
        .arg(
            Arg::new("language")
                .long("language")
                .short('l')
                .required(true)
                .value_name("X")
                .help("Language of the X_sound.afs and X_text.afs containers, e.g. `e`."),
        )
        .arg(
            Arg::new("game-dir")
                .long("game-dir")
                .short('g')
                .value_name("DIR")
                .default_value(".")
                .help("Game installation directory holding the executable."),
        )
        .arg(
            Arg::new("archive-dir")
                .long("archive-dir")
                .value_name("DIR")
                .help("Directory holding the AFS containers (default: <game-dir>/dat)."),
        )
        .arg(
            Arg::new("override-dir")
                .long("override-dir")
                .value_name("DIR")
                .help("Kitserver replacement tree (default: <game-dir>/kitserver/dat)."),
        )
        .arg(
            Arg::new("output-dir")
                .long("output-dir")
                .short('o')
                .value_name("DIR")
                .help("Where per-team folders and map.txt are written (default: <game-dir>/chants)."),
        )
        .arg(
            Arg::new("executable")
                .long("executable")
                .value_name("FILE")
                .requires("table-offset")
                .requires("team-count")
                .help("Use this executable instead of the known ones. Requires --table-offset and --team-count."),
        )
        .arg(
            Arg::new("table-offset")
                .long("table-offset")
                .value_name("OFFSET")
                .requires("executable")
                .value_parser(parse_offset)
                .help("File offset of the chants table, decimal or 0x-prefixed hex."),
        )
        .arg(
            Arg::new("team-count")
                .long("team-count")
                .value_name("N")
                .requires("executable")
                .value_parser(clap::value_parser!(u16))
                .help("Number of records in the chants table."),
        )
        .arg(
            Arg::new("group-size")
                .long("group-size")
                .value_name("N")
                .value_parser(clap::value_parser!(u16).range(1..))
                .help(format!(
                    "Number of consecutive TOC slots holding one team's chants (default: {}).",
                    CHANT_GROUP_SIZE
                )),
        )
        .arg(
            Arg::new("jsonl")
                .long("jsonl")
                .action(ArgAction::SetTrue)
                .help("Print one JSON line per written or missing file to stdout."),
        )
        .arg(
            Arg::new("no-confirm-overwrite")
                .long("no-confirm-overwrite")
                .action(ArgAction::SetTrue)
                .help("When set, will not ask for confirmation before overwriting an existing map.txt, useful for automation"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("-v - info, -vv - debug, -vvv - trace."),
        )
}

fn parse_offset(value: &str) -> Result<u64, String> {
    let parsed = match value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => value.parse::<u64>(),
    };

    parsed.map_err(|e| format!("invalid offset `{}`: {}", value, e))
}

fn settings_from_matches(matches: &ArgMatches) -> ExtractorSettings {
    let language = matches
        .get_one::<String>("language")
        .expect("This is a required argument");
    let game_dir = matches
        .get_one::<String>("game-dir")
        .expect("has a default value");

    let mut settings = ExtractorSettings::new(language.as_str()).game_dir(game_dir);

    if let Some(group_size) = matches.get_one::<u16>("group-size") {
        settings = settings.group_size(*group_size);
    }
    if let Some(dir) = matches.get_one::<String>("archive-dir") {
        settings = settings.archive_dir(dir);
    }
    if let Some(dir) = matches.get_one::<String>("override-dir") {
        settings = settings.override_dir(dir);
    }
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        settings = settings.output_dir(dir);
    }

    if let (Some(exe), Some(offset), Some(count)) = (
        matches.get_one::<String>("executable"),
        matches.get_one::<u64>("table-offset"),
        matches.get_one::<u16>("team-count"),
    ) {
        settings = settings.executables(vec![ExecutableVariant::new(exe, *offset, *count)]);
    }

    settings
}

fn init_logging(occurrences: u8) {
    let level = match occurrences {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        3 => LevelFilter::Trace,
        _ => {
            eprintln!("using more than  -vvv does not affect verbosity level");
            LevelFilter::Trace
        }
    };

    if let Err(e) = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

/// Asks before clobbering a previous run's manifest.
fn confirm_overwrite(manifest: &Path, prompt: bool) -> Result<()> {
    if manifest.is_dir() {
        bail!(
            "There is a directory at {}, refusing to overwrite",
            manifest.display()
        );
    }

    if !manifest.exists() || !prompt {
        return Ok(());
    }

    let confirmed = Confirm::new()
        .with_prompt(format!(
            "Are you sure you want to override output file at {}",
            manifest.display()
        ))
        .default(false)
        .interact()
        .context("Failed to write confirmation prompt to term")?;

    if !confirmed {
        bail!("Cancelled");
    }
    Ok(())
}

fn run(matches: &ArgMatches) -> Result<()> {
    init_logging(matches.get_count("verbose"));

    let settings = settings_from_matches(matches);
    confirm_overwrite(
        &settings.manifest_path(),
        !matches.get_flag("no-confirm-overwrite"),
    )?;

    let as_jsonl = matches.get_flag("jsonl");
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;

    let extractor = ChantExtractor::new(settings);
    let summary = extractor
        .run_with(|event: &OutputEvent| {
            if !as_jsonl || write_error.is_some() {
                return;
            }
            if let Err(e) = jsonl::write_event(&mut out, event) {
                write_error = Some(e);
            }
        })
        .with_context(|| {
            format!(
                "Failed to extract chants from {}",
                extractor.settings().get_game_dir().display()
            )
        })?;

    if let Some(e) = write_error {
        return Err(e).context("Failed to write to stdout");
    }

    info!("Used executable {}", summary.executable.display());
    if !as_jsonl {
        writeln!(
            out,
            "Extraction complete! {} teams, {} chant groups, {} files extracted, {} overrides copied, {} missing slots, {} failed slots, {} failed teams",
            summary.teams,
            summary.groups_extracted,
            summary.files_written,
            summary.overrides_copied,
            summary.missing_slots,
            summary.failed_slots,
            summary.failures.len()
        )?;
    }

    Ok(())
}

fn main() -> Result<()> {
    let matches = command().get_matches();
    run(&matches)
}
