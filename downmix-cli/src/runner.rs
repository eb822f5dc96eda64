use clap::ArgMatches;
use log::{debug, info, warn};
use std::str::FromStr;

use downmix_lib::config::gain::parse_db_str;
use downmix_lib::engine::RampEngineFactory;
use downmix_lib::stream::ring_stream;
use downmix_lib::{
    ChannelSelect, CycleOutcome, DownmixError, DownmixSettings, DownmixStage, DownmixStageArgs,
    OutputRouting,
};

use crate::decode;
use crate::error::CliError;
use crate::wav::WavSink;

/// Newcome wait budget used for file inputs when no settings file is given.
const FILE_SECONDARY_TIMEOUT_MS: u64 = 500;
/// Ring capacity in cycles' worth of frames.
const RING_CYCLES: usize = 8;

pub fn run(args: &ArgMatches) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("mix", mix_args)) => mix(mix_args),
        Some(("create", create_args)) => create(create_args),
        _ => Err(CliError::Usage("no command given".to_string())),
    }
}

fn create(args: &ArgMatches) -> Result<i32, CliError> {
    match args.subcommand() {
        Some(("settings-json", _)) => {
            println!("{}", DownmixSettings::default().to_json_pretty()?);
            Ok(0)
        }
        _ => Err(CliError::Usage("unknown create target".to_string())),
    }
}

fn required<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a String, CliError> {
    args.get_one::<String>(name)
        .ok_or_else(|| CliError::Usage(format!("missing {}", name)))
}

fn parse_value<T: FromStr>(args: &ArgMatches, name: &str) -> Result<Option<T>, CliError> {
    args.get_one::<String>(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|_| CliError::Usage(format!("invalid --{} value \"{}\"", name, raw)))
        })
        .transpose()
}

fn parse_gains(raw: &str) -> Result<[f32; 4], CliError> {
    let values = raw
        .split(',')
        .map(|part| {
            parse_db_str(part)
                .ok_or_else(|| CliError::Usage(format!("invalid gain \"{}\"", part.trim())))
        })
        .collect::<Result<Vec<f32>, CliError>>()?;
    <[f32; 4]>::try_from(values)
        .map_err(|_| CliError::Usage("--gain takes four comma separated values".to_string()))
}

fn parse_transitions(raw: &str) -> Result<[u32; 2], CliError> {
    let values = raw
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| CliError::Usage(format!("invalid transition \"{}\"", part.trim())))
        })
        .collect::<Result<Vec<u32>, CliError>>()?;
    <[u32; 2]>::try_from(values)
        .map_err(|_| CliError::Usage("--transition-ms takes two comma separated values".to_string()))
}

/// Settings file (or defaults) with command line overrides applied.
fn load_settings(args: &ArgMatches) -> Result<DownmixSettings, CliError> {
    let mut settings = match args.get_one::<String>("settings") {
        Some(path) => DownmixSettings::from_path(path)?,
        None => {
            let mut settings = DownmixSettings::default();
            settings.stage.secondary_timeout_ms = FILE_SECONDARY_TIMEOUT_MS;
            settings
        }
    };

    if let Some(frames) = parse_value::<usize>(args, "frames")? {
        settings.stage.frame_budget = frames;
    }
    if let Some(timeout) = parse_value::<u64>(args, "secondary-timeout-ms")? {
        settings.stage.secondary_timeout_ms = timeout;
    }
    if let Some(raw) = args.get_one::<String>("gain") {
        settings.downmix.gain = parse_gains(raw)?;
    }
    if let Some(raw) = args.get_one::<String>("transition-ms") {
        settings.downmix.transition_ms = parse_transitions(raw)?;
    }
    if let Some(routing) = parse_value::<OutputRouting>(args, "routing")? {
        settings.downmix.output_status = routing;
    }
    if let Some(select) = parse_value::<ChannelSelect>(args, "select")? {
        settings.downmix.dual_mono_select = select;
    }
    Ok(settings)
}

fn mix(args: &ArgMatches) -> Result<i32, CliError> {
    let base_path = required(args, "BASE")?;
    let newcome_path = required(args, "NEWCOME")?;
    let output_path = required(args, "output")?;
    let on_at = parse_value::<f64>(args, "on-at")?;
    let off_at = parse_value::<f64>(args, "off-at")?;
    let mut settings = load_settings(args)?;

    let base = decode::open_file(base_path)?;
    let newcome = decode::open_file(newcome_path)?;
    let base_spec = base.spec();
    let newcome_spec = newcome.spec();
    settings.downmix.stream_rate = [base_spec.sample_rate, newcome_spec.sample_rate];
    settings.downmix.stream_channels = [base_spec.channels, newcome_spec.channels];
    info!(
        "base {} Hz x{}, newcome {} Hz x{}",
        base_spec.sample_rate, base_spec.channels, newcome_spec.sample_rate, newcome_spec.channels
    );

    let frame_budget = settings.stage.frame_budget.max(1);
    let (base_writer, base_reader) =
        ring_stream(frame_budget * base_spec.channels as usize * RING_CYCLES);
    let (newcome_writer, newcome_reader) =
        ring_stream(frame_budget * newcome_spec.channels as usize * RING_CYCLES);

    let sink = WavSink::create(output_path, base_spec.sample_rate, base_spec.channels)?;
    let mut stage = DownmixStage::new(DownmixStageArgs {
        config: settings.downmix,
        settings: settings.stage,
        factory: Box::new(RampEngineFactory),
        base: base_reader,
        newcome: newcome_reader,
        sink,
    })?;

    let producers = [
        decode::spawn_producer("base", base, base_writer),
        decode::spawn_producer("newcome", newcome, newcome_writer),
    ];

    let rate = base_spec.sample_rate as f64;
    let mut frames_done = 0u64;
    let mut switched_on = false;
    let mut switched_off = false;
    loop {
        let position = frames_done as f64 / rate;
        if !switched_on && on_at.map_or(false, |at| position >= at) {
            stage.switch_on()?;
            switched_on = true;
            info!("downmix on at {:.3}s", position);
        }
        if !switched_off && off_at.map_or(false, |at| position >= at) {
            stage.switch_off()?;
            switched_off = true;
            info!("downmix off at {:.3}s", position);
        }

        match stage.process_cycle() {
            Ok(CycleOutcome::Mixed(report)) => {
                frames_done += (report.samples / report.output_channels.max(1) as usize) as u64;
            }
            Ok(CycleOutcome::Skip(reason)) => debug!("cycle skipped: {:?}", reason),
            Ok(CycleOutcome::End) => break,
            Err(DownmixError::EngineProcess(err)) => warn!("mix failed, retrying: {}", err),
            Err(err) => return Err(err.into()),
        }
    }

    let samples = stage.into_sink().finalize()?;
    for producer in producers {
        if producer.join().is_err() {
            warn!("decoder thread panicked");
        }
    }

    println!(
        "{} frames ({:.2}s) written to {}",
        frames_done,
        frames_done as f64 / rate,
        output_path
    );
    debug!("{} samples written", samples);
    Ok(0)
}
