//! CLI argument definitions for `downmix`.

use clap::{Arg, ArgAction, Command};

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("downmix")
        .version("0.1.0")
        .about("Blend a newcome audio file into a base audio file")
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log stage events to stderr"),
        )
        .subcommand(
            Command::new("mix")
                .about("Mix two audio files and write the result as WAV")
                .arg(
                    Arg::new("BASE")
                        .help("The base (primary) input file")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::new("NEWCOME")
                        .help("The newcome (secondary) input file")
                        .required(true)
                        .index(2),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_name("PATH")
                        .required(true)
                        .help("Where to write the mixed WAV file"),
                )
                .arg(
                    Arg::new("settings")
                        .long("settings")
                        .short('s')
                        .value_name("PATH")
                        .help("JSON settings file (see `downmix create settings-json`)"),
                )
                .arg(
                    Arg::new("frames")
                        .long("frames")
                        .value_name("FRAMES")
                        .help("Frames read from each input per cycle"),
                )
                .arg(
                    Arg::new("secondary-timeout-ms")
                        .long("secondary-timeout-ms")
                        .value_name("MS")
                        .help("How long each newcome read may wait before the stream is dropped"),
                )
                .arg(
                    Arg::new("on-at")
                        .long("on-at")
                        .value_name("SECONDS")
                        .help("Switch the downmix on at this position"),
                )
                .arg(
                    Arg::new("off-at")
                        .long("off-at")
                        .value_name("SECONDS")
                        .help("Switch the downmix off at this position"),
                )
                .arg(
                    Arg::new("gain")
                        .long("gain")
                        .short('g')
                        .value_name("BASE_OFF,BASE_ON,NEWCOME_OFF,NEWCOME_ON")
                        .allow_hyphen_values(true)
                        .help("Four gains in dB, e.g. 0,-6,-40,0"),
                )
                .arg(
                    Arg::new("transition-ms")
                        .long("transition-ms")
                        .value_name("BASE,NEWCOME")
                        .help("Crossfade lengths in milliseconds"),
                )
                .arg(
                    Arg::new("routing")
                        .long("routing")
                        .value_name("ROUTING")
                        .value_parser(["mixed", "base", "newcome"])
                        .help("Which signal to write"),
                )
                .arg(
                    Arg::new("select")
                        .long("select")
                        .value_name("CHANNEL")
                        .value_parser(["left", "right"])
                        .help("Channel of a stereo newcome that feeds a mono base"),
                ),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default JSON payloads")
                .subcommand_required(true)
                .subcommand(
                    Command::new("settings-json").about("Print the default settings JSON"),
                ),
        )
}
