use clap::{Arg, ArgAction, Command as ClapCommand};
use log::{error, LevelFilter};
use std::process;

use ifdkit::commands::{CommandFactory, IfdkitCommandFactory};
use ifdkit::config::Config;
use ifdkit::utils::logger::Logger;

fn main() {
    let matches = ClapCommand::new("ifdkit")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Maurice Schilpp")
        .about("Inspect, edit and rewrite the directory structure of TIFF files")
        .arg(
            Arg::new("input")
                .help("Input TIFF file")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .help("Write log records to this file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .help("TOML configuration file")
                .value_name("FILE")
                .required(false),
        )
        .arg(
            Arg::new("rewrite")
                .short('o')
                .long("rewrite")
                .help("Rewrite the file to OUTPUT, relocating all image data")
                .value_name("OUTPUT")
                .required(false),
        )
        .arg(
            Arg::new("byte-order")
                .long("byte-order")
                .help("Byte order of the rewritten file (ii or mm)")
                .value_name("ORDER")
                .required(false),
        )
        .arg(
            Arg::new("edit")
                .short('e')
                .long("edit")
                .help("Apply a TOML edit script")
                .value_name("SCRIPT")
                .required(false),
        )
        .arg(
            Arg::new("set")
                .long("set")
                .help("Set a field on every page, e.g. Software:ascii=ifdkit")
                .value_name("TAG:TYPE=VALUE")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("remove-tag")
                .long("remove-tag")
                .help("Remove a field from every page")
                .value_name("TAG")
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new("remove-page")
                .long("remove-page")
                .help("Remove a page by index")
                .value_name("INDEX")
                .action(ArgAction::Append),
        )
        .get_matches();

    let level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    match matches.get_one::<String>("log-file") {
        Some(log_file) => {
            if let Err(e) = Logger::init_global_logger(log_file, level) {
                eprintln!("Error setting up global logger: {}", e);
                process::exit(1);
            }
        }
        None => {
            env_logger::Builder::new()
                .filter_level(level)
                .parse_default_env()
                .init();
        }
    }

    let config = match matches.get_one::<String>("config") {
        Some(path) => match Config::load(path) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load configuration: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        },
        None => Config::default(),
    };

    let factory = IfdkitCommandFactory::new();

    match factory.create_command(&matches, &config) {
        Ok(command) => {
            if let Err(e) = command.execute() {
                error!("Command execution error: {}", e);
                eprintln!("Error: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            error!("Failed to create command: {}", e);
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
}
