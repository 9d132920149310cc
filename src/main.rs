use clap::{Arg, ArgMatches, Command};
use log::{info, LevelFilter};
use nemo_forcing::data_io::{read_forcing_input, ForcingFileWriter};
use nemo_forcing::partition::partition;
use nemo_forcing::{Calendar, Chunking, ForcingConfig, ForcingError};
use std::path::PathBuf;

fn main() {
    let matches = build_cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    if let Err(e) = run(&matches) {
        eprintln!("Forcing generation error: {}", e);
        std::process::exit(1);
    }
}

fn build_cli() -> Command {
    Command::new("nemo_forcing")
        .version("0.1.0")
        .about("Partition merged GFS/FNL atmospheric fields into NEMO-OPA forcing files")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Merged input netCDF file (single grid, single time axis)")
                .required(true),
        )
        .arg(
            Arg::new("output-dir")
                .short('o')
                .long("output-dir")
                .value_name("DIR")
                .help("Directory for generated forcing files")
                .default_value("."),
        )
        .arg(
            Arg::new("cadence")
                .short('c')
                .long("cadence")
                .value_name("HOURS")
                .help("Hour spacing of the input samples (must divide 24)")
                .default_value("6"),
        )
        .arg(
            Arg::new("chunking")
                .long("chunking")
                .value_name("MODE")
                .help("Calendar periods per output file")
                .value_parser(["yearly", "monthly"])
                .default_value("yearly"),
        )
        .arg(
            Arg::new("calendar")
                .long("calendar")
                .value_name("TAG")
                .help("Model calendar for the output time coordinate")
                .value_parser(["gregorian", "noleap", "all_leap", "360_day", "julian"])
                .default_value("noleap"),
        )
        .arg(
            Arg::new("prefix")
                .long("prefix")
                .value_name("PREFIX")
                .help("Output file name prefix")
                .default_value("drowned_"),
        )
        .arg(
            Arg::new("tag")
                .long("tag")
                .value_name("TAG")
                .help("Dataset tag embedded in output file names")
                .default_value("GFS"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(clap::ArgAction::SetTrue),
        )
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level.to_string()))
        .init();
}

fn run(matches: &ArgMatches) -> Result<(), ForcingError> {
    let input_path = PathBuf::from(matches.get_one::<String>("input").unwrap());
    let cadence_hours: u32 = matches
        .get_one::<String>("cadence")
        .unwrap()
        .parse()
        .map_err(|_| ForcingError::Config("cadence must be an integer hour count".to_string()))?;
    let chunking: Chunking = matches
        .get_one::<String>("chunking")
        .unwrap()
        .parse()
        .map_err(ForcingError::Config)?;
    let calendar: Calendar = matches
        .get_one::<String>("calendar")
        .unwrap()
        .parse()
        .map_err(ForcingError::Config)?;

    let config = ForcingConfig {
        cadence_hours,
        chunking,
        calendar,
        output_dir: PathBuf::from(matches.get_one::<String>("output-dir").unwrap()),
        file_prefix: matches.get_one::<String>("prefix").unwrap().clone(),
        dataset_tag: matches.get_one::<String>("tag").unwrap().clone(),
        ..ForcingConfig::default()
    };
    config.validate()?;

    if !input_path.is_file() {
        return Err(ForcingError::Config(format!(
            "input file does not exist: {}",
            input_path.display()
        )));
    }

    info!(
        "generating {} {} forcing from {}",
        config.chunking,
        config.calendar,
        input_path.display()
    );
    let input = read_forcing_input(&input_path, &config)?;
    let mut sink = ForcingFileWriter::new(&config, input.lat.clone(), input.lon.clone());
    partition(&config, &input.time, &input.series, &mut sink)?;
    info!("forcing files written to {}", config.output_dir.display());
    Ok(())
}
