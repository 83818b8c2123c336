//! Command-line front end for the evidence SDK: collect reports, read
//! measurements, list and replay the measured-boot log.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Parser, Subcommand};
use evidence_agent::{build_attester, Config};
use evidence_api::{CcType, EvidenceError, TcgAlgorithmId, TcgEventLogEntry};
use std::path::PathBuf;
use tcg_eventlog::replay_event_log;

#[derive(Parser)]
#[clap(author, version, about = "Confidential-computing evidence tool", long_about = None)]
struct Cli {
    /// Configuration file (YAML); defaults apply when absent.
    #[clap(short, long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the detected confidential-computing platform
    Detect,

    /// Show the platform's default digest algorithm
    Algorithm,

    /// Retrieve an attestation report
    Report {
        /// Freshness nonce, base64 encoded
        #[clap(short, long)]
        nonce: Option<String>,

        /// Caller data bound into the report, base64 encoded
        #[clap(short, long)]
        user_data: Option<String>,

        /// Backend-specific parameters as a JSON object
        #[clap(short, long)]
        extra_args: Option<String>,

        /// Write the raw report to a file instead of printing base64
        #[clap(short, long)]
        out: Option<PathBuf>,

        /// Dump the report fields after collection
        #[clap(short, long)]
        dump: bool,
    },

    /// Dump a previously collected report file
    Dump {
        /// Raw report file
        #[clap(short, long)]
        file: PathBuf,
    },

    /// Read measurement registers
    Measurement {
        /// Register index; all registers when omitted
        #[clap(short, long)]
        index: Option<u32>,

        /// Digest algorithm name, the platform default when omitted
        #[clap(short, long)]
        algorithm: Option<String>,
    },

    /// List measured-boot events
    Eventlog {
        /// First event index
        #[clap(short, long)]
        start: Option<u32>,

        /// Number of events
        #[clap(short, long)]
        count: Option<u32>,

        /// Print events as JSON
        #[clap(short, long)]
        json: bool,
    },

    /// Replay the measured-boot log into expected register values
    Replay {
        /// First event index
        #[clap(short, long)]
        start: Option<u32>,

        /// Number of events
        #[clap(short, long)]
        count: Option<u32>,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), EvidenceError> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    )
    .init();

    match &cli.command {
        Command::Detect => {
            let cc_type = CcType::detect();
            println!("{} ({})", cc_type, cc_type.to_raw());
            Ok(())
        }
        Command::Algorithm => {
            let algorithm = build_attester(&config)?.get_default_algorithm()?;
            println!("{}", algorithm.name);
            Ok(())
        }
        Command::Report {
            nonce,
            user_data,
            extra_args,
            out,
            dump,
        } => report(&config, nonce, user_data, extra_args, out, *dump),
        Command::Dump { file } => {
            let report = std::fs::read(file).map_err(|e| {
                EvidenceError::InputError(format!("Failed to read {}: {}", file.display(), e))
            })?;
            build_attester(&config)?.dump_cc_report(&report)
        }
        Command::Measurement { index, algorithm } => measurement(&config, index, algorithm),
        Command::Eventlog { start, count, json } => {
            let events = build_attester(&config)?.get_cc_eventlog(*start, *count)?;
            if *json {
                let rendered = serde_json::to_string_pretty(&events).map_err(|e| {
                    EvidenceError::InternalError(format!("Failed to serialize events: {}", e))
                })?;
                println!("{}", rendered);
            } else {
                print_events(&events);
            }
            Ok(())
        }
        Command::Replay { start, count } => {
            let events = build_attester(&config)?.get_cc_eventlog(*start, *count)?;
            let replay = replay_event_log(&events);
            for (register_index, banks) in replay.registers() {
                for (algo_id, bank) in banks {
                    match bank {
                        Ok(value) => println!(
                            "register {:2} [{}] {}",
                            register_index,
                            algo_id.digest_name(),
                            hex::encode(value)
                        ),
                        Err(e) => println!(
                            "register {:2} [{}] replay failed: {}",
                            register_index,
                            algo_id.digest_name(),
                            e
                        ),
                    }
                }
            }
            Ok(())
        }
    }
}

fn decode_base64_arg(value: &Option<String>, what: &str) -> Result<Option<Vec<u8>>, EvidenceError> {
    value
        .as_ref()
        .map(|encoded| {
            BASE64
                .decode(encoded)
                .map_err(|e| EvidenceError::InputError(format!("{} is not base64: {}", what, e)))
        })
        .transpose()
}

fn report(
    config: &Config,
    nonce: &Option<String>,
    user_data: &Option<String>,
    extra_args: &Option<String>,
    out: &Option<PathBuf>,
    dump: bool,
) -> Result<(), EvidenceError> {
    let nonce = decode_base64_arg(nonce, "nonce")?;
    let user_data = decode_base64_arg(user_data, "user data")?;
    let extra_args = extra_args
        .as_ref()
        .map(|raw| {
            serde_json::from_str::<serde_json::Value>(raw).map_err(|e| {
                EvidenceError::InputError(format!("extra arguments are not valid JSON: {}", e))
            })
        })
        .transpose()?;

    let attester = build_attester(config)?;
    let report = attester.get_cc_report(
        nonce.as_deref(),
        user_data.as_deref(),
        extra_args.as_ref(),
    )?;

    println!("Platform: {}", report.cc_type);
    match out {
        Some(path) => {
            std::fs::write(path, &report.report).map_err(|e| {
                EvidenceError::InternalError(format!(
                    "Failed to write report to {}: {}",
                    path.display(),
                    e
                ))
            })?;
            println!("Report written to {} ({} bytes)", path.display(), report.report.len());
        }
        None => println!("{}", BASE64.encode(&report.report)),
    }

    if dump {
        attester.dump_cc_report(&report.report)?;
    }
    Ok(())
}

fn measurement(
    config: &Config,
    index: &Option<u32>,
    algorithm: &Option<String>,
) -> Result<(), EvidenceError> {
    let attester = build_attester(config)?;

    let algo_id = match algorithm {
        Some(name) => TcgAlgorithmId::from_name(name)?,
        None => attester.get_default_algorithm()?.algo_id,
    };

    match index {
        Some(index) => {
            let digest = attester.get_cc_measurement(*index, algo_id)?;
            println!("register {:2} [{}] {}", index, algo_id.digest_name(), digest.hash_hex());
        }
        None => {
            let count = attester.get_measurement_count()?;
            println!("{} measurement registers", count);
            for index in 0..count as u32 {
                let digest = attester.get_cc_measurement(index, algo_id)?;
                println!("register {:2} [{}] {}", index, algo_id.digest_name(), digest.hash_hex());
            }
        }
    }
    Ok(())
}

fn print_events(events: &[TcgEventLogEntry]) {
    for event in events {
        println!(
            "event {:4}  register {:2}  {}",
            event.event_number, event.register_index, event.event_type
        );
        for digest in &event.digests {
            println!("    {} {}", digest.algo_id.digest_name(), digest.hash_hex());
        }
    }
}
