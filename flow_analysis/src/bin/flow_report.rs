use clap::{Parser, Subcommand};
use flow_analysis::analyzer::CorridorRequest;
use flow_analysis::data::{load_nodes_csv, AggregationRequest, DateMode, Direction, Period};
use flow_analysis::{AnalysisConfig, FillPolicy, FlowAnalyzer, InMemoryCatalog, InMemorySource};
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(about = "Rank and compare origin/destination flows from CSV extracts")]
struct Args {
    /// CSV with columns id,name,province,kind
    #[arg(long)]
    nodes: PathBuf,

    /// CSV with columns time,origin_id,destination_id,flow,type
    #[arg(long)]
    flows: PathBuf,

    /// Optional JSON config; FLOW_ATLAS_* variables override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Period start (ISO-8601, inclusive)
    #[arg(long)]
    start: String,

    /// Period end (ISO-8601, exclusive)
    #[arg(long)]
    end: String,

    #[arg(long, default_value = "daily")]
    period_type: String,

    #[arg(long)]
    dyna_type: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Flow per province
    ProvinceFlow {
        #[arg(long, default_value = "daily")]
        date_mode: DateMode,
        #[arg(long, default_value = "send")]
        direction: Direction,
    },
    /// Flow per city
    CityFlow {
        #[arg(long, default_value = "daily")]
        date_mode: DateMode,
        #[arg(long, default_value = "send")]
        direction: Direction,
    },
    /// Top province-to-province corridors
    ProvinceCorridor {
        #[arg(long, allow_negative_numbers = true)]
        topk: Option<i64>,
    },
    /// Top city corridors within and across provinces
    CityCorridor {
        #[arg(long, allow_negative_numbers = true)]
        topk_intra: Option<i64>,
        #[arg(long, allow_negative_numbers = true)]
        topk_inter: Option<i64>,
    },
    /// Dense OD tensor over every node
    Tensor {
        #[arg(long)]
        fill: Option<FillPolicy>,
        /// Perturb present cells with the configured noise ratio and seed
        #[arg(long)]
        noisy: bool,
    },
}

fn print_json<T: Serialize>(value: &T) -> flow_analysis::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}

fn run(args: Args) -> flow_analysis::Result<()> {
    let config = AnalysisConfig::load(args.config.as_deref())?;
    let catalog = InMemoryCatalog::new(load_nodes_csv(&args.nodes)?);
    let source = InMemorySource::from_csv(&args.flows)?;
    log::info!(
        "loaded {} nodes and {} flow records",
        catalog.len(),
        source.len()
    );

    let analyzer = FlowAnalyzer::with_config(source, catalog, config);
    let period = Period::parse(&args.start, &args.end)?;

    match args.command {
        Command::ProvinceFlow {
            date_mode,
            direction,
        } => {
            let request = AggregationRequest::new(args.period_type, period)
                .with_date_mode(date_mode)
                .with_direction(direction)
                .with_dyna_type(args.dyna_type);
            print_json(&analyzer.province_flow(&request)?)
        }
        Command::CityFlow {
            date_mode,
            direction,
        } => {
            let request = AggregationRequest::new(args.period_type, period)
                .with_date_mode(date_mode)
                .with_direction(direction)
                .with_dyna_type(args.dyna_type);
            print_json(&analyzer.city_flow(&request)?)
        }
        Command::ProvinceCorridor { topk } => {
            let mut request =
                CorridorRequest::new(args.period_type, period).with_dyna_type(args.dyna_type);
            request.topk = topk;
            print_json(&analyzer.province_corridors(&request)?)
        }
        Command::CityCorridor {
            topk_intra,
            topk_inter,
        } => {
            let mut request =
                CorridorRequest::new(args.period_type, period).with_dyna_type(args.dyna_type);
            request.topk_intra = topk_intra;
            request.topk_inter = topk_inter;
            print_json(&analyzer.city_corridors(&request)?)
        }
        Command::Tensor { fill, noisy } => {
            let dyna_type = args.dyna_type.as_deref();
            let tensor = if noisy {
                analyzer.noisy_od_tensor(&period, dyna_type, fill)?
            } else {
                analyzer.od_tensor(&period, dyna_type, fill)?
            };
            print_json(&tensor)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}
