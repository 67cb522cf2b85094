//! 5G NR Downlink Throughput Calculator
//!
//! Command-line front end for the analytical throughput pipeline.

mod config;
mod report;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use common::ModulationScheme;
use layers::phy::capacity::{area_traffic_capacity, shannon_capacity, spectral_efficiency};
use layers::phy::{select_cqi, select_mcs};
use layers::{LayerError, LinkBudgetInputs, PipelineResult, RadioConfig};

use config::{parse_path_loss_sweep, MimoConfig, ScenarioConfig};

/// 5G NR analytical downlink throughput calculator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Estimate DL application throughput for a link
    Throughput(ThroughputArgs),

    /// Map a linear SNR to spectral efficiency, CQI and MCS
    SpectralEfficiency {
        /// Linear SNR
        #[arg(long)]
        snr: f64,
    },

    /// Information bits per slot for a fixed MCS index
    InfoBits {
        /// MCS index (0-27)
        #[arg(long)]
        mcs_index: u8,
        /// PRBs allocated to the UE
        #[arg(long, default_value = "1")]
        prbs: u32,
        /// Downlink symbols per subcarrier in the slot
        #[arg(long, default_value = "14")]
        symbols: u32,
    },

    /// Shannon capacity B*log2(1+SNR)
    Capacity {
        /// Bandwidth in Hz
        #[arg(long)]
        bandwidth_hz: f64,
        /// Linear SNR
        #[arg(long)]
        snr: f64,
    },

    /// Bits per symbol and power normalization of square M-QAM
    Qam {
        /// Constellation size M (4, 16, 64, 256)
        #[arg(long)]
        m: u32,
    },

    /// Area traffic capacity in bits/s/km^2
    TrafficDensity {
        /// Spectral efficiency in bits/s/Hz/cell
        #[arg(long)]
        spectral_efficiency: f64,
        /// Cells per km^2
        #[arg(long)]
        cell_density: f64,
        /// Bandwidth in Hz
        #[arg(long)]
        bandwidth_hz: f64,
    },
}

#[derive(ClapArgs, Debug)]
struct ThroughputArgs {
    /// Scenario file (.yml, .yaml or .toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// MIMO configuration
    #[arg(long, value_enum)]
    mimo: Option<MimoConfig>,

    /// Bandwidth of operation in MHz
    #[arg(long)]
    bandwidth_mhz: Option<f64>,

    /// Total transmit power in dBm
    #[arg(long)]
    tx_power_dbm: Option<f64>,

    /// Path loss in dB
    #[arg(long)]
    path_loss_db: Option<f64>,

    /// PRB count configured in the gNB
    #[arg(long)]
    prb_count: Option<u32>,

    /// PRBs allocated to the UE
    #[arg(long)]
    prbs_per_ue: Option<u32>,

    /// Numerology (0-4)
    #[arg(long)]
    numerology: Option<u8>,

    /// DL:UL ratio, e.g. "4:1"
    #[arg(long)]
    dl_ul_ratio: Option<String>,

    /// Evaluate several path losses: "start:stop:step" or "a,b,c"
    #[arg(long)]
    sweep_path_loss: Option<String>,

    /// Emit JSON instead of a text report
    #[arg(long)]
    json: bool,
}

impl ThroughputArgs {
    /// Load the scenario file if given and apply command-line overrides
    fn scenario(&self) -> Result<ScenarioConfig> {
        let mut scenario = match &self.config {
            Some(path) => ScenarioConfig::from_file(path)?,
            None => ScenarioConfig::default(),
        };

        if let Some(mimo) = self.mimo {
            scenario.link.mimo = mimo;
        }
        if self.bandwidth_mhz.is_some() {
            scenario.link.bandwidth_mhz = self.bandwidth_mhz;
        }
        if self.tx_power_dbm.is_some() {
            scenario.link.tx_power_dbm = self.tx_power_dbm;
        }
        if self.path_loss_db.is_some() {
            scenario.link.path_loss_db = self.path_loss_db;
        }
        if self.prb_count.is_some() {
            scenario.cell.prb_count = self.prb_count;
        }
        if let Some(prbs) = self.prbs_per_ue {
            scenario.cell.prbs_per_ue = prbs;
        }
        if let Some(mu) = self.numerology {
            scenario.cell.numerology = mu;
        }
        if let Some(ratio) = &self.dl_ul_ratio {
            scenario.traffic.dl_ul_ratio = ratio.clone();
        }

        Ok(scenario)
    }
}

type SweepRow = (f64, std::result::Result<PipelineResult, LayerError>);

/// Evaluate each path loss as an independent run on the blocking pool
async fn run_sweep(link: &LinkBudgetInputs, radio: RadioConfig, path_losses: Vec<f64>) -> Result<Vec<SweepRow>> {
    let radio = Arc::new(radio);

    let handles: Vec<_> = path_losses
        .into_iter()
        .map(|path_loss_db| {
            let mut link = link.clone();
            link.path_loss_db = path_loss_db;
            let radio = radio.clone();
            let handle = tokio::task::spawn_blocking(move || layers::evaluate(&link, &radio));
            (path_loss_db, handle)
        })
        .collect();

    let mut rows = Vec::with_capacity(handles.len());
    for (path_loss_db, handle) in handles {
        rows.push((path_loss_db, handle.await?));
    }
    Ok(rows)
}

async fn run_throughput(args: ThroughputArgs) -> Result<()> {
    let mut scenario = args.scenario()?;

    let sweep = match &args.sweep_path_loss {
        Some(spec) => {
            let values = parse_path_loss_sweep(spec)?;
            // Path loss is supplied per point
            if scenario.link.path_loss_db.is_none() {
                scenario.link.path_loss_db = values.first().copied();
            }
            Some(values)
        }
        None => None,
    };

    let (link, radio) = scenario.resolve()?;
    debug!("Resolved inputs: {:?} {:?}", link, radio);

    match sweep {
        Some(path_losses) => {
            info!("Sweeping {} path loss values", path_losses.len());
            let rows = run_sweep(&link, radio, path_losses).await?;

            if args.json {
                let json: Vec<_> = rows
                    .iter()
                    .map(|(path_loss_db, outcome)| match outcome {
                        Ok(result) => serde_json::json!({ "path_loss_db": path_loss_db, "result": result }),
                        Err(e) => serde_json::json!({ "path_loss_db": path_loss_db, "error": e.to_string() }),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&json)?);
            } else {
                report::print_sweep(&rows);
            }
        }
        None => {
            let result = layers::evaluate(&link, &radio)?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                report::print_pipeline(&link, &radio, &result);
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();

    match args.command {
        Command::Throughput(throughput_args) => run_throughput(throughput_args).await?,

        Command::SpectralEfficiency { snr } => {
            let se = spectral_efficiency(snr)?;
            let cqi = select_cqi(se);
            let mcs = select_mcs(cqi.value.spectral_efficiency);
            println!("Spectral efficiency: {:.4} bits/s/Hz", se);
            println!("CQI index: {}", cqi.value.index);
            println!("Intermediate spectral efficiency: {}", cqi.value.spectral_efficiency);
            println!("Modulation order Qm: {}", mcs.value.modulation_order());
            println!("Code rate R: {}/1024 ({:.4})", mcs.value.code_rate_x1024, mcs.value.code_rate());
            if mcs.clamped {
                println!("Warning: below the lowest MCS, using MCS 0");
            }
        }

        Command::InfoBits { mcs_index, prbs, symbols } => {
            let ninfo = layers::information_bits_per_slot(mcs_index, prbs, symbols)?;
            println!("Information bits per TTI slot: {:.6}", ninfo);
        }

        Command::Capacity { bandwidth_hz, snr } => {
            let capacity = shannon_capacity(bandwidth_hz, snr)?;
            println!("Shannon's capacity: {} bits per second", capacity);
        }

        Command::Qam { m } => {
            let scheme = ModulationScheme::from_constellation_size(m)
                .ok_or_else(|| anyhow!("Unsupported QAM order M={} (use 4, 16, 64 or 256)", m))?;
            println!("{}: {} bits per symbol", scheme, scheme.order());
            println!("Average symbol energy: {}", scheme.average_energy());
            println!("Normalization factor 1/sqrt(E): {}", scheme.normalization_factor());
        }

        Command::TrafficDensity { spectral_efficiency, cell_density, bandwidth_hz } => {
            let density = area_traffic_capacity(spectral_efficiency, cell_density, bandwidth_hz)?;
            println!("Traffic density: {} bits/s/km^2", density);
        }
    }

    Ok(())
}
