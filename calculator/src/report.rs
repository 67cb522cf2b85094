//! Text reports for the command-line front end

use layers::{LayerError, LinkBudgetInputs, PipelineResult, RadioConfig};

/// Print the step-by-step trace of one evaluation
pub fn print_pipeline(link: &LinkBudgetInputs, radio: &RadioConfig, result: &PipelineResult) {
    println!("\nAnalytical DL Throughput");
    println!("========================");
    println!("Layers: {}", link.num_layers);
    println!("Bandwidth: {} Hz", link.bandwidth_hz);
    println!("Transmit power: {} dBm", link.tx_power_dbm);
    println!("Numerology: {}", radio.numerology);
    println!("PRB count: {} (UE allocation {} PRB)", radio.prb_count, radio.allocation.num_prbs);
    println!("DL:UL ratio: {}", radio.dl_ul_ratio);
    println!("Application / MAC packet: {} / {} bytes", radio.app_packet_bytes, radio.mac_packet_bytes);
    println!("Temperature: {} K\n", link.temperature_k);

    let lb = &result.link_budget;
    println!("Step 1: Large-scale total loss = {} dB", lb.total_loss_db);
    println!("Step 2: Tx power per layer = {:.4} dBm, Rx power = {:.4} dBm",
             lb.tx_power_per_layer_dbm, lb.rx_power_per_layer_dbm);
    println!("Step 3: Thermal noise power = {:e} W", lb.thermal_noise_w);
    println!("Step 4: Rx power = {:e} W, SNR (linear) = {:.4}", lb.rx_power_per_layer_w, lb.snr_linear);
    println!("Step 5: Spectral efficiency = {:.4} b/s/Hz", result.spectral_efficiency);
    println!("Step 6: CQI index = {}, intermediate spectral efficiency = {}",
             result.cqi_index, result.cqi_spectral_efficiency);
    println!("Step 7: MCS index = {}, Qm = {}, R = {}/1024 ({:.4})",
             result.mcs_index, result.modulation_order, result.code_rate_x1024, result.code_rate());
    println!("Step 8: REs available for PDSCH = {}", result.available_res);
    println!("Step 9: Ninfo = {:.4}", result.information_bits);
    println!("Step 10: n = {}, N'info = {}", result.quantization_exponent, result.quantized_information_bits);
    println!("Step 11: TBS = {} bits ({} code block(s))", result.transport_block_size, result.code_blocks);
    println!("Step 12: Bits per PRB across layers = {}", result.bits_per_prb);
    println!("Step 13: PRBs available = {}", result.available_prbs);
    println!("Step 14: Bits per slot = {}", result.bits_per_slot);
    println!("Step 15: DL fraction = {}, slot duration = {} s", result.dl_fraction, result.slot_duration_s);
    println!("DL MAC throughput: {:.3} Mbps", result.dl_mac_throughput_bps / 1e6);
    println!("DL application throughput: {:.3} Mbps", result.application_throughput_bps / 1e6);

    for warning in &result.warnings {
        println!("Warning: {:?}", warning);
    }
}

/// Print one row per sweep point
pub fn print_sweep(rows: &[(f64, Result<PipelineResult, LayerError>)]) {
    println!("{:>10} {:>5} {:>5} {:>8} {:>14}", "PL (dB)", "CQI", "MCS", "TBS", "App (Mbps)");
    for (path_loss_db, outcome) in rows {
        match outcome {
            Ok(result) => println!(
                "{:>10.2} {:>5} {:>5} {:>8} {:>14.3}{}",
                path_loss_db,
                result.cqi_index,
                result.mcs_index,
                result.transport_block_size,
                result.application_throughput_bps / 1e6,
                if result.is_exact() { "" } else { " *" }
            ),
            Err(e) => println!("{:>10.2} error: {}", path_loss_db, e),
        }
    }
}
