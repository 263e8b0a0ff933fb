use anyhow::Context;
use clap::{Parser, Subcommand};
use lora_sx127x::lorawan::{decode_uplink, encode_uplink, Region};
use lora_sx127x::util::{format_hex_compact, parse_hex_lenient};
use lora_sx127x::{init_logger, log_info, AppConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "lora-cli")]
#[command(about = "CLI tool for SX127x LoRa radios and LoRaWAN uplinks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the channel plan of a region
    Channels { region: String },
    /// Print a configuration file with every default filled in
    DefaultConfig,
    /// Encode a LoRaWAN uplink and print it as hex
    Encode {
        #[arg(short, long)]
        config: PathBuf,
        /// Frame counter (defaults to the session's counter)
        #[arg(short, long)]
        fcnt: Option<u16>,
        text: String,
    },
    /// Decode and decrypt a LoRaWAN uplink given as hex
    Decode {
        #[arg(short, long)]
        config: PathBuf,
        hex: String,
    },
    /// Send uplinks on the jittered schedule and print anything received in between
    #[cfg(feature = "raspberry-pi")]
    Send {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many uplinks
        #[arg(short = 'n', long)]
        count: Option<u32>,
        text: String,
    },
    /// Receive continuously and print every packet
    #[cfg(feature = "raspberry-pi")]
    Listen {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Print all radio registers
    #[cfg(feature = "raspberry-pi")]
    Dump {
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    init_logger();

    let cli = Cli::parse();

    match cli.command {
        Commands::Channels { region } => {
            let region: Region = region.parse()?;
            println!("{region}");
            for (index, channel) in region.channels().iter().enumerate() {
                println!(
                    "  {index}: {:>7.1} MHz  FRF {}",
                    channel.frequency_hz as f64 / 1e6,
                    format_hex_compact(&channel.frf)
                );
            }
        }
        Commands::DefaultConfig => {
            println!("{}", AppConfig::default().to_json_pretty()?);
        }
        Commands::Encode { config, fcnt, text } => {
            let session = AppConfig::from_file(&config)?.session()?;
            let fcnt = fcnt.unwrap_or(session.frame_counter());
            let frame = encode_uplink(&session, text.as_bytes(), fcnt)?;
            println!("{}", hex::encode(&frame));
        }
        Commands::Decode { config, hex } => {
            let session = AppConfig::from_file(&config)?.session()?;
            let phy = parse_hex_lenient(&hex).context("invalid frame hex")?;
            let frame = decode_uplink(&session, &phy)?;
            println!("DevAddr: {}", frame.dev_addr);
            println!("FCnt:    {}", frame.fcnt);
            match frame.fport {
                Some(fport) => println!("FPort:   {fport}"),
                None => println!("FPort:   -"),
            }
            println!("Payload: {}", format_hex_compact(&frame.payload));
            println!("Text:    {}", String::from_utf8_lossy(&frame.payload));
            println!("MIC:     {}", frame.mic);
        }
        #[cfg(feature = "raspberry-pi")]
        Commands::Send {
            config,
            count,
            text,
        } => pi::send(&AppConfig::from_file(&config)?, count, &text)?,
        #[cfg(feature = "raspberry-pi")]
        Commands::Listen { config } => pi::listen(&AppConfig::from_file(&config)?)?,
        #[cfg(feature = "raspberry-pi")]
        Commands::Dump { config } => pi::dump(&AppConfig::from_file(&config)?)?,
    }

    log_info("Done");
    Ok(())
}

#[cfg(feature = "raspberry-pi")]
mod pi {
    use lora_sx127x::radio::hal::RaspberryPiHal;
    use lora_sx127x::util::{format_hex_compact, format_register_dump};
    use lora_sx127x::{AppConfig, SendScheduler, Sx127xDriver};
    use std::thread;
    use std::time::{Duration, Instant};

    const LOOP_SLEEP: Duration = Duration::from_millis(5);

    fn open_hal(config: &AppConfig) -> anyhow::Result<RaspberryPiHal> {
        let device = config.device.clone().unwrap_or_default();
        Ok(RaspberryPiHal::new(&device.gpio_pins())?)
    }

    fn print_packet(payload: &[u8]) {
        println!(
            "RX {} bytes: {} \"{}\"",
            payload.len(),
            format_hex_compact(payload),
            String::from_utf8_lossy(payload)
        );
    }

    pub fn send(config: &AppConfig, count: Option<u32>, text: &str) -> anyhow::Result<()> {
        let hal = open_hal(config)?;
        let has_led = config.device.as_ref().is_some_and(|d| d.led.is_some());
        let mut driver = Sx127xDriver::new_lorawan(hal, config.radio.clone(), config.session()?)?;
        driver.on_receive(Some(Box::new(print_packet)))?;

        let mut scheduler = SendScheduler::new(config.schedule);
        let epoch = Instant::now();
        let mut sent = 0;

        while count.map_or(true, |limit| sent < limit) {
            if scheduler.due(epoch.elapsed().as_millis() as u64) {
                let fcnt = driver.send_next(text.as_bytes())?;
                println!("TX FCnt {fcnt}, next in {} ms", scheduler.interval_ms());
                if has_led {
                    driver.blink_led(1, 50, 0)?;
                }
                driver.receive(0)?;
                sent += 1;
            }
            driver.service_interrupt();
            thread::sleep(LOOP_SLEEP);
        }
        Ok(())
    }

    pub fn listen(config: &AppConfig) -> anyhow::Result<()> {
        let hal = open_hal(config)?;
        let mut driver = Sx127xDriver::new(hal, config.radio.clone())?;
        driver.on_receive(Some(Box::new(|payload: &[u8]| print_packet(payload))))?;
        driver.receive(0)?;

        loop {
            if driver.service_interrupt() {
                println!(
                    "   RSSI {} dBm, SNR {:.2} dB",
                    driver.packet_rssi()?,
                    driver.packet_snr()?
                );
            }
            thread::sleep(LOOP_SLEEP);
        }
    }

    pub fn dump(config: &AppConfig) -> anyhow::Result<()> {
        let hal = open_hal(config)?;
        let mut driver = Sx127xDriver::new(hal, config.radio.clone())?;
        println!("{}", format_register_dump(&driver.dump_registers()?));
        Ok(())
    }
}
