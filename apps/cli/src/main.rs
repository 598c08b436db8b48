use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use u2c_core::{BridgeConfig, BridgeSession, NusbTransport};

#[derive(Parser, Debug)]
#[command(author, version, about = "CH341 USB-I2C bridge tool", long_about = None)]
struct Args {
    /// Target bus frequency in Hz (mapped to the nearest hardware grade)
    #[arg(long)]
    frequency: Option<u32>,

    /// Bulk transfer timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Load session settings from a TOML file
    #[arg(long)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Probe every bus address and print an address map
    Scan,
    /// Read bytes from a peripheral
    Read {
        /// 7-bit peripheral address (0x-prefixed hex or decimal)
        #[arg(value_parser = parse_addr)]
        address: u8,

        /// Number of bytes to read
        count: usize,

        /// Register to select before reading
        #[arg(long, value_parser = parse_byte)]
        register: Option<u8>,
    },
    /// Write bytes to a peripheral
    Write {
        /// 7-bit peripheral address (0x-prefixed hex or decimal)
        #[arg(value_parser = parse_addr)]
        address: u8,

        /// Bytes to send (0x-prefixed hex or decimal)
        #[arg(required = true, value_parser = parse_byte)]
        data: Vec<u8>,
    },
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => (hex, 16),
        None => (s, 10),
    };
    u8::from_str_radix(digits, radix).map_err(|e| e.to_string())
}

fn parse_addr(s: &str) -> Result<u8, String> {
    let byte = parse_byte(s)?;
    if byte > 0x7F {
        return Err("address exceeds 7 bits".into());
    }
    Ok(byte)
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(if args.verbose {
                    tracing::Level::DEBUG.into()
                } else {
                    tracing::Level::INFO.into()
                })
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let mut config = match &args.config {
        Some(path) => {
            BridgeConfig::load_from_file(path).with_context(|| format!("loading {path}"))?
        }
        None => BridgeConfig::default(),
    };
    if args.frequency.is_some() {
        config.frequency_hz = args.frequency;
    }
    if args.timeout_ms.is_some() {
        config.timeout_ms = args.timeout_ms;
    }

    let transport = NusbTransport::open().context("no CH341 bridge attached")?;
    let mut session = BridgeSession::open(transport, &config)?;
    info!(speed = ?session.speed(), "Session ready");

    match args.command {
        Command::Scan => scan(&mut session),
        Command::Read {
            address,
            count,
            register,
        } => read(&mut session, address, count, register),
        Command::Write { address, data } => write(&mut session, address, &data),
    }
}

/// Print an i2cdetect-style address map.
fn scan(session: &mut BridgeSession<NusbTransport>) -> anyhow::Result<()> {
    println!("     0  1  2  3  4  5  6  7  8  9  a  b  c  d  e  f");
    print!("00:          ");
    for address in 0x03..=0x77u8 {
        match session.probe(address) {
            Ok(true) => print!("{address:02x}"),
            Ok(false) => print!("--"),
            Err(_) => print!("EE"),
        }
        if address & 0x0f == 0x0f {
            println!();
            print!("{:02x}: ", address + 1);
        } else {
            print!(" ");
        }
    }
    println!();
    Ok(())
}

fn read(
    session: &mut BridgeSession<NusbTransport>,
    address: u8,
    count: usize,
    register: Option<u8>,
) -> anyhow::Result<()> {
    let mut buf = vec![0u8; count];
    match register {
        Some(reg) => session.write_read(address, &[reg], &mut buf)?,
        None => session.read(address, &mut buf)?,
    }

    for chunk in buf.chunks(16) {
        let line: Vec<String> = chunk.iter().map(|b| format!("{b:02x}")).collect();
        println!("{}", line.join(" "));
    }
    Ok(())
}

fn write(
    session: &mut BridgeSession<NusbTransport>,
    address: u8,
    data: &[u8],
) -> anyhow::Result<()> {
    session.write(address, data)?;
    info!(
        address = %format!("0x{:02X}", address),
        bytes = data.len(),
        "Write complete"
    );
    Ok(())
}
