use anyhow::{bail, Context, Result};
use bytes::Bytes;
use clap::{Parser, Subcommand};

use sysex_conf::handler::{AccessError, DataHandler};
use sysex_conf::message::{decode, RequestClass};
use sysex_conf::{Block, CustomResponse, ManufacturerId, Section, SysExConf};

#[derive(Parser)]
#[command(name = "sysex-conf", about = "Decode and exercise the SysEx configuration protocol")]
struct Cli {
    /// Manufacturer ID as three hex bytes, e.g. 00:53:43
    #[arg(long, global = true, default_value = "00:53:43")]
    manufacturer: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one hex-encoded request frame and print what it asks for
    Decode {
        /// Frame bytes as hex, e.g. f0005343000001f7
        frame: String,
    },
    /// Feed hex-encoded request frames to a demo engine and print every response
    Demo {
        /// Frames in submission order
        frames: Vec<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let manufacturer = parse_manufacturer(&cli.manufacturer)?;

    match cli.command {
        Command::Decode { frame } => decode_frame(&frame, manufacturer),
        Command::Demo { frames } => run_demo(&frames, manufacturer),
    }
}

fn parse_manufacturer(raw: &str) -> Result<ManufacturerId> {
    let bytes = raw
        .split(':')
        .map(|part| u8::from_str_radix(part, 16).with_context(|| format!("bad ID byte {part:?}")))
        .collect::<Result<Vec<_>>>()?;
    let id: [u8; 3] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("manufacturer ID must be exactly three bytes"))?;
    Ok(ManufacturerId::new(id))
}

fn parse_frame(raw: &str) -> Result<Bytes> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = hex::decode(&cleaned).with_context(|| format!("invalid hex in {raw:?}"))?;
    Ok(Bytes::from(bytes))
}

fn decode_frame(raw: &str, manufacturer: ManufacturerId) -> Result<()> {
    let bytes = parse_frame(raw)?;
    let request = match decode(&bytes, manufacturer) {
        Ok(request) => request,
        Err(error) => bail!("rejected: {error}"),
    };

    println!("part: {:#04x}", request.part);
    match request.class {
        RequestClass::Special(special) => println!("special request: {special}"),
        RequestClass::Unrecognized(id) => println!("custom request candidate: {id:#04x}"),
        RequestClass::Standard(message) => {
            println!(
                "standard request: {:?} {:?} block {} section {}",
                message.wish, message.amount, message.block, message.section
            );
            if !message.payload.is_empty() {
                println!("payload: {}", hex::encode(&message.payload));
            }
        }
    }
    Ok(())
}

/// Parameter store for the demo engine: one block, three sections.
struct DemoStore {
    sections: Vec<Vec<u16>>,
}

impl DemoStore {
    fn new() -> Self {
        Self {
            sections: [10u16, 6, 32]
                .iter()
                .map(|&size| (0..size).collect())
                .collect(),
        }
    }
}

impl DataHandler for DemoStore {
    fn get(&mut self, _block: u8, section: u8, index: u16) -> Result<u16, AccessError> {
        Ok(self.sections[section as usize][index as usize])
    }

    fn set(&mut self, _block: u8, section: u8, index: u16, value: u16) -> Result<(), AccessError> {
        self.sections[section as usize][index as usize] = value;
        Ok(())
    }

    fn custom(
        &mut self,
        _request_id: u16,
        _response: &mut CustomResponse<'_>,
    ) -> Result<(), AccessError> {
        Err(AccessError::NotSupported)
    }

    fn transmit(&mut self, frame: &[u8]) {
        println!("<- {}", hex::encode(frame));
    }
}

fn run_demo(frames: &[String], manufacturer: ManufacturerId) -> Result<()> {
    let mut engine = SysExConf::new(DemoStore::new(), manufacturer);
    engine
        .install_layout(vec![Block::new(vec![
            Section::new(10, 0, 16383).context("section 0")?,
            Section::new(6, 0, 50).context("section 1")?,
            Section::new(32, 0, 16383).context("section 2")?,
        ])])
        .context("demo layout")?;

    for raw in frames {
        let bytes = parse_frame(raw)?;
        println!("-> {}", hex::encode(&bytes));
        engine.handle_message(&bytes);
    }

    println!(
        "connection open: {}, silent: {}",
        engine.is_connection_open(),
        engine.is_silent()
    );
    Ok(())
}
