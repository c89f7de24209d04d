mod parser;

use gbin::{decode_tree, reconcile};
use std::io::{self, Read};
use anyhow::{Context, Result};
use structopt::StructOpt;
use std::str::from_utf8;
use tracing::{warn, Level};

/// Decode and print gbin messages
#[derive(StructOpt)]
#[structopt(name = "gdump")]
struct Opt {
    /// read the message as base64 text instead of raw bytes
    #[structopt(short, long)]
    base64: bool,
    /// reconcile the message with a shape such as 'struct { A: string, B: []int }' and print the typed value
    #[structopt(short, long)]
    shape: Option<String>,
    /// log decoding steps to stderr
    #[structopt(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    tracing_subscriber::fmt()
        .with_max_level(if opt.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(io::stderr)
        .init();
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer).context("Failed to read stdin")?;
    if opt.base64 {
        buffer = unbase64(&buffer)?;
    }
    print(&buffer, opt.shape.as_deref())
}

fn unbase64(buffer: &[u8]) -> Result<Vec<u8>> {
    let text = from_utf8(buffer).context("input is not utf-8")?;
    base64::decode(text.trim()).context("input is not valid base64")
}

fn print(buffer: &[u8], shape: Option<&str>) -> Result<()> {
    let (tree, c) = decode_tree(buffer).context("Decoding error")?;
    if c < buffer.len() {
        warn!(trailing = buffer.len() - c, "ignoring bytes after the message");
    }
    println!("{}", &tree);
    if let Some(shape) = shape {
        let shape = parser::parse(shape)?;
        let value = reconcile(&tree, &shape).with_context(|| format!("Cannot reconcile message with {}", shape))?;
        println!("{}", &value);
    }
    Ok(())
}
