// Command-line interface for smcodec.
//
// Subcommands cover the file compressor (`compress`/`decompress`), text-level
// encoding (`encode`/`decode`/`table`), the TCP pair (`serve`/`send`) and the
// ratio harness (`compare`).

use std::fs;
use std::io::{self, Read, Write};
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueHint};

use crate::compare;
use crate::huffman::{self, Bits, EncodeOptions, EncodedStream, HeaderFormat, ReservedPrefix};
use crate::io::{self as fileio, FileOptions, SMC_EXTENSION};
use crate::net::{
    self, DEFAULT_ADDR, DEFAULT_MAX_MESSAGE_BYTES, DEFAULT_READ_TIMEOUT, Server, ServerConfig,
};

fn parse_reserved(s: &str) -> Result<ReservedPrefix, String> {
    s.parse().map_err(|e| format!("invalid reserved prefix '{s}': {e}"))
}

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Self-describing Huffman codec.
#[derive(Parser, Debug)]
#[command(
    name = "smcodec",
    version,
    about = "Self-describing Huffman encoder/decoder",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Force overwrite existing output files.
    #[arg(short = 'f', long, global = true)]
    force: bool,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Verbose mode (use multiple times for more detail).
    #[arg(short = 'v', long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Output stats as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Compress a file to <file>.smc.
    Compress(FileArgs),
    /// Decompress a .smc file.
    Decompress(FileArgs),
    /// Encode a message and print the bit string.
    Encode(MessageArgs),
    /// Decode a bit string and print the message.
    Decode(MessageArgs),
    /// Print the code table built for a message.
    Table(MessageArgs),
    /// Receive encoded messages over TCP.
    Serve(ServeArgs),
    /// Send an encoded message over TCP.
    Send(SendArgs),
    /// Compare compression ratios line by line against gzip, LZMA and zstd.
    Compare(CompareArgs),
    /// Print build/configuration details.
    Config,
}

#[derive(Args, Debug)]
struct CodecArgs {
    /// Bit prefix no generated code may start with (e.g. "11").
    #[arg(long = "reserve", value_name = "BITS", value_parser = parse_reserved)]
    reserve: Option<ReservedPrefix>,

    /// Width of the header's symbol field.
    #[arg(long = "symbol-bits", value_parser = clap::value_parser!(u8).range(1..=16), default_value_t = huffman::header::DEFAULT_SYMBOL_BITS)]
    symbol_bits: u8,

    /// Do not reserve a code path for byte padding.
    #[arg(long = "no-escape")]
    no_escape: bool,
}

#[derive(Args, Debug)]
struct FileArgs {
    /// Input file.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,

    /// Output file (default derived from the input name).
    #[arg(value_hint = ValueHint::FilePath)]
    output: Option<PathBuf>,

    #[command(flatten)]
    codec: CodecArgs,
}

#[derive(Args, Debug)]
struct MessageArgs {
    /// Read the message from a file instead.
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "message")]
    input: Option<PathBuf>,

    /// Treat the message as a bit string cut into 7-bit symbols.
    #[arg(long)]
    realign: bool,

    #[command(flatten)]
    codec: CodecArgs,

    /// Message text (default: stdin).
    message: Option<String>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Largest accepted payload in bytes.
    #[arg(long = "max-bytes", default_value_t = DEFAULT_MAX_MESSAGE_BYTES)]
    max_message_bytes: usize,

    /// Stop after this many messages (0 = run forever).
    #[arg(long, default_value_t = 0)]
    count: usize,

    /// Seconds to wait on an idle peer before decoding what it sent (0 = wait for close).
    #[arg(long = "read-timeout", default_value_t = DEFAULT_READ_TIMEOUT.as_secs())]
    read_timeout_secs: u64,

    #[command(flatten)]
    codec: CodecArgs,
}

#[derive(Args, Debug)]
struct SendArgs {
    /// Server address.
    #[arg(long, default_value = DEFAULT_ADDR)]
    addr: String,

    /// Read the message from a file instead.
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with = "message")]
    input: Option<PathBuf>,

    #[command(flatten)]
    codec: CodecArgs,

    /// Message text (default: stdin).
    message: Option<String>,
}

#[derive(Args, Debug)]
struct CompareArgs {
    /// Text file to measure, one message per line.
    #[arg(value_hint = ValueHint::FilePath)]
    input: PathBuf,
}

// ---------------------------------------------------------------------------
// Resolved command + options (flattened from Cli)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Compress,
    Decompress,
    Encode,
    Decode,
    Table,
    Serve,
    Send,
    Compare,
    Config,
}

#[derive(Debug)]
struct Options {
    command: Command,
    force: bool,
    quiet: bool,
    verbose: u8,
    json_output: bool,
    input_file: Option<PathBuf>,
    output_file: Option<PathBuf>,
    message: Option<String>,
    realign: bool,
    reserve: Option<ReservedPrefix>,
    symbol_bits: u8,
    padding_escape: bool,
    addr: String,
    max_message_bytes: usize,
    count: usize,
    read_timeout: Option<Duration>,
}

impl Options {
    fn base(command: Command, cli: &Cli) -> Self {
        Self {
            command,
            force: cli.force,
            quiet: cli.quiet,
            verbose: cli.verbose.min(2),
            json_output: cli.json_output,
            input_file: None,
            output_file: None,
            message: None,
            realign: false,
            reserve: None,
            symbol_bits: huffman::header::DEFAULT_SYMBOL_BITS,
            padding_escape: true,
            addr: DEFAULT_ADDR.to_string(),
            max_message_bytes: DEFAULT_MAX_MESSAGE_BYTES,
            count: 0,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
        }
    }

    fn with_codec(mut self, codec: CodecArgs) -> Self {
        self.reserve = codec.reserve;
        self.symbol_bits = codec.symbol_bits;
        self.padding_escape = !codec.no_escape;
        self
    }

    fn header(&self) -> HeaderFormat {
        HeaderFormat::new(self.symbol_bits).unwrap_or_default()
    }

    fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            reserved_prefix: self.reserve.clone(),
            header: self.header(),
            padding_escape: self.padding_escape,
        }
    }

    fn file_options(&self) -> FileOptions {
        FileOptions {
            encode: self.encode_options(),
            force: self.force,
        }
    }
}

fn resolve_options(cli: Cli) -> Options {
    let command = match &cli.command {
        Cmd::Compress(_) => Command::Compress,
        Cmd::Decompress(_) => Command::Decompress,
        Cmd::Encode(_) => Command::Encode,
        Cmd::Decode(_) => Command::Decode,
        Cmd::Table(_) => Command::Table,
        Cmd::Serve(_) => Command::Serve,
        Cmd::Send(_) => Command::Send,
        Cmd::Compare(_) => Command::Compare,
        Cmd::Config => Command::Config,
    };
    let base = Options::base(command, &cli);

    match cli.command {
        Cmd::Compress(args) | Cmd::Decompress(args) => Options {
            input_file: Some(args.input),
            output_file: args.output,
            ..base
        }
        .with_codec(args.codec),
        Cmd::Encode(args) | Cmd::Decode(args) | Cmd::Table(args) => Options {
            input_file: args.input,
            message: args.message,
            realign: args.realign,
            ..base
        }
        .with_codec(args.codec),
        Cmd::Serve(args) => Options {
            addr: args.addr,
            max_message_bytes: args.max_message_bytes,
            count: args.count,
            read_timeout: (args.read_timeout_secs > 0)
                .then(|| Duration::from_secs(args.read_timeout_secs)),
            ..base
        }
        .with_codec(args.codec),
        Cmd::Send(args) => Options {
            addr: args.addr,
            input_file: args.input,
            message: args.message,
            ..base
        }
        .with_codec(args.codec),
        Cmd::Compare(args) => Options {
            input_file: Some(args.input),
            ..base
        },
        Cmd::Config => base,
    }
}

#[cfg(any(test, feature = "fuzzing"))]
pub fn fuzz_try_parse_args(args: &[String]) {
    let argv: Vec<String> = std::iter::once("smcodec".to_string())
        .chain(args.iter().cloned())
        .collect();
    if let Ok(cli) = Cli::try_parse_from(argv) {
        let opts = resolve_options(cli);
        let _ = opts.encode_options();
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn emit_json(value: serde_json::Value) {
    eprintln!("{value:#}");
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Message from `--input`, the positional argument or stdin, in that order.
fn read_message(opts: &Options) -> Result<Vec<u8>, String> {
    if let Some(path) = &opts.input_file {
        return fs::read(path).map_err(|e| format!("input file: {}: {e}", path.display()));
    }
    if let Some(message) = &opts.message {
        return Ok(message.clone().into_bytes());
    }
    let mut buf = Vec::new();
    io::stdin()
        .read_to_end(&mut buf)
        .map_err(|e| format!("stdin: {e}"))?;
    Ok(buf)
}

/// Same as `read_message`, parsed as a `0`/`1` bit string.
fn read_bits(opts: &Options) -> Result<Bits, String> {
    let raw = read_message(opts)?;
    let text = String::from_utf8_lossy(&raw);
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    compact.parse().map_err(|e| format!("bit string: {e}"))
}

fn encode_message(opts: &Options) -> Result<EncodedStream, String> {
    let encode_opts = EncodeOptions {
        padding_escape: false,
        ..opts.encode_options()
    };
    let result = if opts.realign {
        huffman::encode_realigned(&read_bits(opts)?, &encode_opts)
    } else {
        huffman::encode(&read_message(opts)?, &encode_opts)
    };
    result.map_err(|e| format!("encode error: {e}"))
}

fn write_stdout(data: &[u8]) -> i32 {
    let mut out = io::stdout().lock();
    if let Err(e) = out.write_all(data).and_then(|()| out.flush()) {
        eprintln!("smcodec: write error: {e}");
        return 1;
    }
    0
}

// ---------------------------------------------------------------------------
// Config command
// ---------------------------------------------------------------------------

fn cmd_config() -> i32 {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!("smcodec version {version} (Rust)");

    let gzip = cfg!(feature = "gzip-compare") as u8;
    let lzma = cfg!(feature = "lzma-compare") as u8;
    let zstd = cfg!(feature = "zstd-compare") as u8;
    let file_io = cfg!(feature = "file-io") as u8;
    let parallel = cfg!(feature = "parallel") as u8;

    eprintln!("COMPARE_GZIP={gzip}");
    eprintln!("COMPARE_LZMA={lzma}");
    eprintln!("COMPARE_ZSTD={zstd}");
    eprintln!("FILE_IO={file_io}");
    eprintln!("PARALLEL={parallel}");
    eprintln!("EXTENSION=.{SMC_EXTENSION}");
    eprintln!("MAX_CODE_LEN={}", huffman::MAX_CODE_LEN);
    eprintln!("HEADER_LEN_BITS={}", huffman::header::HEADER_LEN_BITS);
    eprintln!("DEFAULT_SYMBOL_BITS={}", huffman::header::DEFAULT_SYMBOL_BITS);
    eprintln!("REALIGN_WIDTH={}", huffman::frequency::REALIGN_WIDTH);
    eprintln!("DEFAULT_ADDR={DEFAULT_ADDR}");
    eprintln!("DEFAULT_MAX_MESSAGE_BYTES={DEFAULT_MAX_MESSAGE_BYTES}");

    0
}

// ---------------------------------------------------------------------------
// Compress / decompress commands
// ---------------------------------------------------------------------------

fn cmd_compress(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("smcodec: no input file");
        return 1;
    };
    let stats = match fileio::compress_file(input, opts.output_file.as_deref(), &opts.file_options()) {
        Ok(stats) => stats,
        Err(fileio::IoError::OutputExists { path }) => {
            eprintln!(
                "smcodec: output file exists, use -f to overwrite: {}",
                path.display()
            );
            return 1;
        }
        Err(e) => {
            eprintln!("smcodec: {}: {e}", input.display());
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "smcodec: compressed {} -> {}: {} -> {} bytes, {} symbols",
            input.display(),
            stats.output_path.display(),
            stats.input_size,
            stats.output_size,
            stats.symbols
        );
    }

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "compress",
            "output": stats.output_path.display().to_string(),
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "symbols": stats.symbols,
            "header_bits": stats.header_bits,
            "payload_bits": stats.payload_bits,
            "input_sha256": stats.input_sha256.map(|d| hex(&d)),
        }));
    }

    0
}

fn cmd_decompress(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("smcodec: no input file");
        return 1;
    };
    let stats =
        match fileio::decompress_file(input, opts.output_file.as_deref(), &opts.file_options()) {
            Ok(stats) => stats,
            Err(fileio::IoError::WrongExtension { path }) => {
                eprintln!(
                    "smcodec: {}: not a .{SMC_EXTENSION} file, use -f to decompress anyway",
                    path.display()
                );
                return 1;
            }
            Err(fileio::IoError::OutputExists { path }) => {
                eprintln!(
                    "smcodec: output file exists, use -f to overwrite: {}",
                    path.display()
                );
                return 1;
            }
            Err(e) => {
                eprintln!("smcodec: {}: {e}", input.display());
                return 1;
            }
        };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "smcodec: decompressed {} -> {}: {} -> {} bytes",
            input.display(),
            stats.output_path.display(),
            stats.input_size,
            stats.output_size
        );
    }

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "decompress",
            "output": stats.output_path.display().to_string(),
            "input_size": stats.input_size,
            "output_size": stats.output_size,
            "output_sha256": stats.output_sha256.map(|d| hex(&d)),
        }));
    }

    0
}

// ---------------------------------------------------------------------------
// Encode / decode / table commands
// ---------------------------------------------------------------------------

fn cmd_encode(opts: &Options) -> i32 {
    let stream = match encode_message(opts) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("smcodec: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "smcodec: encoder: {} symbols, header {} bits, payload {} bits",
            stream.symbol_count(),
            stream.header_bit_len(),
            stream.payload_bit_len()
        );
    }

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "encode",
            "symbols": stream.symbol_count(),
            "distinct_symbols": stream.table().len(),
            "header_bits": stream.header_bit_len(),
            "payload_bits": stream.payload_bit_len(),
            "total_bits": stream.bit_len(),
            "realign": opts.realign,
        }));
    }

    write_stdout(format!("{}\n", stream.bits()).as_bytes())
}

fn cmd_decode(opts: &Options) -> i32 {
    let bits = match read_bits(opts) {
        Ok(bits) => bits,
        Err(e) => {
            eprintln!("smcodec: {e}");
            return 1;
        }
    };

    let output = if opts.realign {
        huffman::decode_realigned_with(&bits, opts.header()).map(|b| format!("{b}\n").into_bytes())
    } else {
        huffman::decode_with(&bits, opts.header()).and_then(|symbols| {
            symbols
                .into_iter()
                .map(|symbol| {
                    u8::try_from(symbol)
                        .map_err(|_| huffman::DecodeError::SymbolOutOfRange { symbol, bits: 8 })
                })
                .collect::<Result<Vec<u8>, _>>()
        })
    };
    let output = match output {
        Ok(output) => output,
        Err(e) => {
            eprintln!("smcodec: decode error: {e}");
            return 1;
        }
    };

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "decode",
            "input_bits": bits.len(),
            "output_size": output.len(),
        }));
    }

    write_stdout(&output)
}

fn cmd_table(opts: &Options) -> i32 {
    let stream = match encode_message(opts) {
        Ok(stream) => stream,
        Err(e) => {
            eprintln!("smcodec: {e}");
            return 1;
        }
    };

    let mut out = String::new();
    for (symbol, code) in stream.table().iter() {
        let shown = match u8::try_from(symbol) {
            Ok(b) if b.is_ascii_graphic() => format!("{:?}", b as char),
            _ => format!("0x{symbol:02x}"),
        };
        out.push_str(&format!("{shown:>6}  {:>2}  {code}\n", code.len()));
    }

    if opts.json_output {
        let entries: Vec<serde_json::Value> = stream
            .table()
            .iter()
            .map(|(symbol, code)| serde_json::json!({ "symbol": symbol, "code": code.to_string() }))
            .collect();
        emit_json(serde_json::json!({ "command": "table", "entries": entries }));
    }

    write_stdout(out.as_bytes())
}

// ---------------------------------------------------------------------------
// Network commands
// ---------------------------------------------------------------------------

fn cmd_serve(opts: &Options) -> i32 {
    let config = ServerConfig {
        addr: opts.addr.clone(),
        max_message_bytes: opts.max_message_bytes,
        header: opts.header(),
        read_timeout: opts.read_timeout,
    };
    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            eprintln!("smcodec: bind {}: {e}", opts.addr);
            return 1;
        }
    };
    if !opts.quiet {
        match server.local_addr() {
            Ok(addr) => eprintln!("smcodec: listening on {addr}"),
            Err(e) => eprintln!("smcodec: listening (address unknown: {e})"),
        }
    }

    let mut received = 0usize;
    let result = server.run(|msg| {
        received += 1;
        match &msg.message {
            Some(message) => {
                let mut line = message.clone();
                line.push(b'\n');
                write_stdout(&line);
            }
            None if !opts.quiet => eprintln!("smcodec: {} sent an empty payload", msg.peer),
            None => {}
        }
        if opts.json_output {
            emit_json(serde_json::json!({
                "command": "serve",
                "peer": msg.peer.to_string(),
                "payload_bytes": msg.payload_bytes,
                "message_bytes": msg.message.as_ref().map(Vec::len),
            }));
        }
        if opts.count > 0 && received >= opts.count {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    if let Err(e) = result {
        eprintln!("smcodec: server error: {e}");
        return 1;
    }
    0
}

fn cmd_send(opts: &Options) -> i32 {
    let message = match read_message(opts) {
        Ok(message) => message,
        Err(e) => {
            eprintln!("smcodec: {e}");
            return 1;
        }
    };
    let sent = match net::send_message(opts.addr.as_str(), &message, &opts.encode_options()) {
        Ok(sent) => sent,
        Err(e) => {
            eprintln!("smcodec: send to {}: {e}", opts.addr);
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        eprintln!(
            "smcodec: sent {} message bytes as {sent} bytes to {}",
            message.len(),
            opts.addr
        );
    }
    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "send",
            "message_bytes": message.len(),
            "sent_bytes": sent,
        }));
    }
    0
}

// ---------------------------------------------------------------------------
// Compare command
// ---------------------------------------------------------------------------

fn format_ratio(ratio: Option<f64>) -> String {
    ratio.map_or_else(|| "n/a".to_string(), |r| format!("{r:.4}"))
}

fn cmd_compare(opts: &Options) -> i32 {
    let Some(input) = &opts.input_file else {
        eprintln!("smcodec: no input file");
        return 1;
    };
    let text = match fs::read(input) {
        Ok(data) => String::from_utf8_lossy(&data).into_owned(),
        Err(e) => {
            eprintln!("smcodec: input file: {}: {e}", input.display());
            return 1;
        }
    };
    let reports = match compare::compare_lines(&text) {
        Ok(reports) => reports,
        Err(e) => {
            eprintln!("smcodec: compare error: {e}");
            return 1;
        }
    };

    if opts.verbose > 0 && !opts.quiet {
        for (i, r) in reports.iter().enumerate() {
            eprintln!(
                "smcodec: line {}: {} bits, huffman {}, gzip {}, lzma {}, zstd {}",
                i + 1,
                r.original_bits,
                format_ratio(Some(r.huffman_ratio)),
                format_ratio(r.gzip_ratio),
                format_ratio(r.lzma_ratio),
                format_ratio(r.zstd_ratio)
            );
        }
    }

    let Some(summary) = compare::summarize(&reports) else {
        eprintln!("smcodec: {}: no non-empty ASCII lines", input.display());
        return 1;
    };

    if opts.json_output {
        emit_json(serde_json::json!({
            "command": "compare",
            "messages": summary.messages,
            "original_bits": summary.original_bits,
            "huffman_ratio": summary.mean_huffman_ratio,
            "gzip_ratio": summary.mean_gzip_ratio,
            "lzma_ratio": summary.mean_lzma_ratio,
            "zstd_ratio": summary.mean_zstd_ratio,
        }));
    }

    let line = format!(
        "messages: {}\nhuffman: {}\ngzip: {}\nlzma: {}\nzstd: {}\n",
        summary.messages,
        format_ratio(Some(summary.mean_huffman_ratio)),
        format_ratio(summary.mean_gzip_ratio),
        format_ratio(summary.mean_lzma_ratio),
        format_ratio(summary.mean_zstd_ratio)
    );
    write_stdout(line.as_bytes())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn default_log_filter(opts: &Options) -> &'static str {
    if opts.quiet {
        return "error";
    }
    match opts.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    let cli = Cli::parse();
    let opts = resolve_options(cli);

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_log_filter(&opts)))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let exit_code = match opts.command {
        Command::Compress => cmd_compress(&opts),
        Command::Decompress => cmd_decompress(&opts),
        Command::Encode => cmd_encode(&opts),
        Command::Decode => cmd_decode(&opts),
        Command::Table => cmd_table(&opts),
        Command::Serve => cmd_serve(&opts),
        Command::Send => cmd_send(&opts),
        Command::Compare => cmd_compare(&opts),
        Command::Config => cmd_config(),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
