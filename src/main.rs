use blockcodec::format::{read_symbols, write_symbols};
use blockcodec::{
    BlockCodec, BlockReader, BlockWriter, CodecError, CodecResult, IdctStrategy, PipelineConfig,
    SampleFormat, MAGIC, VERSION,
};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use colored::Colorize;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};

fn main() -> CodecResult<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 3 {
        print_usage();
        std::process::exit(1);
    }

    let command = &args[1];
    let input = &args[2];

    match command.as_str() {
        "encode" => {
            if args.len() < 4 {
                eprintln!("{} Output file required", "Error:".red().bold());
                std::process::exit(1);
            }
            let quality = args.get(4).and_then(|s| s.parse().ok());
            encode_file(input, &args[3], quality)?;
        }
        "decode" => {
            if args.len() < 4 {
                eprintln!("{} Output file required", "Error:".red().bold());
                std::process::exit(1);
            }
            let strategy = match args.get(4).map(String::as_str) {
                Some("transpose") => Some(IdctStrategy::TransposeDoublePass),
                Some("direct") => Some(IdctStrategy::Direct),
                _ => None,
            };
            decode_file(input, &args[3], strategy)?;
        }
        "info" => {
            show_info(input)?;
        }
        _ => {
            eprintln!("{} Unknown command: {}", "Error:".red().bold(), command);
            print_usage();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn write_header<W: Write>(writer: &mut W, config: &PipelineConfig) -> CodecResult<()> {
    let config_bytes = config.to_bytes()?;
    writer.write_all(MAGIC)?;
    writer.write_u32::<LittleEndian>(config_bytes.len() as u32)?;
    writer.write_all(&config_bytes)?;
    Ok(())
}

fn read_header<R: Read>(reader: &mut R) -> CodecResult<PipelineConfig> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(CodecError::ConfigError(format!(
            "not an encoded block file (magic {:?})",
            magic
        )));
    }
    let len = reader.read_u32::<LittleEndian>()? as usize;
    let mut config_bytes = vec![0u8; len];
    reader.read_exact(&mut config_bytes)?;
    PipelineConfig::from_bytes(&config_bytes)
}

fn encode_file(input: &str, output: &str, quality: Option<u8>) -> CodecResult<()> {
    let config = match quality {
        Some(q) => PipelineConfig::lossy(q),
        None => PipelineConfig::default(),
    };
    println!(
        "{} {} → {} (quality: {})",
        "Encoding".cyan().bold(),
        input.yellow(),
        output.green(),
        quality
            .map(|q| q.to_string())
            .unwrap_or_else(|| "unquantized".into())
            .magenta()
    );

    let codec = BlockCodec::new(config)?;
    let reader = BlockReader::new(
        BufReader::new(File::open(input)?),
        codec.block_size(),
        codec.config().sample_format,
    )?;
    let blocks = reader.blocks().collect::<CodecResult<Vec<_>>>()?;
    let encoded = codec.encode_blocks(&blocks)?;

    let mut writer = BufWriter::new(File::create(output)?);
    write_header(&mut writer, codec.config())?;
    for symbols in &encoded {
        write_symbols(&mut writer, symbols)?;
    }
    writer.flush()?;

    let input_size = std::fs::metadata(input)?.len();
    let output_size = std::fs::metadata(output)?.len();
    let symbol_count: usize = encoded.iter().map(Vec::len).sum();

    println!("{}", "✓ Encoded successfully!".green().bold());
    println!("  {} {}", "Blocks: ".dimmed(), blocks.len().to_string().white());
    println!("  {} {}", "Symbols:".dimmed(), symbol_count.to_string().white());
    println!(
        "  {} {} bytes",
        "Input:  ".dimmed(),
        input_size.to_string().white()
    );
    println!(
        "  {} {} bytes",
        "Output: ".dimmed(),
        output_size.to_string().white()
    );

    Ok(())
}

fn decode_file(input: &str, output: &str, strategy: Option<IdctStrategy>) -> CodecResult<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let mut config = read_header(&mut reader)?;
    if let Some(strategy) = strategy {
        config = config.with_strategy(strategy);
    }

    println!(
        "{} {} → {} ({} inverse)",
        "Decoding".cyan().bold(),
        input.yellow(),
        output.green(),
        config.strategy.name().magenta()
    );

    let mut encoded = Vec::new();
    loop {
        match read_symbols(&mut reader) {
            Ok(symbols) => encoded.push(symbols),
            Err(CodecError::EndOfData) => break,
            Err(e) => return Err(e),
        }
    }

    let codec = BlockCodec::new(config)?;
    let blocks = codec.decode_blocks(&encoded)?;

    let mut writer = BlockWriter::new(
        BufWriter::new(File::create(output)?),
        codec.block_size(),
        SampleFormat::U8,
    );
    for block in &blocks {
        writer.write_block(block)?;
    }
    writer.flush()?;

    println!("{}", "✓ Decoded successfully!".green().bold());
    println!("  {} {}", "Blocks:".dimmed(), blocks.len().to_string().white());

    Ok(())
}

fn show_info(input: &str) -> CodecResult<()> {
    let mut reader = BufReader::new(File::open(input)?);
    let config = read_header(&mut reader)?;

    let mut blocks = 0usize;
    let mut symbols = 0usize;
    loop {
        match read_symbols(&mut reader) {
            Ok(record) => {
                blocks += 1;
                symbols += record.len();
            }
            Err(CodecError::EndOfData) => break,
            Err(e) => return Err(e),
        }
    }

    println!();
    println!("{}", "═══ Block Codec File ═══".cyan().bold());
    println!("{} {}", "Version:".dimmed(), VERSION.green());
    println!(
        "{} {}x{}",
        "Block Size:".dimmed(),
        config.block_size.to_string().white(),
        config.block_size.to_string().white()
    );
    println!(
        "{} {}",
        "Quality:".dimmed(),
        config
            .quality
            .map(|q| q.to_string())
            .unwrap_or_else(|| "unquantized".into())
            .yellow()
    );
    println!("{} {}", "Inverse:".dimmed(), config.strategy.name().magenta());
    println!(
        "{} {}",
        "Level Shift:".dimmed(),
        config.level_shift.to_string().white()
    );
    println!("{} {}", "Blocks:".dimmed(), blocks.to_string().white());
    println!("{} {}", "Symbols:".dimmed(), symbols.to_string().white());
    if blocks > 0 {
        println!(
            "{} {}",
            "Symbols/Block:".dimmed(),
            format!("{:.1}", symbols as f64 / blocks as f64).cyan()
        );
    }
    println!();

    Ok(())
}

fn print_usage() {
    println!();
    println!(
        "{} {}",
        "DCT Block Codec".cyan().bold(),
        format!("v{}", VERSION).green()
    );
    println!();
    println!("{}", "USAGE:".yellow().bold());
    println!(
        "  {} {} <raw_input> <output.dctb> [quality]",
        "blockcodec".white(),
        "encode".green()
    );
    println!(
        "  {} {} <input.dctb> <raw_output> [direct|transpose]",
        "blockcodec".white(),
        "decode".green()
    );
    println!("  {} {} <input.dctb>", "blockcodec".white(), "info".green());
    println!();
    println!("{}", "OPTIONS:".yellow().bold());
    println!(
        "  {} 1-100 (default: none, coefficients are only rounded)",
        "Quality:".dimmed()
    );
    println!();
    println!("{}", "EXAMPLES:".yellow().bold());
    println!("  {} lilies.raw lilies.dctb 85", "blockcodec encode".cyan());
    println!("  {} lilies.dctb lilies.out transpose", "blockcodec decode".cyan());
    println!("  {} lilies.dctb", "blockcodec info".cyan());
    println!();
}
