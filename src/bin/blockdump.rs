use blockcodec::compression::{dct_2d, idct_2d_raw, scan_block, LevelShift};
use blockcodec::{
    Block, BlockCodec, BlockReader, CodecResult, IdctStrategy, PipelineConfig, SampleFormat,
    Zigzag,
};
use std::io::BufReader;

fn print_block<T: std::fmt::Display + Copy>(title: &str, block: &Block<T>) {
    println!("\n<--- {} --->", title);
    for r in 0..block.size() {
        let row: Vec<String> = block.row(r).iter().map(|v| format!("{:>8.2}", v)).collect();
        println!("{}", row.join(" "));
    }
}

fn main() -> CodecResult<()> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: blockdump <raw_file> [block_index] [quality]");
        std::process::exit(1);
    }

    let path = &args[1];
    let index: usize = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(0);
    let config = match args.get(3).and_then(|s| s.parse().ok()) {
        Some(q) => PipelineConfig::lossy(q),
        None => PipelineConfig::default(),
    };

    let file = std::fs::File::open(path)?;
    let mut reader = BlockReader::new(BufReader::new(file), config.block_size, SampleFormat::U8)?;
    let mut block = reader.read_block()?;
    for _ in 0..index {
        block = reader.read_block()?;
    }

    println!("<--- Block Dump --->\n");
    println!("File: {}", path);
    println!("Block: {}", index);
    println!("Quality: {:?}", config.quality);

    print_block("Samples", &block);

    let mut coeffs = block.clone();
    LevelShift::new(config.level_shift).normalize(&mut coeffs);
    dct_2d(&mut coeffs)?;
    print_block("DCT", &coeffs);

    let mut direct = coeffs.clone();
    let mut transposed = coeffs;
    idct_2d_raw(&mut direct, IdctStrategy::Direct)?;
    idct_2d_raw(&mut transposed, IdctStrategy::TransposeDoublePass)?;
    println!(
        "\nIDCT strategy disagreement: {:.3e}",
        direct.max_abs_diff(&transposed)
    );

    let codec = BlockCodec::new(config)?;
    let levels = codec.forward(&block)?;
    print_block("Levels", &levels);

    let scanned = scan_block(&levels, &Zigzag)?;
    println!("\n<--- Zigzag --->");
    println!("{:?}", scanned);

    let symbols = codec.encode_block(&block)?;
    println!("\n<--- Run-Length ({} symbols) --->", symbols.len());
    for s in &symbols {
        print!("({} x {}) ", s.count, s.value);
    }
    println!();

    let decoded = codec.decode_block(&symbols)?;
    print_block("Decoded", &decoded);
    println!(
        "\nMax reconstruction error: {:.0}",
        decoded.max_abs_diff(&block)
    );

    Ok(())
}
