use anyhow::Context;
use mojibake_bus::{Pipeline, decode};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

mod config;

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .filter_module("mojibake_bus", level)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::config();
    init_logging(config.verbose());
    mojibake_bus::init();
    log::debug!("undoing {:?}", config.encodings());

    tokio::select! {
        result = run(config) => result,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("interrupted");
            std::process::exit(130);
        }
    }
}

async fn run(config: &config::DecodeConfig) -> anyhow::Result<()> {
    if !config.texts().is_empty() {
        let mut stdout = tokio::io::stdout();
        for text in config.texts() {
            let decoded = decode(text, config.encodings())
                .await
                .with_context(|| format!("decoding {:?}", text))?;
            stdout.write_all(decoded.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        return Ok(());
    }

    let mut pipeline = Pipeline::new(tokio::io::stdout(), config.encodings())?;
    let mut stdin = tokio::io::stdin();

    if config.flush_lines() {
        let mut reader = BufReader::new(stdin);
        let mut line = Vec::new();
        loop {
            line.clear();
            if reader.read_until(b'\n', &mut line).await? == 0 {
                break;
            }
            pipeline.write(&line).await?;
            match pipeline.flush().await {
                Ok(_) => {}
                Err(e) if e.is_malformed() => log::warn!("skipping line: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
    } else {
        let copied = pipeline.copy_from(&mut stdin).await?;
        log::debug!("read {} byte(s)", copied);
    }

    pipeline.close().await.context("flushing decoded output")?;
    Ok(())
}
