use std::process::ExitCode;

use clap::Parser;
use log::{error, info};

use ckarc::{Archiver, CreateOptions, ZipCompressor};
use ckcore::buf::{suggest_buffer_size, BufferPolicy};

mod cli;
use crate::cli::Cli;
use crate::cli::Commands;
use crate::cli::Config;

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse the cli
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load(cli.config.as_deref())?;
    let buffer = match cli.buffer_size {
        Some(size) => BufferPolicy::Fixed(size),
        None => config.checksum.policy(),
    };
    let archiver = Archiver::new(ZipCompressor, buffer);

    match cli.command {
        Commands::Create {
            source,
            dest,
            no_checksum,
            no_overwrite,
            level,
            include_base_dir,
        } => {
            let options = CreateOptions {
                level: level.unwrap_or(config.archive.level),
                include_base_dir: include_base_dir || config.archive.include_base_dir,
            };
            archiver.create_with_checksum(
                &source,
                &dest,
                config.archive.store_checksum && !no_checksum,
                config.archive.overwrite && !no_overwrite,
                &options,
            )?;
        }
        Commands::Extract {
            archive,
            dest,
            no_check,
        } => {
            archiver.verify_and_extract(&archive, &dest, config.archive.check && !no_check)?;
        }
        Commands::Append { archive } => {
            println!("{}", archiver.append_checksum(&archive)?);
        }
        Commands::Remove { archive } => match archiver.remove_checksum(&archive)? {
            Some(hash) => println!("{}", hash),
            None => info!("{} has no stored checksum", archive.display()),
        },
        Commands::Show { archive } => {
            println!("{}", archiver.stored_checksum(&archive)?);
        }
        Commands::Hash { archive } => {
            println!("{}", archiver.calculate_checksum(&archive)?);
        }
        Commands::Verify { archive } => {
            archiver.verify(&archive)?;
            println!("{}: OK", archive.display());
        }
        Commands::Suggest {
            file,
            min,
            max,
            ratio,
        } => {
            let size = suggest_buffer_size(
                &file,
                min.unwrap_or(config.checksum.min_buffer),
                max.unwrap_or(config.checksum.max_buffer),
                ratio.unwrap_or(config.checksum.ratio),
            )?;
            println!("{}", size);
        }
    }
    Ok(())
}
