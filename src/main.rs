use std::{
    error::Error,
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::Arc,
    thread,
};

use clap::{Parser, Subcommand};
use log::{error, info};
use roosty_alarm::{
    config::Config, Coordinator, Dispatcher, Event, Request, SystemClock,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// use this config file instead of the default one
    #[clap(long, short)]
    config: Option<PathBuf>,
    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// write the default config file
    Init {
        #[clap(long, short)]
        force: bool,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    // initilize the logger
    simple_file_logger::init_logger!("roosty_alarm").expect("couldn't initialize logger");

    let args = Args::parse();
    let config_path = match args.config {
        Some(path) => path,
        None => Config::config_path()?,
    };
    if let Some(Command::Init { force }) = args.command {
        if force || !config_path.exists() {
            Config::new().save(&config_path)?;
            println!("wrote {}", config_path.display());
        } else {
            println!("{} already exists, use --force to overwrite", config_path.display());
        }
        return Ok(());
    }

    let config = Config::load_or_default(&config_path)?;
    log::set_max_level(config.log_level);

    let (tx, rx) = crossbeam_channel::unbounded::<Event>();
    let coordinator = Arc::new(Coordinator::new(SystemClock, tx));
    Dispatcher::new(Arc::clone(&coordinator)).spawn()?;

    // prints whatever the scheduler reports, independent of the prompt
    let time_format = config.time_format.clone();
    thread::spawn(move || {
        for event in rx {
            println!("{}", event.render(&time_format));
        }
    });

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", config.prompt);
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            info!("end of input, exiting");
            return Ok(());
        };
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "list" {
            list_alarms(&coordinator);
            continue;
        }
        match line.parse::<Request>() {
            Ok(request) => {
                if let Err(e) = coordinator.submit(request) {
                    error!("rejected `{line}`: {e}");
                    eprintln!("Error: {e}");
                }
            }
            Err(e) => eprintln!("Bad command: {e}"),
        }
    }
}

fn list_alarms(coordinator: &Coordinator) {
    let listing: Vec<String> = coordinator.with_exclusive_access(|schedule| {
        schedule
            .store()
            .iter()
            .map(ToString::to_string)
            .collect()
    });
    if listing.is_empty() {
        println!("no pending alarms");
    }
    for alarm in listing {
        println!("{alarm}");
    }
}
