use clap::Parser;
use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    process,
};

use vmem_sim::command::{Session, HELP};
use vmem_sim::{FitStrategy, SimConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, help = "Load settings from a JSON file")]
    config: Option<PathBuf>,

    /// Address space size, overrides the config file
    #[arg(long, help = "Total address space in units")]
    size: Option<usize>,

    /// Page size, overrides the config file
    #[arg(long, help = "Allocation granularity in units")]
    page_size: Option<usize>,

    /// Map width, overrides the config file
    #[arg(long, help = "Number of buckets in the memory map")]
    buckets: Option<usize>,

    /// Strategy used when `alloc` omits one
    #[arg(long, help = "Default fit strategy (first, best, next)")]
    strategy: Option<FitStrategy>,

    /// Run commands from a file instead of the REPL
    #[arg(long, help = "Execute a command script and exit")]
    script: Option<PathBuf>,
}

impl Cli {
    fn sim_config(&self) -> vmem_sim::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => SimConfig::load(path)?,
            None => SimConfig::default(),
        };

        if let Some(size) = self.size {
            config.allocator.total_size = size;
        }
        if let Some(page_size) = self.page_size {
            config.allocator.page_size = page_size;
        }
        if let Some(buckets) = self.buckets {
            config.map.buckets = buckets;
        }
        if let Some(strategy) = self.strategy {
            config.default_strategy = strategy;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    let config = match cli.sim_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(2);
        }
    };

    log::debug!("starting session with {:?}", config);

    let mut session = match Session::new(config) {
        Ok(session) => session,
        Err(err) => {
            eprintln!("Error: {}", err);
            process::exit(2);
        }
    };

    match &cli.script {
        Some(path) => run_script(&mut session, path),
        None => repl(&mut session),
    }
}

fn run_script(session: &mut Session, path: &Path) {
    let script = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            eprintln!("Error reading script '{}': {}", path.display(), err);
            process::exit(1);
        }
    };

    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        println!("> {}", line);
        let reply = session.handle_line(line);
        print!("{}", reply.output);
        if reply.exit {
            break;
        }
    }
}

fn repl(session: &mut Session) {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut input_buffer = String::new();

    println!("=== Virtual Memory Allocator ===");
    print!("{}", HELP);

    loop {
        print!("\n> ");
        if let Err(err) = stdout.flush() {
            eprintln!("Error flushing stdout: {}", err);
            break;
        }

        input_buffer.clear();
        match stdin.read_line(&mut input_buffer) {
            Ok(0) => break,
            Ok(_) => {
                let reply = session.handle_line(&input_buffer);
                print!("{}", reply.output);
                if reply.exit {
                    break;
                }
            }
            Err(err) => {
                eprintln!("Error reading input: {}", err);
                break;
            }
        }
    }
}
