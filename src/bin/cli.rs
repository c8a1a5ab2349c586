//! stalkwire CLI Client
//!
//! Command-line interface for a beanstalkd server.

use std::io::Write;

use clap::{Parser, Subcommand};
use stalkwire::{Client, Config, Job, Result, Stats};
use tracing_subscriber::{fmt, EnvFilter};

/// stalkwire CLI
#[derive(Parser, Debug)]
#[command(name = "stalkwire-cli")]
#[command(about = "CLI for beanstalkd work queues")]
#[command(version)]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:11300")]
    server: String,

    /// Tube to use (for put) and watch (for reserve)
    #[arg(short, long)]
    tube: Option<String>,

    /// Connect timeout in milliseconds
    #[arg(long, default_value = "5000")]
    connect_timeout_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enqueue a job
    Put {
        /// Job body
        body: String,

        #[arg(short, long, default_value = "1024")]
        priority: u32,

        /// Delay in seconds
        #[arg(short, long, default_value = "0")]
        delay: u32,

        /// Time-to-run in seconds
        #[arg(long, default_value = "60")]
        ttr: u32,
    },

    /// Reserve a job
    Reserve {
        /// Give up after this many seconds
        #[arg(long)]
        timeout: Option<u32>,
    },

    /// Delete a job
    Delete { id: u64 },

    /// Release a reserved job
    Release {
        id: u64,

        #[arg(short, long, default_value = "1024")]
        priority: u32,

        #[arg(short, long, default_value = "0")]
        delay: u32,
    },

    /// Bury a reserved job
    Bury {
        id: u64,

        #[arg(short, long, default_value = "1024")]
        priority: u32,
    },

    /// Extend a reserved job's time-to-run
    Touch { id: u64 },

    /// Show a job by id
    Peek { id: u64 },

    /// Show the next ready job
    PeekReady,

    /// Show the delayed job with the shortest delay left
    PeekDelayed,

    /// Show the next buried job
    PeekBuried,

    /// Kick up to `bound` buried or delayed jobs
    Kick { bound: u64 },

    /// Kick a single job
    KickJob { id: u64 },

    /// Server statistics
    Stats,

    /// Tube statistics
    StatsTube { name: String },

    /// Job statistics
    StatsJob { id: u64 },

    /// List existing tubes
    ListTubes,

    /// Pause a tube
    PauseTube {
        name: String,

        /// Pause duration in seconds
        delay: u32,
    },
}

fn main() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,stalkwire=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = Config::builder()
        .addr(&args.server)
        .connect_timeout_ms(args.connect_timeout_ms)
        .auto_reconnect(false)
        .build();

    let tube = args.tube;
    let command = args.command;
    let outcome = Client::scoped(config, |client| run(client, tube.as_deref(), command));

    if let Err(e) = outcome {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(client: &Client, tube: Option<&str>, command: Commands) -> Result<()> {
    if let Some(tube) = tube {
        client.use_tube(tube).wait()?;
        client.watch(tube).wait()?;
        if tube != stalkwire::protocol::DEFAULT_TUBE {
            client.ignore(stalkwire::protocol::DEFAULT_TUBE).wait()?;
        }
    }

    match command {
        Commands::Put {
            body,
            priority,
            delay,
            ttr,
        } => {
            let id = client.put(priority, delay, ttr, body.into_bytes()).wait()?;
            println!("INSERTED {}", id);
        }
        Commands::Reserve { timeout } => {
            let job = match timeout {
                Some(seconds) => client.reserve_with_timeout(seconds).wait()?,
                None => client.reserve().wait()?,
            };
            print_job(&job)?;
        }
        Commands::Delete { id } => {
            client.delete(id).wait()?;
            println!("DELETED {}", id);
        }
        Commands::Release { id, priority, delay } => {
            client.release(id, priority, delay).wait()?;
            println!("RELEASED {}", id);
        }
        Commands::Bury { id, priority } => {
            client.bury(id, priority).wait()?;
            println!("BURIED {}", id);
        }
        Commands::Touch { id } => {
            client.touch(id).wait()?;
            println!("TOUCHED {}", id);
        }
        Commands::Peek { id } => print_job(&client.peek(id).wait()?)?,
        Commands::PeekReady => print_job(&client.peek_ready().wait()?)?,
        Commands::PeekDelayed => print_job(&client.peek_delayed().wait()?)?,
        Commands::PeekBuried => print_job(&client.peek_buried().wait()?)?,
        Commands::Kick { bound } => {
            let kicked = client.kick(bound).wait()?;
            println!("KICKED {}", kicked);
        }
        Commands::KickJob { id } => {
            client.kick_job(id).wait()?;
            println!("KICKED {}", id);
        }
        Commands::Stats => print_stats(&client.stats().wait()?),
        Commands::StatsTube { name } => print_stats(&client.stats_tube(&name).wait()?),
        Commands::StatsJob { id } => print_stats(&client.stats_job(id).wait()?),
        Commands::ListTubes => {
            for tube in client.list_tubes().wait()? {
                println!("{}", tube);
            }
        }
        Commands::PauseTube { name, delay } => {
            client.pause_tube(&name, delay).wait()?;
            println!("PAUSED {} for {}s", name, delay);
        }
    }

    Ok(())
}

fn print_job(job: &Job) -> Result<()> {
    println!("id: {} ({} bytes)", job.id, job.declared_len);
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&job.body)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn print_stats(stats: &Stats) {
    match stats {
        Stats::Map(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            for (key, value) in entries {
                println!("{}: {}", key, value);
            }
        }
        Stats::List(items) => {
            for item in items {
                println!("- {}", item);
            }
        }
    }
}
