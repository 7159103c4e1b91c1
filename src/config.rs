use clap::Parser;
use std::time::Duration;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "clip-gateway")]
#[command(about = "Rate limited front door for channel clips and previews")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 8989)]
    pub port: u16,

    // Media generator service
    #[arg(short, long, env = "GENERATOR_URL", default_value = "localhost:9000")]
    pub generator_url: String,

    // Generator request timeout in seconds
    #[arg(long, env = "GENERATOR_TIMEOUT", default_value_t = 30)]
    pub generator_timeout: u64,

    // Max admitted requests per client per window
    #[arg(long, env = "RATE_LIMIT", default_value_t = 3,
          value_parser = clap::value_parser!(u32).range(1..))]
    pub rate_limit: u32,

    // Sliding window length in seconds
    #[arg(long, env = "RATE_WINDOW", default_value_t = 15)]
    pub rate_window: u64,

    // How often idle clients are swept, in seconds
    #[arg(long, env = "CLEANUP_INTERVAL", default_value_t = 60,
          value_parser = clap::value_parser!(u64).range(1..))]
    pub cleanup_interval: u64,

    // Client keys that are never rate limited
    // Example: "10.0.0.1,10.0.0.2"
    #[arg(long, env = "BYPASS_IPS", default_value = "")]
    pub bypass_ips: String,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval)
    }

    pub fn generator_timeout(&self) -> Duration {
        Duration::from_secs(self.generator_timeout)
    }
}
