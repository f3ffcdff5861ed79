use clap::Parser;
use crate::repositories::google_maps_repo::DEFAULT_BASE_URL;

#[derive(Parser, Clone)]
#[clap(about = "Restaurant discovery backend")]
pub struct Config {
    #[clap(env, long, default_value = "development")]
    pub environment: String,

    #[clap(env, long, default_value_t = 3000)]
    pub port: u16,

    /// Comma separated list of origins allowed by CORS
    #[clap(env, long, default_value = "http://localhost:3000")]
    pub origin_urls: String,

    #[clap(env, long, default_value = DEFAULT_BASE_URL)]
    pub maps_base_url: String,

    /// Key handed to sessions that are opened without one
    #[clap(env, long)]
    pub google_maps_api_key: Option<String>,

    #[clap(env, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    pub request_timeout_secs: u64,

    #[clap(env, long, default_value_t = 64, value_parser = clap::value_parser!(u32).range(1..))]
    pub max_concurrent_requests: u32,

    /// Sessions untouched for this long are discarded
    #[clap(env, long, default_value_t = 1800, value_parser = clap::value_parser!(u64).range(1..))]
    pub session_idle_secs: u64,
}
