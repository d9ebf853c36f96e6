//! Command line [`Args`].

use clap::Parser;

/// GraphQL server allocating surplus food donations between donors and
/// recipients.
#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// TOML file to load the configuration from, if it exists.
    ///
    /// `CONF.`-prefixed environment variables take precedence over it.
    #[arg(short, long, value_name = "PATH", default_value = "config.toml")]
    pub config: String,
}

impl Args {
    /// Parses the [`Args`] of the current process.
    ///
    /// # Errors
    ///
    /// If the [`Args`] are malformed, or help or version is requested.
    pub fn parse() -> Result<Self, clap::Error> {
        <Self as Parser>::try_parse()
    }
}
