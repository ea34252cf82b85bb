// Command-line arguments.
// Subcommands for signing in, browsing cached resources, and managing the cache.

use clap::{Args, Parser, Subcommand};

/// Command-line interface for the Sanchara admin console
#[derive(Debug, Parser)]
#[command(name = "sanchara-admin")]
#[command(about = "Sanchara admin console: sign in, browse platform data, and manage admins", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in as an admin and remember the session
    Signin(CredentialArgs),
    /// Register a new admin account and sign in with it
    Signup(CredentialArgs),
    /// Create the first super admin with the deployment secret
    Bootstrap(BootstrapArgs),
    /// Forget the stored session
    Signout,
    /// Show the signed-in admin
    Whoami,
    /// Show dashboard metrics
    Dashboard {
        /// Ignore the cache and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },
    /// List platform users
    Users(ListArgs),
    /// List guest visits
    Guests(ListArgs),
    /// List trips
    Trips(PageArgs),
    /// Show one trip
    Trip {
        /// Trip identifier
        #[arg(value_name = "TRIP_ID")]
        id: String,
    },
    /// Show the analytics snapshot
    Analytics {
        /// Ignore the cache and fetch fresh data
        #[arg(long)]
        refresh: bool,
    },
    /// Create another admin (super admins only)
    CreateAdmin(CredentialArgs),
    /// Remove cached responses, for one resource or all of them
    ClearCache {
        /// Resource key (users, guests, trips, dashboard, analytics)
        #[arg(value_name = "RESOURCE")]
        resource: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CredentialArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Debug, Args)]
pub struct BootstrapArgs {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,

    /// Bootstrap secret configured on the server
    #[arg(long)]
    pub secret: String,
}

/// Paging options
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page to show, starting at 1
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    pub page: u32,

    /// Ignore the cache and fetch fresh data
    #[arg(long)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub paging: PageArgs,

    /// Only show loaded rows matching this text
    #[arg(long, value_name = "QUERY")]
    pub search: Option<String>,
}
