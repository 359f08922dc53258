use std::path::PathBuf;

use clap::Subcommand;

use crate::directory::SortKey;

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    #[command(
        about = "Register one school",
        long_about = "Validate the fields, copy the image into the asset directory and insert the record. Prints the stored record as JSON."
    )]
    Register {
        #[arg(long, value_name = "NAME")]
        name: Option<String>,
        #[arg(long, value_name = "EMAIL")]
        email: Option<String>,
        #[arg(long, value_name = "ADDRESS")]
        address: Option<String>,
        #[arg(long, value_name = "CITY")]
        city: Option<String>,
        #[arg(long, value_name = "STATE")]
        state: Option<String>,
        #[arg(long, value_name = "CONTACT")]
        contact: Option<String>,
        #[arg(long, value_name = "PATH", help = "Image file to upload")]
        image: Option<PathBuf>,
    },
    #[command(
        about = "List registered schools",
        long_about = "Print school summaries as JSON, optionally filtered by a case-insensitive substring of name, city or address and sorted by name or city."
    )]
    List {
        #[arg(long, short = 'q', value_name = "TEXT")]
        query: Option<String>,
        #[arg(long, value_enum)]
        sort: Option<SortKey>,
    },
}
